//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into command-level APIs.
//! - Keep hosts decoupled from storage details.

pub mod record_store;
