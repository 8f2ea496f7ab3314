//! Command-line host for the service request store.
//!
//! # Responsibility
//! - Marshal arguments into the single `update` action and a few read views.
//! - Act as the authentication and clock collaborator for the core.

use anyhow::Context as _;
use clap::Parser;
use cli::{Cli, Command};
use rusqlite::Connection;
use std::path::Path;
use svcreq_core::db::open_db;
use svcreq_core::{
    init_logging, ActionAuth, LoggingConfig, Owner, RecordStore, RequestFields, ServiceRequest,
    SqliteRequestRepository, SystemClock,
};

mod cli;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if let Some(log_dir) = &cli.log_dir {
        let level = cli
            .log_level
            .clone()
            .unwrap_or_else(|| svcreq_core::default_log_level().to_string());
        init_logging(&LoggingConfig::new(level, log_dir)).context("failed to start logging")?;
    }

    match &cli.command {
        Command::Ping => {
            println!("svcreq_core version={}", svcreq_core::core_version());
        }
        Command::Update(args) => {
            let conn = open_connection(&cli.db)?;
            let mut store = open_store(&conn)?;
            // Signers stand in for signatures the host would have verified.
            let auth = args
                .signers
                .iter()
                .fold(ActionAuth::anonymous(), |auth, signer| {
                    auth.with_signer(Owner(*signer))
                });
            let fields = RequestFields::new(
                args.title.clone(),
                args.description.clone(),
                args.time.clone(),
            );
            let upserted = store
                .submit_or_update_with_clock(&auth, Owner(args.owner), fields, &SystemClock)
                .with_context(|| format!("update for owner {} failed", args.owner))?;
            log::debug!(
                "event=cli_update module=cli status=ok outcome={}",
                upserted.outcome.as_str()
            );
            print_requests(cli.json, std::slice::from_ref(&upserted.request))?;
        }
        Command::Show(args) => {
            let conn = open_connection(&cli.db)?;
            let request = open_store(&conn)?
                .get_by_owner(Owner(args.owner))
                .context("lookup failed")?
                .with_context(|| format!("owner {} has no service request", args.owner))?;
            print_requests(cli.json, &[request])?;
        }
        Command::List => {
            let conn = open_connection(&cli.db)?;
            let requests = open_store(&conn)?.list().context("listing failed")?;
            print_requests(cli.json, &requests)?;
        }
    }

    Ok(())
}

fn open_connection(path: &Path) -> anyhow::Result<Connection> {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("failed to read working directory")?
            .join(path)
    };
    open_db(&path).with_context(|| format!("failed to open database `{}`", path.display()))
}

fn open_store(conn: &Connection) -> anyhow::Result<RecordStore<SqliteRequestRepository<'_>>> {
    let repo = SqliteRequestRepository::try_new(conn).context("database is not usable")?;
    Ok(RecordStore::new(repo))
}

fn print_requests(json: bool, requests: &[ServiceRequest]) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(requests)?);
        return Ok(());
    }
    for request in requests {
        println!(
            "prim_key={} owner={} last_updated={}\n  title: {}\n  description: {}\n  time: {}",
            request.prim_key,
            request.owner,
            request.last_updated,
            request.title,
            request.description,
            request.time
        );
    }
    Ok(())
}
