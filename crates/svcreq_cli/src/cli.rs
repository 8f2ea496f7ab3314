use std::path::PathBuf;

/// Maintains one service request per owner
#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// SQLite database file
    #[clap(long, env = "SVCREQ_DB_PATH", default_value = "svcreq.sqlite3")]
    pub db: PathBuf,

    /// Log level (trace|debug|info|warn|error); needs --log-dir
    #[clap(long, env = "SVCREQ_LOG_LEVEL", requires = "log_dir")]
    pub log_level: Option<String>,

    /// Absolute directory for log files; logging is off when unset
    #[clap(long, env = "SVCREQ_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Json output
    #[clap(long)]
    pub json: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Create or overwrite the owner's service request
    Update(UpdateArgs),
    /// Show the owner's service request
    Show(ShowArgs),
    /// List all service requests by primary key
    List,
    /// Print the core version
    Ping,
}

#[derive(Debug, clap::Args)]
pub struct UpdateArgs {
    /// Owner account handle
    #[clap(long)]
    pub owner: u64,

    /// Accounts that authorized this action
    #[clap(long = "signer")]
    pub signers: Vec<u64>,

    #[clap(long, default_value = "")]
    pub title: String,

    #[clap(long, default_value = "")]
    pub description: String,

    /// Free-form time label
    #[clap(long, default_value = "")]
    pub time: String,
}

#[derive(Debug, clap::Args)]
pub struct ShowArgs {
    /// Owner account handle
    #[clap(long)]
    pub owner: u64,
}
