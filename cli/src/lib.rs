use std::path::PathBuf;
use std::process::ExitCode;

use app::consumer::config::ConsumerConfig;
use app::sync::Action;
use clap::{Parser, Subcommand};
use utils::app_config::AppConfig;
use utils::error::Result;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "savesync", version)]
#[command(
    about = "Synchronize a local directory with a remote directory through rsync",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./config.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Set the logging level (debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Only report what rsync would transfer
    #[arg(short = 'n', long, global = true)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Copy the remote directory into the local one; remote content wins
    Download,

    /// Copy the local directory into the remote one, keeping newer remote files
    Upload,

    /// Download, then upload
    Sync,

    /// Read actions (download, upload, sync) from stdin and run them in the background
    Interactive,
}

impl Commands {
    pub fn action(&self) -> Option<Action> {
        match self {
            Commands::Download => Some(Action::Download),
            Commands::Upload => Some(Action::Upload),
            Commands::Sync => Some(Action::Sync),
            Commands::Interactive => None,
        }
    }
}

/// Layer the command line on top of the configuration sources.
pub fn load_config(cli: &Cli, default_config: &str) -> Result<AppConfig> {
    let mut app_config = AppConfig::load(Some(default_config), cli.config.as_deref())?;

    if let Some(level) = &cli.log_level {
        app_config.set("log.level", level)?;
    }
    if cli.dry_run {
        app_config.set("rsync.dry_run", "true")?;
    }

    Ok(app_config)
}

pub async fn cli_match(default_config: &str) -> Result<ExitCode> {
    let cli = Cli::parse();

    let app_config = load_config(&cli, default_config)?;
    let config = app_config.fetch()?;
    let consumer_config: ConsumerConfig = app_config.get("consumer")?;

    // Setup logging once the configured level is known
    let _guard = utils::logger::setup_logging(&config.log)?;
    log::debug!("Configuration: {:?}", config);

    match cli.command.action() {
        Some(action) => commands::action_cmd(action, &config, &consumer_config).await,
        None => commands::interactive_cmd(&config, &consumer_config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: &str = r#"
        [paths]
        remote = "host:/save"
        local = "/tmp/save"

        [consumer]
        channel_capacity = 16
    "#;

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["savesync", "sync", "--dry-run", "-l", "debug"]).unwrap();

        assert_eq!(cli.command, Commands::Sync);
        assert!(cli.dry_run);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.command.action(), Some(Action::Sync));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["savesync"]).is_err());
    }

    #[test]
    fn cli_flags_override_config() {
        let cli = Cli::try_parse_from(["savesync", "-n", "--log-level", "warn", "upload"]).unwrap();

        let config = load_config(&cli, DEFAULTS).unwrap().fetch().unwrap();
        assert!(config.rsync.dry_run);
        assert_eq!(config.log.level, "warn");
        assert_eq!(config.paths.remote, "host:/save");
    }

    #[test]
    fn interactive_has_no_single_action() {
        assert_eq!(Commands::Interactive.action(), None);
    }
}
