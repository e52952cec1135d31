#[cfg(not(debug_assertions))]
use human_panic::setup_panic;

#[cfg(debug_assertions)]
extern crate better_panic;

use std::process::ExitCode;

use utils::error::Result;

/// The main entry point of the application.
#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Human Panic. Only enabled when *not* debugging.
    #[cfg(not(debug_assertions))]
    {
        setup_panic!();
    }

    // Better Panic. Only enabled *when* debugging.
    #[cfg(debug_assertions)]
    {
        better_panic::Settings::debug()
            .most_recent_first(false)
            .lineno_suffix(true)
            .verbosity(better_panic::Verbosity::Full)
            .install();
    }

    let config_contents = include_str!("resources/default_config.toml");

    // Parse CLI arguments, load configuration, setup logging and run the command
    cli::cli_match(config_contents).await
}
