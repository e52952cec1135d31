use std::process::ExitCode;
use std::sync::Arc;

use app::consumer::config::ConsumerConfig;
use app::consumer::ConsumerManager;
use app::sync::{spawn_action, spawn_worker, Action, ActionReport, CommandBuilder, Synchronizer};
use tokio::io::{AsyncBufReadExt, BufReader};
use utils::app_config::Config;
use utils::error::{Error, Result};

const INTERACTIVE_HELP: &str = "\
Commands:
  download   copy the remote directory into the local one
  upload     copy the local directory into the remote one
  sync       download, then upload
  help       show this message
  quit       wait for queued actions and exit";

fn synchronizer(config: &Config, manager: &ConsumerManager) -> Arc<Synchronizer> {
    Arc::new(Synchronizer::new(
        Arc::new(config.paths.clone()),
        CommandBuilder::from_config(&config.rsync),
        manager.get_broadcaster(),
    ))
}

fn all_succeeded(reports: &[ActionReport]) -> bool {
    reports.iter().all(ActionReport::succeeded)
}

fn exit_code(reports: &[ActionReport]) -> ExitCode {
    if all_succeeded(reports) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Run one action on a background worker and wait for it.
pub async fn action_cmd(
    action: Action, config: &Config, consumer_config: &ConsumerConfig,
) -> Result<ExitCode> {
    let mut manager = ConsumerManager::with_config(consumer_config);
    let handles = manager.start_consumers().await?;

    let report = spawn_action(synchronizer(config, &manager), action)
        .await
        .map_err(|e| Error::with_source("Sync worker failed", Box::new(e)))?;

    manager.shutdown(handles).await?;

    log::info!("{} finished: {:?}", action, report.outcomes);
    Ok(exit_code(&[report]))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Empty,
    Help,
    Quit,
    Run(Action),
    Unknown(String),
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "" => Input::Empty,
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        _ => match line.parse::<Action>() {
            Ok(action) => Input::Run(action),
            Err(_) => Input::Unknown(line.to_string()),
        },
    }
}

/// Read actions from stdin and queue them on a single background worker.
///
/// Actions run one after another; stdin keeps being read while they run.
pub async fn interactive_cmd(config: &Config, consumer_config: &ConsumerConfig) -> Result<ExitCode> {
    let mut manager = ConsumerManager::with_config(consumer_config);
    let handles = manager.start_consumers().await?;

    let (queue, worker) = spawn_worker(synchronizer(config, &manager));

    println!("{}", INTERACTIVE_HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            Input::Empty => continue,
            Input::Help => println!("{}", INTERACTIVE_HELP),
            Input::Quit => break,
            Input::Run(action) => {
                log::debug!("Queueing {}", action);
                if queue.send(action).is_err() {
                    log::error!("Sync worker stopped, no more actions accepted");
                    break;
                }
            }
            Input::Unknown(other) => println!("Unknown command: {} (type `help`)", other),
        }
    }

    drop(queue);
    let reports = worker
        .await
        .map_err(|e| Error::with_source("Sync worker failed", Box::new(e)))?;

    manager.shutdown(handles).await?;

    let failed = reports.iter().filter(|r| !r.succeeded()).count();
    log::info!("Interactive session ran {} action(s), {} failed", reports.len(), failed);

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_interactive_input() {
        assert_eq!(parse_input("  "), Input::Empty);
        assert_eq!(parse_input("help"), Input::Help);
        assert_eq!(parse_input("QUIT"), Input::Quit);
        assert_eq!(parse_input("download"), Input::Run(Action::Download));
        assert_eq!(parse_input(" sync\n"), Input::Run(Action::Sync));
        assert_eq!(parse_input("stop"), Input::Unknown("stop".to_string()));
    }

    #[test]
    fn exit_code_requires_every_leg() {
        use app::sync::{ExitStatus, Operation, Outcome};

        let ok = ActionReport {
            action: Action::Download,
            outcomes: vec![(Operation::Download, Outcome::Succeeded)],
        };
        let failed = ActionReport {
            action: Action::Sync,
            outcomes: vec![
                (Operation::Download, Outcome::Failed(ExitStatus::from_code(23))),
                (Operation::Upload, Outcome::Succeeded),
            ],
        };

        assert!(all_succeeded(&[ok.clone()]));
        assert!(!all_succeeded(&[ok, failed]));
    }
}
