//! 同步模块 - 通过 rsync 在本地目录与远端目录之间同步

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use utils::app_config::PathsConfig;
use utils::error::{Error, Result};

pub mod command;
mod message;
pub mod runner;


pub use command::{ensure_trailing_separator, CommandBuilder, SyncCommand};
pub use message::SyncMessage;
pub use runner::{ExitStatus, OutputLine, OutputStream, SyncProcess};

// ============================================================================
// 类型定义
// ============================================================================

/// 单个方向的 rsync 调用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Download,
    Upload,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Download => "Download",
            Operation::Upload => "Upload",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 用户可触发的动作；`Sync` = 先 download 再 upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Download,
    Upload,
    Sync,
}

impl Action {
    pub fn operations(&self) -> &'static [Operation] {
        match self {
            Action::Download => &[Operation::Download],
            Action::Upload => &[Operation::Upload],
            Action::Sync => &[Operation::Download, Operation::Upload],
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Download => write!(f, "download"),
            Action::Upload => write!(f, "upload"),
            Action::Sync => write!(f, "sync"),
        }
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "download" => Ok(Action::Download),
            "upload" => Ok(Action::Upload),
            "sync" => Ok(Action::Sync),
            other => Err(Error::new(format!("Unknown action: {}", other))),
        }
    }
}

/// 单次调用的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    /// 进程运行但退出码非 0
    Failed(ExitStatus),
    /// 进程未能启动或等待失败
    Error(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded)
    }
}

/// 一个动作各步骤的结果，按执行顺序排列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    pub action: Action,
    pub outcomes: Vec<(Operation, Outcome)>,
}

impl ActionReport {
    pub fn succeeded(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|(_, outcome)| outcome.is_success())
    }
}

// ============================================================================
// 同步执行器
// ============================================================================

/// 执行 download / upload / sync，并把进度广播给消费者
pub struct Synchronizer {
    paths: Arc<PathsConfig>,
    builder: CommandBuilder,
    events: broadcast::Sender<SyncMessage>,
}

impl Synchronizer {
    pub fn new(
        paths: Arc<PathsConfig>, builder: CommandBuilder, events: broadcast::Sender<SyncMessage>,
    ) -> Self {
        Self {
            paths,
            builder,
            events,
        }
    }

    pub fn command_for(&self, operation: Operation) -> SyncCommand {
        match operation {
            Operation::Download => self.builder.download(&self.paths.remote, &self.paths.local),
            Operation::Upload => self.builder.upload(&self.paths.local, &self.paths.remote),
        }
    }

    pub async fn download(&self) -> Outcome {
        self.execute(Operation::Download).await
    }

    pub async fn upload(&self) -> Outcome {
        self.execute(Operation::Upload).await
    }

    /// 先完整执行 download，再执行 upload；download 失败不影响 upload
    pub async fn sync(&self) -> Vec<(Operation, Outcome)> {
        self.emit(SyncMessage::SyncStarted);
        self.execute_all(Action::Sync.operations()).await
    }

    pub async fn run(&self, action: Action) -> ActionReport {
        log::info!(
            "Running {} (remote: {}, local: {})",
            action,
            self.paths.remote,
            self.paths.local
        );

        let outcomes = match action {
            Action::Sync => self.sync().await,
            single => self.execute_all(single.operations()).await,
        };

        ActionReport { action, outcomes }
    }

    async fn execute_all(&self, operations: &[Operation]) -> Vec<(Operation, Outcome)> {
        let mut outcomes = Vec::with_capacity(operations.len());
        for &operation in operations {
            outcomes.push((operation, self.execute(operation).await));
        }
        outcomes
    }

    /// spawn -> 逐行转发输出 -> wait -> 报告状态
    async fn execute(&self, operation: Operation) -> Outcome {
        self.emit(SyncMessage::Started(operation));

        let command = self.command_for(operation);
        log::info!("{} command: {}", operation, command);

        match SyncProcess::start(&command) {
            Ok(process) => self.supervise(operation, process).await,
            Err(e) => self.report_error(operation, e),
        }
    }

    async fn supervise(&self, operation: Operation, mut process: SyncProcess) -> Outcome {
        // 某个输出流读取失败只结束该流，另一个流的输出照常转发
        while let Some(line) = process.next_line().await {
            match line {
                Ok(line) => self.emit(SyncMessage::Output { operation, line }),
                Err(e) => {
                    log::warn!("Failed to read {} output: {}", operation, e);
                    self.emit(SyncMessage::Error {
                        operation,
                        message: e.to_string(),
                    });
                }
            }
        }

        match process.wait().await {
            Ok(status) => {
                self.emit(SyncMessage::Finished { operation, status });
                if status.success() {
                    log::info!("{} completed", operation);
                    Outcome::Succeeded
                } else {
                    log::warn!("{} failed with {}", operation, status);
                    Outcome::Failed(status)
                }
            }
            Err(e) => self.report_error(operation, e),
        }
    }

    fn report_error(&self, operation: Operation, error: Error) -> Outcome {
        let message = error.to_string();
        log::error!("{} error: {}", operation, message);
        self.emit(SyncMessage::Error {
            operation,
            message: message.clone(),
        });
        Outcome::Error(message)
    }

    fn emit(&self, message: SyncMessage) {
        // 没有订阅者时忽略
        let _ = self.events.send(message);
    }
}

// ============================================================================
// 后台执行
// ============================================================================

/// 在后台任务中执行一个动作
pub fn spawn_action(synchronizer: Arc<Synchronizer>, action: Action) -> JoinHandle<ActionReport> {
    tokio::spawn(async move { synchronizer.run(action).await })
}

/// 启动一个顺序执行动作的后台 worker
///
/// 动作按入队顺序逐个执行，同一时刻最多运行一个 rsync。
/// 发送端全部释放后 worker 结束，并返回所有动作的结果。
pub fn spawn_worker(
    synchronizer: Arc<Synchronizer>,
) -> (mpsc::UnboundedSender<Action>, JoinHandle<Vec<ActionReport>>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Action>();

    let handle = tokio::spawn(async move {
        let mut reports = Vec::new();
        while let Some(action) = rx.recv().await {
            log::debug!("Worker picked up {}", action);
            reports.push(synchronizer.run(action).await);
        }
        log::debug!("Worker queue closed after {} action(s)", reports.len());
        reports
    });

    (tx, handle)
}
