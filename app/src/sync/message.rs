use super::runner::{ExitStatus, OutputLine};
use super::Operation;

/// 同步过程中广播给消费者的消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncMessage {
    /// sync 开始（随后依次是 download 与 upload 的消息）
    SyncStarted,
    Started(Operation),
    Output {
        operation: Operation,
        line: OutputLine,
    },
    Finished {
        operation: Operation,
        status: ExitStatus,
    },
    /// 子进程无法启动或输出读取失败
    Error {
        operation: Operation,
        message: String,
    },
    Complete,
}

impl SyncMessage {
    /// 展示给用户的一行文本；`Complete` 没有对应文本
    pub fn status_line(&self) -> Option<String> {
        match self {
            SyncMessage::SyncStarted => Some("Starting sync...".to_string()),
            SyncMessage::Started(operation) => {
                Some(format!("Starting {}...", operation.name().to_lowercase()))
            }
            SyncMessage::Output { line, .. } => Some(line.text.clone()),
            SyncMessage::Finished { operation, status } if status.success() => {
                Some(format!("{} completed successfully.", operation))
            }
            SyncMessage::Finished { operation, .. } => Some(format!("{} failed.", operation)),
            SyncMessage::Error { message, .. } => Some(format!("Error: {}", message)),
            SyncMessage::Complete => None,
        }
    }

    pub fn operation(&self) -> Option<Operation> {
        match self {
            SyncMessage::Started(operation) => Some(*operation),
            SyncMessage::Output { operation, .. }
            | SyncMessage::Finished { operation, .. }
            | SyncMessage::Error { operation, .. } => Some(*operation),
            SyncMessage::SyncStarted | SyncMessage::Complete => None,
        }
    }
}
