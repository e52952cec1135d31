use crate::consumer::Consumer;
use crate::sync::SyncMessage;
use tokio::sync::broadcast;
use utils::error::Result;

/// 日志消费者 - 将同步状态记录到日志，rsync 输出只在 debug 级别记录
pub struct LogConsumer;

#[async_trait::async_trait]
impl Consumer for LogConsumer {
    async fn start(
        &mut self, mut receiver: broadcast::Receiver<SyncMessage>,
    ) -> Result<tokio::task::JoinHandle<Result<()>>> {
        let handle = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(SyncMessage::Complete) => {
                        log::debug!("[LogConsumer] Complete");
                        break;
                    }
                    Ok(SyncMessage::Output { operation, line }) => {
                        log::debug!("[LogConsumer] {} {:?}: {}", operation, line.stream, line.text);
                    }
                    Ok(message @ SyncMessage::Error { .. }) => {
                        if let Some(text) = message.status_line() {
                            log::error!("[LogConsumer] {}", text);
                        }
                    }
                    Ok(message) => {
                        if let Some(text) = message.status_line() {
                            log::info!("[LogConsumer] {}", text);
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        log::warn!("[LogConsumer] Channel closed");
                        break;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("[LogConsumer] Channel lagged, skipped {} messages", skipped);
                        continue;
                    }
                }
            }
            Ok(())
        });

        Ok(handle)
    }

    fn name(&self) -> &'static str {
        "log_consumer"
    }
}
