use crate::consumer::Consumer;
use crate::sync::SyncMessage;
use tokio::sync::broadcast;
use utils::error::Result;

/// 控制台消费者 - 将状态行与 rsync 输出逐行打印到标准输出
pub struct ConsoleConsumer {
    show_timestamps: bool,
}

impl ConsoleConsumer {
    pub fn new(show_timestamps: bool) -> Self {
        Self { show_timestamps }
    }

    fn render(text: &str, show_timestamps: bool) -> String {
        if show_timestamps {
            let now = chrono::Local::now();
            format!("[{}] {}", now.format("%Y-%m-%d %H:%M:%S"), text)
        } else {
            text.to_string()
        }
    }
}

impl Default for ConsoleConsumer {
    fn default() -> Self {
        Self::new(false)
    }
}

#[async_trait::async_trait]
impl Consumer for ConsoleConsumer {
    async fn start(
        &mut self, mut receiver: broadcast::Receiver<SyncMessage>,
    ) -> Result<tokio::task::JoinHandle<Result<()>>> {
        let show_timestamps = self.show_timestamps;

        let handle = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(SyncMessage::Complete) => {
                        log::debug!("[ConsoleConsumer] Complete");
                        break;
                    }
                    Ok(message) => {
                        if let Some(text) = message.status_line() {
                            println!("{}", ConsoleConsumer::render(&text, show_timestamps));
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        log::warn!("[ConsoleConsumer] Channel closed");
                        break;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("[ConsoleConsumer] Channel lagged, skipped {} messages", skipped);
                        continue;
                    }
                }
            }
            Ok(())
        });

        Ok(handle)
    }

    fn name(&self) -> &'static str {
        "console_consumer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_without_timestamp_is_verbatim() {
        assert_eq!(ConsoleConsumer::render("Starting sync...", false), "Starting sync...");
    }

    #[test]
    fn render_with_timestamp_keeps_text() {
        let rendered = ConsoleConsumer::render("Upload failed.", true);
        assert!(rendered.starts_with('['));
        assert!(rendered.ends_with("] Upload failed."));
    }
}
