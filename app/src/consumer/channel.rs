use crate::consumer::Consumer;
use crate::sync::SyncMessage;
use tokio::sync::{broadcast, mpsc};
use utils::error::{Error, Result};

/// 通道消费者 - 把状态行转交给其他线程（例如界面线程）渲染
///
/// 只能启动一次：发送端在启动时移交给后台任务，任务结束后接收端随之关闭。
pub struct ChannelConsumer {
    sender: Option<mpsc::UnboundedSender<String>>,
}

impl ChannelConsumer {
    pub fn new(sender: mpsc::UnboundedSender<String>) -> Self {
        Self {
            sender: Some(sender),
        }
    }
}

#[async_trait::async_trait]
impl Consumer for ChannelConsumer {
    async fn start(
        &mut self, mut receiver: broadcast::Receiver<SyncMessage>,
    ) -> Result<tokio::task::JoinHandle<Result<()>>> {
        let sender = self
            .sender
            .take()
            .ok_or_else(|| Error::new("ChannelConsumer already started"))?;

        let handle = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(SyncMessage::Complete) => break,
                    Ok(message) => {
                        let Some(text) = message.status_line() else {
                            continue;
                        };
                        if sender.send(text).is_err() {
                            log::debug!("[ChannelConsumer] Receiver dropped");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("[ChannelConsumer] Channel lagged, skipped {} messages", skipped);
                        continue;
                    }
                }
            }
            Ok(())
        });

        Ok(handle)
    }

    fn name(&self) -> &'static str {
        "channel_consumer"
    }
}
