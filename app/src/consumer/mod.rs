use crate::sync::SyncMessage;
use tokio::sync::broadcast;
use utils::error::Result;

mod channel;
pub mod config;
mod console;
mod logging;
mod manager;

pub use channel::ChannelConsumer;
pub use console::ConsoleConsumer;
pub use logging::LogConsumer;
pub use manager::ConsumerManager;

/// 消费者 trait - 订阅同步消息并负责展示
#[async_trait::async_trait]
pub trait Consumer: Send + Sync {
    /// 启动消费者，收到 `SyncMessage::Complete` 后任务结束
    async fn start(
        &mut self, receiver: broadcast::Receiver<SyncMessage>,
    ) -> Result<tokio::task::JoinHandle<Result<()>>>;

    fn name(&self) -> &'static str;
}
