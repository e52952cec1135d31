use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use utils::error::Result;

use crate::consumer::config::ConsumerConfig;
use crate::consumer::{ConsoleConsumer, Consumer, LogConsumer};
use crate::sync::SyncMessage;

/// 消费者管理器 - 管理多个消费者
pub struct ConsumerManager {
    /// 广播发送器
    broadcaster: broadcast::Sender<SyncMessage>,
    /// 消费者列表
    consumers: Vec<Box<dyn Consumer>>,
}

impl Default for ConsumerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsumerManager {
    pub fn new() -> Self {
        Self::with_config(&ConsumerConfig::default())
    }

    /// 根据配置创建消费者管理器
    pub fn with_config(config: &ConsumerConfig) -> Self {
        // broadcast::channel 要求容量大于 0
        let (broadcaster, _) = broadcast::channel(config.channel_capacity.max(1));
        let mut manager = Self {
            broadcaster,
            consumers: Vec::new(),
        };

        if config.enable_log_consumer {
            manager.add_consumer(Box::new(LogConsumer));
        }
        if config.enable_console_consumer {
            manager.add_consumer(Box::new(ConsoleConsumer::new(config.show_timestamps)));
        }

        manager
    }

    pub fn add_consumer(&mut self, consumer: Box<dyn Consumer>) {
        self.consumers.push(consumer);
    }

    /// 启动所有消费者；必须在广播第一条消息之前调用
    pub async fn start_consumers(&mut self) -> Result<Vec<JoinHandle<Result<()>>>> {
        let mut handles = Vec::new();

        for consumer in &mut self.consumers {
            let receiver = self.broadcaster.subscribe();
            let consumer_handle = consumer.start(receiver).await?;
            log::debug!("Started consumer {}", consumer.name());
            handles.push(consumer_handle);
        }

        Ok(handles)
    }

    pub fn get_broadcaster(&self) -> broadcast::Sender<SyncMessage> {
        self.broadcaster.clone()
    }

    pub fn get_consumer_count(&self) -> usize {
        self.consumers.len()
    }

    pub fn broadcast(&self, message: SyncMessage) -> Result<()> {
        self.broadcaster.send(message).map_err(|e| {
            utils::error::Error::with_source("Failed to broadcast message", Box::new(e))
        })?;
        Ok(())
    }

    /// 通知所有消费者结束，并等待它们处理完剩余消息
    pub async fn shutdown(&self, handles: Vec<JoinHandle<Result<()>>>) -> Result<()> {
        // 没有消费者监听时发送会失败，忽略
        let _ = self.broadcaster.send(SyncMessage::Complete);

        for handle in handles {
            handle
                .await
                .map_err(|e| utils::error::Error::with_source("Consumer task failed", Box::new(e)))??;
        }
        Ok(())
    }
}
