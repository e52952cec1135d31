use serde::{Deserialize, Serialize};

/// 消费者配置，对应配置文件中的 `[consumer]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// 是否启用控制台消费者
    pub enable_console_consumer: bool,
    /// 是否启用日志消费者
    pub enable_log_consumer: bool,
    /// 控制台输出是否带时间戳
    pub show_timestamps: bool,
    /// 消费者通道容量
    pub channel_capacity: usize,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            enable_console_consumer: true,
            enable_log_consumer: true,
            show_timestamps: false,
            channel_capacity: 1024,
        }
    }
}

impl ConsumerConfig {
    /// 只输出到控制台
    pub fn console_only() -> Self {
        Self {
            enable_log_consumer: false,
            ..Default::default()
        }
    }

    /// 不启用任何内置消费者，由调用方自行添加
    pub fn none() -> Self {
        Self {
            enable_console_consumer: false,
            enable_log_consumer: false,
            ..Default::default()
        }
    }
}
