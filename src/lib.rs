//! 日志事件转发器
//!
//! 把 `log` 门面产生的日志记录渲染后发布到消息代理的主题上。

pub mod cli;
pub mod error;
pub mod forwarder;
pub mod layout;
pub mod monitor;

pub use error::{ForwarderError, Result};
pub use forwarder::{Forwarder, ForwarderConfig, ForwarderState};
pub use layout::{JsonLayout, Layout, LogEvent, PatternLayout};
