use log::{Level, Record};
use std::time::{SystemTime, UNIX_EPOCH};

/// 日志事件 - `log::Record` 的自有快照
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub module_path: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub thread: Option<String>,
    pub timestamp: SystemTime,
}

impl LogEvent {
    pub fn new(level: Level, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            target: target.into(),
            message: message.into(),
            module_path: None,
            file: None,
            line: None,
            thread: std::thread::current().name().map(str::to_owned),
            timestamp: SystemTime::now(),
        }
    }

    /// 自 UNIX 纪元起的毫秒数
    pub fn timestamp_millis(&self) -> u64 {
        self.timestamp
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

impl Default for LogEvent {
    fn default() -> Self {
        Self::new(Level::Info, "", "")
    }
}

impl From<&Record<'_>> for LogEvent {
    fn from(record: &Record<'_>) -> Self {
        Self {
            level: record.level(),
            target: record.target().to_owned(),
            message: record.args().to_string(),
            module_path: record.module_path().map(str::to_owned),
            file: record.file().map(str::to_owned),
            line: record.line(),
            thread: std::thread::current().name().map(str::to_owned),
            timestamp: SystemTime::now(),
        }
    }
}
