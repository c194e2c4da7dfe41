use serde::Serialize;

use super::{event::LogEvent, Layout};
use crate::error::Result;

/// JSON 布局, 每个事件输出一个 JSON 对象
#[derive(Debug, Clone, Default)]
pub struct JsonLayout {
    append_line_separator: bool,
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    timestamp: u64,
    level: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread: Option<&'a str>,
    logger: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    module: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
}

impl JsonLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line_separator(mut self, enabled: bool) -> Self {
        self.append_line_separator = enabled;
        self
    }
}

impl Layout for JsonLayout {
    fn render(&self, event: &LogEvent) -> Result<String> {
        let record = JsonRecord {
            timestamp: event.timestamp_millis(),
            level: event.level.as_str(),
            thread: event.thread.as_deref(),
            logger: &event.target,
            message: &event.message,
            module: event.module_path.as_deref(),
            file: event.file.as_deref(),
            line: event.line,
        };

        let mut rendered = serde_json::to_string(&record)?;
        if self.append_line_separator {
            rendered.push('\n');
        }
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;
    use std::time::{Duration, UNIX_EPOCH};

    fn sample_event() -> LogEvent {
        let mut event = LogEvent::new(Level::Error, "app::http", "request \"failed\"");
        event.thread = Some("worker-1".to_string());
        event.line = Some(7);
        event.timestamp = UNIX_EPOCH + Duration::from_millis(1000);
        event
    }

    #[test]
    fn test_json_layout_fields() {
        let rendered = JsonLayout::new().render(&sample_event()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value["timestamp"], 1000);
        assert_eq!(value["level"], "ERROR");
        assert_eq!(value["thread"], "worker-1");
        assert_eq!(value["logger"], "app::http");
        assert_eq!(value["message"], "request \"failed\"");
        assert_eq!(value["line"], 7);
        assert!(value.get("file").is_none());
        assert!(!rendered.ends_with('\n'));
    }

    #[test]
    fn test_json_layout_line_separator() {
        let layout = JsonLayout::new().with_line_separator(true);
        let rendered = layout.render(&sample_event()).unwrap();
        assert!(rendered.ends_with("}\n"));
    }
}
