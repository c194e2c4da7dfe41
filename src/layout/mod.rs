//! 日志布局模块
//!
//! 该模块负责把日志事件渲染为发送到消息代理的文本。

pub mod event;
pub mod json;
pub mod pattern;

pub use event::LogEvent;
pub use json::JsonLayout;
pub use pattern::PatternLayout;

use crate::error::Result;
use serde::Deserialize;
use std::sync::Arc;

#[cfg_attr(test, mockall::automock)]
pub trait Layout: Send + Sync {
    /// 将日志事件渲染为字符串
    fn render(&self, event: &LogEvent) -> Result<String>;
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    #[default]
    Json,
    Pattern,
}

/// 布局配置
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LayoutConfig {
    #[serde(default)]
    pub kind: LayoutKind,
    pub pattern: Option<String>,
    #[serde(default)]
    pub line_separator: bool,
}

impl LayoutConfig {
    /// 根据配置构建布局
    pub fn build(&self) -> Result<Arc<dyn Layout>> {
        let layout: Arc<dyn Layout> = match self.kind {
            LayoutKind::Json => Arc::new(JsonLayout::new().with_line_separator(self.line_separator)),
            LayoutKind::Pattern => {
                let pattern = self.pattern.as_deref().unwrap_or(PatternLayout::DEFAULT_PATTERN);
                Arc::new(PatternLayout::new(pattern)?)
            }
        };
        Ok(layout)
    }
}
