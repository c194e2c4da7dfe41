use std::collections::HashMap;
use std::str::FromStr;

use log::warn;

use crate::error::{ForwarderError, Result};

pub const BOOTSTRAP_SERVERS: &str = "bootstrap.servers";
pub const VALUE_SERIALIZER: &str = "value.serializer";

/// 自定义属性的键值分隔符
pub const PROPERTY_SEPARATOR: char = '|';

/// 消息代理连接属性
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionProperties {
    entries: HashMap<String, String>,
}

impl ConnectionProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// 读取并解析属性值, 不存在时返回 `None`
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
                ForwarderError::Config(format!("Invalid value '{}' for property '{}'", raw, key))
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 解析 `key|value` 形式的自定义属性
///
/// 不符合格式的条目会被丢弃, 只记录一条警告。
pub fn parse_properties<S: AsRef<str>>(raw_entries: &[S], properties: &mut ConnectionProperties) {
    for entry in raw_entries {
        let entry = entry.as_ref();
        let parts: Vec<&str> = entry.split(PROPERTY_SEPARATOR).collect();
        match parts.as_slice() {
            [key, value] if !key.is_empty() && !value.is_empty() => {
                properties.set(*key, *value);
            }
            _ => {
                warn!("Ignoring malformed property '{}', expected key{}value", entry, PROPERTY_SEPARATOR);
            }
        }
    }
}
