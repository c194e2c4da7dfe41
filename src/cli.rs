use clap::Parser;
use log::LevelFilter;
use serde::Deserialize;
use std::fs;

use crate::error::{ForwarderError, Result};
use crate::forwarder::ForwarderConfig;
use crate::layout::LayoutConfig;

#[derive(Parser, Debug, Default)]
#[command(author, version, about)]
pub struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<String>,

    /// 消息代理地址, 逗号分隔
    #[arg(short, long)]
    pub brokers: Option<String>,

    /// 发布主题
    #[arg(short, long)]
    pub topic: Option<String>,

    /// 消息值序列化方式(string/json)
    #[arg(short, long)]
    pub serializer: Option<String>,

    /// 附加连接属性, 格式 key|value, 可重复
    #[arg(short = 'P', long = "property")]
    pub properties: Vec<String>,

    /// 控制台日志级别
    #[arg(short, long)]
    pub log_level: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub forwarder: ForwarderConfig,

    #[serde(default)]
    pub layout: LayoutConfig,

    /// 控制台日志级别
    #[serde(default = "default_level")]
    pub log_level: String,

    /// 转发到消息代理的最低级别
    #[serde(default = "default_level")]
    pub forward_level: String,

    /// 标准输入的每一行以该级别记录
    #[serde(default = "default_level")]
    pub line_level: String,

    /// 标准输入日志的 target
    #[serde(default = "default_target")]
    pub target: String,
}

// 默认日志级别
fn default_level() -> String {
    "info".to_string()
}

fn default_target() -> String {
    "stdin".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            forwarder: ForwarderConfig::default(),
            layout: LayoutConfig::default(),
            log_level: default_level(),
            forward_level: default_level(),
            line_level: default_level(),
            target: default_target(),
        }
    }
}

impl Config {
    /// 从 YAML 文件加载配置
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents)?;
        Ok(config)
    }

    /// 加载配置文件(如果有)并应用命令行参数
    pub fn load(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_args(args);
        Ok(config)
    }

    /// 命令行参数优先于配置文件
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(brokers) = &args.brokers {
            self.forwarder.broker_addresses = Some(brokers.clone());
        }
        if let Some(topic) = &args.topic {
            self.forwarder.topic = Some(topic.clone());
        }
        if let Some(serializer) = &args.serializer {
            self.forwarder.value_serializer = Some(serializer.clone());
        }
        self.forwarder
            .custom_properties
            .extend(args.properties.iter().cloned());
        if let Some(level) = &args.log_level {
            self.log_level = level.clone();
        }
    }

    /// 控制台日志级别, 非法值直接报错
    pub fn console_level(&self) -> Result<LevelFilter> {
        parse_level(&self.log_level)
    }
}

pub fn parse_level(level: &str) -> Result<LevelFilter> {
    level
        .parse()
        .map_err(|_| ForwarderError::Config(format!("Invalid log level: {}", level)))
}
