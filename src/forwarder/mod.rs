//! 日志事件转发模块
//!
//! 该模块把日志事件渲染后发布到消息代理的指定主题。

pub mod base;
pub mod config;
pub mod properties;
pub mod state;
pub mod zmq;

pub use base::{DeliveryFuture, PublishRequest, Publisher, PublisherFactory};
pub use config::ForwarderConfig;
pub use properties::{parse_properties, ConnectionProperties};
pub use state::ForwarderState;
pub use self::zmq::{ZmqPublisher, ZmqPublisherFactory};

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn, LevelFilter, Log, Metadata, Record};

use crate::error::{ForwarderError, Result};
use crate::layout::{Layout, LogEvent};
use crate::monitor::ForwarderStats;
use properties::{BOOTSTRAP_SERVERS, VALUE_SERIALIZER};

pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// 转发器自身诊断日志的目标前缀, 这些记录不会被转发
const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

/// 日志转发器
pub struct Forwarder {
    config: ForwarderConfig,
    layout: Option<Arc<dyn Layout>>,
    publisher_factory: Box<dyn PublisherFactory>,
    publisher: Option<Box<dyn Publisher>>,
    topic: String,
    properties: Option<ConnectionProperties>,
    state: ForwarderState,
    level: LevelFilter,
    stats: Arc<ForwarderStats>,
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ForwarderError::MissingConfiguration(name))
}

impl Forwarder {
    pub fn new(config: ForwarderConfig) -> Self {
        Self {
            config,
            layout: None,
            publisher_factory: Box::new(ZmqPublisherFactory),
            publisher: None,
            topic: String::new(),
            properties: None,
            state: ForwarderState::Created,
            level: LevelFilter::Info,
            stats: Arc::new(ForwarderStats::new()),
        }
    }

    pub fn with_layout(mut self, layout: Arc<dyn Layout>) -> Self {
        self.layout = Some(layout);
        self
    }

    /// 替换默认的 ZMQ 发布者工厂
    pub fn with_publisher_factory(mut self, factory: impl PublisherFactory + 'static) -> Self {
        self.publisher_factory = Box::new(factory);
        self
    }

    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    pub fn state(&self) -> ForwarderState {
        self.state
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    pub fn stats(&self) -> Arc<ForwarderStats> {
        self.stats.clone()
    }

    /// 启动后生效的连接属性
    pub fn connection_properties(&self) -> Option<&ConnectionProperties> {
        self.properties.as_ref()
    }

    /// 校验配置并创建发布者
    ///
    /// 缺少必填配置时返回 `MissingConfiguration`。发布者创建失败不会返回错误,
    /// 转发器进入 `StartFailed` 状态并丢弃之后的事件。
    pub fn start(&mut self) -> Result<()> {
        if self.state != ForwarderState::Created {
            debug!("Forwarder already {}, ignoring start", self.state);
            return Ok(());
        }

        let brokers = required(&self.config.broker_addresses, "broker_addresses")?.to_string();
        let topic = required(&self.config.topic, "topic")?.to_string();
        let serializer = required(&self.config.value_serializer, "value_serializer")?.to_string();
        if self.layout.is_none() {
            return Err(ForwarderError::MissingConfiguration("layout"));
        }

        let mut properties = ConnectionProperties::new();
        properties.set(BOOTSTRAP_SERVERS, brokers);
        properties.set(VALUE_SERIALIZER, serializer);
        parse_properties(&self.config.custom_properties, &mut properties);

        let factory = &self.publisher_factory;
        let created = panic::catch_unwind(AssertUnwindSafe(|| factory.create(&properties)))
            .unwrap_or_else(|_| {
                Err(ForwarderError::BrokerConnection("publisher factory panicked".to_string()))
            });

        match created {
            Ok(publisher) => {
                info!("Forwarder started, publishing to topic '{}'", topic);
                self.publisher = Some(publisher);
                self.state = ForwarderState::Started;
            }
            Err(e) => {
                warn!("Forwarder failed to create publisher, events will be dropped: {}", e);
                self.state = ForwarderState::StartFailed;
            }
        }

        self.topic = topic;
        self.properties = Some(properties);
        Ok(())
    }

    /// 转发单个事件, 任何失败都只会丢弃该事件
    pub fn append(&self, event: &LogEvent) {
        let (Some(publisher), Some(layout)) = (self.publisher.as_deref(), self.layout.as_deref())
        else {
            self.stats.record_inactive();
            return;
        };

        let rendered = panic::catch_unwind(AssertUnwindSafe(|| layout.render(event)));
        let payload = match rendered {
            Ok(Ok(payload)) => payload,
            Ok(Err(e)) => {
                debug!("Dropping event, layout failed: {}", e);
                self.stats.record_render_failure();
                return;
            }
            Err(_) => {
                debug!("Dropping event, layout panicked");
                self.stats.record_render_failure();
                return;
            }
        };

        let bytes = payload.len();
        let request = PublishRequest::new(self.topic.as_str(), payload);
        let dispatched = panic::catch_unwind(AssertUnwindSafe(|| publisher.publish(request)));
        match dispatched {
            // 投递结果不在此等待
            Ok(Ok(_delivery)) => self.stats.record_published(bytes),
            Ok(Err(e)) => {
                debug!("Dropping event, publish failed: {}", e);
                self.stats.record_dispatch_failure();
            }
            Err(_) => {
                debug!("Dropping event, publisher panicked");
                self.stats.record_dispatch_failure();
            }
        }
    }

    /// 等待已发布的事件投递完成
    pub fn flush_timeout(&self, timeout: Duration) -> Result<()> {
        match self.publisher.as_deref() {
            Some(publisher) => publisher.flush(timeout),
            None => Ok(()),
        }
    }

    /// 释放发布者, 之后的事件都会被丢弃
    pub fn stop(&mut self) {
        if let Some(publisher) = self.publisher.take() {
            drop(publisher);
            info!("Forwarder stopped");
        }
        self.state = ForwarderState::Stopped;
    }
}

impl Log for Forwarder {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && !metadata.target().starts_with(OWN_TARGET)
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.append(&LogEvent::from(record));
        }
    }

    fn flush(&self) {
        if let Err(e) = self.flush_timeout(DEFAULT_FLUSH_TIMEOUT) {
            debug!("Forwarder flush incomplete: {}", e);
        }
    }
}
