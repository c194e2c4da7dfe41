use bytes::Bytes;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;

use super::properties::ConnectionProperties;
use crate::error::{ForwarderError, Result};

/// 单条发布请求
#[derive(Debug, Clone, PartialEq)]
pub struct PublishRequest {
    pub topic: String,
    pub payload: Bytes,
}

impl PublishRequest {
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// 投递结果, 由发布者在消息真正写出后完成
#[derive(Debug)]
pub struct DeliveryFuture {
    rx: oneshot::Receiver<Result<()>>,
}

impl DeliveryFuture {
    pub fn new(rx: oneshot::Receiver<Result<()>>) -> Self {
        Self { rx }
    }

    /// 已完成的投递结果
    pub fn ready(result: Result<()>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self { rx }
    }
}

impl Future for DeliveryFuture {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                Err(ForwarderError::Delivery(
                    "publisher dropped before delivery completed".to_string(),
                ))
            })
        })
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait Publisher: Send + Sync {
    /// 发布消息, 不等待投递完成
    fn publish(&self, request: PublishRequest) -> Result<DeliveryFuture>;

    /// 等待已提交的消息投递完成
    fn flush(&self, timeout: Duration) -> Result<()>;
}

/// 发布者工厂
pub trait PublisherFactory: Send + Sync {
    fn create(&self, properties: &ConnectionProperties) -> Result<Box<dyn Publisher>>;
}

impl<F> PublisherFactory for F
where
    F: Fn(&ConnectionProperties) -> Result<Box<dyn Publisher>> + Send + Sync,
{
    fn create(&self, properties: &ConnectionProperties) -> Result<Box<dyn Publisher>> {
        self(properties)
    }
}
