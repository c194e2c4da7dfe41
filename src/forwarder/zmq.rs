use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bytes::Bytes;
use log::{debug, error, info};
use parking_lot::{Condvar, Mutex};
use tokio::sync::{mpsc, oneshot};

use super::base::{DeliveryFuture, PublishRequest, Publisher, PublisherFactory};
use super::properties::{ConnectionProperties, BOOTSTRAP_SERVERS, VALUE_SERIALIZER};
use crate::error::{ForwarderError, Result};

pub const SEND_HWM: &str = "sndhwm";
pub const SEND_TIMEOUT: &str = "sndtimeo";
pub const LINGER: &str = "linger";
pub const RECONNECT_INTERVAL: &str = "reconnect.ivl";
pub const QUEUE_CAPACITY: &str = "queue.buffering.max.messages";

const KNOWN_PROPERTIES: &[&str] = &[
    BOOTSTRAP_SERVERS,
    VALUE_SERIALIZER,
    SEND_HWM,
    SEND_TIMEOUT,
    LINGER,
    RECONNECT_INTERVAL,
    QUEUE_CAPACITY,
];

const DEFAULT_QUEUE_CAPACITY: usize = 10_000;
const DEFAULT_LINGER_MS: i32 = 1000;

/// 消息值序列化方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSerializer {
    /// 原样发送 UTF-8 文本
    String,
    /// 作为 JSON 字符串发送
    Json,
}

impl ValueSerializer {
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "string" | "utf8" => Ok(ValueSerializer::String),
            "json" => Ok(ValueSerializer::Json),
            other => Err(ForwarderError::Config(format!("Unsupported value serializer: {}", other))),
        }
    }

    pub fn encode(&self, payload: &Bytes) -> Result<Vec<u8>> {
        match self {
            ValueSerializer::String => Ok(payload.to_vec()),
            ValueSerializer::Json => Ok(serde_json::to_vec(&String::from_utf8_lossy(payload))?),
        }
    }
}

/// 把 `host:port` 转换为 ZMQ 端点
fn endpoints(servers: &str) -> Vec<String> {
    servers
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            if s.contains("://") {
                s.to_string()
            } else {
                format!("tcp://{}", s)
            }
        })
        .collect()
}

/// 未完成投递计数
#[derive(Default)]
struct InFlight {
    count: Mutex<usize>,
    idle: Condvar,
}

impl InFlight {
    fn begin(&self) {
        *self.count.lock() += 1;
    }

    fn complete(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut count = self.count.lock();
        while *count > 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.idle.wait_for(&mut count, deadline - now);
        }
        true
    }
}

struct Envelope {
    request: PublishRequest,
    reply: oneshot::Sender<Result<()>>,
}

/// ZMQ PUB 发布者
///
/// socket 由独立的发送线程持有, `publish` 只把请求放入有界队列。
pub struct ZmqPublisher {
    sender: Option<mpsc::Sender<Envelope>>,
    worker: Option<JoinHandle<()>>,
    in_flight: Arc<InFlight>,
}

impl ZmqPublisher {
    pub fn from_properties(properties: &ConnectionProperties) -> Result<Self> {
        let servers = properties.get(BOOTSTRAP_SERVERS).ok_or_else(|| {
            ForwarderError::BrokerConnection(format!("'{}' not set", BOOTSTRAP_SERVERS))
        })?;
        let targets = endpoints(servers);
        if targets.is_empty() {
            return Err(ForwarderError::BrokerConnection(format!(
                "No broker endpoints in '{}'",
                servers
            )));
        }

        let serializer_name = properties.get(VALUE_SERIALIZER).ok_or_else(|| {
            ForwarderError::BrokerConnection(format!("'{}' not set", VALUE_SERIALIZER))
        })?;
        let serializer = ValueSerializer::from_name(serializer_name)?;

        let capacity = properties
            .get_parsed::<usize>(QUEUE_CAPACITY)?
            .unwrap_or(DEFAULT_QUEUE_CAPACITY);
        if capacity == 0 {
            return Err(ForwarderError::Config(format!("'{}' must be positive", QUEUE_CAPACITY)));
        }

        for (key, _) in properties.iter() {
            if !KNOWN_PROPERTIES.contains(&key) {
                debug!("Ignoring unsupported broker property '{}'", key);
            }
        }

        let context = zmq::Context::new();
        let socket = context.socket(zmq::PUB)?;
        socket.set_linger(properties.get_parsed(LINGER)?.unwrap_or(DEFAULT_LINGER_MS))?;
        if let Some(hwm) = properties.get_parsed::<i32>(SEND_HWM)? {
            socket.set_sndhwm(hwm)?;
        }
        if let Some(timeout) = properties.get_parsed::<i32>(SEND_TIMEOUT)? {
            socket.set_sndtimeo(timeout)?;
        }
        if let Some(interval) = properties.get_parsed::<i32>(RECONNECT_INTERVAL)? {
            socket.set_reconnect_ivl(interval)?;
        }

        // 连接是惰性的, 对端不在线时不会失败
        for endpoint in &targets {
            socket.connect(endpoint).map_err(|e| {
                ForwarderError::BrokerConnection(format!("Failed to connect {}: {}", endpoint, e))
            })?;
        }

        let (tx, rx) = mpsc::channel(capacity);
        let in_flight = Arc::new(InFlight::default());
        let worker_in_flight = in_flight.clone();
        let worker = thread::Builder::new()
            .name("logfwd-zmq".to_string())
            .spawn(move || {
                // context 需要与 socket 同生命周期
                let _context = context;
                send_loop(socket, serializer, rx, worker_in_flight);
            })?;

        info!("ZMQ publisher connected to {}", targets.join(", "));

        Ok(Self {
            sender: Some(tx),
            worker: Some(worker),
            in_flight,
        })
    }
}

fn send_loop(
    socket: zmq::Socket,
    serializer: ValueSerializer,
    mut rx: mpsc::Receiver<Envelope>,
    in_flight: Arc<InFlight>,
) {
    while let Some(Envelope { request, reply }) = rx.blocking_recv() {
        let result = serializer.encode(&request.payload).and_then(|value| {
            socket
                .send_multipart([request.topic.as_bytes(), value.as_slice()], 0)
                .map_err(|e| ForwarderError::Delivery(format!("Failed to send message: {}", e)))
        });
        if let Err(e) = &result {
            error!("{}", e);
        }
        let _ = reply.send(result);
        in_flight.complete();
    }
}

impl Publisher for ZmqPublisher {
    fn publish(&self, request: PublishRequest) -> Result<DeliveryFuture> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| ForwarderError::PublishDispatch("publisher is closed".to_string()))?;

        let (reply, rx) = oneshot::channel();
        self.in_flight.begin();
        match sender.try_send(Envelope { request, reply }) {
            Ok(()) => Ok(DeliveryFuture::new(rx)),
            Err(e) => {
                self.in_flight.complete();
                let reason = match e {
                    mpsc::error::TrySendError::Full(_) => "send queue is full",
                    mpsc::error::TrySendError::Closed(_) => "send worker has stopped",
                };
                Err(ForwarderError::PublishDispatch(reason.to_string()))
            }
        }
    }

    fn flush(&self, timeout: Duration) -> Result<()> {
        if self.in_flight.wait_idle(timeout) {
            Ok(())
        } else {
            Err(ForwarderError::Delivery(format!(
                "{} messages still in flight after {:?}",
                *self.in_flight.count.lock(),
                timeout
            )))
        }
    }
}

impl Drop for ZmqPublisher {
    fn drop(&mut self) {
        // 关闭队列后发送线程会处理完剩余消息再退出
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("ZMQ send worker panicked");
            }
        }
    }
}

/// 默认发布者工厂
#[derive(Debug, Default, Clone, Copy)]
pub struct ZmqPublisherFactory;

impl PublisherFactory for ZmqPublisherFactory {
    fn create(&self, properties: &ConnectionProperties) -> Result<Box<dyn Publisher>> {
        Ok(Box::new(ZmqPublisher::from_properties(properties)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties(servers: &str, serializer: &str) -> ConnectionProperties {
        let mut properties = ConnectionProperties::new();
        properties.set(BOOTSTRAP_SERVERS, servers);
        properties.set(VALUE_SERIALIZER, serializer);
        properties.set(LINGER, "0");
        properties
    }

    #[test]
    fn test_endpoints() {
        assert_eq!(
            endpoints("10.0.0.1:5556, ipc:///tmp/logs ,"),
            vec!["tcp://10.0.0.1:5556".to_string(), "ipc:///tmp/logs".to_string()]
        );
    }

    #[test]
    fn test_value_serializer() {
        let payload = Bytes::from_static(b"say \"hi\"");
        assert_eq!(ValueSerializer::from_name("String").unwrap(), ValueSerializer::String);
        assert_eq!(ValueSerializer::String.encode(&payload).unwrap(), b"say \"hi\"".to_vec());
        assert_eq!(
            ValueSerializer::Json.encode(&payload).unwrap(),
            br#""say \"hi\"""#.to_vec()
        );
        assert!(ValueSerializer::from_name("avro").is_err());
    }

    #[test]
    fn test_rejects_unknown_serializer() {
        let result = ZmqPublisherFactory.create(&properties("127.0.0.1:5591", "avro"));
        assert!(matches!(result, Err(ForwarderError::Config(_))));
    }

    #[test]
    fn test_rejects_missing_servers() {
        let mut props = ConnectionProperties::new();
        props.set(VALUE_SERIALIZER, "string");
        let result = ZmqPublisherFactory.create(&props);
        assert!(matches!(result, Err(ForwarderError::BrokerConnection(_))));
    }

    #[test]
    fn test_rejects_invalid_option_value() {
        let mut props = properties("127.0.0.1:5592", "string");
        props.set(SEND_HWM, "lots");
        assert!(ZmqPublisherFactory.create(&props).is_err());
    }

    #[test]
    fn test_publish_without_subscriber() {
        let publisher = ZmqPublisherFactory
            .create(&properties("127.0.0.1:5593", "string"))
            .unwrap();

        let delivery = publisher
            .publish(PublishRequest::new("logs", "hello"))
            .unwrap();
        assert!(tokio_test::block_on(delivery).is_ok());
        assert!(publisher.flush(Duration::from_secs(5)).is_ok());
    }
}
