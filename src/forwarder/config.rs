use serde::Deserialize;

/// 转发器配置
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ForwarderConfig {
    /// 消息代理地址, 逗号分隔
    pub broker_addresses: Option<String>,
    pub topic: Option<String>,
    /// 消息值序列化方式的名称
    pub value_serializer: Option<String>,
    /// `key|value` 形式的附加连接属性
    #[serde(default)]
    pub custom_properties: Vec<String>,
}

impl ForwarderConfig {
    pub fn new(
        broker_addresses: impl Into<String>,
        topic: impl Into<String>,
        value_serializer: impl Into<String>,
    ) -> Self {
        Self {
            broker_addresses: Some(broker_addresses.into()),
            topic: Some(topic.into()),
            value_serializer: Some(value_serializer.into()),
            custom_properties: Vec::new(),
        }
    }
}
