use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForwarderError {
    #[error("Missing required configuration: {0}")]
    MissingConfiguration(&'static str),

    #[error("Broker connection error: {0}")]
    BrokerConnection(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Publish dispatch error: {0}")]
    PublishDispatch(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error {0}")]
    Io(io::ErrorKind),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<io::Error> for ForwarderError {
    fn from(err: io::Error) -> Self {
        ForwarderError::Io(err.kind())
    }
}

impl From<serde_yaml::Error> for ForwarderError {
    fn from(err: serde_yaml::Error) -> Self {
        ForwarderError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ForwarderError {
    fn from(err: serde_json::Error) -> Self {
        ForwarderError::Render(err.to_string())
    }
}

impl From<zmq::Error> for ForwarderError {
    fn from(err: zmq::Error) -> Self {
        ForwarderError::Network(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ForwarderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ForwarderError::MissingConfiguration("topic");
        assert_eq!(err.to_string(), "Missing required configuration: topic");

        let err = ForwarderError::Config("invalid queue size".to_string());
        assert_eq!(err.to_string(), "Configuration error: invalid queue size");
    }

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: ForwarderError = io_err.into();
        match err {
            ForwarderError::Io(kind) => assert_eq!(kind, io::ErrorKind::NotFound),
            _ => panic!("Expected Io error variant"),
        }

        let err: ForwarderError = zmq::Error::EINVAL.into();
        assert!(matches!(err, ForwarderError::Network(_)));
    }
}
