use attr_transport::{Cluster, DeviceId, TransportError};
use thiserror::Error;

pub type Result<T, E = AdapterError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// A `poll_interval` value that is non-numeric or below the minimum.
    #[error("{0}")]
    Validation(String),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("expected endpoint {endpoint} of device {device} to be configured as UART ({cluster} cluster)")]
    MissingCapability {
        device: DeviceId,
        endpoint: u8,
        cluster: Cluster,
    },
    #[error("unsupported key: {0}")]
    UnsupportedKey(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Carries the message from `AdapterMetrics::new`, which already names the failure.
    #[error("{0}")]
    Metrics(String),
    #[error("no Tokio runtime to run the poll loop: {0}")]
    Runtime(String),
}
