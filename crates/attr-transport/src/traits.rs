use crate::{AttributeWrite, Cluster, DeviceId, EndpointInfo, Result};
use async_trait::async_trait;

/// A minimal async attribute transport: the send/describe primitives a host provides.
#[async_trait]
pub trait AttributeTransport: Send + Sync {
    /// Describe one endpoint of a device, or `None` if the device has no such endpoint.
    fn endpoint(&self, device: &DeviceId, endpoint: u8) -> Result<Option<EndpointInfo>>;

    /// Write attributes on a cluster of one endpoint. A single attempt; no retries.
    async fn write_attributes(
        &self,
        device: &DeviceId,
        endpoint: u8,
        cluster: Cluster,
        attributes: &[AttributeWrite],
    ) -> Result<()>;
}
