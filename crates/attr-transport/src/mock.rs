use crate::{
    AttributeTransport, AttributeWrite, Cluster, DeviceId, EndpointInfo, Result, Timestamp,
    TransportError, WriteRecord,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use time::OffsetDateTime;

/// A simple in-process mock transport. Writes are accepted and recorded so flows are testable.
#[derive(Default)]
pub struct MockTransport {
    devices: Mutex<HashMap<DeviceId, Vec<EndpointInfo>>>,
    writes: Mutex<Vec<WriteRecord>>,
    unreachable: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_device(&self, device: DeviceId, endpoints: Vec<EndpointInfo>) {
        if let Ok(mut devices) = self.devices.lock() {
            devices.insert(device, endpoints);
        }
    }

    /// Make every subsequent write fail as if the device had dropped off the bus.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Snapshot of all writes accepted so far, oldest first.
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }

    pub fn writes_for(&self, device: &DeviceId) -> Vec<WriteRecord> {
        self.writes()
            .into_iter()
            .filter(|w| &w.device == device)
            .collect()
    }
}

#[async_trait]
impl AttributeTransport for MockTransport {
    fn endpoint(&self, device: &DeviceId, endpoint: u8) -> Result<Option<EndpointInfo>> {
        let devices = self
            .devices
            .lock()
            .map_err(|_| TransportError::Io("mock device table poisoned".into()))?;
        let endpoints = devices
            .get(device)
            .ok_or_else(|| TransportError::DeviceNotFound(device.to_string()))?;
        Ok(endpoints.iter().find(|e| e.id == endpoint).cloned())
    }

    async fn write_attributes(
        &self,
        device: &DeviceId,
        endpoint: u8,
        cluster: Cluster,
        attributes: &[AttributeWrite],
    ) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(TransportError::Unreachable(device.to_string()));
        }
        if self.endpoint(device, endpoint)?.is_none() {
            return Err(TransportError::Unsupported("endpoint not present on mock device"));
        }
        let record = WriteRecord {
            device: device.clone(),
            endpoint,
            cluster,
            attributes: attributes.to_vec(),
            timestamp: Some(Timestamp(OffsetDateTime::now_utc())),
        };
        tracing::trace!(%device, endpoint, %cluster, "mock write accepted");
        self.writes
            .lock()
            .map_err(|_| TransportError::Io("mock write log poisoned".into()))?
            .push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uart_device() -> (MockTransport, DeviceId) {
        let bus = MockTransport::new();
        let dev = DeviceId::new("0x00124b0000000001");
        bus.add_device(
            dev.clone(),
            vec![EndpointInfo::new(4).with_input(Cluster::GenMultistateValue)],
        );
        (bus, dev)
    }

    #[tokio::test]
    async fn records_accepted_writes() -> anyhow::Result<()> {
        let (bus, dev) = uart_device();
        bus.write_attributes(
            &dev,
            4,
            Cluster::GenMultistateValue,
            &[AttributeWrite::char_str(14, "U")],
        )
        .await?;
        let writes = bus.writes_for(&dev);
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].attributes[0].value.as_bytes(), b"U");
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_device_rejects_writes() {
        let (bus, dev) = uart_device();
        bus.set_unreachable(true);
        let res = bus
            .write_attributes(&dev, 4, Cluster::GenMultistateValue, &[])
            .await;
        assert!(matches!(res, Err(TransportError::Unreachable(_))));
        assert!(bus.writes().is_empty());
    }

    #[test]
    fn unknown_device_and_endpoint() {
        let (bus, dev) = uart_device();
        assert!(matches!(
            bus.endpoint(&DeviceId::new("0xdead"), 4),
            Err(TransportError::DeviceNotFound(_))
        ));
        assert!(matches!(bus.endpoint(&dev, 9), Ok(None)));
    }
}
