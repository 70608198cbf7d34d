use crate::decode::{apply_desired_interval, decode_report, StateUpdate};
use crate::encode::{self, parse_interval, send_request, UART_CLUSTER};
use crate::{
    AdapterConfig, AdapterError, AdapterMetrics, Channel, DeviceEvent, Frame, PollRegistry,
    PollScheduler, Result,
};
use attr_transport::{AttributeTransport, AttributeValue, DeviceId, InboundMessage, MessageKind};
use serde_json::{Map, Value};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::task::JoinHandle;

const STATE_TEXT: &str = "stateText";

/// Host-facing glue: lifecycle events, inbound reports, and get/set on the exposed keys.
pub struct RangefinderAdapter {
    transport: Arc<dyn AttributeTransport>,
    registry: Arc<PollRegistry>,
    scheduler: PollScheduler,
    config: AdapterConfig,
    metrics: AdapterMetrics,
}

impl RangefinderAdapter {
    pub fn new(transport: Arc<dyn AttributeTransport>, config: AdapterConfig) -> Result<Self> {
        config.validate()?;
        let metrics = AdapterMetrics::new().map_err(AdapterError::Metrics)?;
        let registry = Arc::new(PollRegistry::new());
        let scheduler = PollScheduler::new(
            transport.clone(),
            registry.clone(),
            config.clone(),
            metrics.clone(),
        );
        Ok(Self {
            transport,
            registry,
            scheduler,
            config,
            metrics,
        })
    }

    /// Drive the poll state machine. Returns the loop handle when a new loop started.
    pub fn on_event(
        &self,
        event: DeviceEvent,
        device: &DeviceId,
    ) -> Result<Option<JoinHandle<()>>> {
        match event {
            DeviceEvent::Start | DeviceEvent::DeviceAnnounce => self.scheduler.start(device),
            DeviceEvent::Stop => {
                self.scheduler.stop(device);
                Ok(None)
            }
        }
    }

    /// Convert a UART report into a state update. `state` is the device's last published
    /// state; a `poll_interval` found there is re-applied to the running loop first.
    pub fn from_uart(
        &self,
        device: &DeviceId,
        msg: &InboundMessage,
        state: &Map<String, Value>,
    ) -> Option<StateUpdate> {
        if !matches!(msg.kind, MessageKind::AttributeReport | MessageKind::ReadResponse)
            || msg.cluster != UART_CLUSTER
            || msg.endpoint != self.config.uart_endpoint
        {
            return None;
        }
        let raw = msg.attribute(STATE_TEXT)?;

        let desired = state
            .get(Channel::PollInterval.key())
            .and_then(|v| parse_interval(v, self.config.min_poll_interval_secs).ok())
            .map(|p| p.interval);
        let poll = self.registry.get(device);

        let frame = match raw {
            AttributeValue::Octets(bytes) => decode_report(bytes, desired, poll.as_deref()),
            // already text on the transport side: pass through as an action
            AttributeValue::Text(s) => {
                apply_desired_interval(desired, poll.as_deref());
                Frame::Text(s.clone())
            }
        };
        self.metrics.frames_decoded.inc();
        tracing::debug!(%device, ?frame, "decoded UART frame");
        Some(StateUpdate::new(
            device.as_str(),
            &frame,
            Some(OffsetDateTime::now_utc()),
        ))
    }

    /// Explicit read of a key. Sends the request now; the value arrives as a report.
    /// Unlike the poll loop, transport failures are returned to the caller.
    pub async fn convert_get(&self, device: &DeviceId, key: &str) -> Result<()> {
        let channel =
            Channel::from_key(key).ok_or_else(|| AdapterError::UnsupportedKey(key.into()))?;
        send_request(
            &*self.transport,
            &self.config,
            &self.metrics,
            device,
            channel,
        )
        .await
    }

    /// Set a key. Only `poll_interval` is settable; other keys yield no state.
    pub fn convert_set(&self, device: &DeviceId, key: &str, value: &Value) -> Result<Option<Value>> {
        if Channel::from_key(key) != Some(Channel::PollInterval) {
            return Ok(None);
        }
        let poll = self.registry.get(device);
        let state = encode::set_interval(value, &self.config, poll.as_deref())?;
        let mut out = Map::new();
        out.insert("state".into(), state);
        Ok(Some(Value::Object(out)))
    }

    /// Stop every running loop (host teardown).
    pub fn shutdown(&self) {
        self.scheduler.stop_all();
    }

    pub fn is_polling(&self, device: &DeviceId) -> bool {
        self.scheduler.is_polling(device)
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn metrics(&self) -> &AdapterMetrics {
        &self.metrics
    }
}
