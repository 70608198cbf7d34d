//! Per-device poll loop keeping distance and temperature readings fresh.
//!
//! Each started device gets one task that alternates a distance request and, after a
//! short delay, a temperature request, then sleeps out the rest of its poll interval.
//! The interval is read right before the trailing sleep, so a change made mid-cycle
//! shortens or lengthens the current cycle only from that point on.

use crate::encode::send_request;
use crate::{AdapterConfig, AdapterError, AdapterMetrics, Channel, PollConfig, PollRegistry, Result};
use attr_transport::{AttributeTransport, DeviceId};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct PollScheduler {
    transport: Arc<dyn AttributeTransport>,
    registry: Arc<PollRegistry>,
    config: AdapterConfig,
    metrics: AdapterMetrics,
}

impl PollScheduler {
    pub fn new(
        transport: Arc<dyn AttributeTransport>,
        registry: Arc<PollRegistry>,
        config: AdapterConfig,
        metrics: AdapterMetrics,
    ) -> Self {
        Self {
            transport,
            registry,
            config,
            metrics,
        }
    }

    /// Start polling a device. Returns the loop's handle, or `None` if the device is
    /// already being polled. Fails without registering anything when called outside
    /// a Tokio runtime.
    pub fn start(&self, device: &DeviceId) -> Result<Option<JoinHandle<()>>> {
        let runtime = Handle::try_current().map_err(|e| AdapterError::Runtime(e.to_string()))?;
        let default_interval = self.config.default_poll_interval();
        let Some(poll) = self
            .registry
            .insert_if_absent(device, || PollConfig::new(default_interval))
        else {
            return Ok(None);
        };
        self.metrics.active_pollers.inc();
        info!(%device, interval = ?default_interval, "starting poll loop");

        let worker = PollWorker {
            device: device.clone(),
            transport: self.transport.clone(),
            config: self.config.clone(),
            metrics: self.metrics.clone(),
            poll,
        };
        Ok(Some(runtime.spawn(worker.run())))
    }

    /// Stop polling a device: raise its stop flag, wake the pending sleep and
    /// deregister it. Returns `false` if the device was not being polled.
    pub fn stop(&self, device: &DeviceId) -> bool {
        match self.registry.remove(device) {
            Some(poll) => {
                poll.stop();
                self.metrics.active_pollers.dec();
                info!(%device, "poll loop stopped");
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&self) {
        for device in self.registry.devices() {
            self.stop(&device);
        }
    }

    pub fn is_polling(&self, device: &DeviceId) -> bool {
        self.registry.contains(device)
    }
}

struct PollWorker {
    device: DeviceId,
    transport: Arc<dyn AttributeTransport>,
    config: AdapterConfig,
    metrics: AdapterMetrics,
    poll: Arc<PollConfig>,
}

impl PollWorker {
    async fn run(self) {
        let delay = self.config.temperature_delay();
        while !self.poll.is_stopped() {
            self.request(Channel::Distance).await;
            if self.poll.is_stopped() || !self.sleep(delay).await {
                break;
            }
            if self.poll.is_stopped() {
                break;
            }
            self.request(Channel::Temperature).await;
            if self.poll.is_stopped() {
                break;
            }
            let trailing = self.poll.interval().saturating_sub(delay);
            if !self.sleep(trailing).await {
                break;
            }
        }
        debug!(device = %self.device, "poll loop exited");
    }

    /// Best effort: the device may be briefly unreachable, the next tick retries.
    async fn request(&self, channel: Channel) {
        if let Err(e) = send_request(
            &*self.transport,
            &self.config,
            &self.metrics,
            &self.device,
            channel,
        )
        .await
        {
            warn!(device = %self.device, channel = channel.key(), error = %e, "poll request failed");
        }
    }

    /// Sleep unless cancelled first. Returns `false` when woken by a stop.
    async fn sleep(&self, d: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.poll.cancelled() => false,
            _ = tokio::time::sleep(d) => true,
        }
    }
}
