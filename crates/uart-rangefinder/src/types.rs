use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

pub const DISTANCE_KEY: &str = "distance";
pub const TEMPERATURE_KEY: &str = "ultrasound_sensor_temperature";
pub const POLL_INTERVAL_KEY: &str = "poll_interval";
pub const ACTION_KEY: &str = "action";

/// Logical properties the adapter exposes to the host
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Distance,
    #[serde(rename = "ultrasound_sensor_temperature")]
    Temperature,
    PollInterval,
}

impl Channel {
    pub fn key(self) -> &'static str {
        match self {
            Channel::Distance => DISTANCE_KEY,
            Channel::Temperature => TEMPERATURE_KEY,
            Channel::PollInterval => POLL_INTERVAL_KEY,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            DISTANCE_KEY => Some(Channel::Distance),
            TEMPERATURE_KEY => Some(Channel::Temperature),
            POLL_INTERVAL_KEY => Some(Channel::PollInterval),
            _ => None,
        }
    }
}

/// Semantic payload decoded from one raw UART frame
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Frame {
    /// Sensor temperature in °C.
    Temperature(i16),
    /// Distance in millimeters; `None` when the sensor reports out of range.
    Distance(Option<u16>),
    Text(String),
    Bytes(Vec<u8>),
}

impl Frame {
    /// State fields to publish for this frame.
    pub fn fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        match self {
            Frame::Temperature(t) => {
                fields.insert(TEMPERATURE_KEY.into(), Value::from(*t));
            }
            Frame::Distance(d) => {
                fields.insert(DISTANCE_KEY.into(), d.map(Value::from).unwrap_or(Value::Null));
            }
            Frame::Text(s) => {
                fields.insert(ACTION_KEY.into(), Value::from(s.as_str()));
            }
            Frame::Bytes(b) => {
                let items = b.iter().map(|&x| Value::from(x)).collect();
                fields.insert(ACTION_KEY.into(), Value::Array(items));
            }
        }
        fields
    }
}

/// Lifecycle events the host delivers for a device
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DeviceEvent {
    Start,
    Stop,
    DeviceAnnounce,
}

impl DeviceEvent {
    /// Map a host event name; events this adapter does not react to yield `None`.
    pub fn from_kind(kind: &str) -> Option<Self> {
        match kind {
            "start" => Some(DeviceEvent::Start),
            "stop" => Some(DeviceEvent::Stop),
            "deviceAnnounce" => Some(DeviceEvent::DeviceAnnounce),
            _ => None,
        }
    }
}

/// Per-device polling state shared between the poll task and the interval-set path.
///
/// Only the interval is written from outside the task; the stop flag and the
/// cancellation token are driven by [`crate::PollScheduler::stop`].
#[derive(Debug)]
pub struct PollConfig {
    interval_ms: AtomicU64,
    stop: AtomicBool,
    cancel: CancellationToken,
}

impl PollConfig {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval_ms: AtomicU64::new(duration_ms(interval)),
            stop: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.load(Ordering::Acquire))
    }

    pub fn set_interval(&self, interval: Duration) {
        self.interval_ms
            .store(duration_ms(interval), Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Raise the stop flag and wake any pending sleep of the poll task.
    pub(crate) fn stop(&self) {
        self.stop.store(true, Ordering::Release);
        self.cancel.cancel();
    }

    pub(crate) fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
