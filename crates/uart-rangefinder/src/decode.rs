use crate::{Frame, PollConfig};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use time::OffsetDateTime;

/// Raw distance readings above this are the sensor's "nothing in range" answer.
pub const MAX_DISTANCE_MM: u16 = 11_000;
/// Temperature bytes are offset so that sub-zero readings stay unsigned on the wire.
pub const TEMPERATURE_OFFSET: i16 = 45;

const PRINTABLE: core::ops::RangeInclusive<u8> = 32..=127;

/// State published to the host for one decoded frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    pub device: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
    pub fields: Map<String, Value>,
}

impl StateUpdate {
    pub fn new(device: &str, frame: &Frame, ts: Option<OffsetDateTime>) -> Self {
        Self {
            device: device.to_string(),
            ts: ts.and_then(|t| {
                t.format(&time::format_description::well_known::Rfc3339)
                    .ok()
            }),
            fields: frame.fields(),
        }
    }
}

/// Decode one raw UART frame. Length alone selects the interpretation.
pub fn decode_frame(data: &[u8]) -> Frame {
    match *data {
        [t] => Frame::Temperature(i16::from(t) - TEMPERATURE_OFFSET),
        [hi, lo] => {
            let raw = u16::from(hi) << 8 | u16::from(lo);
            Frame::Distance((raw <= MAX_DISTANCE_MM).then_some(raw))
        }
        _ if data.iter().all(|b| PRINTABLE.contains(b)) => {
            Frame::Text(data.iter().map(|&b| char::from(b)).collect())
        }
        _ => Frame::Bytes(data.to_vec()),
    }
}

/// Decode a report, first re-applying the host's last desired poll interval to the
/// live poll state so the loop cadence follows it across reconnects.
pub fn decode_report(
    data: &[u8],
    desired_interval: Option<Duration>,
    poll: Option<&PollConfig>,
) -> Frame {
    apply_desired_interval(desired_interval, poll);
    decode_frame(data)
}

pub fn apply_desired_interval(desired_interval: Option<Duration>, poll: Option<&PollConfig>) {
    if let (Some(interval), Some(poll)) = (desired_interval, poll) {
        if poll.interval() != interval {
            tracing::debug!(?interval, "re-applying desired poll interval");
            poll.set_interval(interval);
        }
    }
}
