use crate::{AdapterConfig, Channel};
use serde::Serialize;
use std::collections::BTreeMap;

pub const MODEL_ID: &str = "2ch.1curren.UART";
pub const VENDOR: &str = "Custom devices (DiY)";

/// Access bits of an exposed property.
pub mod access {
    pub const STATE: u8 = 0b001;
    pub const SET: u8 = 0b010;
    pub const GET: u8 = 0b100;
    pub const STATE_GET: u8 = STATE | GET;
    pub const STATE_SET: u8 = STATE | SET;
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceDefinition {
    pub model: &'static str,
    pub vendor: &'static str,
    pub description: &'static str,
    pub multi_endpoint: bool,
    /// Endpoint names as the host addresses them (`l1`, `l2`, ...).
    pub endpoints: BTreeMap<&'static str, u8>,
}

pub fn definition() -> DeviceDefinition {
    DeviceDefinition {
        model: MODEL_ID,
        vendor: VENDOR,
        description: "2 channel relay + UART: first channel with current measurements",
        multi_endpoint: true,
        endpoints: BTreeMap::from([
            ("l1", 1),
            ("l2", 2),
            ("l4", 4),
            ("l5", 5),
            ("l6", 6),
            ("l8", 8),
            ("action", 1),
        ]),
    }
}

pub fn matches(model_id: &str) -> bool {
    model_id == MODEL_ID
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Expose {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: &'static str,
    pub property: &'static str,
    pub access: u8,
    pub unit: &'static str,
    pub description: String,
}

fn numeric(channel: Channel, access: u8, unit: &'static str, description: String) -> Expose {
    Expose {
        kind: "numeric",
        name: channel.key(),
        property: channel.key(),
        access,
        unit,
        description,
    }
}

/// Properties this adapter publishes for the UART channel.
pub fn exposes(config: &AdapterConfig) -> Vec<Expose> {
    vec![
        numeric(
            Channel::Temperature,
            access::STATE_GET,
            "°C",
            "Ultrasound sensor temperature".into(),
        ),
        numeric(
            Channel::Distance,
            access::STATE_GET,
            "mm",
            "Ultrasound sensor distance".into(),
        ),
        numeric(
            Channel::PollInterval,
            access::STATE_SET,
            "seconds",
            format!(
                "Poll interval (minimum is {} seconds)",
                config.min_poll_interval_secs
            ),
        ),
    ]
}
