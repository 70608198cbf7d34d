//! uart-rangefinder: ultrasonic rangefinder behind a field-bus relay's UART channel
//!
//! The relay firmware exposes a pseudo-serial link as the `stateText` attribute of a
//! multistate value object. This crate turns that into three logical channels (distance,
//! temperature, poll interval) plus passthrough actions, and runs the per-device poll
//! loop that keeps the readings fresh.

mod types;
pub use types::{
    Channel, DeviceEvent, Frame, PollConfig, ACTION_KEY, DISTANCE_KEY, POLL_INTERVAL_KEY,
    TEMPERATURE_KEY,
};

mod error;
pub use error::{AdapterError, Result};

mod config;
pub use config::{load_config_file, AdapterConfig};

pub mod definition;
pub use definition::{exposes, DeviceDefinition, Expose};

mod metrics;
pub use metrics::AdapterMetrics;

pub mod encode;
pub use encode::{encode, parse_interval, set_interval, PollInterval};

pub mod decode;
pub use decode::{decode_frame, decode_report, StateUpdate};

mod registry;
pub use registry::PollRegistry;

mod scheduler;
pub use scheduler::PollScheduler;

mod converter;
pub use converter::RangefinderAdapter;
