//! attr-transport: field-bus attribute transport abstractions
//!
//! This crate provides the identifiers, attribute value types and the async
//! [`AttributeTransport`] trait that adapters use to talk to devices on a field bus. The
//! default build enables a `mock` backend so that adapters and binaries can be exercised
//! on any host without a coordinator attached.

mod types;
pub use types::{
    AttributeValue, AttributeWrite, Cluster, DataType, DeviceId, EndpointInfo, InboundMessage,
    MessageKind, Timestamp, WriteRecord,
};

mod error;
pub use error::{Result, TransportError};

mod traits;
pub use traits::AttributeTransport;

#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "mock")]
pub use mock::MockTransport;
