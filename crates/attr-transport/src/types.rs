use core::fmt;
use time::OffsetDateTime;

/// IEEE address of a device on the field bus (e.g. "0x00124b0012345678")
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(ieee: impl Into<String>) -> Self {
        Self(ieee.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Cluster (object) identifiers used by the adapters in this workspace
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Cluster {
    GenOnOff,
    GenMultistateValue,
    Other(u16),
}

impl Cluster {
    pub fn id(self) -> u16 {
        match self {
            Cluster::GenOnOff => 0x0006,
            Cluster::GenMultistateValue => 0x0014,
            Cluster::Other(id) => id,
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cluster::GenOnOff => f.write_str("genOnOff"),
            Cluster::GenMultistateValue => f.write_str("genMultistateValue"),
            Cluster::Other(id) => write!(f, "0x{id:04X}"),
        }
    }
}

/// ZCL attribute data types carried on the wire
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DataType {
    CharStr,
}

impl DataType {
    pub fn code(self) -> u8 {
        match self {
            DataType::CharStr => 0x42,
        }
    }
}

/// A value as exchanged on the attribute protocol: opaque character/octet strings
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Octets(Vec<u8>),
}

impl AttributeValue {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            AttributeValue::Text(s) => s.as_bytes(),
            AttributeValue::Octets(b) => b,
        }
    }
}

/// One attribute slot to be written, with its declared wire type
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttributeWrite {
    pub attribute_id: u16,
    pub value: AttributeValue,
    pub data_type: DataType,
}

impl AttributeWrite {
    pub fn char_str(attribute_id: u16, value: impl Into<String>) -> Self {
        Self {
            attribute_id,
            value: AttributeValue::Text(value.into()),
            data_type: DataType::CharStr,
        }
    }
}

/// Clusters hosted by one endpoint of a device
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct EndpointInfo {
    pub id: u8,
    pub input_clusters: Vec<Cluster>,
    pub output_clusters: Vec<Cluster>,
}

impl EndpointInfo {
    pub fn new(id: u8) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn with_input(mut self, cluster: Cluster) -> Self {
        self.input_clusters.push(cluster);
        self
    }

    pub fn with_output(mut self, cluster: Cluster) -> Self {
        self.output_clusters.push(cluster);
        self
    }

    pub fn supports_input_cluster(&self, cluster: Cluster) -> bool {
        self.input_clusters.contains(&cluster)
    }

    pub fn supports_output_cluster(&self, cluster: Cluster) -> bool {
        self.output_clusters.contains(&cluster)
    }
}

/// A write accepted by a transport, as seen on the bus
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WriteRecord {
    pub device: DeviceId,
    pub endpoint: u8,
    pub cluster: Cluster,
    pub attributes: Vec<AttributeWrite>,
    pub timestamp: Option<Timestamp>,
}

/// How an inbound attribute message reached the host
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MessageKind {
    AttributeReport,
    ReadResponse,
    CommandResponse,
}

/// An attribute report or response delivered by the transport
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InboundMessage {
    pub kind: MessageKind,
    pub endpoint: u8,
    pub cluster: Cluster,
    pub data: Vec<(String, AttributeValue)>,
}

impl InboundMessage {
    /// Look up an attribute by name (e.g. "stateText").
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.data.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Timestamp(pub OffsetDateTime);
