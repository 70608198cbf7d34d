use crate::{AdapterConfig, AdapterError, AdapterMetrics, Channel, PollConfig, Result};
use attr_transport::{AttributeTransport, AttributeWrite, Cluster, DeviceId};
use serde_json::Value;
use std::time::Duration;

/// Object carrying the pseudo-serial channel.
pub const UART_CLUSTER: Cluster = Cluster::GenMultistateValue;
/// `stateText` attribute of the multistate value object.
pub const STATE_TEXT_ATTR: u16 = 14;

/// Single-character command the sensor firmware answers with a reading.
pub fn request_code(channel: Channel) -> Option<char> {
    match channel {
        Channel::Distance => Some('U'),
        Channel::Temperature => Some('P'),
        Channel::PollInterval => None,
    }
}

/// Build the outbound write for a channel; `poll_interval` is local-only.
pub fn encode(channel: Channel) -> Option<AttributeWrite> {
    request_code(channel).map(|c| AttributeWrite::char_str(STATE_TEXT_ATTR, c))
}

/// A validated `poll_interval` value together with the number the host sent.
#[derive(Debug, Clone, PartialEq)]
pub struct PollInterval {
    pub interval: Duration,
    pub value: Value,
}

/// Validate a requested poll interval. Numbers and numeric strings are accepted.
pub fn parse_interval(value: &Value, min_secs: u64) -> Result<PollInterval> {
    let secs = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|s| s.is_finite())
    .ok_or_else(|| AdapterError::Validation(format!("Invalid poll interval '{value}'")))?;

    if secs < min_secs as f64 {
        return Err(AdapterError::Validation(format!(
            "Poll interval should be not less than {min_secs} seconds but '{secs}' second(s) provided"
        )));
    }
    let interval = Duration::try_from_secs_f64(secs)
        .map_err(|e| AdapterError::Validation(format!("Invalid poll interval '{value}': {e}")))?;

    let value = if secs.fract() == 0.0 && secs <= u64::MAX as f64 {
        Value::from(secs as u64)
    } else {
        Value::from(secs)
    };
    Ok(PollInterval { interval, value })
}

/// Validate and apply a `poll_interval` set request. Returns the new logical state.
pub fn set_interval(
    value: &Value,
    config: &AdapterConfig,
    poll: Option<&PollConfig>,
) -> Result<Value> {
    let parsed = parse_interval(value, config.min_poll_interval_secs)?;
    match poll {
        Some(p) => {
            p.set_interval(parsed.interval);
            tracing::info!(interval = ?parsed.interval, "poll interval updated");
        }
        None => tracing::debug!("no active poller; interval applies on next report"),
    }
    let mut state = serde_json::Map::new();
    state.insert(Channel::PollInterval.key().into(), parsed.value);
    Ok(Value::Object(state))
}

/// Fail fast unless the device hosts the UART object on the configured endpoint.
pub fn ensure_uart_endpoint(
    transport: &dyn AttributeTransport,
    device: &DeviceId,
    endpoint: u8,
) -> Result<()> {
    let missing = || AdapterError::MissingCapability {
        device: device.clone(),
        endpoint,
        cluster: UART_CLUSTER,
    };
    let ep = transport.endpoint(device, endpoint)?.ok_or_else(missing)?;
    if !ep.supports_input_cluster(UART_CLUSTER) && !ep.supports_output_cluster(UART_CLUSTER) {
        return Err(missing());
    }
    Ok(())
}

/// Ask the sensor for a fresh reading. One attempt; the answer arrives as a report.
pub async fn send_request(
    transport: &dyn AttributeTransport,
    config: &AdapterConfig,
    metrics: &AdapterMetrics,
    device: &DeviceId,
    channel: Channel,
) -> Result<()> {
    let endpoint = config.uart_endpoint;
    ensure_uart_endpoint(transport, device, endpoint)?;
    let Some(write) = encode(channel) else {
        return Ok(());
    };
    match transport
        .write_attributes(device, endpoint, UART_CLUSTER, &[write])
        .await
    {
        Ok(()) => {
            metrics.requests_sent.inc();
            Ok(())
        }
        Err(e) => {
            metrics.request_failures.inc();
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attr_transport::{DataType, EndpointInfo, MockTransport};
    use serde_json::json;

    #[test]
    fn encodes_request_codes() {
        let w = encode(Channel::Distance).unwrap();
        assert_eq!(w.attribute_id, 14);
        assert_eq!(w.data_type, DataType::CharStr);
        assert_eq!(w.value.as_bytes(), b"U");
        assert_eq!(encode(Channel::Temperature).unwrap().value.as_bytes(), b"P");
        assert!(encode(Channel::PollInterval).is_none());
    }

    #[test]
    fn interval_below_minimum_is_rejected() {
        let err = parse_interval(&json!(1), 2).unwrap_err();
        assert!(matches!(err, AdapterError::Validation(_)));
        assert!(err.to_string().contains("not less than 2"));
    }

    #[test]
    fn interval_must_be_numeric() {
        assert!(parse_interval(&json!("soon"), 2).is_err());
        assert!(parse_interval(&json!("inf"), 2).is_err());
        assert!(parse_interval(&json!(null), 2).is_err());
        assert!(parse_interval(&json!(true), 2).is_err());
    }

    #[test]
    fn interval_accepts_numbers_and_numeric_strings() {
        let p = parse_interval(&json!(2), 2).unwrap();
        assert_eq!(p.interval, Duration::from_secs(2));
        assert_eq!(p.value, json!(2));

        let p = parse_interval(&json!(" 30 "), 2).unwrap();
        assert_eq!(p.interval, Duration::from_secs(30));
        assert_eq!(p.value, json!(30));

        let p = parse_interval(&json!(2.5), 2).unwrap();
        assert_eq!(p.interval, Duration::from_millis(2500));
        assert_eq!(p.value, json!(2.5));
    }

    #[test]
    fn set_interval_updates_live_poll() {
        let cfg = AdapterConfig::default();
        let poll = PollConfig::new(cfg.default_poll_interval());
        let state = set_interval(&json!(2), &cfg, Some(&poll)).unwrap();
        assert_eq!(state, json!({"poll_interval": 2}));
        assert_eq!(poll.interval(), Duration::from_secs(2));
    }

    #[test]
    fn failed_validation_leaves_poll_untouched() {
        let cfg = AdapterConfig::default();
        let poll = PollConfig::new(cfg.default_poll_interval());
        assert!(set_interval(&json!(1), &cfg, Some(&poll)).is_err());
        assert_eq!(poll.interval(), Duration::from_secs(15));
    }

    #[test]
    fn missing_uart_endpoint_fails_fast() {
        let bus = MockTransport::new();
        let dev = DeviceId::new("0x02");
        bus.add_device(
            dev.clone(),
            vec![EndpointInfo::new(4).with_input(Cluster::GenOnOff)],
        );
        let err = ensure_uart_endpoint(&bus, &dev, 4).unwrap_err();
        assert!(matches!(
            err,
            AdapterError::MissingCapability { endpoint: 4, .. }
        ));
        let err = ensure_uart_endpoint(&bus, &dev, 5).unwrap_err();
        assert!(err.to_string().contains("configured as UART"));
    }

    #[tokio::test]
    async fn request_propagates_transport_errors() {
        let bus = MockTransport::new();
        let dev = DeviceId::new("0x03");
        bus.add_device(
            dev.clone(),
            vec![EndpointInfo::new(4).with_output(UART_CLUSTER)],
        );
        let cfg = AdapterConfig::default();
        let metrics = AdapterMetrics::new().unwrap();

        send_request(&bus, &cfg, &metrics, &dev, Channel::Distance)
            .await
            .unwrap();
        bus.set_unreachable(true);
        let res = send_request(&bus, &cfg, &metrics, &dev, Channel::Temperature).await;
        assert!(matches!(res, Err(AdapterError::Transport(_))));
        assert_eq!(metrics.requests_sent.get(), 1);
        assert_eq!(metrics.request_failures.get(), 1);
    }
}
