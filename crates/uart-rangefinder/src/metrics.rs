use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

#[derive(Clone)]
pub struct AdapterMetrics {
    pub registry: Registry,
    pub requests_sent: IntCounter,
    pub request_failures: IntCounter,
    pub frames_decoded: IntCounter,
    pub active_pollers: IntGauge,
}

impl AdapterMetrics {
    pub fn new() -> Result<Self, String> {
        let registry = Registry::new();
        let requests_sent = IntCounter::new("rf_requests_sent", "UART value requests written")
            .map_err(|e| format!("metrics init error: {e}"))?;
        let request_failures =
            IntCounter::new("rf_request_failures", "UART value requests that failed to send")
                .map_err(|e| format!("metrics init error: {e}"))?;
        let frames_decoded = IntCounter::new("rf_frames_decoded", "UART frames decoded")
            .map_err(|e| format!("metrics init error: {e}"))?;
        let active_pollers = IntGauge::new("rf_active_pollers", "Devices with a running poll loop")
            .map_err(|e| format!("metrics init error: {e}"))?;
        let _ = registry.register(Box::new(requests_sent.clone()));
        let _ = registry.register(Box::new(request_failures.clone()));
        let _ = registry.register(Box::new(frames_decoded.clone()));
        let _ = registry.register(Box::new(active_pollers.clone()));
        Ok(Self {
            registry,
            requests_sent,
            request_failures,
            frames_decoded,
            active_pollers,
        })
    }

    pub fn encode_text(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buf) {
            return format!("error encoding metrics: {e}");
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposition_names_all_series() {
        let m = AdapterMetrics::new().unwrap();
        m.requests_sent.inc();
        let text = m.encode_text();
        assert!(text.contains("rf_requests_sent 1"));
        assert!(text.contains("rf_active_pollers 0"));
    }
}
