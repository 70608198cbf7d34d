use crate::{AdapterError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Adapter settings. Every field has a default, so an empty YAML document is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct AdapterConfig {
    /// Endpoint hosting the UART `genMultistateValue` object.
    pub uart_endpoint: u8,
    pub default_poll_interval_secs: u64,
    pub min_poll_interval_secs: u64,
    /// Delay between the distance and temperature requests of one cycle.
    pub temperature_delay_secs: u64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            uart_endpoint: 4,
            default_poll_interval_secs: 15,
            min_poll_interval_secs: 2,
            temperature_delay_secs: 1,
        }
    }
}

impl AdapterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_poll_interval_secs < 1 {
            return Err(AdapterError::Config(
                "min_poll_interval_secs must be at least 1".into(),
            ));
        }
        if self.default_poll_interval_secs < self.min_poll_interval_secs {
            return Err(AdapterError::Config(format!(
                "default_poll_interval_secs ({}) is below min_poll_interval_secs ({})",
                self.default_poll_interval_secs, self.min_poll_interval_secs
            )));
        }
        // the trailing sleep of a cycle is interval - delay and must stay positive
        if self.temperature_delay_secs == 0
            || self.temperature_delay_secs >= self.min_poll_interval_secs
        {
            return Err(AdapterError::Config(format!(
                "temperature_delay_secs must be in 1..{}",
                self.min_poll_interval_secs
            )));
        }
        Ok(())
    }

    pub fn default_poll_interval(&self) -> Duration {
        Duration::from_secs(self.default_poll_interval_secs)
    }

    pub fn temperature_delay(&self) -> Duration {
        Duration::from_secs(self.temperature_delay_secs)
    }
}

pub fn load_config_file(path: impl AsRef<Path>) -> anyhow::Result<AdapterConfig> {
    let path = path.as_ref();
    let raw =
        fs::read_to_string(path).with_context(|| format!("reading config: {}", path.display()))?;
    let cfg: AdapterConfig = if raw.trim().is_empty() {
        AdapterConfig::default()
    } else {
        serde_yaml::from_str(&raw).with_context(|| format!("parsing yaml: {}", path.display()))?
    };
    cfg.validate()
        .with_context(|| format!("validating config: {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let cfg = AdapterConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.default_poll_interval(), Duration::from_secs(15));
        assert_eq!(cfg.uart_endpoint, 4);
    }

    #[test]
    fn rejects_delay_not_below_minimum() {
        let cfg = AdapterConfig {
            temperature_delay_secs: 2,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(AdapterError::Config(_))));
    }

    #[test]
    fn rejects_default_below_minimum() {
        let cfg = AdapterConfig {
            default_poll_interval_secs: 1,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn loads_partial_yaml() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "default_poll_interval_secs: 30")?;
        let cfg = load_config_file(file.path())?;
        assert_eq!(cfg.default_poll_interval_secs, 30);
        assert_eq!(cfg.min_poll_interval_secs, 2);
        Ok(())
    }

    #[test]
    fn load_reports_invalid_values() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "min_poll_interval_secs: 0")?;
        let err = load_config_file(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("min_poll_interval_secs"));
        Ok(())
    }
}
