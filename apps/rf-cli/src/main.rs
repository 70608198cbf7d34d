use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use attr_transport as bus;
use uart_rangefinder as rf;

#[derive(Parser, Debug)]
#[command(
    name = "rf",
    version,
    about = "UART rangefinder adapter CLI",
    disable_help_subcommand = true
)]
struct Cli {
    /// Adapter config YAML (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a captured UART frame (hex bytes like "00 32" or compact "0032")
    Decode {
        /// Frame bytes in hex
        #[arg(required = true)]
        bytes: Vec<String>,
    },
    /// Print the device definition and exposed properties as JSON
    Describe,
    /// Validate an adapter config file
    ConfigCheck {
        /// Path to YAML config
        path: String,
    },
    /// Run a polling session against the mock transport and print the traffic
    Simulate {
        /// Device IEEE address
        #[arg(long, default_value = "0x00124b0000000001")]
        device: String,
        /// Session length in seconds
        #[arg(long, default_value_t = 20u64)]
        seconds: u64,
        /// Poll interval to set once the loop is running
        #[arg(long)]
        interval: Option<String>,
        /// Simulate a device that has dropped off the bus
        #[arg(long, action = ArgAction::SetTrue)]
        unreachable: bool,
        /// Distance the simulated sensor answers with (mm)
        #[arg(long, default_value_t = 1234u16)]
        distance_mm: u16,
        /// Temperature the simulated sensor answers with (°C)
        #[arg(long, default_value_t = 21i16)]
        temperature_c: i16,
    },
    /// Print adapter metrics after a short simulated session
    Metrics {
        #[arg(long, default_value_t = 5u64)]
        seconds: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(p) => rf::load_config_file(p)?,
        None => rf::AdapterConfig::default(),
    };

    match cli.command {
        Commands::Decode { bytes } => decode(&bytes),
        Commands::Describe => describe(&config),
        Commands::ConfigCheck { path } => config_check(&path),
        Commands::Simulate {
            device,
            seconds,
            interval,
            unreachable,
            distance_mm,
            temperature_c,
        } => {
            let opts = SimOptions {
                device: bus::DeviceId::new(device),
                seconds,
                interval,
                unreachable,
                distance_mm,
                temperature_c,
            };
            simulate(config, &opts).await?;
            info!("session finished");
            Ok(())
        }
        Commands::Metrics { seconds } => {
            let opts = SimOptions {
                device: bus::DeviceId::new("0x00124b0000000001"),
                seconds,
                interval: None,
                unreachable: false,
                distance_mm: 1234,
                temperature_c: 21,
            };
            let adapter = simulate(config, &opts).await?;
            print!("{}", adapter.metrics().encode_text());
            Ok(())
        }
    }
}

fn setup_tracing() {
    // Best-effort; avoid panics if already set
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn decode(items: &[String]) -> Result<()> {
    let data = if items.len() == 1 && items[0].trim().len() > 2 {
        parse_hex_compact(&items[0])?
    } else {
        parse_hex_bytes(items)?
    };
    let frame = rf::decode_frame(&data);
    println!("{}", serde_json::Value::Object(frame.fields()));
    Ok(())
}

fn describe(config: &rf::AdapterConfig) -> Result<()> {
    let out = serde_json::json!({
        "definition": rf::definition::definition(),
        "exposes": rf::exposes(config),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn config_check(path: &str) -> Result<()> {
    let cfg = rf::load_config_file(path)?;
    println!("OK: {path}");
    println!("{}", serde_json::to_string_pretty(&cfg)?);
    Ok(())
}

struct SimOptions {
    device: bus::DeviceId,
    seconds: u64,
    interval: Option<String>,
    unreachable: bool,
    distance_mm: u16,
    temperature_c: i16,
}

async fn simulate(config: rf::AdapterConfig, opts: &SimOptions) -> Result<rf::RangefinderAdapter> {
    let transport = Arc::new(bus::MockTransport::new());
    transport.add_device(
        opts.device.clone(),
        vec![
            bus::EndpointInfo::new(1).with_input(bus::Cluster::GenOnOff),
            bus::EndpointInfo::new(2).with_input(bus::Cluster::GenOnOff),
            bus::EndpointInfo::new(config.uart_endpoint)
                .with_input(bus::Cluster::GenMultistateValue)
                .with_output(bus::Cluster::GenMultistateValue),
        ],
    );
    transport.set_unreachable(opts.unreachable);
    let endpoint = config.uart_endpoint;
    let adapter = rf::RangefinderAdapter::new(transport.clone(), config)?;

    let handle = adapter.on_event(rf::DeviceEvent::Start, &opts.device)?;
    let mut state = serde_json::Map::new();
    if let Some(raw) = &opts.interval {
        let value = raw
            .parse::<serde_json::Value>()
            .unwrap_or_else(|_| serde_json::Value::String(raw.clone()));
        if let Some(out) = adapter.convert_set(&opts.device, rf::POLL_INTERVAL_KEY, &value)? {
            println!("set: {out}");
            if let Some(v) = out.get("state").and_then(|s| s.get(rf::POLL_INTERVAL_KEY)) {
                state.insert(rf::POLL_INTERVAL_KEY.into(), v.clone());
            }
        }
    }

    tokio::time::sleep(Duration::from_secs(opts.seconds)).await;
    adapter.on_event(rf::DeviceEvent::Stop, &opts.device)?;
    if let Some(h) = handle {
        h.await?;
    }

    for w in transport.writes_for(&opts.device) {
        let code = w
            .attributes
            .first()
            .map(|a| String::from_utf8_lossy(a.value.as_bytes()).into_owned())
            .unwrap_or_default();
        print_write(&w, &code);
        let reply = match code.as_str() {
            "U" => opts.distance_mm.to_be_bytes().to_vec(),
            "P" => {
                let raw = opts
                    .temperature_c
                    .saturating_add(rf::decode::TEMPERATURE_OFFSET)
                    .clamp(0, 255);
                vec![u8::try_from(raw).unwrap_or_default()]
            }
            _ => continue,
        };
        let msg = bus::InboundMessage {
            kind: bus::MessageKind::AttributeReport,
            endpoint,
            cluster: bus::Cluster::GenMultistateValue,
            data: vec![("stateText".into(), bus::AttributeValue::Octets(reply))],
        };
        if let Some(upd) = adapter.from_uart(&opts.device, &msg, &state) {
            println!("  <- {}", serde_json::to_string(&upd)?);
        }
    }
    Ok(adapter)
}

fn print_write(w: &bus::WriteRecord, code: &str) {
    println!("{}", format_write(w, code));
}

fn format_write(w: &bus::WriteRecord, code: &str) -> String {
    let ts = w
        .timestamp
        .map(|t| {
            t.0.format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_else(|_| "".into())
        })
        .unwrap_or_default();
    let types: Vec<String> = w
        .attributes
        .iter()
        .map(|a| format!("0x{:02X}", a.data_type.code()))
        .collect();
    format!(
        "{ts}\t{dev}\tep{ep}\t{cluster}(0x{cid:04X})\twrite '{code}' [{types}]",
        dev = w.device,
        ep = w.endpoint,
        cluster = w.cluster,
        cid = w.cluster.id(),
        types = types.join(",")
    )
}

fn parse_hex_bytes(items: &[String]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(items.len());
    for s in items {
        let t = s.trim();
        let no_prefix = t.strip_prefix("0x").unwrap_or(t);
        let b = u8::from_str_radix(no_prefix, 16)
            .map_err(|e| anyhow::anyhow!("invalid hex byte '{t}': {e}"))?;
        out.push(b);
    }
    Ok(out)
}

fn parse_hex_compact(s: &str) -> Result<Vec<u8>> {
    let t = s.trim();
    let t = t.strip_prefix("0x").unwrap_or(t);
    if t.len() % 2 != 0 {
        return Err(anyhow::anyhow!("odd hex length"));
    }
    (0..t.len())
        .step_by(2)
        .map(|i| {
            t.get(i..i + 2)
                .ok_or_else(|| anyhow::anyhow!("invalid hex: non-ascii input"))
                .and_then(|pair| {
                    u8::from_str_radix(pair, 16).map_err(|e| anyhow::anyhow!("invalid hex: {e}"))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_spaced_and_compact_hex() {
        assert_eq!(
            parse_hex_bytes(&["0x00".into(), "32".into()]).unwrap(),
            vec![0x00, 0x32]
        );
        assert_eq!(parse_hex_compact("2b28").unwrap(), vec![43, 40]);
        assert!(parse_hex_compact("abc").is_err());
        assert!(parse_hex_compact("zz").is_err());
    }

    #[test]
    fn write_line_names_cluster_and_type() {
        let w = bus::WriteRecord {
            device: bus::DeviceId::new("0x01"),
            endpoint: 4,
            cluster: bus::Cluster::GenMultistateValue,
            attributes: vec![bus::AttributeWrite::char_str(14, "U")],
            timestamp: None,
        };
        assert_eq!(
            format_write(&w, "U"),
            "\t0x01\tep4\tgenMultistateValue(0x0014)\twrite 'U' [0x42]"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_session_polls_both_channels() {
        let opts = SimOptions {
            device: bus::DeviceId::new("0x00124b00000000ff"),
            seconds: 2,
            interval: Some("5".into()),
            unreachable: false,
            distance_mm: 500,
            temperature_c: 20,
        };
        let adapter = simulate(rf::AdapterConfig::default(), &opts).await.unwrap();
        assert_eq!(adapter.metrics().requests_sent.get(), 2);
        assert_eq!(adapter.metrics().frames_decoded.get(), 2);
        assert!(!adapter.is_polling(&opts.device));
    }
}
