//! Sub-GHz decoder configuration and decoded events.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

/// Model reported for events that carry no `model` field.
pub const UNKNOWN_MODEL: &str = "Unknown";

/// Default decoder frequency.
pub const DEFAULT_FREQUENCY: &str = "433.92M";

/// Default SDR device backend passed to the decoder.
pub const DEFAULT_DEVICE: &str = "soapy";

// ============================================================================
// RfEvent
// ============================================================================

/// One decoded transmission.
///
/// The decoder's schema depends on the protocol, so every key except
/// `model` is kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RfEvent {
    fields: Map<String, Value>,
}

impl RfEvent {
    /// Build an event from decoded fields, inserting `model` when absent.
    pub fn new(mut fields: Map<String, Value>) -> Self {
        if !fields.contains_key("model") {
            fields.insert("model".to_string(), Value::String(UNKNOWN_MODEL.to_string()));
        }
        Self { fields }
    }

    /// Decode one output line. Returns `None` for blank lines, invalid JSON
    /// or JSON values that are not objects.
    pub fn from_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(fields)) => Some(Self::new(fields)),
            _ => None,
        }
    }

    /// Device model, or `"Unknown"`.
    pub fn model(&self) -> &str {
        match self.fields.get("model") {
            Some(Value::String(model)) => model,
            _ => UNKNOWN_MODEL,
        }
    }

    /// Look up a raw field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Every field except `model`, with values rendered
    /// without JSON quoting for strings.
    pub fn details(&self) -> impl Iterator<Item = (&str, String)> {
        self.fields
            .iter()
            .filter(|(key, _)| key.as_str() != "model")
            .map(|(key, value)| (key.as_str(), render_value(value)))
    }

    /// Single-line `key=value` summary used in tables.
    pub fn summary(&self) -> String {
        self.details()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// RadioConfig
// ============================================================================

/// Output format passed to the decoder's `-F` flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
    Log,
    Mqtt,
    Influx,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Log => "log",
            OutputFormat::Mqtt => "mqtt",
            OutputFormat::Influx => "influx",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "log" => Ok(OutputFormat::Log),
            "mqtt" => Ok(OutputFormat::Mqtt),
            "influx" => Ok(OutputFormat::Influx),
            other => Err(Error::InvalidArgument(format!(
                "Unknown output format: {}",
                other
            ))),
        }
    }
}

/// Decoder invocation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioConfig {
    /// Center frequency, e.g. `433.92M`.
    pub frequency: String,
    /// Tuner gain (`auto` or a number), passed through as-is.
    pub gain: Option<String>,
    /// Restrict decoding to one protocol id.
    pub protocol: Option<String>,
    pub output: OutputFormat,
    /// SDR device backend.
    pub device: String,
}

impl RadioConfig {
    /// Configuration for `frequency` with every other setting at its default.
    pub fn new(frequency: impl Into<String>) -> Self {
        Self {
            frequency: frequency.into(),
            ..Default::default()
        }
    }

    /// Decoder arguments, without the program name.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-d".to_string(),
            self.device.clone(),
            "-f".to_string(),
            self.frequency.clone(),
            "-F".to_string(),
            self.output.to_string(),
        ];
        if let Some(ref gain) = self.gain {
            args.push("-g".to_string());
            args.push(gain.clone());
        }
        if let Some(ref protocol) = self.protocol {
            args.push("-R".to_string());
            args.push(protocol.clone());
        }
        args
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            frequency: DEFAULT_FREQUENCY.to_string(),
            gain: None,
            protocol: None,
            output: OutputFormat::Json,
            device: DEFAULT_DEVICE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_from_line() {
        let event = RfEvent::from_line(
            r#"{"time":"2024-01-01 10:00:00","model":"Acurite-Tower","id":1234,"temperature_C":21.5}"#,
        )
        .unwrap();
        assert_eq!(event.model(), "Acurite-Tower");
        assert_eq!(event.get("id"), Some(&Value::from(1234)));

        let details: Vec<(&str, String)> = event.details().collect();
        assert_eq!(details.len(), 3);
        assert!(details.iter().all(|(k, _)| *k != "model"));
        assert!(event.summary().contains("temperature_C=21.5"));
        assert!(event.summary().contains("time=2024-01-01 10:00:00"));
    }

    #[test]
    fn test_event_without_model() {
        let event = RfEvent::from_line(r#"{"id": 7}"#).unwrap();
        assert_eq!(event.model(), UNKNOWN_MODEL);
        assert_eq!(
            event.get("model"),
            Some(&Value::String(UNKNOWN_MODEL.to_string()))
        );
    }

    #[test]
    fn test_event_malformed_lines() {
        assert!(RfEvent::from_line("").is_none());
        assert!(RfEvent::from_line("   ").is_none());
        assert!(RfEvent::from_line("rtl_433 version 23.11").is_none());
        assert!(RfEvent::from_line(r#"{"model": "trunc"#).is_none());
        assert!(RfEvent::from_line("[1, 2, 3]").is_none());
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("MQTT".parse::<OutputFormat>().unwrap(), OutputFormat::Mqtt);
        assert!("xml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Influx.to_string(), "influx");
    }

    #[test]
    fn test_radio_args() {
        let config = RadioConfig::default();
        assert_eq!(
            config.args(),
            vec!["-d", "soapy", "-f", "433.92M", "-F", "json"]
        );

        let config = RadioConfig {
            gain: Some("40".to_string()),
            protocol: Some("40".to_string()),
            ..RadioConfig::new("868M")
        };
        let args = config.args();
        assert_eq!(&args[2..4], &["-f".to_string(), "868M".to_string()]);
        assert!(args.windows(2).any(|w| w[0] == "-g" && w[1] == "40"));
        assert!(args.windows(2).any(|w| w[0] == "-R" && w[1] == "40"));
    }
}
