//! BLE discovery through `bluetoothctl`.

use std::collections::HashMap;
use std::time::Duration;

use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::cancel::CancellationToken;
use crate::domain::{sort_by_rssi, BluetoothDevice};
use crate::error::{Error, Result};
use crate::ports::BluetoothScannerPort;
use crate::process::ToolCommand;

pub(crate) const BLUETOOTHCTL: &str = "bluetoothctl";

/// What a discovery line told us about one device.
#[derive(Debug, Default, Clone)]
struct Sighting {
    name: Option<String>,
    alias: Option<String>,
    rssi: Option<i32>,
}

/// Incremental parser for `bluetoothctl` discovery output.
pub(crate) struct DiscoveryParser {
    ansi: Regex,
    device_line: Regex,
    rssi: Regex,
    order: Vec<String>,
    devices: HashMap<String, Sighting>,
}

impl DiscoveryParser {
    pub(crate) fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| Error::ParseError(format!("Invalid pattern: {}", e)))
        };
        Ok(Self {
            ansi: compile(r"\x1b\[[0-9;?]*[A-Za-z]|\x01|\x02")?,
            device_line: compile(
                r"\[(NEW|CHG)\]\s+Device\s+([0-9A-Fa-f]{2}(?::[0-9A-Fa-f]{2}){5})\s*(.*)$",
            )?,
            rssi: compile(r"^RSSI:\s*(?:0x[0-9A-Fa-f]+\s*\()?(-?\d+)\)?")?,
            order: Vec::new(),
            devices: HashMap::new(),
        })
    }

    /// Feed one output line.
    pub(crate) fn feed(&mut self, raw: &str) {
        let line = self.ansi.replace_all(raw, "");
        let Some(caps) = self.device_line.captures(line.trim()) else {
            return;
        };
        let kind = caps[1].to_string();
        let address = caps[2].to_ascii_uppercase();
        let rest = caps[3].trim().to_string();

        if !self.devices.contains_key(&address) {
            self.order.push(address.clone());
        }
        let rssi_value = self
            .rssi
            .captures(&rest)
            .and_then(|c| c[1].parse::<i32>().ok());
        let sighting = self.devices.entry(address.clone()).or_default();

        if kind == "NEW" {
            // A device without a name is announced with its address in dashed form.
            if !rest.is_empty() && rest.replace('-', ":").to_ascii_uppercase() != address {
                sighting.name.get_or_insert(rest);
            }
            return;
        }

        if let Some(rssi) = rssi_value {
            sighting.rssi = Some(rssi);
        } else if let Some(name) = rest.strip_prefix("Name:") {
            sighting.name = Some(name.trim().to_string());
        } else if let Some(alias) = rest.strip_prefix("Alias:") {
            sighting.alias = Some(alias.trim().to_string());
        }
    }

    /// Devices seen so far, strongest first.
    pub(crate) fn devices(&self) -> Vec<BluetoothDevice> {
        let mut devices: Vec<BluetoothDevice> = self
            .order
            .iter()
            .filter_map(|address| {
                let sighting = self.devices.get(address)?;
                let alias = sighting
                    .alias
                    .clone()
                    .filter(|a| a.replace('-', ":").to_ascii_uppercase() != *address);
                Some(BluetoothDevice::new(
                    sighting.name.clone().or(alias),
                    address.clone(),
                    sighting.rssi,
                ))
            })
            .collect();
        sort_by_rssi(&mut devices);
        devices
    }
}

/// Run a discovery command and parse its output until it exits, the
/// deadline passes or `cancel` fires. Partial results are returned in every case.
pub(crate) async fn run_discovery(
    command: ToolCommand,
    duration: Duration,
    cancel: &CancellationToken,
) -> Result<Vec<BluetoothDevice>> {
    let mut parser = DiscoveryParser::new()?;

    let mut process = match command.capture_stdout().spawn() {
        Ok(process) => process,
        Err(e) => {
            warn!(error = %e, "Bluetooth discovery could not be started");
            return Ok(Vec::new());
        }
    };

    let Some(stdout) = process.take_stdout() else {
        process.terminate().await?;
        return Err(Error::CommandFailed("Discovery output not captured".to_string()));
    };
    let mut lines = BufReader::new(stdout).lines();
    let deadline = Instant::now() + duration;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Bluetooth discovery cancelled");
                break;
            }
            _ = tokio::time::sleep_until(deadline) => {
                debug!("Bluetooth discovery deadline reached");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => parser.feed(&line),
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Bluetooth discovery output unreadable");
                    break;
                }
            },
        }
    }

    if let Err(e) = process.terminate().await {
        warn!(error = %e, "Failed to stop Bluetooth discovery");
    }
    Ok(parser.devices())
}

/// BLE scanner backed by `bluetoothctl --timeout <secs> scan on`.
#[derive(Debug, Clone)]
pub struct BluetoothctlScanner {
    program: String,
}

impl BluetoothctlScanner {
    pub fn new() -> Self {
        Self {
            program: BLUETOOTHCTL.to_string(),
        }
    }

    fn command(&self, duration: Duration) -> ToolCommand {
        let secs = duration.as_secs().max(1);
        ToolCommand::new(&self.program)
            .arg("--timeout")
            .arg(secs.to_string())
            .args(["scan", "on"])
    }
}

impl Default for BluetoothctlScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl BluetoothScannerPort for BluetoothctlScanner {
    async fn scan(&self, duration: Duration, cancel: &CancellationToken) -> Result<Vec<BluetoothDevice>> {
        run_discovery(self.command(duration), duration, cancel).await
    }
}
