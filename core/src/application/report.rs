//! Append-only audit report file and its section formatters.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use tokio::io::AsyncWriteExt;

use crate::domain::{AccessPoint, BluetoothDevice, RfEvent};
use crate::error::Result;

use super::vendors::VendorBook;

/// Default report location, relative to the working directory.
pub const DEFAULT_AUDIT_FILE: &str = "audit.txt";

const RULE_WIDTH: usize = 50;

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// An audit report on disk.
#[derive(Debug, Clone)]
pub struct AuditReport {
    path: PathBuf,
}

impl AuditReport {
    /// Truncate `path` and write the report header.
    pub async fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let header = format!("=== Full Audit Report - {} ===\n", timestamp());
        tokio::fs::write(&path, header).await?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped section.
    pub async fn append_section(&self, body: &str) -> Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .await?;
        let block = format!("\n\n=== {} ===\n{}\n", timestamp(), body.trim_end());
        file.write_all(block.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

// ============================================================================
// Section formatters
// ============================================================================

/// Wi-Fi section listing every network with its clients.
pub fn wifi_section(aps: &[AccessPoint], vendors: &VendorBook, duration: Duration) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Wi-Fi Scan Results ===");
    let _ = writeln!(out, "Scan Duration: {}s", duration.as_secs());
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));

    if aps.is_empty() {
        out.push_str("No Wi-Fi networks detected.\n");
        return out;
    }

    for ap in aps {
        let _ = writeln!(out, "\nSSID: {}", ap.display_name());
        let _ = writeln!(out, "   - BSSID: {} -> {}", ap.bssid, vendors.get(&ap.bssid));
        let _ = writeln!(out, "   - Channel: {}", ap.channel);
        let _ = writeln!(out, "   - Signal Strength: {} dBm", ap.signal);
        let _ = writeln!(out, "   - Security: {}", ap.security);
        if !ap.clients.is_empty() {
            out.push_str("   +- Connected Devices:\n");
            for client in &ap.clients {
                let _ = writeln!(
                    out,
                    "      - Device: {} -> {} (Signal: {} dBm)",
                    client.mac,
                    vendors.get(&client.mac),
                    client.signal
                );
            }
        }
    }
    out
}

/// Bluetooth section, one line per device.
pub fn bluetooth_section(devices: &[BluetoothDevice], vendors: &VendorBook) -> String {
    let mut out = String::from("Bluetooth Scan Results:\n----------------------\n");
    if devices.is_empty() {
        out.push_str("No Bluetooth devices found.\n");
        return out;
    }
    for dev in devices {
        let _ = writeln!(
            out,
            "{} ({}) - {} (RSSI: {} dBm)",
            dev.address,
            vendors.get(&dev.address),
            dev.name,
            dev.rssi
        );
    }
    out
}

/// Sub-GHz section listing at most `limit` events.
pub fn radio_section(frequency: &str, duration: Duration, events: &[RfEvent], limit: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== RTL433 Scan Results ({}) ===", frequency);
    let _ = writeln!(out, "Scan Duration: {}s", duration.as_secs());
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));

    if events.is_empty() {
        out.push_str("No devices detected.\n");
        return out;
    }
    for event in events.iter().take(limit) {
        let _ = writeln!(out, "\n--> Device Model: {}", event.model());
        for (key, value) in event.details() {
            let _ = writeln!(out, "   - {}: {}", key, value);
        }
    }
    if events.len() > limit {
        let _ = writeln!(out, "\n({} more events not shown)", events.len() - limit);
    }
    out
}

/// Section recorded when a step could not run.
pub fn failed_section(title: &str, reason: &str) -> String {
    format!(
        "{}\n{}\nScan failed: {}\n",
        title,
        "-".repeat(title.len()),
        reason
    )
}
