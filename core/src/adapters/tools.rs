//! Availability of the wrapped command-line tools.

use std::path::PathBuf;

use serde::Serialize;

use crate::process::locate;

use super::aircrack::AIRCRACK;
use super::aireplay::{AIREPLAY, IW, IWCONFIG};
use super::airodump::AIRODUMP;
use super::bluetoothctl::BLUETOOTHCTL;
use super::handshake::TSHARK;
use super::rtl433::RTL_433;

/// Every external binary airspy may invoke, with what it is used for.
pub const KNOWN_TOOLS: &[(&str, &str)] = &[
    (AIRODUMP, "Wi-Fi scanning and handshake capture"),
    (AIREPLAY, "Deauthentication"),
    (AIRCRACK, "Offline key recovery"),
    ("airmon-ng", "Enabling monitor mode"),
    (RTL_433, "Sub-GHz decoding"),
    (BLUETOOTHCTL, "Bluetooth discovery"),
    (TSHARK, "EAPOL inspection"),
    (IWCONFIG, "Monitor mode check"),
    (IW, "Monitor mode check (fallback)"),
];

/// Whether one tool was found on `PATH`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolStatus {
    pub name: String,
    pub purpose: String,
    pub path: Option<PathBuf>,
}

impl ToolStatus {
    pub fn is_available(&self) -> bool {
        self.path.is_some()
    }
}

/// Look up every known tool.
pub fn check_tools() -> Vec<ToolStatus> {
    KNOWN_TOOLS
        .iter()
        .map(|(name, purpose)| ToolStatus {
            name: name.to_string(),
            purpose: purpose.to_string(),
            path: locate(name),
        })
        .collect()
}
