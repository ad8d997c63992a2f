//! Airspy Core Library
//!
//! Wireless reconnaissance built on established command-line tools.
//! Provides functionality to:
//! - Scan Wi-Fi access points and clients (`airodump-ng`)
//! - Scan Bluetooth Low Energy devices (`bluetoothctl`)
//! - Decode sub-GHz transmissions (`rtl_433`)
//! - Deauthenticate clients (`aireplay-ng`)
//! - Capture and crack WPA handshakes (`airodump-ng`, `tshark`, `aircrack-ng`)
//! - Run a full audit into a report file, or monitor continuously
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Scan results, targets and pure analysis
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: External tool wrappers
//! - `application`: Use case services
//!
//! # Platform Support
//! Linux with the wrapped tools installed. Capture and attack tools run
//! through `sudo` unless disabled.

// Hexagonal architecture layers
pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub mod cancel;
pub mod config;
pub mod error;
pub mod process;

// Re-export domain types (primary API)
pub use domain::{
    AccessPoint, BluetoothDevice, ChannelRange, HandshakeOutcome, HandshakeTarget, RadioConfig,
    RfEvent, Station, WifiFilter,
};

// Re-export other commonly used types
pub use application::{AuditService, Monitor, MonitorHandle, MonitorUpdate};
pub use cancel::CancellationToken;
pub use config::{Config, ConfigStore};
pub use error::{Error, Result};
