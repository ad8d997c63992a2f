//! Adapters layer - Wrappers around the external tools.
//!
//! This module contains implementations of the port traits defined in `ports`,
//! plus the attack tools that the application layer drives directly.

pub mod aircrack;
pub mod aireplay;
pub mod airodump;
pub mod bluetoothctl;
pub mod handshake;
pub mod rtl433;
pub mod tools;
pub mod vendor;

// Re-export main types for convenience
pub use aircrack::{parse_key_found, Aircrack, CrackRequest};
pub use aireplay::{ensure_monitor_mode, Aireplay, DeauthRequest, DeauthSummary, MONITOR_MODE_HINT};
pub use airodump::AirodumpScanner;
pub use bluetoothctl::BluetoothctlScanner;
pub use handshake::{count_eapol_frames, HandshakeCapture, DEFAULT_HANDSHAKE_DIR};
pub use rtl433::{Rtl433Scanner, Rtl433Session};
pub use tools::{check_tools, ToolStatus, KNOWN_TOOLS};
pub use vendor::{MacVendorsClient, DEFAULT_VENDOR_TIMEOUT, DEFAULT_VENDOR_URL};
