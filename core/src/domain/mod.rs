//! Domain layer - Scan results and attack targets.
//!
//! These types have no I/O dependencies and can be tested in isolation.

mod bluetooth;
mod handshake;
mod mac;
mod radio;
mod wifi;

pub use bluetooth::{sort_by_rssi, BluetoothDevice};
pub use handshake::{sanitize_file_name, CrackOutcome, HandshakeOutcome, HandshakeTarget};
pub use mac::{is_mac, parse_mac};
pub use radio::{OutputFormat, RadioConfig, RfEvent, DEFAULT_DEVICE, DEFAULT_FREQUENCY, UNKNOWN_MODEL};
pub use wifi::{
    attach_stations, channel_usage, recommend_channel, sort_by_signal, AccessPoint,
    ChannelRange, ChannelRecommendation, Station, WifiFilter, UNKNOWN_CHANNEL, UNKNOWN_SIGNAL,
};
