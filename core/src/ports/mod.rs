//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interfaces that the application layer uses
//! to interact with the wrapped tools. Implementations live in `adapters`.

mod bluetooth;
mod radio;
mod vendor;
mod wifi;

pub use bluetooth::BluetoothScannerPort;
pub use radio::{RadioScannerPort, RadioSession, SessionRead};
pub use vendor::{VendorLookupPort, UNKNOWN_VENDOR};
pub use wifi::WifiScannerPort;
