//! Bluetooth Low Energy device model.

use serde::{Deserialize, Serialize};

use super::wifi::UNKNOWN_SIGNAL;

/// A device reported by BLE discovery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BluetoothDevice {
    /// Advertised name, or the address when the device has none.
    pub name: String,
    /// Device address.
    pub address: String,
    /// Received signal strength in dBm.
    pub rssi: i32,
}

impl BluetoothDevice {
    /// Create a device, falling back to the address when `name` is missing or blank.
    pub fn new(name: Option<String>, address: impl Into<String>, rssi: Option<i32>) -> Self {
        let address = address.into();
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| address.clone());
        Self {
            name,
            address,
            rssi: rssi.unwrap_or(UNKNOWN_SIGNAL),
        }
    }

    /// Whether the device advertised a real name.
    pub fn has_name(&self) -> bool {
        self.name != self.address
    }
}

/// Sort devices strongest first.
pub fn sort_by_rssi(devices: &mut [BluetoothDevice]) {
    devices.sort_by(|a, b| b.rssi.cmp(&a.rssi));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_fallback() {
        let dev = BluetoothDevice::new(None, "AA:BB:CC:DD:EE:FF", Some(-60));
        assert_eq!(dev.name, "AA:BB:CC:DD:EE:FF");
        assert!(!dev.has_name());

        let blank = BluetoothDevice::new(Some("  ".to_string()), "AA:BB:CC:DD:EE:FF", None);
        assert_eq!(blank.name, "AA:BB:CC:DD:EE:FF");
        assert_eq!(blank.rssi, UNKNOWN_SIGNAL);

        let named = BluetoothDevice::new(Some("Headset".to_string()), "AA:BB:CC:DD:EE:FF", None);
        assert!(named.has_name());
    }

    #[test]
    fn test_sort_by_rssi() {
        let mut devices = vec![
            BluetoothDevice::new(None, "00:00:00:00:00:01", Some(-80)),
            BluetoothDevice::new(None, "00:00:00:00:00:02", Some(-40)),
            BluetoothDevice::new(None, "00:00:00:00:00:03", None),
        ];
        sort_by_rssi(&mut devices);
        let rssi: Vec<i32> = devices.iter().map(|d| d.rssi).collect();
        assert_eq!(rssi, vec![-40, -80, -100]);
    }
}
