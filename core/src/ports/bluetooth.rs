//! Bluetooth scanner port (interface).

use std::time::Duration;

use crate::cancel::CancellationToken;
use crate::domain::BluetoothDevice;
use crate::error::Result;

/// Port for BLE device discovery.
///
/// A scan is bounded by `duration`. Reaching the deadline is not an error:
/// implementations return whatever was discovered so far.
pub trait BluetoothScannerPort: Send + Sync {
    fn scan(
        &self,
        duration: Duration,
        cancel: &CancellationToken,
    ) -> impl std::future::Future<Output = Result<Vec<BluetoothDevice>>> + Send;
}
