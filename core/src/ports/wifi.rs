//! Wi-Fi scanner port (interface).

use std::time::Duration;

use crate::cancel::CancellationToken;
use crate::domain::AccessPoint;
use crate::error::Result;

/// Port for Wi-Fi access point discovery.
///
/// Implementations run the capture for `duration` (or until `cancel` fires)
/// and return every access point seen, with clients attached. Filtering and
/// ordering are left to the caller.
pub trait WifiScannerPort: Send + Sync {
    fn scan(
        &self,
        duration: Duration,
        cancel: &CancellationToken,
    ) -> impl std::future::Future<Output = Result<Vec<AccessPoint>>> + Send;
}
