//! MAC vendor lookup port (interface).

/// Vendor string returned whenever a lookup fails.
pub const UNKNOWN_VENDOR: &str = "Unknown";

/// Port for resolving the manufacturer of a MAC address.
///
/// Lookups never fail: any error degrades to [`UNKNOWN_VENDOR`].
pub trait VendorLookupPort: Send + Sync {
    fn lookup(&self, mac: &str) -> impl std::future::Future<Output = String> + Send;
}
