//! Resolving vendors for every address in a scan.

use std::collections::HashMap;

use crate::domain::{AccessPoint, BluetoothDevice};
use crate::ports::{VendorLookupPort, UNKNOWN_VENDOR};

/// Vendor names keyed by upper-cased MAC address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorBook {
    vendors: HashMap<String, String>,
}

impl VendorBook {
    /// Resolve each distinct address once, in order.
    pub async fn resolve<'a, V, I>(lookup: &V, macs: I) -> Self
    where
        V: VendorLookupPort,
        I: IntoIterator<Item = &'a str>,
    {
        let mut vendors = HashMap::new();
        for mac in macs {
            let key = mac.to_ascii_uppercase();
            if vendors.contains_key(&key) {
                continue;
            }
            let vendor = lookup.lookup(mac).await;
            vendors.insert(key, vendor);
        }
        Self { vendors }
    }

    /// Resolve access points and their clients.
    pub async fn for_access_points<V: VendorLookupPort>(lookup: &V, aps: &[AccessPoint]) -> Self {
        let macs = aps.iter().flat_map(|ap| {
            std::iter::once(ap.bssid.as_str()).chain(ap.clients.iter().map(|c| c.mac.as_str()))
        });
        Self::resolve(lookup, macs).await
    }

    pub async fn for_devices<V: VendorLookupPort>(lookup: &V, devices: &[BluetoothDevice]) -> Self {
        Self::resolve(lookup, devices.iter().map(|d| d.address.as_str())).await
    }

    /// Vendor for `mac`, or `"Unknown"` when it was never resolved.
    pub fn get(&self, mac: &str) -> &str {
        self.vendors
            .get(&mac.to_ascii_uppercase())
            .map(String::as_str)
            .unwrap_or(UNKNOWN_VENDOR)
    }

    pub fn len(&self) -> usize {
        self.vendors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::ports::{VendorLookupPort, UNKNOWN_VENDOR};

    /// Lookup backed by a fixed table.
    #[derive(Default, Clone)]
    pub struct TableLookup {
        pub table: HashMap<String, String>,
        pub calls: Arc<AtomicUsize>,
    }

    impl TableLookup {
        pub fn new(entries: &[(&str, &str)]) -> Self {
            Self {
                table: entries
                    .iter()
                    .map(|(mac, vendor)| (mac.to_string(), vendor.to_string()))
                    .collect(),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl VendorLookupPort for TableLookup {
        async fn lookup(&self, mac: &str) -> String {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.table
                .get(mac)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_VENDOR.to_string())
        }
    }
}
