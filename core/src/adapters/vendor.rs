//! MAC vendor lookup over HTTP.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::error::{Error, Result};
use crate::ports::{VendorLookupPort, UNKNOWN_VENDOR};

/// Public MAC vendor API.
pub const DEFAULT_VENDOR_URL: &str = "https://api.macvendors.com";

/// Per-request timeout.
pub const DEFAULT_VENDOR_TIMEOUT: Duration = Duration::from_secs(2);

/// Client for a `GET <base>/<mac>` vendor API returning plain text.
///
/// Successful answers are cached for the lifetime of the client; failures
/// are not, so a later lookup may still succeed.
pub struct MacVendorsClient {
    client: Client,
    base_url: String,
    cache: RwLock<HashMap<String, String>>,
}

impl MacVendorsClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("airspy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Client against the public API with the default timeout.
    pub fn public() -> Result<Self> {
        Self::new(DEFAULT_VENDOR_URL, DEFAULT_VENDOR_TIMEOUT)
    }

    async fn fetch(&self, mac: &str) -> Option<String> {
        let url = format!("{}/{}", self.base_url, mac);
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(mac, error = %e, "Vendor lookup failed");
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            debug!(mac, status = %response.status(), "Vendor lookup rejected");
            return None;
        }

        match response.text().await {
            Ok(body) => Some(body.trim().to_string()),
            Err(e) => {
                debug!(mac, error = %e, "Vendor response unreadable");
                None
            }
        }
    }
}

impl VendorLookupPort for MacVendorsClient {
    async fn lookup(&self, mac: &str) -> String {
        let key = mac.to_ascii_uppercase();
        let cached = self.cache.read().get(&key).cloned();
        if let Some(vendor) = cached {
            return vendor;
        }

        match self.fetch(mac).await {
            Some(vendor) => {
                self.cache.write().insert(key, vendor.clone());
                vendor
            }
            None => UNKNOWN_VENDOR.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve every connection with the same raw HTTP response, counting hits.
    async fn serve(response: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", addr), hits)
    }

    #[tokio::test]
    async fn test_lookup_ok_trims_and_caches() {
        let (url, hits) = serve(
            "HTTP/1.1 200 OK\r\nContent-Length: 15\r\nConnection: close\r\n\r\n  Apple, Inc.\n\n",
        )
        .await;
        let client = MacVendorsClient::new(url, DEFAULT_VENDOR_TIMEOUT).unwrap();

        assert_eq!(client.lookup("aa:bb:cc:dd:ee:ff").await, "Apple, Inc.");
        assert_eq!(client.lookup("AA:BB:CC:DD:EE:FF").await, "Apple, Inc.");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_lookup_not_found_is_unknown() {
        let (url, hits) = serve(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\nConnection: close\r\n\r\nNot Found",
        )
        .await;
        let client = MacVendorsClient::new(url, DEFAULT_VENDOR_TIMEOUT).unwrap();

        assert_eq!(client.lookup("00:11:22:33:44:55").await, UNKNOWN_VENDOR);
        // Failures are not cached.
        assert_eq!(client.lookup("00:11:22:33:44:55").await, UNKNOWN_VENDOR);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_lookup_timeout_is_unknown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept and never answer.
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client =
            MacVendorsClient::new(format!("http://{}", addr), Duration::from_millis(200)).unwrap();
        let started = std::time::Instant::now();
        assert_eq!(client.lookup("00:11:22:33:44:55").await, UNKNOWN_VENDOR);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_lookup_connection_refused_is_unknown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = MacVendorsClient::new(format!("http://{}/", addr), DEFAULT_VENDOR_TIMEOUT).unwrap();
        assert_eq!(client.lookup("00:11:22:33:44:55").await, UNKNOWN_VENDOR);
    }
}
