//! Subcommand implementations.

pub mod audit;
pub mod bluetooth;
pub mod config;
pub mod crack;
pub mod deauth;
pub mod handshake;
pub mod monitor;
pub mod radio;
pub mod tools;
pub mod wifi;

use std::path::PathBuf;

use airspy_core::adapters::{AirodumpScanner, BluetoothctlScanner, MacVendorsClient, Rtl433Scanner};
use airspy_core::process;
use airspy_core::{CancellationToken, Config, ConfigStore};
use tracing::warn;

/// Settings and flags shared by every subcommand.
pub struct Context {
    pub config: Config,
    pub json: bool,
    pub cancel: CancellationToken,
}

impl Context {
    /// Load the config file and apply command-line overrides.
    pub async fn load(
        config_path: Option<PathBuf>,
        interface: Option<String>,
        no_sudo: bool,
        json: bool,
    ) -> anyhow::Result<Self> {
        let mut config = store(config_path)?.load().await?;
        if let Some(interface) = interface {
            config.interface = interface;
        }
        if no_sudo {
            config.sudo = false;
        }
        Ok(Self {
            config,
            json,
            cancel: cancel_on_ctrl_c(),
        })
    }

    /// Ask for the sudo password before any tool starts.
    pub async fn authorize_sudo(&self) {
        if !self.config.sudo {
            return;
        }
        if let Err(e) = process::authorize_sudo().await {
            warn!(error = %e, "sudo credentials not available, privileged tools may fail");
        }
    }

    pub fn wifi_scanner(&self) -> AirodumpScanner {
        AirodumpScanner::new(&self.config.interface, self.config.sudo)
    }

    pub fn bluetooth_scanner(&self) -> BluetoothctlScanner {
        BluetoothctlScanner::new()
    }

    pub fn radio_scanner(&self) -> Rtl433Scanner {
        Rtl433Scanner::new()
    }

    pub fn vendor_client(&self) -> anyhow::Result<MacVendorsClient> {
        Ok(MacVendorsClient::new(
            &self.config.vendor.url,
            self.config.vendor_timeout(),
        )?)
    }
}

pub fn store(config_path: Option<PathBuf>) -> anyhow::Result<ConfigStore> {
    Ok(match config_path {
        Some(path) => ConfigStore::with_path(path),
        None => ConfigStore::new()?,
    })
}

/// Token cancelled by the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => trigger.cancel(),
            Err(e) => warn!(error = %e, "Cannot listen for Ctrl-C"),
        }
    });
    cancel
}
