//! Config command - show or initialize the configuration file.

use std::path::PathBuf;

use airspy_core::Config;
use anyhow::Result;

use super::store;
use crate::terminal::print;

pub async fn show(config_path: Option<PathBuf>, json: bool) -> Result<()> {
    let store = store(config_path)?;
    let config = store.load().await?;

    if json {
        return print::json(&config);
    }

    print::header("configuration");
    print::aligned("File", store.path().display(), 18);
    print_config(&config);
    Ok(())
}

pub async fn init(config_path: Option<PathBuf>, force: bool) -> Result<()> {
    let store = store(config_path)?;
    store.init(force).await?;
    print::success(&format!("Default configuration written to {}", store.path().display()));
    Ok(())
}

fn print_config(config: &Config) {
    const WIDTH: usize = 18;
    print::aligned("Interface", &config.interface, WIDTH);
    print::aligned("Sudo", config.sudo, WIDTH);
    print::aligned("Vendor API", &config.vendor.url, WIDTH);
    print::aligned("Vendor timeout", format!("{} ms", config.vendor.timeout_ms), WIDTH);
    print::aligned("SDR device", &config.radio.device, WIDTH);
    print::aligned("Frequency", &config.radio.frequency, WIDTH);
    print::aligned("Audit file", config.audit.file.display(), WIDTH);
    print::aligned(
        "Audit durations",
        format!(
            "wifi {}s, bluetooth {}s, radio {}s",
            config.audit.wifi_secs, config.audit.bluetooth_secs, config.audit.radio_secs
        ),
        WIDTH,
    );
    print::aligned("Audit bands", config.audit.frequencies.join(", "), WIDTH);
    print::aligned("Monitor interval", format!("{}s", config.monitor.interval_secs), WIDTH);
    print::aligned("RF window", format!("{}s", config.monitor.rf_window_secs), WIDTH);
    print::aligned("Handshake dir", config.handshake.dir.display(), WIDTH);
}
