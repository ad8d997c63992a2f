//! Monitor command - periodic scans until interrupted.

use std::time::Duration;

use airspy_core::cancel::sleep_or_cancel;
use airspy_core::{Monitor, MonitorUpdate};
use anyhow::Result;
use chrono::Local;

use super::Context;
use crate::terminal::print;

/// Plain console monitor, used when the terminal UI is unavailable.
pub async fn run(ctx: &Context) -> Result<()> {
    let settings = ctx.config.monitor_settings();
    if !ctx.json {
        print::status(&format!(
            "Monitoring every {}s, press Ctrl-C to stop...",
            settings.interval.as_secs()
        ));
    }

    let handle = Monitor::spawn(
        ctx.wifi_scanner(),
        ctx.bluetooth_scanner(),
        ctx.radio_scanner(),
        settings,
    )?;

    loop {
        for update in handle.try_iter() {
            if ctx.json {
                print_json(&update)?;
            } else {
                print_update(&update);
            }
        }
        if sleep_or_cancel(Duration::from_millis(200), &ctx.cancel).await {
            break;
        }
    }

    if !ctx.json {
        print::status("Stopping monitor...");
    }
    handle.stop();
    Ok(())
}

fn print_json(update: &MonitorUpdate) -> Result<()> {
    let line = match update {
        MonitorUpdate::Wifi(aps) => serde_json::json!({ "wifi": aps }),
        MonitorUpdate::Bluetooth(devices) => serde_json::json!({ "bluetooth": devices }),
        MonitorUpdate::Radio(events) => serde_json::json!({ "radio": events }),
        MonitorUpdate::Status(message) => serde_json::json!({ "status": message }),
    };
    println!("{}", serde_json::to_string(&line)?);
    Ok(())
}

fn print_update(update: &MonitorUpdate) {
    let now = Local::now().format("%H:%M:%S");
    match update {
        MonitorUpdate::Wifi(aps) => {
            print::success(&format!("[{}] {} Wi-Fi networks", now, aps.len()));
            for ap in aps {
                println!(
                    "    {:<24} {} ch {:>3} {}",
                    print::truncate(ap.display_name(), 24),
                    ap.bssid,
                    ap.channel,
                    print::signal(ap.signal)
                );
            }
        }
        MonitorUpdate::Bluetooth(devices) => {
            print::success(&format!("[{}] {} Bluetooth devices", now, devices.len()));
            for device in devices {
                println!(
                    "    {} {:<28} {}",
                    device.address,
                    print::truncate(&device.name, 28),
                    print::signal(device.rssi)
                );
            }
        }
        MonitorUpdate::Radio(events) => {
            print::success(&format!("[{}] {} RF events", now, events.len()));
            for event in events {
                println!("    {}: {}", event.model(), event.summary());
            }
        }
        MonitorUpdate::Status(message) => print::status(&format!("[{}] {}", now, message)),
    }
}
