//! Bluetooth command - BLE discovery.

use std::time::Duration;

use airspy_core::application::VendorBook;
use airspy_core::ports::BluetoothScannerPort;
use airspy_core::BluetoothDevice;
use anyhow::Result;
use colored::*;
use serde::Serialize;

use super::Context;
use crate::terminal::print;

#[derive(Serialize)]
struct DeviceJson<'a> {
    #[serde(flatten)]
    device: &'a BluetoothDevice,
    vendor: &'a str,
}

pub async fn run(ctx: &Context, duration: u64, vendors: bool) -> Result<()> {
    if !ctx.json {
        print::status(&format!("Scanning Bluetooth devices for {}s...", duration));
    }

    let devices = ctx
        .bluetooth_scanner()
        .scan(Duration::from_secs(duration), &ctx.cancel)
        .await?;
    let book = if vendors {
        VendorBook::for_devices(&ctx.vendor_client()?, &devices).await
    } else {
        VendorBook::default()
    };

    if ctx.json {
        let out: Vec<DeviceJson> = devices
            .iter()
            .map(|device| DeviceJson {
                device,
                vendor: book.get(&device.address),
            })
            .collect();
        return print::json(&out);
    }

    if devices.is_empty() {
        print::failure("No Bluetooth devices found.");
        return Ok(());
    }

    print::header("bluetooth devices");
    println!("{:<18} {:<28} {:>9}  VENDOR", "ADDRESS", "NAME", "RSSI");
    print::separator();
    for device in &devices {
        let name = print::truncate(&device.name, 28);
        let name = if device.has_name() { name.bold() } else { name.dimmed() };
        println!(
            "{:<18} {:<28} {:>9}  {}",
            device.address,
            name,
            print::signal(device.rssi),
            book.get(&device.address).dimmed()
        );
    }
    println!("\nTotal: {} devices", devices.len());
    Ok(())
}
