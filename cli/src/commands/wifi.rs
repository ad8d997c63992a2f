//! Wifi command - scan access points and their clients.

use std::time::Duration;

use airspy_core::application::VendorBook;
use airspy_core::domain::{channel_usage, recommend_channel, ChannelRecommendation};
use airspy_core::ports::WifiScannerPort;
use airspy_core::{AccessPoint, WifiFilter};
use anyhow::Result;
use colored::*;
use serde::Serialize;

use super::Context;
use crate::terminal::print;

pub struct WifiArgs {
    pub duration: u64,
    pub filter: WifiFilter,
    pub analyze_channels: bool,
    pub vendors: bool,
}

#[derive(Serialize)]
struct NetworkJson<'a> {
    #[serde(flatten)]
    access_point: &'a AccessPoint,
    vendor: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WifiJson<'a> {
    networks: Vec<NetworkJson<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel_usage: Option<Vec<(i32, usize)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recommendation: Option<ChannelRecommendation>,
}

pub async fn run(ctx: &Context, args: WifiArgs) -> Result<()> {
    let duration = Duration::from_secs(args.duration);
    if !ctx.json {
        print::status(&format!(
            "Scanning Wi-Fi on {} for {}s...",
            ctx.config.interface, args.duration
        ));
    }

    let scanned = ctx.wifi_scanner().scan(duration, &ctx.cancel).await?;
    let aps = args.filter.apply(scanned);
    let vendors = if args.vendors {
        VendorBook::for_access_points(&ctx.vendor_client()?, &aps).await
    } else {
        VendorBook::default()
    };

    let usage = args.analyze_channels.then(|| channel_usage(&aps));
    let recommendation = if args.analyze_channels {
        recommend_channel(&aps)
    } else {
        None
    };

    if ctx.json {
        let networks = aps
            .iter()
            .map(|ap| NetworkJson {
                access_point: ap,
                vendor: vendors.get(&ap.bssid),
            })
            .collect();
        return print::json(&WifiJson {
            networks,
            channel_usage: usage,
            recommendation,
        });
    }

    if aps.is_empty() {
        print::failure("No Wi-Fi networks detected.");
        return Ok(());
    }

    print::header("wi-fi networks");
    println!(
        "{:<24} {:<18} {:>4} {:>9}  {:<18} VENDOR",
        "SSID", "BSSID", "CH", "SIGNAL", "SECURITY"
    );
    print::separator();
    for ap in &aps {
        println!(
            "{:<24} {:<18} {:>4} {:>9}  {:<18} {}",
            print::truncate(ap.display_name(), 24).bold(),
            ap.bssid,
            ap.channel,
            print::signal(ap.signal),
            print::truncate(&ap.security, 18),
            vendors.get(&ap.bssid).dimmed()
        );
        for client in &ap.clients {
            println!(
                "  {} {} {} {}",
                "└─".bright_black(),
                client.mac,
                print::signal(client.signal),
                vendors.get(&client.mac).dimmed()
            );
        }
    }
    println!("\nTotal: {} networks", aps.len());

    if let Some(usage) = usage {
        print_channel_analysis(&usage, recommendation);
    }
    Ok(())
}

fn print_channel_analysis(usage: &[(i32, usize)], recommendation: Option<ChannelRecommendation>) {
    println!();
    print::header("channel analysis");
    for (channel, count) in usage {
        println!("  Channel {:>3}: {}", channel, "█".repeat(*count).cyan());
    }
    match recommendation {
        Some(rec) => print::success(&format!(
            "Recommended channel: {} ({} networks)",
            rec.channel, rec.occupancy
        )),
        None => print::failure("No channel data to analyze."),
    }
}
