//! Radio command - sub-GHz decoding.

use std::time::Duration;

use airspy_core::application::{monitor_radio, scan_radio};
use airspy_core::cancel::Deadline;
use airspy_core::domain::OutputFormat;
use airspy_core::RfEvent;
use anyhow::Result;
use colored::*;

use super::Context;
use crate::terminal::print;

pub struct RadioArgs {
    pub frequency: Option<String>,
    pub duration: u64,
    pub live: bool,
    pub gain: Option<String>,
    pub protocol: Option<String>,
    pub format: OutputFormat,
    pub device: Option<String>,
}

pub async fn run(ctx: &Context, args: RadioArgs) -> Result<()> {
    let mut config = ctx.config.radio_config(args.frequency.as_deref());
    if args.gain.is_some() {
        config.gain = args.gain;
    }
    if let Some(device) = args.device {
        config.device = device;
    }
    config.protocol = args.protocol;
    config.output = args.format;

    let scanner = ctx.radio_scanner();

    // Only JSON output can be decoded into events; other formats pass through.
    if config.output != OutputFormat::Json {
        let cancel = ctx.cancel.child_token();
        let deadline = (!args.live).then(|| Deadline::start(&cancel, Duration::from_secs(args.duration)));
        let streamed = scanner
            .stream_raw(&config, &cancel, |line| println!("{}", line))
            .await;
        drop(deadline);
        streamed?;
        return Ok(());
    }

    if args.live {
        if !ctx.json {
            print::status(&format!(
                "Listening on {} until Ctrl-C...",
                config.frequency
            ));
        }
        let json = ctx.json;
        let count = monitor_radio(&scanner, &config, &ctx.cancel, |event| {
            if json {
                if let Ok(line) = serde_json::to_string(event) {
                    println!("{}", line);
                }
            } else {
                print_event(event);
            }
        })
        .await?;
        if !json {
            print::success(&format!("{} events received", count));
        }
        return Ok(());
    }

    if !ctx.json {
        print::status(&format!(
            "Scanning {} for {}s...",
            config.frequency, args.duration
        ));
    }
    let events = scan_radio(&scanner, &config, Duration::from_secs(args.duration), &ctx.cancel).await?;

    if ctx.json {
        return print::json(&events);
    }
    if events.is_empty() {
        print::failure("No devices detected.");
        return Ok(());
    }
    print::header(&format!("rf devices at {}", config.frequency));
    for event in &events {
        print_event(event);
    }
    println!("\nTotal: {} events", events.len());
    Ok(())
}

fn print_event(event: &RfEvent) {
    println!("{} {}", "-->".bright_black(), event.model().bold().green());
    for (key, value) in event.details() {
        println!("    {}: {}", key.cyan(), value);
    }
}
