//! Handshake command - capture a WPA handshake from one network.

use std::path::PathBuf;
use std::time::Duration;

use airspy_core::adapters::HandshakeCapture;
use airspy_core::HandshakeTarget;
use anyhow::{bail, Result};

use super::Context;
use crate::terminal::print;

pub struct HandshakeArgs {
    pub bssid: String,
    pub channel: i32,
    pub essid: String,
    pub duration: Option<u64>,
    pub output_dir: Option<PathBuf>,
}

pub async fn run(ctx: &Context, args: HandshakeArgs) -> Result<()> {
    let output_dir = args
        .output_dir
        .unwrap_or_else(|| ctx.config.handshake.dir.clone());
    let duration = args.duration.unwrap_or(ctx.config.handshake.duration_secs);
    let capture = HandshakeCapture::new(&ctx.config.interface, ctx.config.sudo, output_dir);
    let target = HandshakeTarget::new(args.bssid, args.channel, args.essid);

    if !ctx.json {
        print::status(&format!(
            "Capturing handshake from {} on channel {} for {}s...",
            target.bssid, target.channel, duration
        ));
    }

    let outcome = capture
        .capture(&target, Duration::from_secs(duration), &ctx.cancel)
        .await?;

    if ctx.json {
        return print::json(&outcome);
    }
    if outcome.is_captured() {
        print::success(&outcome.message());
        Ok(())
    } else {
        bail!(outcome.message())
    }
}
