//! Deauth command - disconnect clients from an access point.

use std::time::Duration;

use airspy_core::adapters::{Aireplay, DeauthRequest};
use anyhow::Result;

use super::Context;
use crate::terminal::print;

pub async fn run(ctx: &Context, bssid: String, station: Option<String>, duration: u64) -> Result<()> {
    let request = DeauthRequest {
        bssid,
        station,
        duration: Duration::from_secs(duration),
    };
    let aireplay = Aireplay::new(&ctx.config.interface, ctx.config.sudo);

    if !ctx.json {
        let target = request.station.as_deref().unwrap_or("all clients");
        print::status(&format!(
            "Sending deauthentication packets to {} ({}) for {}s...",
            request.bssid, target, duration
        ));
    }

    let summary = aireplay.deauth(&request, &ctx.cancel).await?;

    if ctx.json {
        return print::json(&summary);
    }
    if summary.interrupted {
        print::failure(&format!(
            "Attack interrupted after {}s.",
            summary.elapsed.as_secs()
        ));
    } else if summary.exited_early {
        print::failure("aireplay-ng stopped before the attack duration elapsed.");
    } else {
        print::success("Deauthentication attack completed.");
    }
    Ok(())
}
