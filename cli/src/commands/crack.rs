//! Crack command - dictionary attack on a captured handshake.

use std::path::PathBuf;

use airspy_core::adapters::{Aircrack, CrackRequest};
use anyhow::Result;

use super::Context;
use crate::terminal::print;

pub async fn run(ctx: &Context, capture: PathBuf, wordlist: PathBuf, bssid: Option<String>) -> Result<()> {
    let request = CrackRequest {
        capture,
        wordlist,
        bssid,
    };
    let json = ctx.json;
    let outcome = Aircrack::new(ctx.config.sudo)
        .crack(&request, &ctx.cancel, |line| {
            if !json {
                println!("{}", line);
            }
        })
        .await?;

    if json {
        return print::json(&outcome);
    }
    match outcome.key {
        Some(key) => print::success(&format!("KEY FOUND: {}", key)),
        None => print::failure("Key not found in the wordlist."),
    }
    Ok(())
}
