//! Audit command - every scan once, into a report file.

use std::path::PathBuf;

use airspy_core::application::StepStatus;
use airspy_core::AuditService;
use anyhow::Result;

use super::Context;
use crate::terminal::print;

pub async fn run(ctx: &Context, output: Option<PathBuf>) -> Result<()> {
    let path = output.unwrap_or_else(|| ctx.config.audit.file.clone());
    let service = AuditService::new(
        ctx.wifi_scanner(),
        ctx.bluetooth_scanner(),
        ctx.radio_scanner(),
        ctx.vendor_client()?,
        ctx.config.audit_settings(),
    );

    if !ctx.json {
        print::status(&format!("Running full audit into {}...", path.display()));
        for step in service.steps() {
            println!("  - {}", step);
        }
    }

    let summary = service.run(&path, &ctx.cancel).await?;

    if ctx.json {
        return print::json(&summary);
    }
    for outcome in &summary.steps {
        match &outcome.status {
            StepStatus::Completed { found } => {
                print::success(&format!("{}: {} found", outcome.step, found))
            }
            StepStatus::Failed { reason } => {
                print::failure(&format!("{}: {}", outcome.step, reason))
            }
        }
    }
    if summary.interrupted {
        print::failure("Audit interrupted.");
    }
    print::success(&format!("Report saved to {}", summary.report.display()));
    Ok(())
}
