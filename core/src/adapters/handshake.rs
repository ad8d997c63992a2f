//! Targeted handshake capture with `airodump-ng` and EAPOL confirmation
//! with `tshark`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cancel::CancellationToken;
use crate::domain::{parse_mac, HandshakeOutcome, HandshakeTarget};
use crate::error::{Error, Result};
use crate::process::{copy_tool_file, run_bounded, ToolCommand};

use super::airodump::{CapturePrefix, AIRODUMP};

pub(crate) const TSHARK: &str = "tshark";

/// Default directory for saved handshakes, relative to the working directory.
pub const DEFAULT_HANDSHAKE_DIR: &str = "captured_handshake";

/// Count EAPOL frames in a capture file using `tshark -r <file> -Y eapol`.
pub async fn count_eapol_frames(capture: &Path) -> Result<usize> {
    count_eapol_with(TSHARK, capture).await
}

async fn count_eapol_with(tshark: &str, capture: &Path) -> Result<usize> {
    let output = ToolCommand::new(tshark)
        .arg("-r")
        .arg(capture)
        .args(["-Y", "eapol"])
        .output()
        .await?;

    if !output.status.success() {
        return Err(Error::CommandFailed(format!(
            "tshark could not read {}: {}",
            capture.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(count_frames(&String::from_utf8_lossy(&output.stdout)))
}

/// One summary line per matching frame.
fn count_frames(tshark_output: &str) -> usize {
    tshark_output.lines().filter(|l| !l.trim().is_empty()).count()
}

/// Captures handshakes on one monitor-mode interface.
#[derive(Debug, Clone)]
pub struct HandshakeCapture {
    interface: String,
    sudo: bool,
    output_dir: PathBuf,
    capture_dir: PathBuf,
    airodump: String,
    tshark: String,
}

impl HandshakeCapture {
    pub fn new(interface: impl Into<String>, sudo: bool, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            interface: interface.into(),
            sudo,
            output_dir: output_dir.into(),
            capture_dir: std::env::temp_dir(),
            airodump: AIRODUMP.to_string(),
            tshark: TSHARK.to_string(),
        }
    }

    /// Use other binaries in place of `airodump-ng` and `tshark`.
    pub fn with_programs(mut self, airodump: impl Into<String>, tshark: impl Into<String>) -> Self {
        self.airodump = airodump.into();
        self.tshark = tshark.into();
        self
    }

    /// Write temporary capture files under `dir`.
    pub fn with_capture_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.capture_dir = dir.into();
        self
    }

    /// Directory saved handshakes are copied to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn command(&self, target: &HandshakeTarget, bssid: &str, prefix: &CapturePrefix) -> ToolCommand {
        ToolCommand::new(&self.airodump)
            .arg("-d")
            .arg(bssid)
            .arg("-c")
            .arg(target.channel.to_string())
            .arg("-w")
            .arg(prefix.path())
            .arg(&self.interface)
            .sudo(self.sudo)
    }

    /// Capture on the target's channel for `duration`, then look for EAPOL
    /// frames. Temporary capture files are removed in every case.
    pub async fn capture(
        &self,
        target: &HandshakeTarget,
        duration: Duration,
        cancel: &CancellationToken,
    ) -> Result<HandshakeOutcome> {
        let bssid = parse_mac(&target.bssid)?;
        if target.channel <= 0 {
            return Err(Error::InvalidArgument(format!(
                "Invalid channel for {}: {}",
                bssid, target.channel
            )));
        }

        let prefix = CapturePrefix::new(&self.capture_dir);
        let command = self.command(target, &bssid, &prefix);
        info!(bssid = %bssid, channel = target.channel, "Capturing handshake");

        let result = self.capture_into(&command, &prefix, target, duration, cancel).await;
        prefix.cleanup(self.sudo).await;
        result
    }

    async fn capture_into(
        &self,
        command: &ToolCommand,
        prefix: &CapturePrefix,
        target: &HandshakeTarget,
        duration: Duration,
        cancel: &CancellationToken,
    ) -> Result<HandshakeOutcome> {
        let run = run_bounded(command, duration, cancel).await?;
        debug!(?run, "Handshake capture finished");

        let capture = prefix.file("cap");
        if !tokio::fs::try_exists(&capture).await.unwrap_or(false) {
            warn!(path = %capture.display(), "Capture file not found");
            return Ok(HandshakeOutcome::CaptureMissing);
        }

        let frames = count_eapol_with(&self.tshark, &capture).await?;
        if frames == 0 {
            return Ok(HandshakeOutcome::NoHandshake);
        }

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let destination = self.output_dir.join(target.capture_file_name());
        copy_tool_file(&capture, &destination, self.sudo).await?;
        info!(frames, path = %destination.display(), "Handshake saved");

        Ok(HandshakeOutcome::Captured {
            eapol_frames: frames,
            saved_to: destination,
        })
    }
}
