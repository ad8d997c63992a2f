//! Handshake capture and key recovery models.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Access point targeted by a handshake capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeTarget {
    pub bssid: String,
    pub channel: i32,
    /// Network name, used to name the saved capture.
    pub essid: String,
}

impl HandshakeTarget {
    pub fn new(bssid: impl Into<String>, channel: i32, essid: impl Into<String>) -> Self {
        Self {
            bssid: bssid.into(),
            channel,
            essid: essid.into(),
        }
    }

    /// File name for the saved capture.
    ///
    /// Falls back to the BSSID for hidden networks.
    pub fn capture_file_name(&self) -> String {
        let base = if self.essid.trim().is_empty() {
            &self.bssid
        } else {
            &self.essid
        };
        format!("{}.cap", sanitize_file_name(base))
    }
}

/// Result of a handshake capture attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HandshakeOutcome {
    /// EAPOL frames were found and the capture was saved.
    Captured { eapol_frames: usize, saved_to: PathBuf },
    /// The capture ran but contained no EAPOL frames.
    NoHandshake,
    /// The capture tool produced no file.
    CaptureMissing,
}

impl HandshakeOutcome {
    pub fn is_captured(&self) -> bool {
        matches!(self, HandshakeOutcome::Captured { .. })
    }

    /// Human readable status line.
    pub fn message(&self) -> String {
        match self {
            HandshakeOutcome::Captured {
                eapol_frames,
                saved_to,
            } => format!(
                "Handshake captured! {} EAPOL packets found. Saved to {}",
                eapol_frames,
                saved_to.display()
            ),
            HandshakeOutcome::NoHandshake => "No handshake captured".to_string(),
            HandshakeOutcome::CaptureMissing => "Capture file not found".to_string(),
        }
    }
}

/// Result of an offline key recovery run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrackOutcome {
    /// Recovered key, if any.
    pub key: Option<String>,
    /// Tool exit code.
    pub exit_code: Option<i32>,
}

/// Replace characters that are unsafe in file names.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "capture".to_string()
    } else {
        cleaned.to_string()
    }
}
