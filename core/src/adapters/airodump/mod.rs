//! Wi-Fi scanning through `airodump-ng`.

mod csv;

pub use self::csv::parse_capture;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::cancel::CancellationToken;
use crate::domain::AccessPoint;
use crate::error::Result;
use crate::ports::WifiScannerPort;
use crate::process::{remove_tool_file, run_bounded, ToolCommand};

pub(crate) const AIRODUMP: &str = "airodump-ng";

/// Unique output prefix for one capture run.
///
/// `airodump-ng --write <prefix>` names its files `<prefix>-01.<ext>`.
#[derive(Debug, Clone)]
pub(crate) struct CapturePrefix {
    dir: PathBuf,
    stem: String,
}

impl CapturePrefix {
    pub(crate) fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            stem: format!("airspy-{}", Uuid::new_v4()),
        }
    }

    /// The prefix passed to `--write`.
    pub(crate) fn path(&self) -> PathBuf {
        self.dir.join(&self.stem)
    }

    /// Path of the first output file with extension `ext`.
    pub(crate) fn file(&self, ext: &str) -> PathBuf {
        let mut name = OsString::from(&self.stem);
        name.push(format!("-01.{}", ext));
        self.dir.join(name)
    }

    /// Remove every file the capture tool wrote under this prefix.
    pub(crate) async fn cleanup(&self, sudo: bool) {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "Cannot list capture directory");
                return;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            if !name.to_string_lossy().starts_with(&self.stem) {
                continue;
            }
            let path = entry.path();
            match remove_tool_file(&path, sudo).await {
                Ok(()) => debug!(path = %path.display(), "Removed capture file"),
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove capture file"),
            }
        }
    }
}

/// Access point scanner backed by `airodump-ng`.
#[derive(Debug, Clone)]
pub struct AirodumpScanner {
    interface: String,
    sudo: bool,
    program: String,
    capture_dir: PathBuf,
}

impl AirodumpScanner {
    /// Create a scanner for a monitor-mode `interface`.
    pub fn new(interface: impl Into<String>, sudo: bool) -> Self {
        Self {
            interface: interface.into(),
            sudo,
            program: AIRODUMP.to_string(),
            capture_dir: std::env::temp_dir(),
        }
    }

    /// Use another binary in place of `airodump-ng`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Write capture files under `dir` instead of the system temp directory.
    pub fn with_capture_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.capture_dir = dir.into();
        self
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    async fn capture(&self, duration: Duration, cancel: &CancellationToken) -> Result<Vec<AccessPoint>> {
        let prefix = CapturePrefix::new(&self.capture_dir);
        let command = ToolCommand::new(&self.program)
            .arg(&self.interface)
            .arg("--write")
            .arg(prefix.path())
            .args(["--output-format", "csv"])
            .sudo(self.sudo);

        match run_bounded(&command, duration, cancel).await {
            Ok(run) => debug!(?run, "Wi-Fi capture finished"),
            Err(e) => {
                warn!(error = %e, "Wi-Fi capture could not be run");
                prefix.cleanup(self.sudo).await;
                return Ok(Vec::new());
            }
        }

        let csv_path = prefix.file("csv");
        let result = match tokio::fs::read(&csv_path).await {
            Ok(data) => Ok(parse_capture(&data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    path = %csv_path.display(),
                    "No capture file written. Is {} in monitor mode?",
                    self.interface
                );
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        };

        prefix.cleanup(self.sudo).await;
        result
    }
}

impl WifiScannerPort for AirodumpScanner {
    async fn scan(&self, duration: Duration, cancel: &CancellationToken) -> Result<Vec<AccessPoint>> {
        self.capture(duration, cancel).await
    }
}
