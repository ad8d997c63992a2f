//! Offline key recovery through `aircrack-ng`.

use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::timeout;
use tracing::{debug, info};

use crate::cancel::CancellationToken;
use crate::domain::{parse_mac, CrackOutcome};
use crate::error::{Error, Result};
use crate::process::{ToolCommand, TERMINATE_GRACE_PERIOD};

pub(crate) const AIRCRACK: &str = "aircrack-ng";

/// Input files for one cracking run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrackRequest {
    pub capture: PathBuf,
    pub wordlist: PathBuf,
    /// Select one network when the capture holds several.
    pub bssid: Option<String>,
}

/// Extract the key from a `KEY FOUND! [ secret ]` line.
pub fn parse_key_found(line: &str) -> Option<String> {
    let start = line.find("KEY FOUND!")?;
    let rest = &line[start..];
    let open = rest.find('[')?;
    let close = rest.rfind(']')?;
    if close <= open {
        return None;
    }
    Some(rest[open + 1..close].trim().to_string())
}

/// Strip terminal control sequences aircrack-ng emits even when piped.
fn clean_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            if chars.peek() == Some(&'[') {
                chars.next();
                for next in chars.by_ref() {
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
            continue;
        }
        if c == '\r' || (c.is_control() && c != '\t') {
            continue;
        }
        out.push(c);
    }
    out.trim_end().to_string()
}

async fn require_file(path: &Path, what: &str) -> Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => Err(Error::Precondition(format!(
            "{} not found: {}",
            what,
            path.display()
        ))),
    }
}

/// Runs `aircrack-ng` against a capture and a wordlist.
#[derive(Debug, Clone)]
pub struct Aircrack {
    sudo: bool,
    program: String,
}

impl Aircrack {
    pub fn new(sudo: bool) -> Self {
        Self {
            sudo,
            program: AIRCRACK.to_string(),
        }
    }

    pub fn command(&self, request: &CrackRequest) -> Result<ToolCommand> {
        let mut command = ToolCommand::new(&self.program)
            .arg("-w")
            .arg(&request.wordlist)
            .sudo(self.sudo);
        if let Some(ref bssid) = request.bssid {
            command = command.arg("-b").arg(parse_mac(bssid)?);
        }
        Ok(command.arg(&request.capture).capture_stdout())
    }

    /// Run the cracker, passing each output line to `on_line` as it is
    /// produced. Both input files must exist.
    pub async fn crack<F>(
        &self,
        request: &CrackRequest,
        cancel: &CancellationToken,
        on_line: F,
    ) -> Result<CrackOutcome>
    where
        F: FnMut(&str) + Send,
    {
        require_file(&request.capture, "Capture file").await?;
        require_file(&request.wordlist, "Wordlist").await?;
        let command = self.command(request)?;
        run_crack(&command, cancel, on_line).await
    }
}

impl Default for Aircrack {
    fn default() -> Self {
        Self::new(false)
    }
}

pub(crate) async fn run_crack<F>(
    command: &ToolCommand,
    cancel: &CancellationToken,
    mut on_line: F,
) -> Result<CrackOutcome>
where
    F: FnMut(&str) + Send,
{
    info!(tool = %command, "Starting key recovery");
    let mut process = command.spawn()?;
    let stdout = process
        .take_stdout()
        .ok_or_else(|| Error::CommandFailed("Cracker output not captured".to_string()))?;
    let mut lines = BufReader::new(stdout).lines();
    let mut key = None;

    let cancelled = loop {
        tokio::select! {
            _ = cancel.cancelled() => break true,
            line = lines.next_line() => match line? {
                Some(raw) => {
                    let line = clean_line(&raw);
                    if line.is_empty() {
                        continue;
                    }
                    if let Some(found) = parse_key_found(&line) {
                        key = Some(found);
                    }
                    on_line(&line);
                }
                None => break false,
            },
        }
    };

    let status = if cancelled {
        process.terminate().await?
    } else {
        // Output closed: the tool is exiting on its own.
        let waited = timeout(TERMINATE_GRACE_PERIOD, process.wait()).await;
        match waited {
            Ok(status) => status?,
            Err(_) => process.terminate().await?,
        }
    };
    debug!(?status, cancelled, "Key recovery finished");
    if cancelled && key.is_none() {
        return Err(Error::Cancelled);
    }

    Ok(CrackOutcome {
        key,
        exit_code: status.code(),
    })
}
