//! Sub-GHz decoding through `rtl_433`.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::ChildStdout;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::cancel::CancellationToken;
use crate::domain::{RadioConfig, RfEvent};
use crate::error::{Error, Result};
use crate::ports::{RadioScannerPort, RadioSession, SessionRead};
use crate::process::{ToolCommand, ToolProcess};

pub(crate) const RTL_433: &str = "rtl_433";

/// Starts `rtl_433` decoder sessions.
#[derive(Debug, Clone)]
pub struct Rtl433Scanner {
    program: String,
}

impl Rtl433Scanner {
    pub fn new() -> Self {
        Self {
            program: RTL_433.to_string(),
        }
    }

    /// Command line for `config`.
    pub fn command(&self, config: &RadioConfig) -> ToolCommand {
        ToolCommand::new(&self.program).args(config.args())
    }

    /// Pass decoder output through line by line until `cancel` fires or the
    /// decoder exits. Used for output formats other than JSON.
    pub async fn stream_raw<F>(&self, config: &RadioConfig, cancel: &CancellationToken, on_line: F) -> Result<usize>
    where
        F: FnMut(&str) + Send,
    {
        stream_lines(&self.command(config), cancel, on_line).await
    }
}

pub(crate) async fn stream_lines<F>(command: &ToolCommand, cancel: &CancellationToken, mut on_line: F) -> Result<usize>
where
    F: FnMut(&str) + Send,
{
    let mut process = command.clone().capture_stdout().spawn()?;
    let stdout = process
        .take_stdout()
        .ok_or_else(|| Error::CommandFailed("Decoder output not captured".to_string()))?;
    let mut lines = BufReader::new(stdout).lines();
    let mut count = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => match line? {
                Some(line) => {
                    count += 1;
                    on_line(line.trim_end());
                }
                None => break,
            },
        }
    }

    let status = process.terminate().await?;
    debug!(?status, count, "Decoder stopped");
    Ok(count)
}

impl Default for Rtl433Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl RadioScannerPort for Rtl433Scanner {
    type Session = Rtl433Session;

    async fn open(&self, config: &RadioConfig) -> Result<Rtl433Session> {
        info!(frequency = %config.frequency, output = %config.output, "Starting decoder");
        Rtl433Session::spawn(self.command(config))
    }
}

/// A running decoder with its stdout split into lines.
///
/// Lines that are not JSON objects (including every line when a non-JSON
/// output format is selected) are reported as [`SessionRead::Idle`].
pub struct Rtl433Session {
    process: ToolProcess,
    lines: Lines<BufReader<ChildStdout>>,
}

impl Rtl433Session {
    pub(crate) fn spawn(command: ToolCommand) -> Result<Self> {
        let mut process = command.capture_stdout().spawn()?;
        let stdout = process
            .take_stdout()
            .ok_or_else(|| Error::CommandFailed("Decoder output not captured".to_string()))?;
        Ok(Self {
            process,
            lines: BufReader::new(stdout).lines(),
        })
    }

    /// Decoder process id, `None` once it has been reaped.
    pub fn pid(&self) -> Option<u32> {
        self.process.id()
    }
}

impl RadioSession for Rtl433Session {
    async fn next_event(&mut self, wait: Duration) -> Result<SessionRead> {
        match timeout(wait, self.lines.next_line()).await {
            Err(_) => Ok(SessionRead::Idle),
            Ok(Ok(None)) => Ok(SessionRead::Closed),
            Ok(Ok(Some(line))) => match RfEvent::from_line(&line) {
                Some(event) => Ok(SessionRead::Event(event)),
                None => {
                    debug!(line = %line.trim(), "Skipping non-JSON decoder line");
                    Ok(SessionRead::Idle)
                }
            },
            Ok(Err(e)) => Err(e.into()),
        }
    }

    async fn close(self) -> Result<()> {
        let status = self.process.terminate().await?;
        debug!(?status, "Decoder stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn fake_decoder(script: &str) -> Rtl433Session {
        Rtl433Session::spawn(ToolCommand::new("sh").args(["-c", script])).unwrap()
    }

    #[test]
    fn test_command_line() {
        let config = RadioConfig {
            gain: Some("auto".to_string()),
            ..RadioConfig::new("868M")
        };
        assert_eq!(
            Rtl433Scanner::new().command(&config).to_string(),
            "rtl_433 -d soapy -f 868M -F json -g auto"
        );
    }

    #[tokio::test]
    async fn test_session_reads_events_and_skips_noise() {
        let mut session = fake_decoder(
            r#"echo 'rtl_433 version 23.11'; echo '{"model":"Acurite-Tower","id":1}'; echo '{"id":2}'"#,
        );

        let mut events = Vec::new();
        loop {
            match session.next_event(Duration::from_secs(5)).await.unwrap() {
                SessionRead::Event(event) => events.push(event),
                SessionRead::Idle => continue,
                SessionRead::Closed => break,
            }
        }
        session.close().await.unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].model(), "Acurite-Tower");
        assert_eq!(events[1].model(), "Unknown");
    }

    #[tokio::test]
    async fn test_silent_session_is_idle() {
        let mut session = fake_decoder("exec sleep 30");
        let started = Instant::now();
        let read = session.next_event(Duration::from_millis(200)).await.unwrap();
        assert_eq!(read, SessionRead::Idle);
        assert!(started.elapsed() < Duration::from_secs(2));

        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_stream_lines_passes_raw_output() {
        let command = ToolCommand::new("sh").args(["-c", "echo 'time,model,id'; echo '2024-01-01,Acurite,1'"]);
        let mut seen = Vec::new();
        let count = stream_lines(&command, &CancellationToken::new(), |line| seen.push(line.to_string()))
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(seen[1], "2024-01-01,Acurite,1");
    }

    #[tokio::test]
    async fn test_open_missing_decoder() {
        let scanner = Rtl433Scanner {
            program: "airspy-no-such-tool".to_string(),
        };
        let result = scanner.open(&RadioConfig::default()).await;
        assert!(matches!(result, Err(Error::ToolNotFound(_))));
    }
}
