//! Collecting decoded transmissions from a radio session.

use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

use crate::cancel::CancellationToken;
use crate::domain::{RadioConfig, RfEvent};
use crate::error::Result;
use crate::ports::{RadioScannerPort, RadioSession, SessionRead};

/// Longest single wait on the decoder output, so deadlines and cancellation
/// are observed promptly.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Collect events for `duration`.
///
/// Returns within `duration + POLL_INTERVAL` even when the decoder is silent,
/// and early when it closes its output or `cancel` fires.
pub async fn collect_events<S: RadioSession>(
    session: &mut S,
    duration: Duration,
    cancel: &CancellationToken,
) -> Result<Vec<RfEvent>> {
    let deadline = Instant::now() + duration;
    let mut events = Vec::new();

    loop {
        let now = Instant::now();
        if now >= deadline || cancel.is_cancelled() {
            break;
        }
        let wait = POLL_INTERVAL.min(deadline - now);

        let read = tokio::select! {
            _ = cancel.cancelled() => break,
            read = session.next_event(wait) => read?,
        };
        match read {
            SessionRead::Event(event) => events.push(event),
            SessionRead::Idle => {}
            SessionRead::Closed => break,
        }
    }
    Ok(events)
}

/// Pass events to `on_event` as they arrive until `cancel` fires or the
/// decoder closes. Returns the number of events seen.
pub async fn stream_events<S, F>(
    session: &mut S,
    cancel: &CancellationToken,
    mut on_event: F,
) -> Result<usize>
where
    S: RadioSession,
    F: FnMut(&RfEvent),
{
    let mut count = 0;
    loop {
        let read = tokio::select! {
            _ = cancel.cancelled() => break,
            read = session.next_event(POLL_INTERVAL) => read?,
        };
        match read {
            SessionRead::Event(event) => {
                count += 1;
                on_event(&event);
            }
            SessionRead::Idle => {}
            SessionRead::Closed => {
                warn!("Decoder closed its output");
                break;
            }
        }
    }
    Ok(count)
}

/// Open a session, collect for `duration`, and always close it.
pub async fn scan_radio<P: RadioScannerPort>(
    scanner: &P,
    config: &RadioConfig,
    duration: Duration,
    cancel: &CancellationToken,
) -> Result<Vec<RfEvent>> {
    let mut session = scanner.open(config).await?;
    let collected = collect_events(&mut session, duration, cancel).await;
    let closed = session.close().await;
    let events = collected?;
    closed?;
    Ok(events)
}

/// Open a session and stream events until cancelled; always closes it.
pub async fn monitor_radio<P, F>(
    scanner: &P,
    config: &RadioConfig,
    cancel: &CancellationToken,
    on_event: F,
) -> Result<usize>
where
    P: RadioScannerPort,
    F: FnMut(&RfEvent),
{
    let mut session = scanner.open(config).await?;
    let streamed = stream_events(&mut session, cancel, on_event).await;
    let closed = session.close().await;
    let count = streamed?;
    closed?;
    Ok(count)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    /// Session that replays queued reads, then stays silent.
    pub struct ScriptedSession {
        pub reads: VecDeque<SessionRead>,
        pub closed: Arc<AtomicBool>,
    }

    impl RadioSession for ScriptedSession {
        async fn next_event(&mut self, wait: Duration) -> Result<SessionRead> {
            match self.reads.pop_front() {
                Some(read) => Ok(read),
                None => {
                    tokio::time::sleep(wait).await;
                    Ok(SessionRead::Idle)
                }
            }
        }

        async fn close(self) -> Result<()> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Scanner handing out scripted sessions built from JSON lines.
    #[derive(Default, Clone)]
    pub struct ScriptedRadio {
        pub lines: Vec<String>,
        pub opened: Arc<AtomicUsize>,
        pub closed: Arc<AtomicBool>,
    }

    impl ScriptedRadio {
        pub fn with_lines(lines: &[&str]) -> Self {
            Self {
                lines: lines.iter().map(|l| l.to_string()).collect(),
                ..Default::default()
            }
        }
    }

    impl RadioScannerPort for ScriptedRadio {
        type Session = ScriptedSession;

        async fn open(&self, _config: &RadioConfig) -> Result<ScriptedSession> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            let reads = self
                .lines
                .iter()
                .map(|line| match RfEvent::from_line(line) {
                    Some(event) => SessionRead::Event(event),
                    None => SessionRead::Idle,
                })
                .collect();
            Ok(ScriptedSession {
                reads,
                closed: self.closed.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn silent() -> ScriptedSession {
        ScriptedSession {
            reads: VecDeque::new(),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    #[tokio::test]
    async fn test_silent_decoder_returns_within_bound() {
        let mut session = silent();
        let duration = Duration::from_millis(700);

        let started = Instant::now();
        let events = collect_events(&mut session, duration, &CancellationToken::new())
            .await
            .unwrap();
        let elapsed = started.elapsed();

        assert!(events.is_empty());
        assert!(elapsed >= duration);
        assert!(elapsed <= duration + POLL_INTERVAL);
    }

    #[tokio::test]
    async fn test_collect_skips_malformed_and_stops_on_close() {
        let mut session = ScriptedSession {
            reads: VecDeque::from(vec![
                SessionRead::Event(RfEvent::from_line(r#"{"model":"A"}"#).unwrap()),
                SessionRead::Idle,
                SessionRead::Event(RfEvent::from_line(r#"{"model":"B"}"#).unwrap()),
                SessionRead::Closed,
            ]),
            closed: Arc::new(AtomicBool::new(false)),
        };

        let events = collect_events(&mut session, Duration::from_secs(30), &CancellationToken::new())
            .await
            .unwrap();
        let models: Vec<&str> = events.iter().map(|e| e.model()).collect();
        assert_eq!(models, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_collect_observes_cancel() {
        let mut session = silent();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        collect_events(&mut session, Duration::from_secs(60), &cancel)
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_stream_until_cancelled() {
        let radio = ScriptedRadio::with_lines(&[r#"{"model":"A"}"#, "garbage", r#"{"id":3}"#]);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            trigger.cancel();
        });

        let mut seen = Vec::new();
        let count = monitor_radio(&radio, &RadioConfig::default(), &cancel, |event| {
            seen.push(event.model().to_string())
        })
        .await
        .unwrap();

        assert_eq!(count, 2);
        assert_eq!(seen, vec!["A", "Unknown"]);
        assert!(radio.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_scan_radio_closes_session() {
        let radio = ScriptedRadio::with_lines(&[r#"{"model":"Oregon-THGR122N","temperature_C":4.2}"#]);
        let events = scan_radio(
            &radio,
            &RadioConfig::new("868M"),
            Duration::from_millis(200),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(events.len(), 1);
        assert!(radio.closed.load(Ordering::SeqCst));
    }
}
