//! Sub-GHz decoder ports (interfaces).

use std::time::Duration;

use crate::domain::{RadioConfig, RfEvent};
use crate::error::Result;

/// Outcome of a single poll of a decoder session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionRead {
    /// A decoded event.
    Event(RfEvent),
    /// Nothing usable arrived within the wait (silence or a malformed line).
    Idle,
    /// The decoder closed its output.
    Closed,
}

/// A running decoder.
pub trait RadioSession: Send {
    /// Wait at most `wait` for the next event.
    fn next_event(
        &mut self,
        wait: Duration,
    ) -> impl std::future::Future<Output = Result<SessionRead>> + Send;

    /// Stop the decoder and reap it.
    fn close(self) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Port for starting decoder sessions.
pub trait RadioScannerPort: Send + Sync {
    type Session: RadioSession;

    fn open(
        &self,
        config: &RadioConfig,
    ) -> impl std::future::Future<Output = Result<Self::Session>> + Send;
}
