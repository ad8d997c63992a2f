//! Key recovery on a worker thread, for front ends that cannot block.

use std::sync::mpsc::{self, Receiver, TryIter};
use std::thread::JoinHandle;

use tokio::runtime::Builder;
use tracing::warn;

use crate::adapters::{Aircrack, CrackRequest};
use crate::cancel::CancellationToken;
use crate::domain::CrackOutcome;
use crate::error::{Error, Result};

/// Progress of a background cracking run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrackUpdate {
    /// One cleaned output line.
    Line(String),
    /// The run ended; errors are carried as their message.
    Finished(std::result::Result<CrackOutcome, String>),
}

/// A cracking run on its own thread. Dropping it stops the run.
pub struct CrackJob {
    updates: Receiver<CrackUpdate>,
    cancel: CancellationToken,
    thread: Option<JoinHandle<()>>,
}

impl CrackJob {
    pub fn spawn(aircrack: Aircrack, request: CrackRequest) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();

        let thread = std::thread::Builder::new()
            .name("airspy-crack".to_string())
            .spawn(move || {
                let finished = match Builder::new_current_thread().enable_all().build() {
                    Ok(runtime) => {
                        let lines = tx.clone();
                        runtime.block_on(aircrack.crack(&request, &worker_cancel, move |line| {
                            let _ = lines.send(CrackUpdate::Line(line.to_string()));
                        }))
                    }
                    Err(e) => Err(Error::Io(e)),
                };
                let _ = tx.send(CrackUpdate::Finished(finished.map_err(|e| e.to_string())));
            })
            .map_err(|e| Error::CommandFailed(format!("Failed to start crack thread: {}", e)))?;

        Ok(Self {
            updates: rx,
            cancel,
            thread: Some(thread),
        })
    }

    pub fn try_iter(&self) -> TryIter<'_, CrackUpdate> {
        self.updates.try_iter()
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel the run and wait for the cracker to be reaped.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Crack thread panicked");
            }
        }
    }
}

impl Drop for CrackJob {
    fn drop(&mut self) {
        self.shutdown();
    }
}
