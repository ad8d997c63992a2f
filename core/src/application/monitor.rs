//! Background monitoring worker.
//!
//! A single thread owns a current-thread runtime and repeats Wi-Fi, Bluetooth
//! and RF scans until stopped. Results travel one way to the display thread
//! over a channel; the worker shares no state with it.

use std::sync::mpsc::{self, Receiver, Sender, TryIter};
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::runtime::Builder;
use tracing::{debug, info, warn};

use crate::cancel::{sleep_or_cancel, CancellationToken};
use crate::domain::{sort_by_rssi, sort_by_signal, AccessPoint, BluetoothDevice, RadioConfig, RfEvent};
use crate::error::{Error, Result};
use crate::ports::{BluetoothScannerPort, RadioScannerPort, RadioSession, WifiScannerPort};

use super::radio::collect_events;

/// Timing of one monitoring cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    pub wifi_duration: Duration,
    pub bluetooth_duration: Duration,
    /// How long the live RF session is drained each cycle.
    pub rf_window: Duration,
    /// Pause between cycles.
    pub interval: Duration,
    pub radio: RadioConfig,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            wifi_duration: Duration::from_secs(10),
            bluetooth_duration: Duration::from_secs(10),
            rf_window: Duration::from_secs(10),
            interval: Duration::from_secs(300),
            radio: RadioConfig::default(),
        }
    }
}

/// A message from the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorUpdate {
    Wifi(Vec<AccessPoint>),
    Bluetooth(Vec<BluetoothDevice>),
    Radio(Vec<RfEvent>),
    Status(String),
}

/// Entry point for starting the worker.
pub struct Monitor;

impl Monitor {
    /// Start the worker thread. Scanning begins immediately.
    pub fn spawn<W, B, R>(wifi: W, bluetooth: B, radio: R, settings: MonitorSettings) -> Result<MonitorHandle>
    where
        W: WifiScannerPort + 'static,
        B: BluetoothScannerPort + 'static,
        R: RadioScannerPort + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();

        let thread = std::thread::Builder::new()
            .name("airspy-monitor".to_string())
            .spawn(move || {
                let runtime = match Builder::new_current_thread().enable_all().build() {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = tx.send(MonitorUpdate::Status(format!("Monitor failed to start: {}", e)));
                        return;
                    }
                };
                let worker = Worker {
                    wifi,
                    bluetooth,
                    radio,
                    settings,
                    tx,
                };
                runtime.block_on(worker.run(&worker_cancel));
            })
            .map_err(|e| Error::CommandFailed(format!("Failed to start monitor thread: {}", e)))?;

        Ok(MonitorHandle {
            updates: rx,
            cancel,
            thread: Some(thread),
        })
    }
}

/// Owner side of a running worker. Dropping it stops the worker.
pub struct MonitorHandle {
    updates: Receiver<MonitorUpdate>,
    cancel: CancellationToken,
    thread: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Updates received since the last call, without blocking.
    pub fn try_iter(&self) -> TryIter<'_, MonitorUpdate> {
        self.updates.try_iter()
    }

    /// Wait up to `timeout` for the next update.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<MonitorUpdate> {
        self.updates.recv_timeout(timeout).ok()
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel the worker and wait for it. Returns once every subprocess it
    /// started has been reaped.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Monitor thread panicked");
            }
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Worker<W, B, R> {
    wifi: W,
    bluetooth: B,
    radio: R,
    settings: MonitorSettings,
    tx: Sender<MonitorUpdate>,
}

impl<W, B, R> Worker<W, B, R>
where
    W: WifiScannerPort,
    B: BluetoothScannerPort,
    R: RadioScannerPort,
{
    fn status(&self, message: impl Into<String>) {
        let _ = self.tx.send(MonitorUpdate::Status(message.into()));
    }

    async fn run(self, cancel: &CancellationToken) {
        let mut session = match self.radio.open(&self.settings.radio).await {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(error = %e, "Radio monitoring unavailable");
                self.status(format!("RF monitoring unavailable: {}", e));
                None
            }
        };

        let mut cycle: u64 = 0;
        while !cancel.is_cancelled() {
            cycle += 1;
            debug!(cycle, "Monitor cycle");
            self.cycle(session.as_mut(), cancel).await;
            if cancel.is_cancelled() {
                break;
            }
            self.status(format!(
                "Cycle {} complete, next scan in {}s",
                cycle,
                self.settings.interval.as_secs()
            ));
            if sleep_or_cancel(self.settings.interval, cancel).await {
                break;
            }
        }

        if let Some(session) = session {
            if let Err(e) = session.close().await {
                warn!(error = %e, "Failed to stop decoder");
            }
        }
        info!("Monitor stopped");
    }

    async fn cycle(&self, session: Option<&mut R::Session>, cancel: &CancellationToken) {
        self.status("Scanning Wi-Fi...");
        match self.wifi.scan(self.settings.wifi_duration, cancel).await {
            Ok(mut aps) => {
                sort_by_signal(&mut aps);
                let _ = self.tx.send(MonitorUpdate::Wifi(aps));
            }
            Err(e) => self.status(format!("Wi-Fi scan failed: {}", e)),
        }
        if cancel.is_cancelled() {
            return;
        }

        self.status("Scanning Bluetooth...");
        match self.bluetooth.scan(self.settings.bluetooth_duration, cancel).await {
            Ok(mut devices) => {
                sort_by_rssi(&mut devices);
                let _ = self.tx.send(MonitorUpdate::Bluetooth(devices));
            }
            Err(e) => self.status(format!("Bluetooth scan failed: {}", e)),
        }
        if cancel.is_cancelled() {
            return;
        }

        if let Some(session) = session {
            self.status("Listening for RF devices...");
            match collect_events(session, self.settings.rf_window, cancel).await {
                Ok(events) => {
                    let _ = self.tx.send(MonitorUpdate::Radio(events));
                }
                Err(e) => self.status(format!("RF scan failed: {}", e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::Rtl433Session;
    use crate::application::radio::testing::ScriptedRadio;
    use crate::process::ToolCommand;
    use parking_lot::Mutex;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Instant;

    struct MockWifi;

    impl WifiScannerPort for MockWifi {
        async fn scan(&self, _duration: Duration, _cancel: &CancellationToken) -> Result<Vec<AccessPoint>> {
            Ok(vec![
                AccessPoint::new("AA:BB:CC:DD:EE:01", "Weak", -80, 1, "WPA2 CCMP PSK"),
                AccessPoint::new("AA:BB:CC:DD:EE:02", "Strong", -30, 6, "WPA2 CCMP PSK"),
            ])
        }
    }

    struct MockBluetooth;

    impl BluetoothScannerPort for MockBluetooth {
        async fn scan(&self, duration: Duration, cancel: &CancellationToken) -> Result<Vec<BluetoothDevice>> {
            sleep_or_cancel(duration, cancel).await;
            Ok(vec![BluetoothDevice::new(None, "11:22:33:44:55:66", Some(-50))])
        }
    }

    /// Decoder stand-in that stays silent and records its pid.
    struct SleepingRadio {
        pid: Arc<Mutex<Option<u32>>>,
    }

    impl RadioScannerPort for SleepingRadio {
        type Session = Rtl433Session;

        async fn open(&self, _config: &RadioConfig) -> Result<Rtl433Session> {
            let session = Rtl433Session::spawn(ToolCommand::new("sh").args(["-c", "exec sleep 30"]))?;
            *self.pid.lock() = session.pid();
            Ok(session)
        }
    }

    fn fast_settings() -> MonitorSettings {
        MonitorSettings {
            wifi_duration: Duration::from_millis(10),
            bluetooth_duration: Duration::from_millis(10),
            rf_window: Duration::from_millis(100),
            interval: Duration::from_secs(300),
            radio: RadioConfig::default(),
        }
    }

    #[test]
    fn test_cycle_delivers_updates_and_stop_closes_session() {
        let radio = ScriptedRadio::with_lines(&[r#"{"model":"Acurite-606TX","id":12}"#]);
        let handle = Monitor::spawn(MockWifi, MockBluetooth, radio.clone(), fast_settings()).unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut updates = Vec::new();
        while Instant::now() < deadline {
            match handle.recv_timeout(Duration::from_millis(100)) {
                Some(update @ MonitorUpdate::Radio(_)) => {
                    updates.push(update);
                    break;
                }
                Some(update) => updates.push(update),
                None => {}
            }
        }

        let wifi = updates.iter().find_map(|u| match u {
            MonitorUpdate::Wifi(aps) => Some(aps),
            _ => None,
        });
        assert_eq!(wifi.unwrap()[0].essid, "Strong");
        assert!(updates.iter().any(|u| matches!(u, MonitorUpdate::Bluetooth(d) if d.len() == 1)));
        assert!(matches!(updates.last(), Some(MonitorUpdate::Radio(events)) if events.len() == 1));

        // The worker is now in its 300 s pause; stop must cut it short.
        let started = Instant::now();
        handle.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(radio.opened.load(Ordering::SeqCst), 1);
        assert!(radio.closed.load(Ordering::SeqCst));
    }

    #[cfg(unix)]
    #[test]
    fn test_stop_reaps_decoder_process() {
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        let pid = Arc::new(Mutex::new(None));
        let settings = MonitorSettings {
            bluetooth_duration: Duration::from_secs(60),
            ..fast_settings()
        };
        let handle = Monitor::spawn(MockWifi, MockBluetooth, SleepingRadio { pid: pid.clone() }, settings).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while pid.lock().is_none() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }
        let decoder = (*pid.lock()).expect("decoder started");
        assert!(kill(Pid::from_raw(decoder as i32), None).is_ok());

        let started = Instant::now();
        handle.stop();
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(kill(Pid::from_raw(decoder as i32), None).is_err());
    }

    #[test]
    fn test_drop_stops_worker() {
        let radio = ScriptedRadio::default();
        let handle = Monitor::spawn(MockWifi, MockBluetooth, radio.clone(), fast_settings()).unwrap();
        assert!(handle.recv_timeout(Duration::from_secs(5)).is_some());
        drop(handle);
        assert!(radio.closed.load(Ordering::SeqCst));
    }
}
