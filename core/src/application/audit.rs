//! Full audit: every scan once, in sequence, into one report file.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::cancel::CancellationToken;
use crate::domain::{sort_by_rssi, sort_by_signal, RadioConfig};
use crate::error::Result;
use crate::ports::{BluetoothScannerPort, RadioScannerPort, VendorLookupPort, WifiScannerPort};

use super::radio::scan_radio;
use super::report::{bluetooth_section, failed_section, radio_section, wifi_section, AuditReport};
use super::vendors::VendorBook;

/// Durations and frequencies for one audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditSettings {
    pub wifi_duration: Duration,
    pub bluetooth_duration: Duration,
    pub radio_duration: Duration,
    /// Decoder runs, in order.
    pub frequencies: Vec<String>,
    /// Events listed per radio section.
    pub event_limit: usize,
    /// Decoder settings shared by every frequency.
    pub radio: RadioConfig,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            wifi_duration: Duration::from_secs(10),
            bluetooth_duration: Duration::from_secs(10),
            radio_duration: Duration::from_secs(30),
            frequencies: vec!["433.92M".to_string(), "868M".to_string()],
            event_limit: 10,
            radio: RadioConfig::default(),
        }
    }
}

/// One audit step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "frequency", rename_all = "snake_case")]
pub enum AuditStep {
    Wifi,
    Bluetooth,
    Radio(String),
}

impl fmt::Display for AuditStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditStep::Wifi => write!(f, "Wi-Fi scan"),
            AuditStep::Bluetooth => write!(f, "Bluetooth scan"),
            AuditStep::Radio(freq) => write!(f, "RF scan at {}", freq),
        }
    }
}

/// What a step produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    /// The scan ran; `found` results were recorded.
    Completed { found: usize },
    /// The scan could not run; the reason was recorded.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub step: AuditStep,
    pub status: StepStatus,
}

/// Result of a full audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    pub report: PathBuf,
    pub steps: Vec<StepOutcome>,
    /// The audit was cancelled before every step finished.
    pub interrupted: bool,
}

/// Runs the audit against injected scanners.
pub struct AuditService<W, B, R, V> {
    wifi: W,
    bluetooth: B,
    radio: R,
    vendors: V,
    settings: AuditSettings,
}

impl<W, B, R, V> AuditService<W, B, R, V>
where
    W: WifiScannerPort,
    B: BluetoothScannerPort,
    R: RadioScannerPort,
    V: VendorLookupPort,
{
    pub fn new(wifi: W, bluetooth: B, radio: R, vendors: V, settings: AuditSettings) -> Self {
        Self {
            wifi,
            bluetooth,
            radio,
            vendors,
            settings,
        }
    }

    pub fn settings(&self) -> &AuditSettings {
        &self.settings
    }

    /// Steps in execution order.
    pub fn steps(&self) -> Vec<AuditStep> {
        let mut steps = vec![AuditStep::Wifi, AuditStep::Bluetooth];
        steps.extend(self.settings.frequencies.iter().cloned().map(AuditStep::Radio));
        steps
    }

    /// Truncate the report and run every step. A failing step is recorded
    /// and the audit moves on; cancellation stops it.
    pub async fn run(&self, report_path: impl Into<PathBuf>, cancel: &CancellationToken) -> Result<AuditSummary> {
        let report = AuditReport::create(report_path).await?;
        let mut outcomes = Vec::new();
        let mut interrupted = false;

        for step in self.steps() {
            if cancel.is_cancelled() {
                report
                    .append_section(&format!("Audit interrupted before {}.", step))
                    .await?;
                interrupted = true;
                break;
            }

            info!(%step, "Audit step");
            let (section, status) = self.run_step(&step, cancel).await;
            report.append_section(&section).await?;
            outcomes.push(StepOutcome {
                step: step.clone(),
                status,
            });
            if cancel.is_cancelled() {
                report
                    .append_section(&format!("Audit interrupted during {}.", step))
                    .await?;
                interrupted = true;
                break;
            }
        }

        Ok(AuditSummary {
            report: report.path().to_path_buf(),
            steps: outcomes,
            interrupted,
        })
    }

    async fn run_step(&self, step: &AuditStep, cancel: &CancellationToken) -> (String, StepStatus) {
        match step {
            AuditStep::Wifi => self.wifi_step(cancel).await,
            AuditStep::Bluetooth => self.bluetooth_step(cancel).await,
            AuditStep::Radio(frequency) => self.radio_step(frequency, cancel).await,
        }
    }

    async fn wifi_step(&self, cancel: &CancellationToken) -> (String, StepStatus) {
        let duration = self.settings.wifi_duration;
        match self.wifi.scan(duration, cancel).await {
            Ok(mut aps) => {
                sort_by_signal(&mut aps);
                let vendors = VendorBook::for_access_points(&self.vendors, &aps).await;
                let found = aps.len();
                (wifi_section(&aps, &vendors, duration), StepStatus::Completed { found })
            }
            Err(e) => failed("Wi-Fi Scan Results:", &AuditStep::Wifi, e.to_string()),
        }
    }

    async fn bluetooth_step(&self, cancel: &CancellationToken) -> (String, StepStatus) {
        match self.bluetooth.scan(self.settings.bluetooth_duration, cancel).await {
            Ok(mut devices) => {
                sort_by_rssi(&mut devices);
                let vendors = VendorBook::for_devices(&self.vendors, &devices).await;
                let found = devices.len();
                (bluetooth_section(&devices, &vendors), StepStatus::Completed { found })
            }
            Err(e) => failed("Bluetooth Scan Results:", &AuditStep::Bluetooth, e.to_string()),
        }
    }

    async fn radio_step(&self, frequency: &str, cancel: &CancellationToken) -> (String, StepStatus) {
        let config = RadioConfig {
            frequency: frequency.to_string(),
            ..self.settings.radio.clone()
        };
        let duration = self.settings.radio_duration;
        match scan_radio(&self.radio, &config, duration, cancel).await {
            Ok(events) => {
                let found = events.len();
                (
                    radio_section(frequency, duration, &events, self.settings.event_limit),
                    StepStatus::Completed { found },
                )
            }
            Err(e) => failed(
                &format!("RTL433 Scan Results ({}):", frequency),
                &AuditStep::Radio(frequency.to_string()),
                e.to_string(),
            ),
        }
    }
}

fn failed(title: &str, step: &AuditStep, reason: String) -> (String, StepStatus) {
    warn!(%step, %reason, "Audit step failed");
    (failed_section(title, &reason), StepStatus::Failed { reason })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::radio::testing::ScriptedRadio;
    use crate::application::vendors::testing::TableLookup;
    use crate::domain::{AccessPoint, BluetoothDevice};
    use crate::error::Error;
    use std::sync::atomic::Ordering;

    struct MockWifi {
        aps: Vec<AccessPoint>,
    }

    impl WifiScannerPort for MockWifi {
        async fn scan(&self, _duration: Duration, _cancel: &CancellationToken) -> Result<Vec<AccessPoint>> {
            Ok(self.aps.clone())
        }
    }

    struct FailingBluetooth;

    impl BluetoothScannerPort for FailingBluetooth {
        async fn scan(&self, _duration: Duration, _cancel: &CancellationToken) -> Result<Vec<BluetoothDevice>> {
            Err(Error::ToolNotFound("bluetoothctl".to_string()))
        }
    }

    struct MockBluetooth {
        devices: Vec<BluetoothDevice>,
    }

    impl BluetoothScannerPort for MockBluetooth {
        async fn scan(&self, _duration: Duration, _cancel: &CancellationToken) -> Result<Vec<BluetoothDevice>> {
            Ok(self.devices.clone())
        }
    }

    fn fast_settings() -> AuditSettings {
        AuditSettings {
            wifi_duration: Duration::from_millis(10),
            bluetooth_duration: Duration::from_millis(10),
            radio_duration: Duration::from_millis(100),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_audit_sections_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.txt");

        let radio = ScriptedRadio::with_lines(&[r#"{"model":"Acurite-Tower","id":1}"#]);
        let service = AuditService::new(
            MockWifi {
                aps: vec![AccessPoint::new("AA:BB:CC:DD:EE:FF", "TestNet", -45, 6, "WPA2 CCMP PSK")],
            },
            MockBluetooth {
                devices: vec![BluetoothDevice::new(None, "11:22:33:44:55:66", Some(-70))],
            },
            radio.clone(),
            TableLookup::new(&[("AA:BB:CC:DD:EE:FF", "Netgear")]),
            fast_settings(),
        );

        let summary = service.run(&path, &CancellationToken::new()).await.unwrap();
        assert!(!summary.interrupted);
        assert_eq!(summary.steps.len(), 4);
        assert_eq!(radio.opened.load(Ordering::SeqCst), 2);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("=== Full Audit Report - "));
        let wifi = content.find("=== Wi-Fi Scan Results ===").unwrap();
        let bt = content.find("Bluetooth Scan Results:").unwrap();
        let rf_433 = content.find("RTL433 Scan Results (433.92M)").unwrap();
        let rf_868 = content.find("RTL433 Scan Results (868M)").unwrap();
        assert!(wifi < bt && bt < rf_433 && rf_433 < rf_868);
        assert!(content.contains("AA:BB:CC:DD:EE:FF -> Netgear"));
        assert!(content.contains("--> Device Model: Acurite-Tower"));
    }

    #[tokio::test]
    async fn test_failed_step_does_not_abort() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.txt");

        let service = AuditService::new(
            MockWifi { aps: Vec::new() },
            FailingBluetooth,
            ScriptedRadio::default(),
            TableLookup::default(),
            fast_settings(),
        );

        let summary = service.run(&path, &CancellationToken::new()).await.unwrap();
        assert_eq!(summary.steps.len(), 4);
        assert_eq!(summary.steps[0].status, StepStatus::Completed { found: 0 });
        assert!(matches!(summary.steps[1].status, StepStatus::Failed { .. }));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("No Wi-Fi networks detected."));
        assert!(content.contains("Scan failed: Tool not found: bluetoothctl"));
        assert_eq!(content.matches("No devices detected.").count(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_audit_records_interruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.txt");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let service = AuditService::new(
            MockWifi { aps: Vec::new() },
            MockBluetooth { devices: Vec::new() },
            ScriptedRadio::default(),
            TableLookup::default(),
            fast_settings(),
        );

        let summary = service.run(&path, &cancel).await.unwrap();
        assert!(summary.interrupted);
        assert!(summary.steps.is_empty());
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Audit interrupted before Wi-Fi scan."));
    }

    #[tokio::test]
    async fn test_cancel_during_last_step_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.txt");
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            trigger.cancel();
        });

        let radio = ScriptedRadio::default();
        let service = AuditService::new(
            MockWifi { aps: Vec::new() },
            MockBluetooth { devices: Vec::new() },
            radio.clone(),
            TableLookup::default(),
            AuditSettings {
                radio_duration: Duration::from_secs(30),
                frequencies: vec!["433.92M".to_string()],
                ..fast_settings()
            },
        );

        let started = std::time::Instant::now();
        let summary = service.run(&path, &cancel).await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(summary.interrupted);
        assert_eq!(summary.steps.len(), 3);
        assert!(radio.closed.load(Ordering::SeqCst));

        let content = std::fs::read_to_string(&path).unwrap();
        let section = content.find("RTL433 Scan Results (433.92M)").unwrap();
        let note = content.find("Audit interrupted during RF scan at 433.92M.").unwrap();
        assert!(section < note);
    }
}
