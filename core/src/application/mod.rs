//! Application layer - Use case services.
//!
//! Services orchestrate the adapters through the port traits:
//! - `audit`: every scan once, written to a report file
//! - `monitor`: periodic scans on a background thread
//! - `crack`: key recovery on a background thread
//! - `radio`: bounded and live collection from a decoder session
//! - `vendors` and `report`: shared result formatting

pub mod audit;
pub mod crack;
pub mod monitor;
pub mod radio;
pub mod report;
pub mod vendors;

pub use audit::{AuditService, AuditSettings, AuditStep, AuditSummary, StepOutcome, StepStatus};
pub use crack::{CrackJob, CrackUpdate};
pub use monitor::{Monitor, MonitorHandle, MonitorSettings, MonitorUpdate};
pub use radio::{collect_events, monitor_radio, scan_radio, stream_events, POLL_INTERVAL};
pub use report::{
    bluetooth_section, failed_section, radio_section, wifi_section, AuditReport, DEFAULT_AUDIT_FILE,
};
pub use vendors::VendorBook;
