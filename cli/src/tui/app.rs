//! TUI application state.

use std::path::PathBuf;

use airspy_core::adapters::{Aircrack, CrackRequest};
use airspy_core::application::{CrackJob, CrackUpdate};
use airspy_core::{AccessPoint, BluetoothDevice, MonitorUpdate, RfEvent};
use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// RF events kept for display, newest last.
const MAX_EVENTS: usize = 200;
/// Cracker output lines kept for display.
const MAX_CRACK_LINES: usize = 500;

pub const DEFAULT_WORDLIST: &str = "/usr/share/wordlists/rockyou.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Wifi,
    Bluetooth,
    Radio,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Wifi, Tab::Bluetooth, Tab::Radio];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Wifi => "Wi-Fi",
            Tab::Bluetooth => "Bluetooth",
            Tab::Radio => "RF",
        }
    }

    fn index(&self) -> usize {
        match self {
            Tab::Wifi => 0,
            Tab::Bluetooth => 1,
            Tab::Radio => 2,
        }
    }

    fn next(&self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrackField {
    Capture,
    Wordlist,
}

/// Brute-force panel: two path inputs and the running job.
pub struct CrackPanel {
    pub capture: String,
    pub wordlist: String,
    pub focus: CrackField,
    pub output: Vec<String>,
    pub result: Option<String>,
    job: Option<CrackJob>,
}

impl CrackPanel {
    fn new(capture: String) -> Self {
        Self {
            capture,
            wordlist: DEFAULT_WORDLIST.to_string(),
            focus: CrackField::Capture,
            output: Vec::new(),
            result: None,
            job: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.job.is_some()
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            CrackField::Capture => &mut self.capture,
            CrackField::Wordlist => &mut self.wordlist,
        }
    }

    fn push_line(&mut self, line: String) {
        self.output.push(line);
        if self.output.len() > MAX_CRACK_LINES {
            let excess = self.output.len() - MAX_CRACK_LINES;
            self.output.drain(..excess);
        }
    }
}

pub struct App {
    pub tab: Tab,
    selected: [usize; 3],
    pub access_points: Vec<AccessPoint>,
    pub devices: Vec<BluetoothDevice>,
    pub events: Vec<RfEvent>,
    pub status: Option<String>,
    pub last_update: Option<DateTime<Local>>,
    pub crack: Option<CrackPanel>,
    pub should_quit: bool,
    sudo: bool,
    handshake_dir: PathBuf,
}

impl App {
    pub fn new(sudo: bool, handshake_dir: PathBuf) -> Self {
        Self {
            tab: Tab::Wifi,
            selected: [0; 3],
            access_points: Vec::new(),
            devices: Vec::new(),
            events: Vec::new(),
            status: None,
            last_update: None,
            crack: None,
            should_quit: false,
            sudo,
            handshake_dir,
        }
    }

    pub fn selected(&self) -> usize {
        self.selected[self.tab.index()]
    }

    fn row_count(&self) -> usize {
        self.rows_in(self.tab)
    }

    fn rows_in(&self, tab: Tab) -> usize {
        match tab {
            Tab::Wifi => self.access_points.len(),
            Tab::Bluetooth => self.devices.len(),
            Tab::Radio => self.events.len(),
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.row_count();
        let slot = &mut self.selected[self.tab.index()];
        *slot = (*slot).min(len.saturating_sub(1));
    }

    /// Access point whose clients are shown in the detail pane.
    pub fn selected_access_point(&self) -> Option<&AccessPoint> {
        self.access_points.get(self.selected[Tab::Wifi.index()])
    }

    pub fn apply(&mut self, update: MonitorUpdate) {
        match update {
            MonitorUpdate::Wifi(aps) => {
                self.access_points = aps;
                self.last_update = Some(Local::now());
            }
            MonitorUpdate::Bluetooth(devices) => {
                self.devices = devices;
                self.last_update = Some(Local::now());
            }
            MonitorUpdate::Radio(events) => {
                self.events.extend(events);
                if self.events.len() > MAX_EVENTS {
                    let excess = self.events.len() - MAX_EVENTS;
                    self.events.drain(..excess);
                }
                self.last_update = Some(Local::now());
            }
            MonitorUpdate::Status(message) => self.status = Some(message),
        }
        for tab in Tab::ALL {
            let len = self.rows_in(tab);
            let slot = &mut self.selected[tab.index()];
            *slot = (*slot).min(len.saturating_sub(1));
        }
    }

    /// Drain output from a running crack job.
    pub fn poll_crack(&mut self) {
        let Some(panel) = self.crack.as_mut() else {
            return;
        };
        let Some(job) = panel.job.as_ref() else {
            return;
        };

        let updates: Vec<CrackUpdate> = job.try_iter().collect();
        let mut finished = false;
        for update in updates {
            match update {
                CrackUpdate::Line(line) => panel.push_line(line),
                CrackUpdate::Finished(result) => {
                    panel.result = Some(match result {
                        Ok(outcome) => match outcome.key {
                            Some(key) => format!("KEY FOUND: {}", key),
                            None => "Key not found in the wordlist".to_string(),
                        },
                        Err(e) => format!("Error: {}", e),
                    });
                    finished = true;
                }
            }
        }
        if finished {
            panel.job = None;
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.crack.is_some() {
            self.handle_crack_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => {
                self.tab = self.tab.next();
                self.clamp_selection();
            }
            KeyCode::Char('1') => self.tab = Tab::Wifi,
            KeyCode::Char('2') => self.tab = Tab::Bluetooth,
            KeyCode::Char('3') => self.tab = Tab::Radio,
            KeyCode::Down | KeyCode::Char('j') => {
                let len = self.row_count();
                let slot = &mut self.selected[self.tab.index()];
                if *slot + 1 < len {
                    *slot += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                let slot = &mut self.selected[self.tab.index()];
                *slot = slot.saturating_sub(1);
            }
            KeyCode::Char('c') => self.open_crack_panel(),
            _ => {}
        }
    }

    fn open_crack_panel(&mut self) {
        let capture = match self.selected_access_point() {
            Some(ap) if self.tab == Tab::Wifi => {
                let target = airspy_core::HandshakeTarget::new(&ap.bssid, ap.channel, &ap.essid);
                self.handshake_dir.join(target.capture_file_name())
            }
            _ => self.handshake_dir.join(""),
        };
        self.crack = Some(CrackPanel::new(capture.to_string_lossy().into_owned()));
    }

    fn handle_crack_key(&mut self, key: KeyEvent) {
        let sudo = self.sudo;
        let Some(panel) = self.crack.as_mut() else {
            return;
        };

        if panel.is_running() {
            // Only stopping is possible while the cracker runs.
            if key.code == KeyCode::Esc {
                if let Some(job) = panel.job.take() {
                    job.stop();
                }
                panel.result = Some("Stopped".to_string());
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.crack = None,
            KeyCode::Tab | KeyCode::Up | KeyCode::Down => {
                panel.focus = match panel.focus {
                    CrackField::Capture => CrackField::Wordlist,
                    CrackField::Wordlist => CrackField::Capture,
                };
            }
            KeyCode::Backspace => {
                panel.focused_mut().pop();
            }
            KeyCode::Char(c) => panel.focused_mut().push(c),
            KeyCode::Enter => {
                let request = CrackRequest {
                    capture: PathBuf::from(panel.capture.trim()),
                    wordlist: PathBuf::from(panel.wordlist.trim()),
                    bssid: None,
                };
                panel.output.clear();
                panel.result = None;
                match CrackJob::spawn(Aircrack::new(sudo), request) {
                    Ok(job) => panel.job = Some(job),
                    Err(e) => panel.result = Some(format!("Error: {}", e)),
                }
            }
            _ => {}
        }
    }
}
