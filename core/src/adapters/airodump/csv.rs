//! Parser for the two-section CSV written by `airodump-ng`.
//!
//! The file holds an access point table, a blank line, then a station table
//! introduced by a header row whose first field is `Station MAC`. The header
//! switches the parser into the station section for the rest of the file.

use csv::{ByteRecord, ReaderBuilder, Trim};

use crate::domain::{attach_stations, AccessPoint, Station, UNKNOWN_CHANNEL, UNKNOWN_SIGNAL};

/// Marker found in the first field of the station header row.
const STATION_MARKER: &str = "Station MAC";

/// First field of the access point header row.
const AP_HEADER: &str = "BSSID";

const AP_MIN_FIELDS: usize = 14;
const STATION_MIN_FIELDS: usize = 7;

mod ap_field {
    pub const BSSID: usize = 0;
    pub const CHANNEL: usize = 3;
    pub const PRIVACY: usize = 5;
    pub const CIPHER: usize = 6;
    pub const AUTH: usize = 7;
    pub const POWER: usize = 8;
    pub const ESSID: usize = 13;
}

mod station_field {
    pub const MAC: usize = 0;
    pub const POWER: usize = 3;
    pub const BSSID: usize = 5;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    AccessPoints,
    Stations,
}

/// Parser state: the current section plus everything collected so far.
#[derive(Debug)]
struct CaptureParser {
    section: Section,
    access_points: Vec<AccessPoint>,
    stations: Vec<Station>,
}

impl CaptureParser {
    fn new() -> Self {
        Self {
            section: Section::AccessPoints,
            access_points: Vec::new(),
            stations: Vec::new(),
        }
    }

    fn feed(&mut self, row: &[String]) {
        if row.len() < 2 {
            return;
        }
        if row[0].contains(STATION_MARKER) {
            self.section = Section::Stations;
            return;
        }

        match self.section {
            Section::AccessPoints => {
                if let Some(ap) = parse_access_point(row) {
                    self.access_points.push(ap);
                }
            }
            Section::Stations => {
                if let Some(station) = parse_station(row) {
                    self.stations.push(station);
                }
            }
        }
    }

    fn finish(mut self) -> Vec<AccessPoint> {
        attach_stations(&mut self.access_points, self.stations);
        self.access_points
    }
}

/// Parse raw capture file bytes (ISO-8859-1) into access points with their
/// clients attached. Rows that are too short or otherwise malformed are skipped.
pub fn parse_capture(data: &[u8]) -> Vec<AccessPoint> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(data);

    let mut parser = CaptureParser::new();
    let mut record = ByteRecord::new();
    loop {
        match reader.read_byte_record(&mut record) {
            Ok(true) => {
                let row: Vec<String> = record.iter().map(decode_latin1).collect();
                parser.feed(&row);
            }
            Ok(false) => break,
            Err(_) => continue,
        }
    }
    parser.finish()
}

fn parse_access_point(row: &[String]) -> Option<AccessPoint> {
    if row.len() < AP_MIN_FIELDS || row[ap_field::BSSID] == AP_HEADER {
        return None;
    }

    let security = format!(
        "{} {} {}",
        row[ap_field::PRIVACY],
        or_unknown(&row[ap_field::CIPHER]),
        or_unknown(&row[ap_field::AUTH]),
    );

    Some(AccessPoint::new(
        row[ap_field::BSSID].as_str(),
        row[ap_field::ESSID].as_str(),
        parse_signal(&row[ap_field::POWER]),
        parse_channel(&row[ap_field::CHANNEL]),
        security,
    ))
}

fn parse_station(row: &[String]) -> Option<Station> {
    if row.len() < STATION_MIN_FIELDS {
        return None;
    }
    Some(Station::new(
        row[station_field::MAC].as_str(),
        row[station_field::BSSID].as_str(),
        parse_signal(&row[station_field::POWER]),
    ))
}

fn parse_signal(field: &str) -> i32 {
    field.trim().parse().unwrap_or(UNKNOWN_SIGNAL)
}

fn parse_channel(field: &str) -> i32 {
    field.trim().parse().unwrap_or(UNKNOWN_CHANNEL)
}

fn or_unknown(field: &str) -> &str {
    if field.is_empty() {
        "Unknown"
    } else {
        field
    }
}

/// ISO-8859-1 maps every byte to the code point of the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const AP_HEADER_ROW: &str = "BSSID, First time seen, Last time seen, channel, Speed, Privacy, Cipher, Authentication, Power, # beacons, # IV, LAN IP, ID-length, ESSID, Key";
    const STATION_HEADER_ROW: &str = "Station MAC, First time seen, Last time seen, Power, # packets, BSSID, Probed ESSIDs";

    fn ap_row(bssid: &str, channel: &str, power: &str, essid: &str) -> String {
        format!(
            "{}, 2024-01-01 10:00:00, 2024-01-01 10:00:10, {}, 54, WPA2, CCMP, PSK, {}, 12, 0, 0.  0.  0.  0, {}, {}, ",
            bssid,
            channel,
            power,
            essid.len(),
            essid
        )
    }

    fn station_row(mac: &str, power: &str, bssid: &str) -> String {
        format!(
            "{}, 2024-01-01 10:00:00, 2024-01-01 10:00:10, {}, 20, {}, ",
            mac, power, bssid
        )
    }

    fn capture(lines: &[String]) -> Vec<u8> {
        lines.join("\r\n").into_bytes()
    }

    #[test]
    fn test_single_ap_with_client() {
        let data = capture(&[
            String::new(),
            AP_HEADER_ROW.to_string(),
            ap_row("AA:BB:CC:DD:EE:FF", "6", "-45", "TestNet"),
            String::new(),
            STATION_HEADER_ROW.to_string(),
            station_row("11:22:33:44:55:66", "-60", "AA:BB:CC:DD:EE:FF"),
        ]);

        let aps = parse_capture(&data);
        assert_eq!(aps.len(), 1);
        let ap = &aps[0];
        assert_eq!(ap.essid, "TestNet");
        assert_eq!(ap.channel, 6);
        assert_eq!(ap.signal, -45);
        assert_eq!(ap.security, "WPA2 CCMP PSK");
        assert_eq!(ap.clients.len(), 1);
        assert_eq!(ap.clients[0].signal, -60);
        assert_eq!(ap.clients[0].mac, "11:22:33:44:55:66");
    }

    #[test]
    fn test_missing_marker_means_all_rows_are_aps() {
        // Without the marker the station row is read as a too-short AP row.
        let data = capture(&[
            ap_row("AA:00:00:00:00:01", "1", "-50", "One"),
            ap_row("AA:00:00:00:00:02", "11", "-70", "Two"),
            station_row("11:22:33:44:55:66", "-60", "AA:00:00:00:00:01"),
        ]);

        let aps = parse_capture(&data);
        assert_eq!(aps.len(), 2);
        assert!(aps.iter().all(|ap| ap.clients.is_empty()));
    }

    #[test]
    fn test_unparseable_numbers_use_sentinels() {
        let data = capture(&[
            ap_row("AA:00:00:00:00:01", "x", "n/a", "Broken"),
            STATION_HEADER_ROW.to_string(),
            station_row("11:22:33:44:55:66", "??", "AA:00:00:00:00:01"),
        ]);

        let aps = parse_capture(&data);
        assert_eq!(aps[0].signal, UNKNOWN_SIGNAL);
        assert_eq!(aps[0].channel, UNKNOWN_CHANNEL);
        assert_eq!(aps[0].clients[0].signal, UNKNOWN_SIGNAL);
    }

    #[test]
    fn test_unmatched_and_short_rows_dropped() {
        let data = capture(&[
            AP_HEADER_ROW.to_string(),
            ap_row("AA:00:00:00:00:01", "6", "-40", "Net"),
            "AA:00:00:00:00:02, short".to_string(),
            "lonely".to_string(),
            STATION_HEADER_ROW.to_string(),
            station_row("11:22:33:44:55:66", "-60", "(not associated)"),
            station_row("11:22:33:44:55:77", "-61", "FF:FF:FF:FF:FF:00"),
            "11:22:33:44:55:88, -50".to_string(),
        ]);

        let aps = parse_capture(&data);
        assert_eq!(aps.len(), 1);
        assert!(aps[0].clients.is_empty());
    }

    #[test]
    fn test_blank_cipher_and_auth() {
        let row = "AA:00:00:00:00:01, t0, t1, 11, 54, OPN, , , -30, 1, 0, 0.  0.  0.  0, 4, Cafe, ";
        let aps = parse_capture(row.as_bytes());
        assert_eq!(aps[0].security, "OPN Unknown Unknown");
        assert_eq!(aps[0].essid, "Cafe");
    }

    #[test]
    fn test_latin1_essid() {
        let mut data = b"AA:00:00:00:00:01, t0, t1, 1, 54, WPA2, CCMP, PSK, -30, 1, 0, 0.0.0.0, 4, Caf".to_vec();
        data.push(0xE9);
        data.extend_from_slice(b", ");

        let aps = parse_capture(&data);
        assert_eq!(aps[0].essid, "Caf\u{e9}");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_capture(b"").is_empty());
    }
}
