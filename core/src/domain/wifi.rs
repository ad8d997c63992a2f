//! Wi-Fi access point and station models.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Signal value used when the capture tool reports something unparseable.
pub const UNKNOWN_SIGNAL: i32 = -100;

/// Channel value used when the capture tool reports something unparseable.
pub const UNKNOWN_CHANNEL: i32 = -1;

// ============================================================================
// Station
// ============================================================================

/// A client station seen by the capture tool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Station {
    /// Station MAC address.
    pub mac: String,
    /// BSSID the station is associated with, as printed by the tool.
    pub bssid: String,
    /// Signal strength in dBm.
    pub signal: i32,
}

impl Station {
    /// Create a new station record.
    pub fn new(mac: impl Into<String>, bssid: impl Into<String>, signal: i32) -> Self {
        Self {
            mac: mac.into(),
            bssid: bssid.into(),
            signal,
        }
    }
}

// ============================================================================
// AccessPoint
// ============================================================================

/// An access point with the stations associated to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessPoint {
    /// BSSID (MAC of the access point).
    pub bssid: String,
    /// Broadcast network name; empty for hidden networks.
    pub essid: String,
    /// Signal strength in dBm.
    pub signal: i32,
    /// Channel number.
    pub channel: i32,
    /// Privacy, cipher and authentication joined by spaces.
    pub security: String,
    /// Stations associated with this access point.
    #[serde(default)]
    pub clients: Vec<Station>,
}

impl AccessPoint {
    /// Create an access point without clients.
    pub fn new(
        bssid: impl Into<String>,
        essid: impl Into<String>,
        signal: i32,
        channel: i32,
        security: impl Into<String>,
    ) -> Self {
        Self {
            bssid: bssid.into(),
            essid: essid.into(),
            signal,
            channel,
            security: security.into(),
            clients: Vec::new(),
        }
    }

    /// Whether the network does not broadcast its name.
    pub fn is_hidden(&self) -> bool {
        self.essid.trim().is_empty()
    }

    /// Name suitable for display.
    pub fn display_name(&self) -> &str {
        if self.is_hidden() {
            "<hidden>"
        } else {
            &self.essid
        }
    }
}

/// Attach stations to their access points by exact BSSID match.
///
/// Stations whose BSSID matches no access point are dropped.
pub fn attach_stations(access_points: &mut [AccessPoint], stations: Vec<Station>) {
    for station in stations {
        if let Some(ap) = access_points.iter_mut().find(|ap| ap.bssid == station.bssid) {
            ap.clients.push(station);
        }
    }
}

// ============================================================================
// Filtering
// ============================================================================

/// Inclusive channel range such as `1-6`, or a single channel such as `11`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRange {
    pub start: i32,
    pub end: i32,
}

impl ChannelRange {
    /// Whether `channel` lies inside the range.
    pub fn contains(&self, channel: i32) -> bool {
        (self.start..=self.end).contains(&channel)
    }
}

impl FromStr for ChannelRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim()
                .parse::<i32>()
                .map_err(|_| Error::InvalidArgument(format!("Invalid channel range: {}", s)))
        };

        let (start, end) = match s.split_once('-') {
            Some((a, b)) => (parse(a)?, parse(b)?),
            None => {
                let single = parse(s)?;
                (single, single)
            }
        };

        if start > end {
            return Err(Error::InvalidArgument(format!(
                "Channel range start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }
}

impl std::fmt::Display for ChannelRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Filter criteria for Wi-Fi scan results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiFilter {
    /// Keep only networks with exactly this ESSID.
    pub ssid: Option<String>,
    /// Keep only networks on these channels.
    pub channels: Option<ChannelRange>,
    /// Keep only networks at or above this signal (dBm).
    pub min_signal: Option<i32>,
}

impl WifiFilter {
    /// Check if an access point matches this filter.
    pub fn matches(&self, ap: &AccessPoint) -> bool {
        if let Some(ref ssid) = self.ssid {
            if &ap.essid != ssid {
                return false;
            }
        }
        if let Some(range) = self.channels {
            if !range.contains(ap.channel) {
                return false;
            }
        }
        if let Some(min) = self.min_signal {
            if ap.signal < min {
                return false;
            }
        }
        true
    }

    /// Apply the filter and sort the survivors by descending signal.
    pub fn apply(&self, access_points: Vec<AccessPoint>) -> Vec<AccessPoint> {
        let mut result: Vec<AccessPoint> =
            access_points.into_iter().filter(|ap| self.matches(ap)).collect();
        sort_by_signal(&mut result);
        result
    }
}

/// Sort access points strongest first.
pub fn sort_by_signal(access_points: &mut [AccessPoint]) {
    access_points.sort_by(|a, b| b.signal.cmp(&a.signal));
}

// ============================================================================
// Channel analysis
// ============================================================================

/// Least crowded channel among the scanned networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecommendation {
    pub channel: i32,
    /// Number of access points seen on that channel.
    pub occupancy: usize,
}

/// Count access points per channel, in first-seen order.
///
/// Access points with an unknown channel are ignored.
pub fn channel_usage(access_points: &[AccessPoint]) -> Vec<(i32, usize)> {
    let mut usage: Vec<(i32, usize)> = Vec::new();
    for ap in access_points.iter().filter(|ap| ap.channel != UNKNOWN_CHANNEL) {
        match usage.iter_mut().find(|(channel, _)| *channel == ap.channel) {
            Some((_, count)) => *count += 1,
            None => usage.push((ap.channel, 1)),
        }
    }
    usage
}

/// Recommend the channel occupied by the fewest access points.
///
/// Ties go to the channel encountered first.
pub fn recommend_channel(access_points: &[AccessPoint]) -> Option<ChannelRecommendation> {
    let mut best: Option<ChannelRecommendation> = None;
    for (channel, occupancy) in channel_usage(access_points) {
        if best.map_or(true, |b| occupancy < b.occupancy) {
            best = Some(ChannelRecommendation { channel, occupancy });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ap(bssid: &str, essid: &str, signal: i32, channel: i32) -> AccessPoint {
        AccessPoint::new(bssid, essid, signal, channel, "WPA2 CCMP PSK")
    }

    #[test]
    fn test_hidden_network() {
        let hidden = ap("AA:BB:CC:DD:EE:01", "", -50, 1);
        assert!(hidden.is_hidden());
        assert_eq!(hidden.display_name(), "<hidden>");

        let named = ap("AA:BB:CC:DD:EE:02", "TestNet", -50, 1);
        assert_eq!(named.display_name(), "TestNet");
    }

    #[test]
    fn test_attach_stations_drops_unmatched() {
        let mut aps = vec![ap("AA:BB:CC:DD:EE:FF", "TestNet", -45, 6)];
        attach_stations(
            &mut aps,
            vec![
                Station::new("11:22:33:44:55:66", "AA:BB:CC:DD:EE:FF", -60),
                Station::new("11:22:33:44:55:77", "(not associated)", -70),
                Station::new("11:22:33:44:55:88", "00:00:00:00:00:01", -70),
            ],
        );
        assert_eq!(aps[0].clients.len(), 1);
        assert_eq!(aps[0].clients[0].signal, -60);
    }

    #[test]
    fn test_channel_range_parse() {
        let range: ChannelRange = "1-6".parse().unwrap();
        assert!(range.contains(1));
        assert!(range.contains(4));
        assert!(range.contains(6));
        assert!(!range.contains(11));
        assert_eq!(range.to_string(), "1-6");

        let single: ChannelRange = "11".parse().unwrap();
        assert!(single.contains(11));
        assert!(!single.contains(10));

        assert!("6-1".parse::<ChannelRange>().is_err());
        assert!("abc".parse::<ChannelRange>().is_err());
    }

    #[test]
    fn test_filter_and_sort() {
        let aps = vec![
            ap("AA:00:00:00:00:01", "Home", -70, 1),
            ap("AA:00:00:00:00:02", "Office", -40, 6),
            ap("AA:00:00:00:00:03", "Home", -55, 11),
        ];

        let all = WifiFilter::default().apply(aps.clone());
        let signals: Vec<i32> = all.iter().map(|a| a.signal).collect();
        assert_eq!(signals, vec![-40, -55, -70]);

        let by_ssid = WifiFilter {
            ssid: Some("Home".to_string()),
            ..Default::default()
        }
        .apply(aps.clone());
        assert_eq!(by_ssid.len(), 2);
        assert_eq!(by_ssid[0].channel, 11);

        let by_channel = WifiFilter {
            channels: Some("1-6".parse().unwrap()),
            ..Default::default()
        }
        .apply(aps.clone());
        assert_eq!(by_channel.len(), 2);

        let by_signal = WifiFilter {
            min_signal: Some(-60),
            ..Default::default()
        }
        .apply(aps);
        assert_eq!(by_signal.len(), 2);
        assert!(by_signal.iter().all(|a| a.signal >= -60));
    }

    #[test]
    fn test_recommend_channel_avoids_crowded() {
        let aps = vec![
            ap("AA:00:00:00:00:01", "A", -50, 1),
            ap("AA:00:00:00:00:02", "B", -50, 1),
            ap("AA:00:00:00:00:03", "C", -50, 6),
            ap("AA:00:00:00:00:04", "D", -50, 11),
        ];
        let rec = recommend_channel(&aps).unwrap();
        assert_ne!(rec.channel, 1);
        assert!(rec.channel == 6 || rec.channel == 11);
        assert_eq!(rec.occupancy, 1);
    }

    #[test]
    fn test_recommend_channel_ignores_unknown() {
        assert!(recommend_channel(&[]).is_none());

        let aps = vec![
            ap("AA:00:00:00:00:01", "A", -50, UNKNOWN_CHANNEL),
            ap("AA:00:00:00:00:02", "B", -50, 3),
        ];
        assert_eq!(channel_usage(&aps), vec![(3, 1)]);
        assert_eq!(recommend_channel(&aps).unwrap().channel, 3);
    }
}
