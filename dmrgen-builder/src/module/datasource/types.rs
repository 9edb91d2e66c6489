//! Record shapes handed over by the data-source collaborators

use chrono::{DateTime, NaiveDateTime, Utc};
use dmrgen_common::Coordinates;
use serde::{Deserialize, Serialize};

/// One talkgroup from the network registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TalkgroupEntry {
    /// Numeric group-call address
    pub calling_id: u32,
    pub name: String,
}

/// A talkgroup statically bound to a repeater time slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalkgroupBinding {
    pub talkgroup: u32,
    /// 1 or 2; 0 means dynamic / unbound
    pub slot: u8,
}

/// A repeater or hotspot from the network device directory.
///
/// Frequencies are from the device's point of view: `tx` is what the
/// device transmits, i.e. what the radio receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: u32,
    pub callsign: String,
    pub rx: f64,
    pub tx: f64,
    #[serde(rename = "colorcode")]
    pub color_code: u8,
    #[serde(default)]
    pub pep: Option<f64>,
    #[serde(default, rename = "statusText")]
    pub status: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub city: Option<String>,
    /// e.g. "2026-02-18 04:59:02" or RFC 3339
    #[serde(default)]
    pub last_seen: Option<String>,
    #[serde(default)]
    pub talkgroups: Vec<TalkgroupBinding>,
}

impl Device {
    /// Simplex, single-watt or DMO devices are personal hotspots, not repeaters.
    pub fn is_hotspot_like(&self) -> bool {
        (self.rx - self.tx).abs() < 1e-9
            || self.pep.is_some_and(|pep| pep == 1.0)
            || self.status.as_deref() == Some("DMO")
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::new(self.lat?, self.lng?)
    }

    /// Parsed `last_seen`, if present and well-formed.
    pub fn last_seen_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.last_seen.as_deref()?.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Seen at or after `since`. Devices with no usable timestamp are not.
    pub fn seen_since(&self, since: DateTime<Utc>) -> bool {
        self.last_seen_at().is_some_and(|seen| seen >= since)
    }
}

/// Operational state of an analog repeater
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RepeaterStatus {
    Working,
    Testing,
    Off,
    Planned,
}

impl RepeaterStatus {
    pub fn is_on_air(&self) -> bool {
        matches!(self, RepeaterStatus::Working | RepeaterStatus::Testing)
    }
}

/// An analog FM repeater from the regional export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalogRepeater {
    #[serde(default)]
    pub callsign: String,
    /// Repeater output, the radio's receive frequency
    pub output_freq: f64,
    /// Repeater input, the radio's transmit frequency
    pub input_freq: f64,
    /// CTCSS tone the repeater sends
    #[serde(default)]
    pub ctcss_tx: Option<f64>,
    /// CTCSS tone the repeater expects
    #[serde(default)]
    pub ctcss_rx: Option<f64>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub locator: Option<String>,
    #[serde(default)]
    pub qth: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub status: Option<RepeaterStatus>,
}

impl AnalogRepeater {
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::new(self.lat?, self.lng?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(json: &str) -> Device {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_device_deserialize_minimal() {
        let dev = device(r#"{"id": 260101, "callsign": "SR5WA", "rx": 430.1, "tx": 439.5, "colorcode": 1}"#);
        assert_eq!(dev.callsign, "SR5WA");
        assert!(dev.talkgroups.is_empty());
        assert!(dev.coordinates().is_none());
        assert!(!dev.is_hotspot_like());
    }

    #[test]
    fn test_device_hotspot_like() {
        let simplex = device(r#"{"id": 1, "callsign": "SP5ABC", "rx": 438.8, "tx": 438.8, "colorcode": 1}"#);
        assert!(simplex.is_hotspot_like());

        let low_power = device(r#"{"id": 2, "callsign": "SP5ABC", "rx": 430.0, "tx": 439.0, "colorcode": 1, "pep": 1}"#);
        assert!(low_power.is_hotspot_like());

        let dmo = device(
            r#"{"id": 3, "callsign": "SP5ABC", "rx": 430.0, "tx": 439.0, "colorcode": 1, "statusText": "DMO"}"#,
        );
        assert!(dmo.is_hotspot_like());
    }

    #[test]
    fn test_device_last_seen_formats() {
        let since = "2026-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();

        let plain = device(
            r#"{"id": 1, "callsign": "SR5WA", "rx": 1, "tx": 2, "colorcode": 1, "last_seen": "2026-02-18 04:59:02"}"#,
        );
        assert!(plain.seen_since(since));

        let old = device(
            r#"{"id": 1, "callsign": "SR5WA", "rx": 1, "tx": 2, "colorcode": 1, "last_seen": "2025-02-18T04:59:02+00:00"}"#,
        );
        assert!(!old.seen_since(since));

        let garbage = device(r#"{"id": 1, "callsign": "SR5WA", "rx": 1, "tx": 2, "colorcode": 1, "last_seen": "yesterday"}"#);
        assert!(garbage.last_seen_at().is_none());
        assert!(!garbage.seen_since(since));
    }

    #[test]
    fn test_analog_repeater_status() {
        let rpt: AnalogRepeater = serde_json::from_str(
            r#"{"callsign": "SR5W", "output_freq": 145.6, "input_freq": 145.0, "status": "TESTING"}"#,
        )
        .unwrap();
        assert_eq!(rpt.status, Some(RepeaterStatus::Testing));
        assert!(rpt.status.unwrap().is_on_air());
        assert!(!RepeaterStatus::Off.is_on_air());
    }
}
