//! Channel producers
//!
//! Analog and digital channels share one identifier space, so every
//! producer here draws from the run's channel sequence.

pub mod analog;
pub mod digital;

pub use analog::{Pmr446Channels, RepeaterAnalogChannels};
pub use digital::{HotspotChannels, RepeaterDigitalChannels};

use chrono::{DateTime, Duration, Utc};
use dmrgen_common::{Coordinates, GroupingHints};
use regex::Regex;

use crate::module::datasource::Device;
use crate::module::geo::maidenhead;

/// Which directory devices become channels.
#[derive(Debug, Clone, Default)]
pub struct DeviceSelection {
    /// Repeater callsign pattern, e.g. `^SR[0-9]`
    pub callsign: Option<Regex>,
    /// Devices not seen since this instant are skipped
    pub active_since: Option<DateTime<Utc>>,
}

impl DeviceSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callsign(mut self, pattern: Regex) -> Self {
        self.callsign = Some(pattern);
        self
    }

    /// Only devices seen within the last `days` days, counted from `now`.
    pub fn active_within(mut self, days: i64, now: DateTime<Utc>) -> Self {
        self.active_since = Some(now - Duration::days(days));
        self
    }

    /// Repeaters (not hotspot-like devices) passing the callsign and
    /// activity checks.
    pub fn accepts(&self, device: &Device) -> bool {
        if device.is_hotspot_like() {
            tracing::debug!("Skipping {}: hotspot-like device", device.callsign);
            return false;
        }
        if let Some(pattern) = &self.callsign {
            if !pattern.is_match(&device.callsign) {
                return false;
            }
        }
        if let Some(since) = self.active_since {
            if !device.seen_since(since) {
                tracing::debug!("Skipping {}: not seen since {}", device.callsign, since);
                return false;
            }
        }
        true
    }
}

/// Grouping hints of a channel derived from a directory device.
fn device_hints(device: &Device) -> GroupingHints {
    located_hints(device.coordinates(), None, Some(device.callsign.clone()), device.city.clone())
}

/// Hints with the locator computed from the coordinates when not supplied.
fn located_hints(
    location: Option<Coordinates>,
    locator: Option<String>,
    rpt_callsign: Option<String>,
    qth: Option<String>,
) -> GroupingHints {
    let locator = locator
        .filter(|l| !l.trim().is_empty())
        .or_else(|| location.map(maidenhead));
    GroupingHints {
        lat: location.map(|l| l.lat),
        lng: location.map(|l| l.lng),
        locator,
        rpt_callsign: rpt_callsign.filter(|c| !c.is_empty()),
        qth: qth.filter(|q| !q.trim().is_empty()),
    }
}
