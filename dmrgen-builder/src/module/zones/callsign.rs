//! Zones keyed by repeater callsign or grid locator

use std::sync::LazyLock;

use dmrgen_common::{ChannelRecord, Sequence, Zone};
use regex::Regex;

use super::{ChannelView, emit_zones, group_sorted};
use crate::module::generator::Generate;

/// How a repeater callsign is turned into a zone key
#[derive(Debug, Clone)]
pub enum CallsignKey {
    /// One zone per repeater
    Callsign,
    /// One zone per callsign prefix: the first capture group of the pattern
    Prefix(Regex),
}

impl CallsignKey {
    /// Letters plus call-area digit, e.g. "SR5" from "SR5WA"
    pub fn default_prefix() -> Self {
        CallsignKey::Prefix(callsign_prefix_pattern())
    }

    pub fn key(&self, callsign: &str) -> Option<String> {
        match self {
            CallsignKey::Callsign => Some(callsign.to_string()),
            CallsignKey::Prefix(pattern) => pattern
                .captures(callsign)
                .and_then(|captures| captures.get(1).or_else(|| captures.get(0)))
                .map(|m| m.as_str().to_string()),
        }
    }
}

static CALLSIGN_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]{1,2}[0-9])").expect("constant callsign prefix pattern"));

/// `^([A-Z]{1,2}[0-9])`
pub fn callsign_prefix_pattern() -> Regex {
    CALLSIGN_PREFIX.clone()
}

/// Repeater channels grouped by callsign; hotspot channels are skipped.
pub struct CallsignZones<'c> {
    channels: Vec<ChannelView<'c>>,
    key: CallsignKey,
}

impl<'c> CallsignZones<'c> {
    pub fn new(channels: Vec<ChannelView<'c>>, key: CallsignKey) -> Self {
        Self { channels, key }
    }
}

impl Generate for CallsignZones<'_> {
    type Entity = Zone;

    fn label(&self) -> String {
        match self.key {
            CallsignKey::Callsign => "callsign zones".to_string(),
            CallsignKey::Prefix(_) => "callsign prefix zones".to_string(),
        }
    }

    fn generate(&self, seq: &mut Sequence) -> Vec<Zone> {
        let groups = group_sorted(&self.channels, |channel: &dyn ChannelRecord| {
            if channel.is_hotspot() {
                return None;
            }
            self.key.key(channel.hints().rpt_callsign.as_deref()?)
        });
        emit_zones(&self.label(), seq, groups)
    }
}

/// Channels grouped by the four-character prefix of their grid locator.
pub struct LocatorZones<'c> {
    channels: Vec<ChannelView<'c>>,
}

impl<'c> LocatorZones<'c> {
    pub fn new(channels: Vec<ChannelView<'c>>) -> Self {
        Self { channels }
    }
}

impl Generate for LocatorZones<'_> {
    type Entity = Zone;

    fn label(&self) -> String {
        "locator zones".to_string()
    }

    fn generate(&self, seq: &mut Sequence) -> Vec<Zone> {
        let groups = group_sorted(&self.channels, |channel: &dyn ChannelRecord| channel.hints().locator_prefix());
        emit_zones(&self.label(), seq, groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::generator::{Producer, Source};
    use crate::module::zones::tests::{digital, views};

    #[test]
    fn test_prefix_key() {
        let key = CallsignKey::default_prefix();
        assert_eq!(key.key("SR5WA").as_deref(), Some("SR5"));
        assert_eq!(key.key("W2ABC").as_deref(), Some("W2"));
        assert_eq!(key.key("sr5wa"), None);
        assert_eq!(CallsignKey::Callsign.key("SR5WA").as_deref(), Some("SR5WA"));
    }

    #[test]
    fn test_callsign_zones_sorted_and_hotspots_excluded() {
        let channels = vec![
            digital(1, "SR5WA TS2", Some("SR5WA"), None),
            digital(2, "HS TS1", None, None),
            digital(3, "SR3P TS1", Some("SR3P"), None),
            digital(4, "2602 Mazowsze", Some("SR5WA"), None),
            digital(5, "SR5WA TS1", Some("SR5WA"), None),
        ];
        let mut seq = Sequence::new();
        let zones = Producer::new(CallsignZones::new(views(&channels), CallsignKey::Callsign)).produce(&mut seq);

        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].name, "SR3P");
        assert_eq!(zones[1].name, "SR5WA");
        assert_eq!(zones[1].channels, vec![4, 5, 1]);
        assert_eq!(zones[1].id, 2);
    }

    #[test]
    fn test_prefix_zones_merge_repeaters() {
        let channels = vec![
            digital(1, "SR5WA TS1", Some("SR5WA"), None),
            digital(2, "SR5B TS1", Some("SR5B"), None),
            digital(3, "SR3P TS1", Some("SR3P"), None),
        ];
        let mut seq = Sequence::new();
        let zones = Producer::new(CallsignZones::new(views(&channels), CallsignKey::default_prefix())).produce(&mut seq);
        let names: Vec<&str> = zones.iter().map(|z| z.name.as_str()).collect();
        assert_eq!(names, vec!["SR3", "SR5"]);
        assert_eq!(zones[1].channels, vec![2, 1]);
    }

    #[test]
    fn test_locator_zones() {
        let mut a = digital(1, "B", None, None);
        a.hints.locator = Some("KO02md".to_string());
        let mut b = digital(2, "A", None, None);
        b.hints.locator = Some("ko02xx".to_string());
        let mut c = digital(3, "C", None, None);
        c.hints.locator = Some("JO91".to_string());
        let d = digital(4, "D", None, None);

        let channels = vec![a, b, c, d];
        let mut seq = Sequence::new();
        let zones = Producer::new(LocatorZones::new(views(&channels))).produce(&mut seq);
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].name, "JO91");
        assert_eq!(zones[1].name, "KO02");
        assert_eq!(zones[1].channels, vec![2, 1]);
    }

    #[test]
    fn test_prefix_pattern_is_shared() {
        let first = callsign_prefix_pattern();
        let second = callsign_prefix_pattern();
        assert_eq!(first.as_str(), second.as_str());
        assert_eq!(first.as_str(), CALLSIGN_PREFIX.as_str());
    }
}
