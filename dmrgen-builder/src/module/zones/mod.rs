//! Zone generators
//!
//! Zone generators read channels that were allocated earlier in the run
//! and group them. They never modify the channels.

pub mod callsign;
pub mod location;

pub use callsign::{CallsignKey, CallsignZones, LocatorZones};
pub use location::{DistanceBandZones, LocationClusterZones, ZoneNaming};

use std::collections::BTreeMap;

use dmrgen_common::capacity::{MAX_ZONE_CHANNELS, MAX_ZONES};
use dmrgen_common::{ChannelId, ChannelRecord, Sequence, Zone, truncate_to_capacity};

use crate::module::generator::{Aggregator, Generate, Source};

/// Borrowed read-only view of an analog or digital channel
pub type ChannelView<'c> = &'c dyn ChannelRecord;

/// Allocate one zone per group, in the given order.
///
/// Groups past the zone ceiling are dropped before allocation, and each
/// membership list is capped at the per-zone ceiling.
pub(crate) fn emit_zones(label: &str, seq: &mut Sequence, mut groups: Vec<(String, Vec<ChannelId>)>) -> Vec<Zone> {
    truncate_to_capacity(&mut groups, MAX_ZONES, "Zone set", label);

    groups
        .into_iter()
        .map(|(name, mut channels)| {
            truncate_to_capacity(&mut channels, MAX_ZONE_CHANNELS, "Zone", &name);
            Zone {
                id: seq.next_id(),
                name,
                channels,
            }
        })
        .collect()
}

/// Group channels under string keys, keys in sorted order and members
/// sorted by channel name.
pub(crate) fn group_sorted<'c>(
    channels: &[ChannelView<'c>],
    key: impl Fn(&dyn ChannelRecord) -> Option<String>,
) -> Vec<(String, Vec<ChannelId>)> {
    let mut groups: BTreeMap<String, Vec<ChannelView<'c>>> = BTreeMap::new();
    for channel in channels {
        if let Some(key) = key(*channel) {
            groups.entry(key).or_default().push(*channel);
        }
    }

    groups
        .into_iter()
        .map(|(key, mut members)| {
            members.sort_by(|a, b| a.name().cmp(b.name()));
            (key, members.iter().map(|c| c.id()).collect())
        })
        .collect()
}

/// One zone over a fixed channel list, in list order.
pub struct ListZone<'c> {
    name: String,
    channels: Vec<ChannelView<'c>>,
}

impl<'c> ListZone<'c> {
    pub fn new(name: impl Into<String>, channels: Vec<ChannelView<'c>>) -> Self {
        Self {
            name: name.into(),
            channels,
        }
    }
}

impl Generate for ListZone<'_> {
    type Entity = Zone;

    fn label(&self) -> String {
        format!("zone '{}'", self.name)
    }

    fn generate(&self, seq: &mut Sequence) -> Vec<Zone> {
        if self.channels.is_empty() {
            return Vec::new();
        }
        let members = self.channels.iter().map(|c| c.id()).collect();
        emit_zones(&self.label(), seq, vec![(self.name.clone(), members)])
    }
}

/// "Hotspot" zone with every hotspot channel, optionally followed by a
/// zone with every other channel.
pub struct HotspotZones<'c> {
    channels: Vec<ChannelView<'c>>,
    pub repeaters_zone: Option<String>,
}

impl<'c> HotspotZones<'c> {
    pub fn new(channels: Vec<ChannelView<'c>>) -> Self {
        Self {
            channels,
            repeaters_zone: None,
        }
    }
}

impl Generate for HotspotZones<'_> {
    type Entity = Zone;

    fn label(&self) -> String {
        "hotspot zones".to_string()
    }

    fn generate(&self, seq: &mut Sequence) -> Vec<Zone> {
        let (hotspots, repeaters): (Vec<ChannelView>, Vec<ChannelView>) =
            self.channels.iter().copied().partition(|c| c.is_hotspot());

        let mut groups = Vec::new();
        if !hotspots.is_empty() {
            groups.push(("Hotspot".to_string(), hotspots.iter().map(|c| c.id()).collect()));
        }
        if let Some(name) = &self.repeaters_zone {
            if !repeaters.is_empty() {
                groups.push((name.clone(), repeaters.iter().map(|c| c.id()).collect()));
            }
        }
        emit_zones(&self.label(), seq, groups)
    }
}

/// One zone per frequency band, named "<prefix> <band>".
pub struct BandZones<'c> {
    prefix: String,
    channels: Vec<ChannelView<'c>>,
    /// (band name, inclusive MHz range)
    pub bands: Vec<(String, f64, f64)>,
}

impl<'c> BandZones<'c> {
    pub fn new(prefix: impl Into<String>, channels: Vec<ChannelView<'c>>) -> Self {
        Self {
            prefix: prefix.into(),
            channels,
            bands: vec![("2m".to_string(), 144.0, 148.0), ("70cm".to_string(), 420.0, 450.0)],
        }
    }
}

impl Generate for BandZones<'_> {
    type Entity = Zone;

    fn label(&self) -> String {
        format!("{} band zones", self.prefix)
    }

    fn generate(&self, seq: &mut Sequence) -> Vec<Zone> {
        let groups = self
            .bands
            .iter()
            .map(|(band, min, max)| {
                let members: Vec<ChannelId> = self
                    .channels
                    .iter()
                    .filter(|c| (*min..=*max).contains(&c.rx_freq()))
                    .map(|c| c.id())
                    .collect();
                (format!("{} {}", self.prefix, band), members)
            })
            .filter(|(_, members)| !members.is_empty())
            .collect();
        emit_zones(&self.label(), seq, groups)
    }
}

/// Fan-in of zone generators, capped at the zone ceiling overall.
pub struct ZoneAggregator<'a> {
    inner: Aggregator<'a, Zone>,
}

impl<'a> ZoneAggregator<'a> {
    pub fn new() -> Self {
        Self {
            inner: Aggregator::new("zones"),
        }
    }

    pub fn with(mut self, source: impl Source<Zone> + 'a) -> Self {
        self.inner = self.inner.with(source);
        self
    }

    pub fn order(&self) -> Vec<String> {
        self.inner.order()
    }
}

impl Default for ZoneAggregator<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Source<Zone> for ZoneAggregator<'_> {
    fn label(&self) -> String {
        self.inner.label()
    }

    fn produce(&mut self, seq: &mut Sequence) -> Vec<Zone> {
        let mut zones = self.inner.produce(seq);
        truncate_to_capacity(&mut zones, MAX_ZONES, "Zone set", "all zones");
        zones
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::module::generator::Producer;
    use dmrgen_common::{AnalogChannel, DigitalChannel, GroupingHints, TimeSlot};

    pub(crate) fn analog(id: u32, name: &str, rx: f64) -> AnalogChannel {
        AnalogChannel::new(id, name, rx, rx)
    }

    pub(crate) fn digital(id: u32, name: &str, callsign: Option<&str>, coords: Option<(f64, f64)>) -> DigitalChannel {
        let mut ch = DigitalChannel::new(id, name, 439.5, 430.1, 1, TimeSlot::Ts1);
        ch.hints = GroupingHints {
            lat: coords.map(|c| c.0),
            lng: coords.map(|c| c.1),
            rpt_callsign: callsign.map(str::to_string),
            ..Default::default()
        };
        ch
    }

    pub(crate) fn views<C: ChannelRecord>(channels: &[C]) -> Vec<ChannelView<'_>> {
        channels.iter().map(|c| c as &dyn ChannelRecord).collect()
    }

    #[test]
    fn test_list_zone_keeps_input_order() {
        let channels = vec![analog(3, "PMR 2", 446.0), analog(2, "PMR 1", 446.0)];
        let mut seq = Sequence::new();
        let zones = Producer::new(ListZone::new("PMR", views(&channels))).produce(&mut seq);
        assert_eq!(zones, vec![Zone { id: 1, name: "PMR".into(), channels: vec![3, 2] }]);
    }

    #[test]
    fn test_list_zone_empty_emits_nothing() {
        let mut seq = Sequence::new();
        let zones = Producer::new(ListZone::new("Empty", Vec::new())).produce(&mut seq);
        assert!(zones.is_empty());
        assert_eq!(seq.allocated(), 0);
    }

    #[test]
    fn test_list_zone_truncated_to_capacity() {
        let channels: Vec<AnalogChannel> = (1..=300).map(|i| analog(i, &format!("CH{}", i), 145.0)).collect();
        let mut seq = Sequence::new();
        let zones = Producer::new(ListZone::new("Big", views(&channels))).produce(&mut seq);
        assert_eq!(zones[0].channels.len(), MAX_ZONE_CHANNELS);
        assert_eq!(zones[0].channels[249], 250);
    }

    #[test]
    fn test_hotspot_zones() {
        let channels = vec![
            digital(1, "HS TS1", None, None),
            digital(2, "SR5WA TS1", Some("SR5WA"), None),
            digital(3, "HS2602 Mazowsze", None, None),
        ];
        let mut producer = HotspotZones::new(views(&channels));
        producer.repeaters_zone = Some("Repeaters".to_string());
        let mut seq = Sequence::new();
        let zones = Producer::new(producer).produce(&mut seq);

        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].name, "Hotspot");
        assert_eq!(zones[0].channels, vec![1, 3]);
        assert_eq!(zones[1].channels, vec![2]);
    }

    #[test]
    fn test_band_zones() {
        let channels = vec![
            analog(1, "A", 145.6),
            analog(2, "B", 439.1),
            analog(3, "C", 145.7),
            analog(4, "D", 52.5),
        ];
        let mut seq = Sequence::new();
        let zones = Producer::new(BandZones::new("Analog", views(&channels))).produce(&mut seq);

        let summary: Vec<(&str, &[u32])> = zones.iter().map(|z| (z.name.as_str(), z.channels.as_slice())).collect();
        assert_eq!(summary, vec![("Analog 2m", &[1, 3][..]), ("Analog 70cm", &[2][..])]);
    }

    #[test]
    fn test_zone_aggregator_caps_zone_count() {
        let channels = vec![analog(1, "A", 145.0)];
        let mut aggregator = ZoneAggregator::new();
        for i in 0..260 {
            aggregator = aggregator.with(Producer::new(ListZone::new(format!("Z{}", i), views(&channels))));
        }
        let mut seq = Sequence::new();
        let zones = aggregator.produce(&mut seq);
        assert_eq!(zones.len(), MAX_ZONES);
        assert_eq!(zones[0].name, "Z0");
    }
}
