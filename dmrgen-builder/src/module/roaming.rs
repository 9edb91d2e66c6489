//! Roaming channels and zones for automatic repeater hand-off

use std::collections::BTreeMap;
use std::sync::LazyLock;

use dmrgen_common::capacity::MAX_ROAMING_ZONE_CHANNELS;
use dmrgen_common::{RoamingChannel, RoamingChannelId, RoamingZone, Sequence, TimeSlot, truncate_to_capacity};
use regex::Regex;

use crate::module::channels::DeviceSelection;
use crate::module::datasource::{DeviceDirectory, StaticTalkgroups};
use crate::module::generator::Generate;

/// One roaming channel per (repeater, slot) pair carrying static talkgroups.
pub struct RoamingChannels<'d, D: DeviceDirectory + ?Sized, S: StaticTalkgroups + ?Sized> {
    devices: &'d D,
    bindings: &'d S,
    selection: DeviceSelection,
}

impl<'d, D, S> RoamingChannels<'d, D, S>
where
    D: DeviceDirectory + ?Sized,
    S: StaticTalkgroups + ?Sized,
{
    pub fn new(devices: &'d D, bindings: &'d S, selection: DeviceSelection) -> Self {
        Self {
            devices,
            bindings,
            selection,
        }
    }
}

impl<D, S> Generate for RoamingChannels<'_, D, S>
where
    D: DeviceDirectory + ?Sized,
    S: StaticTalkgroups + ?Sized,
{
    type Entity = RoamingChannel;

    fn label(&self) -> String {
        "roaming channels".to_string()
    }

    fn generate(&self, seq: &mut Sequence) -> Vec<RoamingChannel> {
        let mut channels = Vec::new();

        for device in self.devices.devices().iter().filter(|d| self.selection.accepts(d)) {
            let bindings = self.bindings.static_talkgroups(device.id);
            for slot in TimeSlot::both() {
                if !bindings.iter().any(|b| b.slot == slot.number()) {
                    continue;
                }
                channels.push(RoamingChannel {
                    id: seq.next_id(),
                    name: format!("{} {}", device.callsign, slot),
                    rx_freq: device.tx,
                    tx_freq: device.rx,
                    color: device.color_code,
                    slot,
                });
            }
        }

        tracing::info!("{} roaming channels", channels.len());
        channels
    }
}

/// Roaming channels grouped by callsign prefix (`^[A-Z]{2}[0-9]`).
pub struct RoamingZones<'c> {
    channels: &'c [RoamingChannel],
}

static ROAMING_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]{2}[0-9])").expect("constant roaming prefix pattern"));

impl<'c> RoamingZones<'c> {
    pub fn new(channels: &'c [RoamingChannel]) -> Self {
        Self { channels }
    }
}

impl Generate for RoamingZones<'_> {
    type Entity = RoamingZone;

    fn label(&self) -> String {
        "roaming zones".to_string()
    }

    fn generate(&self, seq: &mut Sequence) -> Vec<RoamingZone> {
        let mut groups: BTreeMap<String, Vec<RoamingChannelId>> = BTreeMap::new();
        for channel in self.channels {
            if let Some(prefix) = ROAMING_PREFIX.captures(&channel.name).and_then(|c| c.get(1)) {
                groups.entry(prefix.as_str().to_string()).or_default().push(channel.id);
            }
        }

        groups
            .into_iter()
            .map(|(name, mut channels)| {
                channels.sort_unstable();
                truncate_to_capacity(&mut channels, MAX_ROAMING_ZONE_CHANNELS, "Roaming zone", &name);
                RoamingZone {
                    id: seq.next_id(),
                    name,
                    channels,
                }
            })
            .collect()
    }
}
