//! DMR channel producers: hotspot ladder and repeater directory

use dmrgen_common::{AprsId, Contact, ContactId, DigitalChannel, HOTSPOT_PREFIX, Sequence, TimeSlot, TxPower};

use super::{DeviceSelection, device_hints};
use crate::module::datasource::{Device, DeviceDirectory, StaticTalkgroups};
use crate::module::generator::Generate;

/// Simplex hotspot channels: one per time slot, then one per talkgroup.
#[derive(Debug, Clone)]
pub struct HotspotChannels {
    pub frequency: f64,
    pub slot: TimeSlot,
    pub color: u8,
    pub talkgroups: Vec<Contact>,
    pub default_contact: Option<ContactId>,
    pub aprs_id: Option<AprsId>,
}

impl HotspotChannels {
    /// 438.800 MHz, slot 2, color code 1
    pub fn new(talkgroups: Vec<Contact>) -> Self {
        Self {
            frequency: 438.800,
            slot: TimeSlot::Ts2,
            color: 1,
            talkgroups,
            default_contact: None,
            aprs_id: None,
        }
    }

    fn channel(&self, seq: &mut Sequence, name: String, slot: TimeSlot, contact: Option<ContactId>) -> DigitalChannel {
        let mut channel = DigitalChannel::new(seq.next_id(), name, self.frequency, self.frequency, self.color, slot);
        channel.tx_power = TxPower::Low;
        channel.tx_contact_id = contact;
        channel.aprs_id = self.aprs_id;
        channel
    }
}

impl Generate for HotspotChannels {
    type Entity = DigitalChannel;

    fn label(&self) -> String {
        format!("hotspot {:.4} MHz", self.frequency)
    }

    fn generate(&self, seq: &mut Sequence) -> Vec<DigitalChannel> {
        let mut channels = Vec::with_capacity(2 + self.talkgroups.len());

        for slot in TimeSlot::both() {
            let name = format!("{} {}", HOTSPOT_PREFIX, slot);
            channels.push(self.channel(seq, name, slot, self.default_contact));
        }
        for talkgroup in &self.talkgroups {
            let name = format!("{}{} {}", HOTSPOT_PREFIX, talkgroup.calling_id, talkgroup.name);
            channels.push(self.channel(seq, name, self.slot, Some(talkgroup.id)));
        }

        channels
    }
}

/// Channels for every selected repeater of a device directory.
///
/// Per repeater: one channel per static binding whose talkgroup is among
/// `talkgroups`, then one channel per time slot.
pub struct RepeaterDigitalChannels<'d, D: DeviceDirectory + ?Sized, S: StaticTalkgroups + ?Sized> {
    devices: &'d D,
    bindings: &'d S,
    talkgroups: Vec<Contact>,
    selection: DeviceSelection,
    pub default_contact: Option<ContactId>,
    pub aprs_id: Option<AprsId>,
}

impl<'d, D, S> RepeaterDigitalChannels<'d, D, S>
where
    D: DeviceDirectory + ?Sized,
    S: StaticTalkgroups + ?Sized,
{
    pub fn new(devices: &'d D, bindings: &'d S, talkgroups: Vec<Contact>, selection: DeviceSelection) -> Self {
        Self {
            devices,
            bindings,
            talkgroups,
            selection,
            default_contact: None,
            aprs_id: None,
        }
    }

    fn channel(&self, seq: &mut Sequence, device: &Device, name: String, slot: TimeSlot) -> DigitalChannel {
        // the radio listens on the repeater's output
        let mut channel = DigitalChannel::new(seq.next_id(), name, device.tx, device.rx, device.color_code, slot);
        channel.tx_power = TxPower::High;
        channel.aprs_id = self.aprs_id;
        channel.hints = device_hints(device);
        channel
    }
}

impl<D, S> Generate for RepeaterDigitalChannels<'_, D, S>
where
    D: DeviceDirectory + ?Sized,
    S: StaticTalkgroups + ?Sized,
{
    type Entity = DigitalChannel;

    fn label(&self) -> String {
        "repeater directory (digital)".to_string()
    }

    fn generate(&self, seq: &mut Sequence) -> Vec<DigitalChannel> {
        let mut channels = Vec::new();
        let mut repeaters = 0usize;

        for device in self.devices.devices().iter().filter(|d| self.selection.accepts(d)) {
            repeaters += 1;

            for binding in self.bindings.static_talkgroups(device.id) {
                let Some(slot) = TimeSlot::from_number(binding.slot) else {
                    continue;
                };
                for talkgroup in self.talkgroups.iter().filter(|tg| tg.calling_id == binding.talkgroup) {
                    let name = format!("{} {}", talkgroup.calling_id, talkgroup.name);
                    let mut channel = self.channel(seq, device, name, slot);
                    channel.tx_contact_id = Some(talkgroup.id);
                    channels.push(channel);
                }
            }

            for slot in TimeSlot::both() {
                let name = format!("{} {}", device.callsign, slot);
                let mut channel = self.channel(seq, device, name, slot);
                channel.tx_contact_id = self.default_contact;
                channels.push(channel);
            }
        }

        tracing::info!("{} digital channels from {} repeaters", channels.len(), repeaters);
        channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::datasource::JsonDeviceDirectory;
    use crate::module::generator::{Producer, Source};
    use dmrgen_common::{ChannelRecord, ContactType};
    use regex::Regex;

    fn talkgroup(id: u32, calling_id: u32, name: &str) -> Contact {
        Contact {
            id,
            name: name.to_string(),
            kind: ContactType::GroupCall,
            calling_id,
        }
    }

    fn directory() -> JsonDeviceDirectory {
        JsonDeviceDirectory::parse(
            r#"[
                {"id": 1, "callsign": "SR5WA", "rx": 430.1, "tx": 439.5, "colorcode": 3,
                 "lat": 52.2297, "lng": 21.0122, "city": "Warszawa",
                 "talkgroups": [{"talkgroup": 2602, "slot": 2}, {"talkgroup": 9, "slot": 0}, {"talkgroup": 235, "slot": 1}]},
                {"id": 2, "callsign": "SP5HOT", "rx": 438.8, "tx": 438.8, "colorcode": 1,
                 "talkgroups": [{"talkgroup": 2602, "slot": 2}]},
                {"id": 3, "callsign": "OK1RAA", "rx": 430.2, "tx": 439.6, "colorcode": 1}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_hotspot_ladder() {
        let mut producer = HotspotChannels::new(vec![talkgroup(10, 2602, "Mazowsze"), talkgroup(11, 260, "Poland")]);
        producer.default_contact = Some(3);
        let mut seq = Sequence::new();
        let channels = Producer::new(producer).produce(&mut seq);

        let names: Vec<&str> = channels.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["HS TS1", "HS TS2", "HS2602 Mazowsze", "HS260 Poland"]);
        assert!(channels.iter().all(|c| c.is_hotspot()));
        assert!(channels.iter().all(|c| c.rx_freq == 438.800 && c.tx_freq == 438.800));
        assert_eq!(channels[0].slot, TimeSlot::Ts1);
        assert_eq!(channels[0].tx_contact_id, Some(3));
        assert_eq!(channels[2].slot, TimeSlot::Ts2);
        assert_eq!(channels[2].tx_contact_id, Some(10));
        assert!(channels[2].hints.coordinates().is_none());
    }

    #[test]
    fn test_repeater_channels() {
        let directory = directory();
        let selection = DeviceSelection::new().with_callsign(Regex::new(r"^S[PR][0-9]").unwrap());
        let talkgroups = vec![talkgroup(10, 2602, "Mazowsze"), talkgroup(11, 9, "Local")];
        let mut producer = RepeaterDigitalChannels::new(&directory, &directory, talkgroups, selection);
        producer.default_contact = Some(3);

        let mut seq = Sequence::starting_at(5);
        let channels = Producer::new(producer).produce(&mut seq);

        let names: Vec<&str> = channels.iter().map(|c| c.name.as_str()).collect();
        // slot 0 binding skipped, 235 not a supplied talkgroup, hotspot and OK1 skipped
        assert_eq!(names, vec!["2602 Mazowsze", "SR5WA TS1", "SR5WA TS2"]);
        assert_eq!(channels[0].id, 5);
        assert_eq!(channels[0].tx_contact_id, Some(10));
        assert_eq!(channels[0].slot, TimeSlot::Ts2);
        assert_eq!(channels[0].color, 3);
        assert_eq!(channels[0].rx_freq, 439.5);
        assert_eq!(channels[0].tx_freq, 430.1);
        assert_eq!(channels[1].tx_contact_id, Some(3));
        assert_eq!(channels[1].hints.rpt_callsign.as_deref(), Some("SR5WA"));
        assert_eq!(channels[1].hints.locator.as_deref(), Some("KO02mf"));
        assert!(!channels[1].is_hotspot());
    }
}
