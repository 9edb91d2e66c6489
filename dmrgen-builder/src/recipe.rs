//! Configuration-driven recipe for one country's repeater network

use std::collections::HashSet;

use anyhow::Context;
use chrono::{DateTime, Utc};
use dmrgen_common::{
    AnalogChannel, AprsId, ChannelId, ChannelRecord, Contact, ContactId, ContactType, Coordinates, Sequence,
};
use regex::Regex;

use crate::config::BuilderConfig;
use crate::error::CodeplugError;
use crate::module::aprs::{AnalogAprs, DigitalAprs};
use crate::module::channels::{
    DeviceSelection, HotspotChannels, Pmr446Channels, RepeaterAnalogChannels, RepeaterDigitalChannels,
};
use crate::module::contacts::{
    APRS_GATEWAY_ID, AprsGatewayContact, ContactAggregator, PARROT_ID, RegistryContacts, SpecialContacts,
    find_contact, matching_contacts,
};
use crate::module::datasource::{AnalogRepeaterDirectory, DeviceDirectory, Geocoder, StaticTalkgroups, TalkgroupRegistry};
use crate::module::generator::{
    Aggregator, BandFilter, DistanceFilter, FilterChain, Filtered, Producer, Source,
};
use crate::module::geo::{sort_channels_by_distance, sort_zones_by_distance};
use crate::module::grouplists::{CountryGroupList, GroupListResolver, HotspotGroupList, RepeaterGroupLists};
use crate::module::roaming::{RoamingChannels, RoamingZones};
use crate::module::scanlists::{CallsignPrefixScanLists, RegionScanLists, ScanListGrouping, attach_scanlists};
use crate::module::zones::{
    BandZones, CallsignKey, CallsignZones, ChannelView, DistanceBandZones, HotspotZones, ListZone,
    LocationClusterZones, LocatorZones, ZoneAggregator,
};
use crate::pipeline::{Recipe, Run, Stage};

/// The external collaborators a recipe reads from
#[derive(Clone, Copy)]
pub struct DataSources<'d> {
    pub talkgroups: &'d dyn TalkgroupRegistry,
    pub devices: &'d dyn DeviceDirectory,
    pub bindings: &'d dyn StaticTalkgroups,
    pub analog: &'d dyn AnalogRepeaterDirectory,
    pub geocoder: &'d dyn Geocoder,
}

pub struct RegionalRecipe<'d> {
    config: &'d BuilderConfig,
    sources: DataSources<'d>,
    reference: Option<Coordinates>,
    callsign_pattern: Regex,
    talkgroup_patterns: Vec<Regex>,
    now: DateTime<Utc>,

    analog_aprs: AnalogAprs,
    aprs_contact: Option<ContactId>,
    parrot: Option<ContactId>,
    analog_aprs_id: Option<AprsId>,
    digital_aprs_id: Option<AprsId>,
    pmr_channels: Vec<ChannelId>,
    directory_channels: Vec<ChannelId>,
}

impl<'d> RegionalRecipe<'d> {
    pub fn new(config: &'d BuilderConfig, sources: DataSources<'d>, now: DateTime<Utc>) -> anyhow::Result<Self> {
        let repeaters = &config.repeaters;
        let callsign_pattern = Regex::new(&repeaters.callsign_pattern)
            .context(format!("Invalid callsign pattern '{}'", repeaters.callsign_pattern))?;
        let talkgroup_patterns = repeaters
            .talkgroup_patterns
            .iter()
            .map(|p| Regex::new(p).context(format!("Invalid talkgroup pattern '{}'", p)))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            config,
            sources,
            reference: config.reference_point(),
            callsign_pattern,
            talkgroup_patterns,
            now,
            analog_aprs: AnalogAprs::new(config.station.callsign.clone(), config.aprs_region),
            aprs_contact: None,
            parrot: None,
            analog_aprs_id: None,
            digital_aprs_id: None,
            pmr_channels: Vec::new(),
            directory_channels: Vec::new(),
        })
    }

    fn selection(&self) -> DeviceSelection {
        let selection = DeviceSelection::new().with_callsign(self.callsign_pattern.clone());
        match self.config.repeaters.active_within_days {
            Some(days) => selection.active_within(days, self.now),
            None => selection,
        }
    }

    /// Group-call contacts matching any talkgroup pattern, without repeats.
    fn talkgroups(&self, contacts: &[Contact]) -> Vec<Contact> {
        let mut selected: Vec<Contact> = Vec::new();
        for pattern in &self.talkgroup_patterns {
            for contact in matching_contacts(contacts, pattern) {
                if contact.kind == ContactType::GroupCall && !selected.iter().any(|c| c.id == contact.id) {
                    selected.push(contact);
                }
            }
        }
        selected
    }

    fn analog_filters(&self) -> FilterChain<AnalogChannel> {
        let filter = &self.config.filter;
        let mut bands = BandFilter::new(filter.bands.clone());
        bands.missing = filter.missing_coordinates;
        let chain = FilterChain::new().with(bands);

        match (self.reference, filter.max_distance_km) {
            (Some(reference), Some(max_km)) => {
                chain.with(DistanceFilter::new(reference, max_km).with_missing(filter.missing_coordinates))
            }
            _ => chain,
        }
    }
}

fn pick<'c, C: ChannelRecord>(channels: &'c [C], ids: &[ChannelId]) -> Vec<ChannelView<'c>> {
    let ids: HashSet<ChannelId> = ids.iter().copied().collect();
    channels
        .iter()
        .filter(|c| ids.contains(&c.id()))
        .map(|c| c as ChannelView)
        .collect()
}

fn all<C: ChannelRecord>(channels: &[C]) -> Vec<ChannelView<'_>> {
    channels.iter().map(|c| c as ChannelView).collect()
}

impl Recipe for RegionalRecipe<'_> {
    fn name(&self) -> String {
        format!("regional ({})", self.config.station.callsign)
    }

    fn prepare_contacts(&mut self, run: &mut Run) -> Result<(), CodeplugError> {
        run.contacts = ContactAggregator::new("contacts")
            .with(Producer::new(AprsGatewayContact))
            .with(Producer::new(SpecialContacts))
            .with(Producer::new(RegistryContacts::new(self.sources.talkgroups)))
            .produce(&mut run.contact_seq);

        self.aprs_contact = find_contact(&run.contacts, ContactType::PrivateCall, APRS_GATEWAY_ID);
        self.parrot = find_contact(&run.contacts, ContactType::PrivateCall, PARROT_ID);
        Ok(())
    }

    fn prepare_aprs(&mut self, run: &mut Run) -> Result<(), CodeplugError> {
        run.require(Stage::Aprs, Stage::Contacts, "the APRS gateway contact")?;

        if let Some(contact) = self.aprs_contact {
            let config = DigitalAprs::new(contact).config(&mut run.aprs_seq);
            self.digital_aprs_id = Some(config.id);
            run.digital_aprs = Some(config);
        }

        // the beacon channel takes the first channel identifier
        self.analog_aprs.channel(&mut run.channel_seq);
        let config = self.analog_aprs.config(&mut run.aprs_seq)?;
        self.analog_aprs_id = Some(config.id);
        run.analog_aprs = Some(config);
        Ok(())
    }

    fn prepare_digital_channels(&mut self, run: &mut Run) -> Result<(), CodeplugError> {
        run.require(Stage::DigitalChannels, Stage::Contacts, "talkgroup contacts")?;
        let talkgroups = self.talkgroups(&run.contacts);
        let hotspot_config = &self.config.hotspot;

        let mut hotspot = HotspotChannels::new(talkgroups.clone());
        hotspot.frequency = hotspot_config.frequency;
        hotspot.slot = hotspot_config.time_slot();
        hotspot.color = hotspot_config.color;
        hotspot.default_contact = self.parrot;
        hotspot.aprs_id = self.digital_aprs_id;

        let mut repeaters =
            RepeaterDigitalChannels::new(self.sources.devices, self.sources.bindings, talkgroups, self.selection());
        repeaters.default_contact = self.parrot;
        repeaters.aprs_id = self.digital_aprs_id;

        run.digital_channels = Aggregator::new("digital channels")
            .with(Producer::new(hotspot))
            .with(Producer::new(repeaters))
            .produce(&mut run.channel_seq);
        Ok(())
    }

    fn prepare_analog_channels(&mut self, run: &mut Run) -> Result<(), CodeplugError> {
        let mut pmr = Pmr446Channels::new();
        pmr.aprs_id = self.analog_aprs_id;
        let mut fixed = Aggregator::new("analog channels")
            .with(&mut self.analog_aprs)
            .with(Producer::new(pmr));
        let fixed_channels = fixed.produce(&mut run.channel_seq);
        drop(fixed);
        self.pmr_channels = fixed_channels
            .iter()
            .filter(|c| c.name.starts_with("PMR "))
            .map(|c| c.id)
            .collect();

        let mut directory = RepeaterAnalogChannels::new(self.sources.analog, self.sources.geocoder);
        directory.aprs_id = self.analog_aprs_id;
        let mut repeaters = Filtered::new(Producer::new(directory), self.analog_filters()).produce(&mut run.channel_seq);
        if let Some(reference) = self.reference {
            repeaters = sort_channels_by_distance(repeaters, reference, self.config.zones.missing_placement);
        }
        self.directory_channels = repeaters.iter().map(|c| c.id).collect();

        run.analog_channels = fixed_channels;
        run.analog_channels.extend(repeaters);
        Ok(())
    }

    fn prepare_zones(&mut self, run: &mut Run) -> Result<(), CodeplugError> {
        run.require(Stage::Zones, Stage::AnalogChannels, "channels")?;
        let zone_config = &self.config.zones;

        let digital = all(&run.digital_channels);
        let pmr = pick(&run.analog_channels, &self.pmr_channels);
        let analog_repeaters = pick(&run.analog_channels, &self.directory_channels);
        let repeaters: Vec<ChannelView> = digital
            .iter()
            .copied()
            .filter(|c| !c.is_hotspot())
            .chain(analog_repeaters.iter().copied())
            .collect();

        let mut zones = ZoneAggregator::new()
            .with(Producer::new(HotspotZones::new(digital.clone())))
            .with(Producer::new(CallsignZones::new(digital.clone(), CallsignKey::Callsign)))
            .with(Producer::new(ListZone::new("PMR", pmr)))
            .with(Producer::new(BandZones::new("Analog", analog_repeaters)));

        if zone_config.locator_zones {
            zones = zones.with(Producer::new(LocatorZones::new(repeaters.clone())));
        }

        if zone_config.location_clusters {
            let mut clusters = LocationClusterZones::new(repeaters.clone());
            clusters.options = zone_config.cluster;
            clusters.naming = zone_config.naming;
            zones = zones.with(Producer::new(clusters));
        }
        if let Some(reference) = self.reference {
            if !zone_config.distance_bands.is_empty() {
                zones = zones.with(Producer::new(DistanceBandZones::new(
                    repeaters.clone(),
                    reference,
                    zone_config.distance_bands.clone(),
                )));
            }
        }

        let produced = zones.produce(&mut run.zone_seq);
        run.zones = match self.reference {
            Some(reference) => {
                let members: Vec<ChannelView> = all(&run.analog_channels).into_iter().chain(digital).collect();
                sort_zones_by_distance(produced, &members, reference, zone_config.missing_placement)
            }
            None => produced,
        };
        Ok(())
    }

    fn prepare_roaming(&mut self, run: &mut Run) -> Result<(), CodeplugError> {
        run.roaming_channels = Producer::new(RoamingChannels::new(
            self.sources.devices,
            self.sources.bindings,
            self.selection(),
        ))
        .produce(&mut run.roaming_channel_seq);
        run.roaming_zones = Producer::new(RoamingZones::new(&run.roaming_channels)).produce(&mut run.roaming_zone_seq);
        Ok(())
    }

    fn prepare_scanlists(&mut self, run: &mut Run) -> Result<(), CodeplugError> {
        run.require(Stage::ScanLists, Stage::AnalogChannels, "channels")?;

        let (lists, groups) = match &self.config.scanlists.region {
            Some(region) => {
                let digital: Vec<ChannelView> =
                    all(&run.digital_channels).into_iter().filter(|c| !c.is_hotspot()).collect();
                let analog = pick(&run.analog_channels, &self.directory_channels);
                let region_lists = RegionScanLists::new(region.clone(), analog, digital);
                let groups = region_lists.groups();
                (Producer::new(region_lists).produce(&mut run.scanlist_seq), groups)
            }
            None => {
                let analog = CallsignPrefixScanLists::new(all(&run.analog_channels), "Analog");
                let digital = CallsignPrefixScanLists::new(all(&run.digital_channels), "Digital");
                let mut groups = analog.groups();
                groups.extend(digital.groups());
                let mut lists = Producer::new(analog).produce(&mut run.scanlist_seq);
                lists.extend(Producer::new(digital).produce(&mut run.scanlist_seq));
                (lists, groups)
            }
        };

        attach_scanlists(&mut run.analog_channels, &lists, &groups)?;
        attach_scanlists(&mut run.digital_channels, &lists, &groups)?;
        run.scanlists = lists;
        Ok(())
    }

    fn prepare_grouplists(&mut self, run: &mut Run) -> Result<(), CodeplugError> {
        run.require(Stage::GroupLists, Stage::DigitalChannels, "digital channels")?;
        let seq: &mut Sequence = &mut run.grouplist_seq;

        let mut lists = GroupListResolver::new(RepeaterGroupLists::new(self.sources.devices, self.sources.bindings))
            .resolve(seq, &mut run.digital_channels, &run.contacts)?;
        lists.extend(
            GroupListResolver::new(HotspotGroupList::default()).resolve(seq, &mut run.digital_channels, &run.contacts)?,
        );

        let repeaters = &self.config.repeaters;
        if let Some(prefix) = &repeaters.country_prefix {
            let country = CountryGroupList::new(repeaters.country_list_name.clone(), prefix.clone());
            lists.extend(GroupListResolver::new(country).resolve(seq, &mut run.digital_channels, &run.contacts)?);
        }

        run.grouplists = lists;
        Ok(())
    }
}
