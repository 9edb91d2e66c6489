//! Receive group lists
//!
//! Resolution runs in two phases. A [`GroupListPlan`] reads the channels
//! and contacts of the run and decides which lists exist and which
//! channels they belong to; [`GroupListResolver`] then allocates nothing
//! further, attaches the list identifiers onto the channels and stores the
//! result so a second call returns the same lists.

use std::collections::{HashMap, HashSet};

use dmrgen_common::capacity::MAX_GROUPLIST_CONTACTS;
use dmrgen_common::{
    ChannelId, ChannelRecord, Contact, ContactId, ContactType, DigitalChannel, GroupList, Sequence,
    truncate_to_capacity,
};

use crate::error::CodeplugError;
use crate::module::datasource::{DeviceDirectory, StaticTalkgroups};
use crate::module::generator::GenerationState;

/// A planned list and the channels it is attached to
pub type PlannedList = (GroupList, Vec<ChannelId>);

pub trait GroupListPlan {
    fn label(&self) -> String;

    /// Build the lists, allocating one identifier per list.
    fn plan(&self, seq: &mut Sequence, channels: &[DigitalChannel], contacts: &[Contact]) -> Vec<PlannedList>;
}

/// Generate-once wrapper around a [`GroupListPlan`] that performs the
/// write-back onto the channels.
pub struct GroupListResolver<P: GroupListPlan> {
    plan: P,
    state: GenerationState<GroupList>,
}

impl<P: GroupListPlan> GroupListResolver<P> {
    pub fn new(plan: P) -> Self {
        Self {
            plan,
            state: GenerationState::NotStarted,
        }
    }

    pub fn resolve(
        &mut self,
        seq: &mut Sequence,
        channels: &mut [DigitalChannel],
        contacts: &[Contact],
    ) -> Result<Vec<GroupList>, CodeplugError> {
        if let Some(lists) = self.state.entities() {
            return Ok(lists.to_vec());
        }

        let planned = self.plan.plan(seq, channels, contacts);

        let mut owner: HashMap<ChannelId, u32> = HashMap::new();
        for (list, members) in &planned {
            for &channel in members {
                owner.entry(channel).or_insert(list.id);
            }
        }
        for channel in channels.iter_mut() {
            if let Some(&list) = owner.get(&channel.id) {
                channel
                    .attach_grouplist(list)
                    .map_err(|source| CodeplugError::attach(channel.id, &channel.name, source))?;
            }
        }

        let lists: Vec<GroupList> = planned.into_iter().map(|(list, _)| list).collect();
        tracing::info!(
            "{}: {} group lists attached to {} channels",
            self.plan.label(),
            lists.len(),
            owner.len()
        );
        self.state = GenerationState::Generated(lists.clone());
        Ok(lists)
    }
}

fn group_list(seq: &mut Sequence, name: String, mut contact_ids: Vec<ContactId>) -> GroupList {
    truncate_to_capacity(&mut contact_ids, MAX_GROUPLIST_CONTACTS, "Group list", &name);
    GroupList {
        id: seq.next_id(),
        name,
        contact_ids,
    }
}

/// One list per repeater: its static talkgroups that exist as group-call
/// contacts in this run. Hotspot channels are not considered.
pub struct RepeaterGroupLists<'s, D: DeviceDirectory + ?Sized, S: StaticTalkgroups + ?Sized> {
    devices: &'s D,
    bindings: &'s S,
}

impl<'s, D, S> RepeaterGroupLists<'s, D, S>
where
    D: DeviceDirectory + ?Sized,
    S: StaticTalkgroups + ?Sized,
{
    pub fn new(devices: &'s D, bindings: &'s S) -> Self {
        Self { devices, bindings }
    }
}

impl<D, S> GroupListPlan for RepeaterGroupLists<'_, D, S>
where
    D: DeviceDirectory + ?Sized,
    S: StaticTalkgroups + ?Sized,
{
    fn label(&self) -> String {
        "repeater group lists".to_string()
    }

    fn plan(&self, seq: &mut Sequence, channels: &[DigitalChannel], contacts: &[Contact]) -> Vec<PlannedList> {
        // repeaters in channel order
        let mut repeaters: Vec<(&str, Vec<ChannelId>)> = Vec::new();
        for channel in channels.iter().filter(|c| !c.is_hotspot()) {
            let Some(callsign) = channel.hints.rpt_callsign.as_deref() else {
                continue;
            };
            match repeaters.iter_mut().find(|(known, _)| *known == callsign) {
                Some((_, members)) => members.push(channel.id),
                None => repeaters.push((callsign, vec![channel.id])),
            }
        }

        let mut planned = Vec::new();
        for (callsign, members) in repeaters {
            let Some(device) = self.devices.find_by_callsign(callsign) else {
                tracing::debug!("No directory entry for repeater {}", callsign);
                continue;
            };

            let mut seen = HashSet::new();
            let contact_ids: Vec<ContactId> = self
                .bindings
                .static_talkgroups(device.id)
                .iter()
                .filter_map(|binding| {
                    contacts
                        .iter()
                        .find(|c| c.kind == ContactType::GroupCall && c.calling_id == binding.talkgroup)
                })
                .map(|contact| contact.id)
                .filter(|id| seen.insert(*id))
                .collect();

            if contact_ids.is_empty() {
                tracing::debug!("Repeater {} has no static talkgroups among the contacts", callsign);
                continue;
            }
            planned.push((group_list(seq, format!("RX {}", callsign), contact_ids), members));
        }
        planned
    }
}

/// One list with every group-call contact, attached to every hotspot channel.
#[derive(Debug, Clone)]
pub struct HotspotGroupList {
    pub name: String,
}

impl Default for HotspotGroupList {
    fn default() -> Self {
        Self {
            name: "RX Hotspot".to_string(),
        }
    }
}

impl GroupListPlan for HotspotGroupList {
    fn label(&self) -> String {
        "hotspot group list".to_string()
    }

    fn plan(&self, seq: &mut Sequence, channels: &[DigitalChannel], contacts: &[Contact]) -> Vec<PlannedList> {
        let members: Vec<ChannelId> = channels.iter().filter(|c| c.is_hotspot()).map(|c| c.id).collect();
        let contact_ids: Vec<ContactId> = contacts
            .iter()
            .filter(|c| c.kind == ContactType::GroupCall)
            .map(|c| c.id)
            .collect();

        if members.is_empty() || contact_ids.is_empty() {
            return Vec::new();
        }
        vec![(group_list(seq, self.name.clone(), contact_ids), members)]
    }
}

/// One list with the group-call contacts whose address starts with
/// `prefix`, e.g. "260" for every Polish talkgroup.
#[derive(Debug, Clone)]
pub struct CountryGroupList {
    pub name: String,
    pub prefix: String,
    /// Attach to every digital channel that has no group list yet
    pub attach_unassigned: bool,
}

impl CountryGroupList {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            attach_unassigned: true,
        }
    }
}

impl GroupListPlan for CountryGroupList {
    fn label(&self) -> String {
        format!("country group list '{}'", self.name)
    }

    fn plan(&self, seq: &mut Sequence, channels: &[DigitalChannel], contacts: &[Contact]) -> Vec<PlannedList> {
        let contact_ids: Vec<ContactId> = contacts
            .iter()
            .filter(|c| c.kind == ContactType::GroupCall && c.calling_id.to_string().starts_with(&self.prefix))
            .map(|c| c.id)
            .collect();
        if contact_ids.is_empty() {
            tracing::warn!("No contacts match prefix {} for '{}'", self.prefix, self.name);
            return Vec::new();
        }

        let members = if self.attach_unassigned {
            channels
                .iter()
                .filter(|c| c.rx_grouplist_id.is_unset())
                .map(|c| c.id)
                .collect()
        } else {
            Vec::new()
        };
        vec![(group_list(seq, self.name.clone(), contact_ids), members)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::datasource::JsonDeviceDirectory;
    use crate::module::zones::tests::digital;

    fn contact(id: u32, calling_id: u32, kind: ContactType) -> Contact {
        Contact {
            id,
            name: format!("TG{}", calling_id),
            kind,
            calling_id,
        }
    }

    fn directory() -> JsonDeviceDirectory {
        JsonDeviceDirectory::parse(
            r#"[
                {"id": 1, "callsign": "SR5WA", "rx": 430.1, "tx": 439.5, "colorcode": 1,
                 "talkgroups": [{"talkgroup": 2602, "slot": 2}, {"talkgroup": 260, "slot": 1},
                                {"talkgroup": 2602, "slot": 1}, {"talkgroup": 91, "slot": 1}]},
                {"id": 2, "callsign": "SR3P", "rx": 430.2, "tx": 439.6, "colorcode": 1,
                 "talkgroups": [{"talkgroup": 555, "slot": 1}]}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_repeater_group_lists_write_back() {
        let directory = directory();
        let contacts = vec![
            contact(1, 260, ContactType::GroupCall),
            contact(2, 2602, ContactType::GroupCall),
            contact(3, 9990, ContactType::PrivateCall),
        ];
        let mut channels = vec![
            digital(1, "SR5WA TS1", Some("SR5WA"), None),
            digital(2, "SR3P TS1", Some("SR3P"), None),
            digital(3, "HS TS1", None, None),
            digital(4, "SR5WA TS2", Some("SR5WA"), None),
        ];

        let mut seq = Sequence::new();
        let mut resolver = GroupListResolver::new(RepeaterGroupLists::new(&directory, &directory));
        let lists = resolver.resolve(&mut seq, &mut channels, &contacts).unwrap();

        assert_eq!(
            lists,
            vec![GroupList {
                id: 1,
                name: "RX SR5WA".into(),
                contact_ids: vec![2, 1],
            }]
        );
        assert_eq!(channels[0].rx_grouplist_id.get(), Some(1));
        assert_eq!(channels[3].rx_grouplist_id.get(), Some(1));
        // no matching contacts for SR3P
        assert!(channels[1].rx_grouplist_id.is_unset());
        assert!(channels[2].rx_grouplist_id.is_unset());

        let again = resolver.resolve(&mut seq, &mut channels, &contacts).unwrap();
        assert_eq!(again, lists);
        assert_eq!(seq.allocated(), 1);
    }

    #[test]
    fn test_repeater_group_list_truncated_to_capacity() {
        let talkgroups: Vec<String> = (1..=80)
            .map(|tg| format!(r#"{{"talkgroup": {}, "slot": 1}}"#, tg))
            .collect();
        let directory = JsonDeviceDirectory::parse(&format!(
            r#"[{{"id": 7, "callsign": "SR5BIG", "rx": 430.0, "tx": 439.0, "colorcode": 1, "talkgroups": [{}]}}]"#,
            talkgroups.join(",")
        ))
        .unwrap();
        let contacts: Vec<Contact> = (1..=80).map(|tg| contact(tg, tg, ContactType::GroupCall)).collect();
        let mut channels = vec![digital(1, "SR5BIG TS1", Some("SR5BIG"), None)];

        let mut seq = Sequence::new();
        let lists = GroupListResolver::new(RepeaterGroupLists::new(&directory, &directory))
            .resolve(&mut seq, &mut channels, &contacts)
            .unwrap();
        assert_eq!(lists[0].contact_ids.len(), MAX_GROUPLIST_CONTACTS);
        assert_eq!(lists[0].contact_ids[63], 64);
    }

    #[test]
    fn test_hotspot_then_country_list() {
        let contacts = vec![
            contact(1, 260, ContactType::GroupCall),
            contact(2, 2602, ContactType::GroupCall),
            contact(3, 235, ContactType::GroupCall),
            contact(4, 2609990, ContactType::PrivateCall),
        ];
        let mut channels = vec![
            digital(1, "HS TS1", None, None),
            digital(2, "SR5WA TS1", Some("SR5WA"), None),
        ];

        let mut seq = Sequence::new();
        let hotspot = GroupListResolver::new(HotspotGroupList::default())
            .resolve(&mut seq, &mut channels, &contacts)
            .unwrap();
        assert_eq!(hotspot[0].contact_ids, vec![1, 2, 3]);
        assert_eq!(channels[0].rx_grouplist_id.get(), Some(1));

        let country = GroupListResolver::new(CountryGroupList::new("Poland", "260"))
            .resolve(&mut seq, &mut channels, &contacts)
            .unwrap();
        assert_eq!(country[0].id, 2);
        assert_eq!(country[0].contact_ids, vec![1, 2]);
        assert_eq!(channels[0].rx_grouplist_id.get(), Some(1));
        assert_eq!(channels[1].rx_grouplist_id.get(), Some(2));
    }

    #[test]
    fn test_attach_conflict_aborts() {
        let contacts = vec![contact(1, 260, ContactType::GroupCall)];
        let mut channels = vec![digital(1, "HS TS1", None, None)];
        channels[0].attach_grouplist(42).unwrap();

        let err = GroupListResolver::new(HotspotGroupList::default())
            .resolve(&mut Sequence::new(), &mut channels, &contacts)
            .unwrap_err();
        assert!(matches!(err, CodeplugError::Attach { channel: 1, .. }));
    }
}
