//! Scan-list generators and the scan-list write-back pass
//!
//! Generators expose their full channel grouping through
//! [`ScanListGrouping`]. The emitted lists are capped at the per-list
//! ceiling, while [`attach_scanlists`] writes each list identifier onto
//! every channel of its group, including channels past the cap.

use std::collections::HashMap;

use dmrgen_common::capacity::MAX_SCANLIST_CHANNELS;
use dmrgen_common::{
    AttachError, ChannelId, ChannelRecord, ScanList, ScanListId, ScanListMember, Sequence, truncate_to_capacity,
};
use regex::Regex;

use crate::error::CodeplugError;
use crate::module::generator::Generate;
use crate::module::zones::callsign::callsign_prefix_pattern;
use crate::module::zones::{ChannelView, group_sorted};

/// Named channel groups, one per list, before the capacity cut
pub type ScanListGroups = Vec<(String, Vec<ChannelId>)>;

pub trait ScanListGrouping {
    fn groups(&self) -> ScanListGroups;
}

fn emit_scanlists(seq: &mut Sequence, groups: ScanListGroups) -> Vec<ScanList> {
    groups
        .into_iter()
        .filter(|(_, channels)| !channels.is_empty())
        .map(|(name, mut channels)| {
            truncate_to_capacity(&mut channels, MAX_SCANLIST_CHANNELS, "Scan list", &name);
            ScanList {
                id: seq.next_id(),
                name,
                channels,
            }
        })
        .collect()
}

fn ids(channels: &[ChannelView]) -> Vec<ChannelId> {
    channels.iter().map(|c| c.id()).collect()
}

/// One scan list over a fixed channel list, in list order.
pub struct SingleScanList<'c> {
    name: String,
    channels: Vec<ChannelView<'c>>,
}

impl<'c> SingleScanList<'c> {
    pub fn new(name: impl Into<String>, channels: Vec<ChannelView<'c>>) -> Self {
        Self {
            name: name.into(),
            channels,
        }
    }
}

impl ScanListGrouping for SingleScanList<'_> {
    fn groups(&self) -> ScanListGroups {
        vec![(self.name.clone(), ids(&self.channels))]
    }
}

impl Generate for SingleScanList<'_> {
    type Entity = ScanList;

    fn label(&self) -> String {
        format!("scan list '{}'", self.name)
    }

    fn generate(&self, seq: &mut Sequence) -> Vec<ScanList> {
        emit_scanlists(seq, self.groups())
    }
}

/// One scan list per repeater callsign prefix, named "<prefix> <suffix>".
///
/// Run once over analog channels with suffix "Analog" and once over
/// digital channels with suffix "Digital".
pub struct CallsignPrefixScanLists<'c> {
    channels: Vec<ChannelView<'c>>,
    suffix: String,
    pattern: Regex,
}

impl<'c> CallsignPrefixScanLists<'c> {
    pub fn new(channels: Vec<ChannelView<'c>>, suffix: impl Into<String>) -> Self {
        Self {
            channels,
            suffix: suffix.into(),
            pattern: callsign_prefix_pattern(),
        }
    }

    pub fn with_pattern(mut self, pattern: Regex) -> Self {
        self.pattern = pattern;
        self
    }

    fn prefix(&self, channel: &dyn ChannelRecord) -> Option<String> {
        if channel.is_hotspot() {
            return None;
        }
        let callsign = channel.hints().rpt_callsign.as_deref()?;
        let captures = self.pattern.captures(callsign)?;
        captures.get(1).or_else(|| captures.get(0)).map(|m| m.as_str().to_string())
    }
}

impl ScanListGrouping for CallsignPrefixScanLists<'_> {
    fn groups(&self) -> ScanListGroups {
        group_sorted(&self.channels, |channel| self.prefix(channel))
            .into_iter()
            .map(|(prefix, members)| (format!("{} {}", prefix, self.suffix), members))
            .collect()
    }
}

impl Generate for CallsignPrefixScanLists<'_> {
    type Entity = ScanList;

    fn label(&self) -> String {
        format!("{} callsign prefix scan lists", self.suffix)
    }

    fn generate(&self, seq: &mut Sequence) -> Vec<ScanList> {
        emit_scanlists(seq, self.groups())
    }
}

/// "<region> Analog" and "<region> Digital" for one administrative region.
pub struct RegionScanLists<'c> {
    region: String,
    analog: Vec<ChannelView<'c>>,
    digital: Vec<ChannelView<'c>>,
}

impl<'c> RegionScanLists<'c> {
    pub fn new(region: impl Into<String>, analog: Vec<ChannelView<'c>>, digital: Vec<ChannelView<'c>>) -> Self {
        Self {
            region: region.into(),
            analog,
            digital,
        }
    }
}

impl ScanListGrouping for RegionScanLists<'_> {
    fn groups(&self) -> ScanListGroups {
        vec![
            (format!("{} Analog", self.region), ids(&self.analog)),
            (format!("{} Digital", self.region), ids(&self.digital)),
        ]
    }
}

impl Generate for RegionScanLists<'_> {
    type Entity = ScanList;

    fn label(&self) -> String {
        format!("region '{}' scan lists", self.region)
    }

    fn generate(&self, seq: &mut Sequence) -> Vec<ScanList> {
        emit_scanlists(seq, self.groups())
    }
}

/// Write each list's identifier onto every channel of its group.
///
/// `groups` is the grouping the lists were emitted from; groups without
/// an emitted list of the same name are ignored. Returns the number of
/// channels attached. A channel claimed by two different lists, or
/// already attached to another list, is an error.
pub fn attach_scanlists<C: ScanListMember>(
    channels: &mut [C],
    lists: &[ScanList],
    groups: &[(String, Vec<ChannelId>)],
) -> Result<usize, CodeplugError> {
    let list_ids: HashMap<&str, ScanListId> = lists.iter().map(|l| (l.name.as_str(), l.id)).collect();

    let mut owner: HashMap<ChannelId, ScanListId> = HashMap::new();
    for (name, members) in groups {
        let Some(&list) = list_ids.get(name.as_str()) else {
            continue;
        };
        for &channel in members {
            match owner.insert(channel, list) {
                Some(existing) if existing != list => {
                    let channel_name = channels
                        .iter()
                        .find(|c| c.id() == channel)
                        .map(|c| c.name().to_string())
                        .unwrap_or_default();
                    let source = AttachError {
                        field: "scanlist_id",
                        existing,
                        requested: list,
                    };
                    return Err(CodeplugError::attach(channel, &channel_name, source));
                }
                _ => {}
            }
        }
    }

    let mut attached = 0;
    for channel in channels.iter_mut() {
        let Some(&list) = owner.get(&channel.id()) else {
            continue;
        };
        let (id, name) = (channel.id(), channel.name().to_string());
        channel
            .attach_scanlist(list)
            .map_err(|source| CodeplugError::attach(id, &name, source))?;
        attached += 1;
    }

    let listed: usize = lists.iter().map(|l| l.channels.len()).sum();
    if attached > listed {
        tracing::info!(
            "{} channels attached beyond the {}-channel scan list cap",
            attached - listed,
            MAX_SCANLIST_CHANNELS
        );
    }
    tracing::debug!("Attached {} channels to {} scan lists", attached, lists.len());
    Ok(attached)
}
