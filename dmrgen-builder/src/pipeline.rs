//! Run orchestration
//!
//! A [`Recipe`] fills a [`Run`] one stage at a time in the fixed order of
//! [`Stage::ORDER`]. Producer order inside a stage decides identifier
//! allocation, so recipes must not reorder stages.

use std::fmt;

use dmrgen_common::{
    AnalogAprsConfig, AnalogChannel, Contact, DigitalAprsConfig, DigitalChannel, GroupList, RoamingChannel,
    RoamingZone, ScanList, Sequence, Zone,
};
use serde::{Deserialize, Serialize};

use crate::error::CodeplugError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Contacts,
    Aprs,
    DigitalChannels,
    AnalogChannels,
    Zones,
    Roaming,
    ScanLists,
    GroupLists,
}

impl Stage {
    pub const ORDER: [Stage; 8] = [
        Stage::Contacts,
        Stage::Aprs,
        Stage::DigitalChannels,
        Stage::AnalogChannels,
        Stage::Zones,
        Stage::Roaming,
        Stage::ScanLists,
        Stage::GroupLists,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Contacts => "contacts",
            Stage::Aprs => "aprs",
            Stage::DigitalChannels => "digital channels",
            Stage::AnalogChannels => "analog channels",
            Stage::Zones => "zones",
            Stage::Roaming => "roaming",
            Stage::ScanLists => "scan lists",
            Stage::GroupLists => "group lists",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Allocators and entity collections of one generation run.
///
/// Analog and digital channels share `channel_seq`.
#[derive(Debug, Default)]
pub struct Run {
    pub contact_seq: Sequence,
    pub aprs_seq: Sequence,
    pub channel_seq: Sequence,
    pub zone_seq: Sequence,
    pub grouplist_seq: Sequence,
    pub scanlist_seq: Sequence,
    pub roaming_channel_seq: Sequence,
    pub roaming_zone_seq: Sequence,

    pub contacts: Vec<Contact>,
    pub grouplists: Vec<GroupList>,
    pub analog_channels: Vec<AnalogChannel>,
    pub digital_channels: Vec<DigitalChannel>,
    pub zones: Vec<Zone>,
    pub scanlists: Vec<ScanList>,
    pub roaming_channels: Vec<RoamingChannel>,
    pub roaming_zones: Vec<RoamingZone>,
    pub analog_aprs: Option<AnalogAprsConfig>,
    pub digital_aprs: Option<DigitalAprsConfig>,

    completed: Vec<Stage>,
}

impl Run {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_completed(&self, stage: Stage) -> bool {
        self.completed.contains(&stage)
    }

    /// Fail unless `needed` finished before `reader` asks for `what`.
    pub fn require(&self, reader: Stage, needed: Stage, what: &'static str) -> Result<(), CodeplugError> {
        if self.is_completed(needed) {
            Ok(())
        } else {
            Err(CodeplugError::MissingStageOutput {
                stage: reader.name(),
                what,
            })
        }
    }

    fn complete(&mut self, stage: Stage) {
        self.completed.push(stage);
    }

    pub fn into_codeplug(self) -> Codeplug {
        let channels = self
            .analog_channels
            .into_iter()
            .map(Channel::Analog)
            .chain(self.digital_channels.into_iter().map(Channel::Digital))
            .collect();
        let aprs = self
            .analog_aprs
            .into_iter()
            .map(AprsConfig::Analog)
            .chain(self.digital_aprs.into_iter().map(AprsConfig::Digital))
            .collect();

        Codeplug {
            contacts: self.contacts,
            grouplists: self.grouplists,
            channels,
            zones: self.zones,
            scanlists: self.scanlists,
            roaming_channels: self.roaming_channels,
            roaming_zones: self.roaming_zones,
            aprs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Channel {
    Analog(AnalogChannel),
    Digital(DigitalChannel),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AprsConfig {
    Analog(AnalogAprsConfig),
    Digital(DigitalAprsConfig),
}

/// The ordered entity collections handed to the serializer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Codeplug {
    pub contacts: Vec<Contact>,
    #[serde(rename = "groupLists")]
    pub grouplists: Vec<GroupList>,
    /// Analog channels, then digital channels
    pub channels: Vec<Channel>,
    pub zones: Vec<Zone>,
    #[serde(rename = "scanLists")]
    pub scanlists: Vec<ScanList>,
    pub roaming_channels: Vec<RoamingChannel>,
    pub roaming_zones: Vec<RoamingZone>,
    pub aprs: Vec<AprsConfig>,
}

impl Codeplug {
    pub fn stats(&self) -> CodeplugStats {
        CodeplugStats {
            contacts: self.contacts.len(),
            grouplists: self.grouplists.len(),
            channels: self.channels.len(),
            zones: self.zones.len(),
            scanlists: self.scanlists.len(),
            roaming_channels: self.roaming_channels.len(),
            roaming_zones: self.roaming_zones.len(),
            aprs: self.aprs.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodeplugStats {
    pub contacts: usize,
    pub grouplists: usize,
    pub channels: usize,
    pub zones: usize,
    pub scanlists: usize,
    pub roaming_channels: usize,
    pub roaming_zones: usize,
    pub aprs: usize,
}

impl fmt::Display for CodeplugStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} contacts, {} group lists, {} channels, {} zones, {} scan lists, {} roaming channels, {} roaming zones, {} APRS configs",
            self.contacts,
            self.grouplists,
            self.channels,
            self.zones,
            self.scanlists,
            self.roaming_channels,
            self.roaming_zones,
            self.aprs
        )
    }
}

/// One hook per stage; stages a recipe does not override produce nothing.
pub trait Recipe {
    fn name(&self) -> String;

    fn prepare_contacts(&mut self, _run: &mut Run) -> Result<(), CodeplugError> {
        Ok(())
    }

    fn prepare_aprs(&mut self, _run: &mut Run) -> Result<(), CodeplugError> {
        Ok(())
    }

    fn prepare_digital_channels(&mut self, _run: &mut Run) -> Result<(), CodeplugError> {
        Ok(())
    }

    fn prepare_analog_channels(&mut self, _run: &mut Run) -> Result<(), CodeplugError> {
        Ok(())
    }

    fn prepare_zones(&mut self, _run: &mut Run) -> Result<(), CodeplugError> {
        Ok(())
    }

    fn prepare_roaming(&mut self, _run: &mut Run) -> Result<(), CodeplugError> {
        Ok(())
    }

    fn prepare_scanlists(&mut self, _run: &mut Run) -> Result<(), CodeplugError> {
        Ok(())
    }

    fn prepare_grouplists(&mut self, _run: &mut Run) -> Result<(), CodeplugError> {
        Ok(())
    }
}

/// Run every stage of `recipe` on a fresh [`Run`].
///
/// An error aborts the run; entities allocated by earlier stages are
/// discarded with it.
pub fn assemble(recipe: &mut dyn Recipe) -> Result<Codeplug, CodeplugError> {
    let mut run = Run::new();
    tracing::info!("Assembling codeplug with recipe '{}'", recipe.name());

    for stage in Stage::ORDER {
        match stage {
            Stage::Contacts => recipe.prepare_contacts(&mut run)?,
            Stage::Aprs => recipe.prepare_aprs(&mut run)?,
            Stage::DigitalChannels => recipe.prepare_digital_channels(&mut run)?,
            Stage::AnalogChannels => recipe.prepare_analog_channels(&mut run)?,
            Stage::Zones => recipe.prepare_zones(&mut run)?,
            Stage::Roaming => recipe.prepare_roaming(&mut run)?,
            Stage::ScanLists => recipe.prepare_scanlists(&mut run)?,
            Stage::GroupLists => recipe.prepare_grouplists(&mut run)?,
        }
        run.complete(stage);
        tracing::debug!("Stage '{}' complete", stage);
    }

    let codeplug = run.into_codeplug();
    tracing::info!("Assembled {}", codeplug.stats());
    Ok(codeplug)
}
