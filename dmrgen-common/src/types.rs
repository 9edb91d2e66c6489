//! Codeplug entity records
//!
//! One statically-typed record per entity kind. Absent values are `None`,
//! never sentinel strings. Fields that a later resolver fills in
//! (scan list, receive group list) are [`BackRef`]s: created empty and
//! attached at most once.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Contact identifier (contact namespace)
pub type ContactId = u32;
/// Receive group list identifier
pub type GroupListId = u32;
/// Channel identifier, shared by analog and digital channels
pub type ChannelId = u32;
/// Zone identifier
pub type ZoneId = u32;
/// Scan list identifier
pub type ScanListId = u32;
/// Roaming channel identifier
pub type RoamingChannelId = u32;
/// Roaming zone identifier
pub type RoamingZoneId = u32;
/// APRS configuration identifier, shared by analog and digital configs
pub type AprsId = u32;

/// Reserved name prefix of hotspot channels.
pub const HOTSPOT_PREFIX: &str = "HS";

/// Hotspot test: a channel is a hotspot channel iff its name starts with
/// [`HOTSPOT_PREFIX`]. There is no separate flag.
pub fn is_hotspot_name(name: &str) -> bool {
    name.starts_with(HOTSPOT_PREFIX)
}

// ============ Back references ============

/// Error raised when a resolver tries to overwrite an attached reference
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} already attached to {existing}, refusing to overwrite with {requested}")]
pub struct AttachError {
    pub field: &'static str,
    pub existing: u32,
    pub requested: u32,
}

/// Reference written by a later resolver pass.
///
/// Starts unset; [`BackRef::attach`] widens it exactly once. Re-attaching
/// the same value is accepted, a different value is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackRef(Option<u32>);

impl BackRef {
    pub const fn unset() -> Self {
        BackRef(None)
    }

    pub fn get(&self) -> Option<u32> {
        self.0
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    pub fn is_unset(&self) -> bool {
        self.0.is_none()
    }

    pub fn attach(&mut self, field: &'static str, value: u32) -> Result<(), AttachError> {
        match self.0 {
            None => {
                self.0 = Some(value);
                Ok(())
            }
            Some(existing) if existing == value => Ok(()),
            Some(existing) => Err(AttachError {
                field,
                existing,
                requested: value,
            }),
        }
    }
}

// ============ Enumerations ============

/// Contact call type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactType {
    GroupCall,
    PrivateCall,
    AllCall,
}

/// Transmit power, ordered from weakest to strongest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TxPower {
    Min,
    Low,
    Mid,
    High,
    Max,
}

/// Analog channel bandwidth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelWidth {
    /// 12.5 kHz
    Narrow,
    /// 25 kHz
    Wide,
}

/// Transmit admission criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdmitCriteria {
    Always,
    Free,
    Tone,
    ColorCode,
}

/// DMR TDMA time slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeSlot {
    #[serde(rename = "TS1")]
    Ts1,
    #[serde(rename = "TS2")]
    Ts2,
}

impl TimeSlot {
    /// Map a numeric slot (1 or 2) to a time slot. Slot 0 ("dynamic"/unset)
    /// and anything else yields `None`.
    pub fn from_number(slot: u8) -> Option<Self> {
        match slot {
            1 => Some(TimeSlot::Ts1),
            2 => Some(TimeSlot::Ts2),
            _ => None,
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            TimeSlot::Ts1 => 1,
            TimeSlot::Ts2 => 2,
        }
    }

    pub fn both() -> [TimeSlot; 2] {
        [TimeSlot::Ts1, TimeSlot::Ts2]
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TS{}", self.number())
    }
}

// ============ Geography ============

/// A validated latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Build a coordinate pair, rejecting non-finite or out-of-range values.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);
        valid.then_some(Coordinates { lat, lng })
    }
}

/// Non-hardware hints used only by zone/scan-list grouping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupingHints {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Maidenhead locator, only the first four characters are used for grouping
    pub locator: Option<String>,
    /// Callsign of the originating repeater, absent for hotspot channels
    pub rpt_callsign: Option<String>,
    /// Nearest town, display only
    pub qth: Option<String>,
}

impl GroupingHints {
    /// Coordinates if both halves are present and sane.
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::new(self.lat?, self.lng?)
    }

    /// First four characters of the grid locator.
    pub fn locator_prefix(&self) -> Option<String> {
        let locator = self.locator.as_deref()?.trim();
        if locator.chars().count() < 4 {
            return None;
        }
        Some(locator.chars().take(4).collect::<String>().to_uppercase())
    }
}

// ============ Contacts and group lists ============

/// DMR contact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub kind: ContactType,
    /// Numeric calling address (talkgroup or private id)
    pub calling_id: u32,
}

/// Receive group list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupList {
    pub id: GroupListId,
    pub name: String,
    pub contact_ids: Vec<ContactId>,
}

// ============ Channels ============

/// Read-only view shared by analog and digital channels
pub trait ChannelRecord {
    fn id(&self) -> ChannelId;
    fn name(&self) -> &str;
    fn rx_freq(&self) -> f64;
    fn hints(&self) -> &GroupingHints;

    fn is_hotspot(&self) -> bool {
        is_hotspot_name(self.name())
    }

    fn coordinates(&self) -> Option<Coordinates> {
        self.hints().coordinates()
    }
}

/// Channels that can be attached to a scan list
pub trait ScanListMember: ChannelRecord {
    fn scanlist_ref(&self) -> &BackRef;

    fn attach_scanlist(&mut self, id: ScanListId) -> Result<(), AttachError>;
}

/// Analog FM channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalogChannel {
    pub id: ChannelId,
    pub name: String,
    pub rx_freq: f64,
    pub tx_freq: f64,
    pub tx_power: TxPower,
    #[serde(default, skip_serializing_if = "BackRef::is_unset")]
    pub scanlist_id: BackRef,
    /// Transmit timeout in seconds
    pub tot: Option<u32>,
    pub rx_only: bool,
    pub admit: AdmitCriteria,
    pub squelch: u8,
    /// CTCSS tone in Hz
    pub rx_tone: Option<f64>,
    pub tx_tone: Option<f64>,
    pub width: ChannelWidth,
    pub aprs_id: Option<AprsId>,
    #[serde(skip)]
    pub hints: GroupingHints,
}

impl AnalogChannel {
    /// Channel with the defaults every analog producer starts from.
    pub fn new(id: ChannelId, name: impl Into<String>, rx_freq: f64, tx_freq: f64) -> Self {
        Self {
            id,
            name: name.into(),
            rx_freq,
            tx_freq,
            tx_power: TxPower::High,
            scanlist_id: BackRef::unset(),
            tot: None,
            rx_only: false,
            admit: AdmitCriteria::Free,
            squelch: 1,
            rx_tone: None,
            tx_tone: None,
            width: ChannelWidth::Narrow,
            aprs_id: None,
            hints: GroupingHints::default(),
        }
    }
}

impl ChannelRecord for AnalogChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn rx_freq(&self) -> f64 {
        self.rx_freq
    }

    fn hints(&self) -> &GroupingHints {
        &self.hints
    }
}

impl ScanListMember for AnalogChannel {
    fn scanlist_ref(&self) -> &BackRef {
        &self.scanlist_id
    }

    fn attach_scanlist(&mut self, id: ScanListId) -> Result<(), AttachError> {
        self.scanlist_id.attach("scanlist_id", id)
    }
}

/// DMR channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigitalChannel {
    pub id: ChannelId,
    pub name: String,
    pub rx_freq: f64,
    pub tx_freq: f64,
    pub tx_power: TxPower,
    #[serde(default, skip_serializing_if = "BackRef::is_unset")]
    pub scanlist_id: BackRef,
    pub tot: Option<u32>,
    pub rx_only: bool,
    pub admit: AdmitCriteria,
    pub color: u8,
    pub slot: TimeSlot,
    #[serde(default, skip_serializing_if = "BackRef::is_unset")]
    pub rx_grouplist_id: BackRef,
    pub tx_contact_id: Option<ContactId>,
    pub aprs_id: Option<AprsId>,
    #[serde(skip)]
    pub hints: GroupingHints,
}

impl DigitalChannel {
    /// Channel with the defaults every digital producer starts from.
    pub fn new(
        id: ChannelId,
        name: impl Into<String>,
        rx_freq: f64,
        tx_freq: f64,
        color: u8,
        slot: TimeSlot,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            rx_freq,
            tx_freq,
            tx_power: TxPower::High,
            scanlist_id: BackRef::unset(),
            tot: None,
            rx_only: false,
            admit: AdmitCriteria::Free,
            color,
            slot,
            rx_grouplist_id: BackRef::unset(),
            tx_contact_id: None,
            aprs_id: None,
            hints: GroupingHints::default(),
        }
    }

    pub fn attach_grouplist(&mut self, id: GroupListId) -> Result<(), AttachError> {
        self.rx_grouplist_id.attach("rx_grouplist_id", id)
    }
}

impl ChannelRecord for DigitalChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn rx_freq(&self) -> f64 {
        self.rx_freq
    }

    fn hints(&self) -> &GroupingHints {
        &self.hints
    }
}

impl ScanListMember for DigitalChannel {
    fn scanlist_ref(&self) -> &BackRef {
        &self.scanlist_id
    }

    fn attach_scanlist(&mut self, id: ScanListId) -> Result<(), AttachError> {
        self.scanlist_id.attach("scanlist_id", id)
    }
}

// ============ Zones and scan lists ============

/// Named, ordered set of channels on the channel selector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub channels: Vec<ChannelId>,
}

/// Named, ordered set of channels cycled while scanning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanList {
    pub id: ScanListId,
    pub name: String,
    pub channels: Vec<ChannelId>,
}

// ============ Roaming ============

/// Simplified digital channel used for repeater hand-off
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoamingChannel {
    pub id: RoamingChannelId,
    pub name: String,
    pub rx_freq: f64,
    pub tx_freq: f64,
    pub color: u8,
    pub slot: TimeSlot,
}

/// Set of roaming channels the radio may hand off between
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoamingZone {
    pub id: RoamingZoneId,
    pub name: String,
    pub channels: Vec<RoamingChannelId>,
}

// ============ APRS ============

/// Analog (AFSK) APRS beacon configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalogAprsConfig {
    pub id: AprsId,
    pub name: String,
    /// Channel the beacon is sent on
    pub channel_id: ChannelId,
    pub source: String,
    pub destination: String,
    pub path: Vec<String>,
    /// Beacon period in seconds
    pub period: u32,
    pub icon: String,
    pub message: String,
}

/// DMR APRS (GPS report) configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigitalAprsConfig {
    pub id: AprsId,
    pub name: String,
    pub period: u32,
    /// Contact the position report is sent to
    pub contact_id: ContactId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hotspot_name_predicate() {
        assert!(is_hotspot_name("HS TS1"));
        assert!(is_hotspot_name("HS2602 Mazowsze"));
        assert!(!is_hotspot_name("SR5WA TS1"));
        assert!(!is_hotspot_name("hs lowercase"));
    }

    #[test]
    fn test_backref_attach_once() {
        let mut r = BackRef::unset();
        assert!(r.is_unset());
        r.attach("rx_grouplist_id", 7).unwrap();
        assert_eq!(r.get(), Some(7));
        // same value again is fine
        r.attach("rx_grouplist_id", 7).unwrap();
        let err = r.attach("rx_grouplist_id", 8).unwrap_err();
        assert_eq!(err.existing, 7);
        assert_eq!(err.requested, 8);
        assert_eq!(r.get(), Some(7));
    }

    #[test]
    fn test_coordinates_validation() {
        assert!(Coordinates::new(52.23, 21.01).is_some());
        assert!(Coordinates::new(f64::NAN, 21.01).is_none());
        assert!(Coordinates::new(91.0, 0.0).is_none());
        assert!(Coordinates::new(0.0, 181.0).is_none());
    }

    #[test]
    fn test_hints_locator_prefix() {
        let hints = GroupingHints {
            locator: Some("ko02md".to_string()),
            ..Default::default()
        };
        assert_eq!(hints.locator_prefix().as_deref(), Some("KO02"));

        let short = GroupingHints {
            locator: Some("KO".to_string()),
            ..Default::default()
        };
        assert_eq!(short.locator_prefix(), None);
    }

    #[test]
    fn test_hints_missing_half_of_coordinates() {
        let hints = GroupingHints {
            lat: Some(52.0),
            lng: None,
            ..Default::default()
        };
        assert!(hints.coordinates().is_none());
    }

    #[test]
    fn test_time_slot_from_number() {
        assert_eq!(TimeSlot::from_number(1), Some(TimeSlot::Ts1));
        assert_eq!(TimeSlot::from_number(2), Some(TimeSlot::Ts2));
        assert_eq!(TimeSlot::from_number(0), None);
        assert_eq!(TimeSlot::Ts2.to_string(), "TS2");
    }

    #[test]
    fn test_tx_power_ordering() {
        assert!(TxPower::Min < TxPower::Low);
        assert!(TxPower::Mid < TxPower::High);
        assert!(TxPower::High < TxPower::Max);
    }
}
