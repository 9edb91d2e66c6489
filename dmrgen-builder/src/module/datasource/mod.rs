//! Data-source boundary
//!
//! Every external collaborator is consumed through one of these traits as
//! a fully materialized, synchronous collection. Fetching and caching live
//! outside the builder; the bundled implementations read local JSON files.

pub mod json;
pub mod types;

pub use json::{JsonAnalogRepeaters, JsonDeviceDirectory, JsonTalkgroupRegistry, NoGeocoder, TableGeocoder};
pub use types::{AnalogRepeater, Device, RepeaterStatus, TalkgroupBinding, TalkgroupEntry};

use dmrgen_common::Coordinates;

/// Talkgroup address to name registry.
pub trait TalkgroupRegistry {
    /// Listed talkgroups, in registry order
    fn primary(&self) -> &[TalkgroupEntry];

    /// Unlisted talkgroups, appended after the primary table
    fn supplementary(&self) -> &[TalkgroupEntry] {
        &[]
    }
}

/// Repeater and hotspot device directory.
pub trait DeviceDirectory {
    fn devices(&self) -> &[Device];

    fn find_by_callsign(&self, callsign: &str) -> Option<&Device> {
        self.devices().iter().find(|device| device.callsign == callsign)
    }
}

/// Static talkgroup bindings configured on a device.
pub trait StaticTalkgroups {
    /// Bindings of `device_id`; unknown devices yield an empty list.
    fn static_talkgroups(&self, device_id: u32) -> Vec<TalkgroupBinding>;
}

/// Analog repeaters from a regional export.
pub trait AnalogRepeaterDirectory {
    fn repeaters(&self) -> &[AnalogRepeater];
}

/// Coordinate lookup for records that only name a place.
pub trait Geocoder {
    fn locate(&self, city: &str, state: Option<&str>, country: Option<&str>) -> Option<Coordinates>;
}
