//! JSON-file implementations of the data-source traits

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use dmrgen_common::Coordinates;
use serde::Deserialize;

use super::types::{AnalogRepeater, Device, TalkgroupBinding, TalkgroupEntry};
use super::{AnalogRepeaterDirectory, DeviceDirectory, Geocoder, StaticTalkgroups, TalkgroupRegistry};

fn read_file(path: &Path, what: &str) -> Result<String> {
    std::fs::read_to_string(path).context(format!("Failed to read {} file: {}", what, path.display()))
}

// ============ Talkgroup registry ============

#[derive(Deserialize)]
#[serde(untagged)]
enum RegistryFile {
    Split {
        primary: BTreeMap<String, String>,
        #[serde(default)]
        supplementary: BTreeMap<String, String>,
    },
    Flat(BTreeMap<String, String>),
}

/// Registry loaded from `{"91": "Worldwide", ...}` or
/// `{"primary": {...}, "supplementary": {...}}`.
#[derive(Debug, Clone, Default)]
pub struct JsonTalkgroupRegistry {
    primary: Vec<TalkgroupEntry>,
    supplementary: Vec<TalkgroupEntry>,
}

impl JsonTalkgroupRegistry {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let registry = Self::parse(&read_file(path, "talkgroup registry")?)
            .context(format!("Failed to parse talkgroup registry: {}", path.display()))?;
        tracing::info!(
            "Loaded {} talkgroups ({} supplementary) from {}",
            registry.primary.len() + registry.supplementary.len(),
            registry.supplementary.len(),
            path.display()
        );
        Ok(registry)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let file: RegistryFile = serde_json::from_str(content)?;
        let (primary, supplementary) = match file {
            RegistryFile::Split { primary, supplementary } => (primary, supplementary),
            RegistryFile::Flat(primary) => (primary, BTreeMap::new()),
        };
        Ok(Self {
            primary: Self::entries(primary),
            supplementary: Self::entries(supplementary),
        })
    }

    /// Numeric-ordered entries; keys that are not addresses are skipped.
    fn entries(table: BTreeMap<String, String>) -> Vec<TalkgroupEntry> {
        let mut entries: Vec<TalkgroupEntry> = table
            .into_iter()
            .filter_map(|(key, name)| match key.trim().parse::<u32>() {
                Ok(calling_id) => Some(TalkgroupEntry { calling_id, name }),
                Err(_) => {
                    tracing::warn!("Skipping talkgroup with invalid address '{}'", key);
                    None
                }
            })
            .collect();
        entries.sort_by_key(|entry| entry.calling_id);
        entries
    }
}

impl TalkgroupRegistry for JsonTalkgroupRegistry {
    fn primary(&self) -> &[TalkgroupEntry] {
        &self.primary
    }

    fn supplementary(&self) -> &[TalkgroupEntry] {
        &self.supplementary
    }
}

// ============ Device directory ============

/// Device list with embedded static talkgroup bindings.
#[derive(Debug, Clone, Default)]
pub struct JsonDeviceDirectory {
    devices: Vec<Device>,
    by_id: HashMap<u32, usize>,
}

impl JsonDeviceDirectory {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let directory = Self::parse(&read_file(path, "device directory")?)
            .context(format!("Failed to parse device directory: {}", path.display()))?;
        tracing::info!("Loaded {} devices from {}", directory.devices.len(), path.display());
        Ok(directory)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let devices: Vec<Device> = serde_json::from_str(content)?;
        Ok(Self::new(devices))
    }

    pub fn new(devices: Vec<Device>) -> Self {
        let by_id = devices.iter().enumerate().map(|(index, device)| (device.id, index)).collect();
        Self { devices, by_id }
    }
}

impl DeviceDirectory for JsonDeviceDirectory {
    fn devices(&self) -> &[Device] {
        &self.devices
    }
}

impl StaticTalkgroups for JsonDeviceDirectory {
    fn static_talkgroups(&self, device_id: u32) -> Vec<TalkgroupBinding> {
        self.by_id
            .get(&device_id)
            .map(|&index| self.devices[index].talkgroups.clone())
            .unwrap_or_default()
    }
}

// ============ Analog repeaters ============

#[derive(Debug, Clone, Default)]
pub struct JsonAnalogRepeaters {
    repeaters: Vec<AnalogRepeater>,
}

impl JsonAnalogRepeaters {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let repeaters = Self::parse(&read_file(path, "analog repeater")?)
            .context(format!("Failed to parse analog repeaters: {}", path.display()))?;
        tracing::info!("Loaded {} analog repeaters from {}", repeaters.repeaters.len(), path.display());
        Ok(repeaters)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(Self {
            repeaters: serde_json::from_str(content)?,
        })
    }
}

impl AnalogRepeaterDirectory for JsonAnalogRepeaters {
    fn repeaters(&self) -> &[AnalogRepeater] {
        &self.repeaters
    }
}

// ============ Geocoding ============

#[derive(Deserialize)]
struct PlaceRow {
    city: String,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    country: Option<String>,
    lat: f64,
    lng: f64,
}

/// In-memory place table.
///
/// Lookups try the most specific key first: city + state + country, then
/// city + state, then the city alone.
#[derive(Debug, Clone, Default)]
pub struct TableGeocoder {
    places: HashMap<String, Coordinates>,
}

impl TableGeocoder {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let geocoder = Self::parse(&read_file(path, "geocoder table")?)
            .context(format!("Failed to parse geocoder table: {}", path.display()))?;
        tracing::info!("Loaded {} places from {}", geocoder.places.len(), path.display());
        Ok(geocoder)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let rows: Vec<PlaceRow> = serde_json::from_str(content)?;
        let mut geocoder = Self::default();
        for row in rows {
            match Coordinates::new(row.lat, row.lng) {
                Some(location) => geocoder.insert(&row.city, row.state.as_deref(), row.country.as_deref(), location),
                None => tracing::warn!("Skipping place '{}' with invalid coordinates", row.city),
            }
        }
        Ok(geocoder)
    }

    pub fn insert(&mut self, city: &str, state: Option<&str>, country: Option<&str>, location: Coordinates) {
        self.places.insert(Self::key(city, state, country), location);
    }

    fn key(city: &str, state: Option<&str>, country: Option<&str>) -> String {
        let part = |value: Option<&str>| value.map(|v| v.trim().to_lowercase()).unwrap_or_default();
        format!("{}|{}|{}", city.trim().to_lowercase(), part(state), part(country))
    }
}

impl Geocoder for TableGeocoder {
    fn locate(&self, city: &str, state: Option<&str>, country: Option<&str>) -> Option<Coordinates> {
        if city.trim().is_empty() {
            return None;
        }
        [
            Self::key(city, state, country),
            Self::key(city, state, None),
            Self::key(city, None, None),
        ]
        .iter()
        .find_map(|key| self.places.get(key).copied())
    }
}

/// Geocoder that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeocoder;

impl Geocoder for NoGeocoder {
    fn locate(&self, _city: &str, _state: Option<&str>, _country: Option<&str>) -> Option<Coordinates> {
        None
    }
}
