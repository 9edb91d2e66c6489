use std::path::Path;
use std::sync::OnceLock;

use anyhow::Context;
use dmrgen_common::{Coordinates, TimeSlot};
use serde::{Deserialize, Serialize};

use crate::module::aprs::AprsRegion;
use crate::module::generator::{BandFilter, MissingData};
use crate::module::geo::{ClusterOptions, DistanceBand, MissingPlacement};
use crate::module::zones::ZoneNaming;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationConfig {
    #[serde(default = "default_callsign")]
    pub callsign: String,

    #[serde(default)]
    pub dmr_id: u32,
}

fn default_callsign() -> String {
    "N0CALL".to_string()
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            callsign: default_callsign(),
            dmr_id: 0,
        }
    }
}

/// Local files standing in for the network data sources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_talkgroups_path")]
    pub talkgroups: String,

    #[serde(default = "default_devices_path")]
    pub devices: String,

    #[serde(default = "default_analog_path")]
    pub analog_repeaters: String,

    /// Place-name table for the geocoding fallback; none disables it
    #[serde(default)]
    pub geocoder: Option<String>,

    #[serde(default = "default_template_path")]
    pub template: String,

    #[serde(default = "default_output_path")]
    pub output: String,
}

fn default_talkgroups_path() -> String {
    "data/talkgroups.json".to_string()
}

fn default_devices_path() -> String {
    "data/devices.json".to_string()
}

fn default_analog_path() -> String {
    "data/analog_repeaters.json".to_string()
}

fn default_template_path() -> String {
    "data/template.json".to_string()
}

fn default_output_path() -> String {
    "codeplug.json".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            talkgroups: default_talkgroups_path(),
            devices: default_devices_path(),
            analog_repeaters: default_analog_path(),
            geocoder: None,
            template: default_template_path(),
            output: default_output_path(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LocationConfig {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotspotConfig {
    #[serde(default = "default_hotspot_frequency")]
    pub frequency: f64,

    #[serde(default = "default_hotspot_slot")]
    pub slot: u8,

    #[serde(default = "default_hotspot_color")]
    pub color: u8,
}

fn default_hotspot_frequency() -> f64 {
    438.800
}

fn default_hotspot_slot() -> u8 {
    2
}

fn default_hotspot_color() -> u8 {
    1
}

impl Default for HotspotConfig {
    fn default() -> Self {
        Self {
            frequency: default_hotspot_frequency(),
            slot: default_hotspot_slot(),
            color: default_hotspot_color(),
        }
    }
}

impl HotspotConfig {
    /// Configured slot, falling back to slot 2 for anything but 1 or 2.
    pub fn time_slot(&self) -> TimeSlot {
        TimeSlot::from_number(self.slot).unwrap_or_else(|| {
            tracing::warn!("Invalid hotspot slot {}, using TS2", self.slot);
            TimeSlot::Ts2
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Analog repeaters further than this from the reference are dropped
    #[serde(default)]
    pub max_distance_km: Option<f64>,

    #[serde(default)]
    pub missing_coordinates: MissingData,

    /// Inclusive receive-frequency ranges in MHz
    #[serde(default = "BandFilter::default_ranges")]
    pub bands: Vec<(f64, f64)>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_distance_km: None,
            missing_coordinates: MissingData::default(),
            bands: BandFilter::default_ranges(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Add location-cluster zones
    #[serde(default)]
    pub location_clusters: bool,

    /// Add one zone per four-character grid locator square
    #[serde(default)]
    pub locator_zones: bool,

    #[serde(default)]
    pub cluster: ClusterOptions,

    #[serde(default)]
    pub naming: ZoneNaming,

    /// Distance-band zones around the reference; empty disables them
    #[serde(default)]
    pub distance_bands: Vec<DistanceBand>,

    #[serde(default)]
    pub missing_placement: MissingPlacement,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanListConfig {
    /// Build "<region> Analog"/"<region> Digital" lists instead of
    /// callsign-prefix lists
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepeaterConfig {
    /// Which directory repeaters become channels
    #[serde(default = "default_callsign_pattern")]
    pub callsign_pattern: String,

    /// Talkgroup address patterns used for channels and roaming
    #[serde(default = "default_talkgroup_patterns")]
    pub talkgroup_patterns: Vec<String>,

    /// Address prefix of the country group list; none skips it
    #[serde(default)]
    pub country_prefix: Option<String>,

    #[serde(default = "default_country_list_name")]
    pub country_list_name: String,

    /// Skip devices not seen within this many days
    #[serde(default = "default_active_days")]
    pub active_within_days: Option<i64>,
}

fn default_callsign_pattern() -> String {
    "^SR[0-9]".to_string()
}

fn default_talkgroup_patterns() -> Vec<String> {
    vec!["^260".to_string()]
}

fn default_country_list_name() -> String {
    "Country".to_string()
}

fn default_active_days() -> Option<i64> {
    Some(30)
}

impl Default for RepeaterConfig {
    fn default() -> Self {
        Self {
            callsign_pattern: default_callsign_pattern(),
            talkgroup_patterns: default_talkgroup_patterns(),
            country_prefix: None,
            country_list_name: default_country_list_name(),
            active_within_days: default_active_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuilderConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub station: StationConfig,

    #[serde(default)]
    pub data: DataConfig,

    /// Reference point for distance filtering, sorting and banding
    #[serde(default)]
    pub reference: Option<LocationConfig>,

    #[serde(default)]
    pub hotspot: HotspotConfig,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub zones: ZoneConfig,

    #[serde(default)]
    pub scanlists: ScanListConfig,

    #[serde(default)]
    pub aprs_region: AprsRegion,

    #[serde(default)]
    pub repeaters: RepeaterConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            station: StationConfig::default(),
            data: DataConfig::default(),
            reference: None,
            hotspot: HotspotConfig::default(),
            filter: FilterConfig::default(),
            zones: ZoneConfig::default(),
            scanlists: ScanListConfig::default(),
            aprs_region: AprsRegion::default(),
            repeaters: RepeaterConfig::default(),
        }
    }
}

impl BuilderConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).context(format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content).context(format!("Failed to parse config file {}", path.display()))
    }

    /// Reference point, if configured and within range.
    pub fn reference_point(&self) -> Option<Coordinates> {
        let reference = self.reference?;
        let point = Coordinates::new(reference.lat, reference.lng);
        if point.is_none() {
            tracing::warn!("Reference location {}, {} is out of range, ignoring", reference.lat, reference.lng);
        }
        point
    }
}

pub static CONFIG: OnceLock<BuilderConfig> = OnceLock::new();

pub fn read_config(path: impl AsRef<Path>) -> anyhow::Result<()> {
    let config = BuilderConfig::from_file(path)?;
    CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("Configuration already loaded"))
}
