//! Geographic zones: distance clusters and distance bands

use dmrgen_common::capacity::MAX_ZONE_CHANNELS;
use dmrgen_common::{ChannelId, ChannelRecord, Coordinates, Sequence, Zone};
use serde::{Deserialize, Serialize};

use super::{ChannelView, emit_zones};
use crate::module::generator::Generate;
use crate::module::geo::{ClusterOptions, DistanceBand, assign_bands, centroid, cluster_by_distance, haversine_km};

/// How a location cluster is named
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneNaming {
    /// First member's repeater callsign
    #[default]
    Representative,
    /// Centroid coordinates
    Centroid,
    /// Callsign of the member nearest the centroid
    Center,
}

/// Zones from greedy distance clustering, sorted by name.
pub struct LocationClusterZones<'c> {
    channels: Vec<ChannelView<'c>>,
    pub options: ClusterOptions,
    pub naming: ZoneNaming,
    /// Append the representative's town to its callsign
    pub include_qth: bool,
}

impl<'c> LocationClusterZones<'c> {
    pub fn new(channels: Vec<ChannelView<'c>>) -> Self {
        Self {
            channels,
            options: ClusterOptions::default(),
            naming: ZoneNaming::default(),
            include_qth: true,
        }
    }

    fn station_name(&self, channel: &dyn ChannelRecord) -> Option<String> {
        let hints = channel.hints();
        let callsign = hints.rpt_callsign.as_deref()?;
        match hints.qth.as_deref() {
            Some(qth) if self.include_qth => Some(format!("{} {}", callsign, qth)),
            _ => Some(callsign.to_string()),
        }
    }

    fn cluster_name(&self, members: &[ChannelView<'c>], ordinal: usize) -> String {
        let located: Vec<Coordinates> = members.iter().filter_map(|c| c.coordinates()).collect();
        let center = centroid(&located);

        let base = match (self.naming, center) {
            (ZoneNaming::Representative, _) => members
                .first()
                .and_then(|c| self.station_name(*c))
                .unwrap_or_else(|| format!("Cluster {}", ordinal)),
            (ZoneNaming::Centroid, Some(center)) => format_centroid(center),
            (ZoneNaming::Center, Some(center)) => members
                .iter()
                .filter_map(|c| c.coordinates().map(|location| (*c, haversine_km(center, location))))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .and_then(|(c, _)| self.station_name(c))
                .unwrap_or_else(|| format!("Center Zone {}", ordinal)),
            (_, None) => format!("Cluster {}", ordinal),
        };

        format!("{} ({} repeaters)", base, named_count(members.len()))
    }
}

/// Member count as emitted, after the per-zone cap.
fn named_count(members: usize) -> usize {
    members.min(MAX_ZONE_CHANNELS)
}

/// "Zone 52.23°N 21.01°E"
fn format_centroid(center: Coordinates) -> String {
    let ns = if center.lat < 0.0 { 'S' } else { 'N' };
    let ew = if center.lng < 0.0 { 'W' } else { 'E' };
    format!("Zone {:.2}°{} {:.2}°{}", center.lat.abs(), ns, center.lng.abs(), ew)
}

impl Generate for LocationClusterZones<'_> {
    type Entity = Zone;

    fn label(&self) -> String {
        format!("location clusters ({} km)", self.options.max_distance_km)
    }

    fn generate(&self, seq: &mut Sequence) -> Vec<Zone> {
        let clusters = cluster_by_distance(&self.channels, &self.options);

        let mut groups: Vec<(String, Vec<ChannelId>)> = clusters
            .iter()
            .enumerate()
            .map(|(index, cluster)| {
                let members: Vec<ChannelView> = cluster.iter().map(|&i| self.channels[i]).collect();
                let name = self.cluster_name(&members, index + 1);
                (name, members.iter().map(|c| c.id()).collect())
            })
            .collect();
        groups.sort_by(|a, b| a.0.cmp(&b.0));

        let clustered: usize = groups.iter().map(|(_, members)| members.len()).sum();
        tracing::info!(
            "{} location zones covering {} of {} channels (max {} km, min {} members)",
            groups.len(),
            clustered,
            self.channels.len(),
            self.options.max_distance_km,
            self.options.min_members
        );
        emit_zones(&self.label(), seq, groups)
    }
}

/// One zone per non-empty distance band around a reference point.
pub struct DistanceBandZones<'c> {
    channels: Vec<ChannelView<'c>>,
    reference: Coordinates,
    bands: Vec<DistanceBand>,
}

impl<'c> DistanceBandZones<'c> {
    pub fn new(channels: Vec<ChannelView<'c>>, reference: Coordinates, bands: Vec<DistanceBand>) -> Self {
        Self {
            channels,
            reference,
            bands,
        }
    }
}

impl Generate for DistanceBandZones<'_> {
    type Entity = Zone;

    fn label(&self) -> String {
        "distance bands".to_string()
    }

    fn generate(&self, seq: &mut Sequence) -> Vec<Zone> {
        let groups = assign_bands(&self.channels, self.reference, &self.bands)
            .into_iter()
            .map(|assignment| {
                let mut members: Vec<ChannelView> = assignment.members.iter().map(|&i| self.channels[i]).collect();
                members.sort_by(|a, b| a.name().cmp(b.name()));
                let name = format!("{} ({} repeaters)", assignment.band, named_count(members.len()));
                (name, members.iter().map(|c| c.id()).collect())
            })
            .collect();
        emit_zones(&self.label(), seq, groups)
    }
}
