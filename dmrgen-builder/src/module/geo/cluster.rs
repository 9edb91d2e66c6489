//! Greedy distance-threshold clustering

use dmrgen_common::{ChannelRecord, Coordinates};
use serde::{Deserialize, Serialize};

use super::distance::{centroid, haversine_km};

/// Parameters of [`cluster_by_distance`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterOptions {
    /// Maximum distance from the running centroid for a channel to join
    pub max_distance_km: f64,
    /// Clusters smaller than this are dropped
    pub min_members: usize,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            max_distance_km: 25.0,
            min_members: 2,
        }
    }
}

/// Group channels into clusters, returning indices into `channels`.
///
/// Every channel with coordinates that is not yet in a cluster seeds a new
/// one, in input order. The cluster then repeatedly absorbs the nearest
/// unused channel within `max_distance_km` of its current centroid, and the
/// centroid is recomputed after each addition. Equidistant candidates are
/// resolved in favour of the earlier one. A seed counts as used even when
/// its cluster ends up below `min_members` and is dropped.
pub fn cluster_by_distance<C>(channels: &[&C], options: &ClusterOptions) -> Vec<Vec<usize>>
where
    C: ChannelRecord + ?Sized,
{
    let locations: Vec<Option<Coordinates>> = channels.iter().map(|c| c.coordinates()).collect();
    let mut used = vec![false; channels.len()];
    let mut clusters = Vec::new();

    for start in 0..channels.len() {
        if used[start] {
            continue;
        }
        let Some(seed) = locations[start] else {
            continue;
        };

        used[start] = true;
        let mut members = vec![start];
        let mut points = vec![seed];
        let mut center = seed;

        while let Some(next) = nearest_unused(center, &locations, &used, options.max_distance_km) {
            used[next] = true;
            members.push(next);
            if let Some(point) = locations[next] {
                points.push(point);
            }
            center = centroid(&points).unwrap_or(center);
        }

        if members.len() >= options.min_members {
            clusters.push(members);
        } else {
            tracing::debug!(
                "Dropping cluster seeded at '{}': {} member(s) < {}",
                channels[start].name(),
                members.len(),
                options.min_members
            );
        }
    }

    clusters
}

fn nearest_unused(
    center: Coordinates,
    locations: &[Option<Coordinates>],
    used: &[bool],
    max_distance_km: f64,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (index, location) in locations.iter().enumerate() {
        if used[index] {
            continue;
        }
        let Some(location) = location else {
            continue;
        };
        let distance = haversine_km(center, *location);
        // strict comparison keeps the first of equidistant candidates
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((index, distance));
        }
    }

    best.filter(|(_, d)| *d <= max_distance_km).map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmrgen_common::{AnalogChannel, GroupingHints};

    fn located(id: u32, name: &str, lat: f64, lng: f64) -> AnalogChannel {
        let mut ch = AnalogChannel::new(id, name, 145.0, 145.6);
        ch.hints = GroupingHints {
            lat: Some(lat),
            lng: Some(lng),
            ..Default::default()
        };
        ch
    }

    #[test]
    fn test_two_close_one_far() {
        let a = located(1, "A", 0.0, 0.0);
        let b = located(2, "B", 0.0, 0.01);
        let c = located(3, "C", 10.0, 10.0);
        let channels = vec![&a, &b, &c];

        let clusters = cluster_by_distance(&channels, &ClusterOptions::default());
        assert_eq!(clusters, vec![vec![0, 1]]);
    }

    #[test]
    fn test_min_members_one_keeps_singletons() {
        let a = located(1, "A", 0.0, 0.0);
        let c = located(2, "C", 10.0, 10.0);
        let options = ClusterOptions {
            max_distance_km: 25.0,
            min_members: 1,
        };
        let clusters = cluster_by_distance(&[&a, &c], &options);
        assert_eq!(clusters, vec![vec![0], vec![1]]);
    }

    #[test]
    fn test_channels_without_coordinates_are_skipped() {
        let a = located(1, "A", 0.0, 0.0);
        let nowhere = AnalogChannel::new(2, "NOWHERE", 145.0, 145.6);
        let b = located(3, "B", 0.0, 0.01);

        let clusters = cluster_by_distance(&[&a, &nowhere, &b], &ClusterOptions::default());
        assert_eq!(clusters, vec![vec![0, 2]]);
    }

    #[test]
    fn test_equidistant_tie_goes_to_first() {
        let center = located(1, "CENTER", 0.0, 0.0);
        let east = located(2, "EAST", 0.0, 0.1);
        let west = located(3, "WEST", 0.0, -0.1);
        let options = ClusterOptions {
            max_distance_km: 12.0,
            min_members: 2,
        };

        let clusters = cluster_by_distance(&[&center, &east, &west], &options);
        // east joins first and moves the centroid out of west's reach
        assert_eq!(clusters, vec![vec![0, 1]]);
    }

    #[test]
    fn test_distance_measured_from_centroid() {
        // 0.15 degrees of latitude is about 16.7 km
        let a = located(1, "A", 0.0, 0.0);
        let b = located(2, "B", 0.15, 0.0);
        let c = located(3, "C", 0.30, 0.0);
        let options = ClusterOptions {
            max_distance_km: 20.0,
            min_members: 2,
        };

        // A seeds; B joins (16.7 km); centroid moves to 0.075, C is 25 km away
        let clusters = cluster_by_distance(&[&a, &b, &c], &options);
        assert_eq!(clusters, vec![vec![0, 1]]);
    }

    #[test]
    fn test_empty_input() {
        let channels: Vec<&AnalogChannel> = Vec::new();
        assert!(cluster_by_distance(&channels, &ClusterOptions::default()).is_empty());
    }
}
