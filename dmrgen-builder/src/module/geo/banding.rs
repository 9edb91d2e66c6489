//! Fixed distance bands around a reference point

use dmrgen_common::{ChannelRecord, Coordinates};
use serde::{Deserialize, Serialize};

use super::distance::haversine_km;

/// A named half-open `[min_km, max_km)` distance range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceBand {
    pub name: String,
    pub min_km: f64,
    pub max_km: f64,
}

impl DistanceBand {
    pub fn new(name: impl Into<String>, min_km: f64, max_km: f64) -> Self {
        Self {
            name: name.into(),
            min_km,
            max_km,
        }
    }

    pub fn contains(&self, distance_km: f64) -> bool {
        self.min_km <= distance_km && distance_km < self.max_km
    }
}

/// Members of one band, as indices into the input
#[derive(Debug, Clone, PartialEq)]
pub struct BandAssignment {
    pub band: String,
    pub members: Vec<usize>,
}

/// Assign every channel with coordinates to the first band containing
/// its distance from `reference`.
///
/// Channels at or beyond the upper edge of the last band go to an
/// open-ended `"<last band>+"` band rather than being folded back into
/// the band that starts at 0 km. Channels without coordinates, and
/// channels falling in a gap between bands, are left out. Output follows
/// band order with the open-ended band last; empty bands are omitted.
pub fn assign_bands<C>(channels: &[&C], reference: Coordinates, bands: &[DistanceBand]) -> Vec<BandAssignment>
where
    C: ChannelRecord + ?Sized,
{
    let Some(last) = bands.last() else {
        return Vec::new();
    };

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); bands.len()];
    let mut beyond = Vec::new();

    for (index, channel) in channels.iter().enumerate() {
        let Some(location) = channel.coordinates() else {
            continue;
        };
        let distance = haversine_km(reference, location);

        if let Some(slot) = bands.iter().position(|band| band.contains(distance)) {
            members[slot].push(index);
        } else if distance >= last.max_km {
            beyond.push(index);
        } else {
            tracing::debug!("'{}' at {:.1} km falls between bands", channel.name(), distance);
        }
    }

    let mut assignments: Vec<BandAssignment> = bands
        .iter()
        .zip(members)
        .filter(|(_, members)| !members.is_empty())
        .map(|(band, members)| BandAssignment {
            band: band.name.clone(),
            members,
        })
        .collect();

    if !beyond.is_empty() {
        assignments.push(BandAssignment {
            band: format!("{}+", last.name),
            members: beyond,
        });
    }

    assignments
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

    // one degree of latitude is about 111.19 km
    fn km_north(km: f64) -> f64 {
        km / 111.194_93
    }

    fn local_regional() -> Vec<DistanceBand> {
        vec![DistanceBand::new("Local", 0.0, 50.0), DistanceBand::new("Regional", 50.0, 150.0)]
    }

    #[test]
    fn test_two_bands() {
        let reference = Coordinates::new(0.0, 0.0).unwrap();
        let near = located(1, "NEAR", km_north(40.0), 0.0);
        let mid = located(2, "MID", km_north(100.0), 0.0);

        let result = assign_bands(&[&near, &mid], reference, &local_regional());
        assert_eq!(
            result,
            vec![
                BandAssignment { band: "Local".into(), members: vec![0] },
                BandAssignment { band: "Regional".into(), members: vec![1] },
            ]
        );
    }

    #[test]
    fn test_beyond_last_band_goes_to_open_band() {
        let reference = Coordinates::new(0.0, 0.0).unwrap();
        let far = located(1, "FAR", km_north(400.0), 0.0);
        let near = located(2, "NEAR", km_north(10.0), 0.0);

        let result = assign_bands(&[&far, &near], reference, &local_regional());
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].band, "Local");
        // the zero-based band keeps only its own members
        assert_eq!(result[0].members, vec![1]);
        assert_eq!(result[1].band, "Regional+");
        assert_eq!(result[1].members, vec![0]);
    }

    #[test]
    fn test_upper_edge_of_band_moves_on() {
        let bands = vec![DistanceBand::new("Local", 0.0, 50.0)];
        assert!(bands[0].contains(0.0));
        assert!(bands[0].contains(49.999));
        assert!(!bands[0].contains(50.0));
    }

    #[test]
    fn test_missing_coordinates_and_gaps_excluded() {
        let reference = Coordinates::new(0.0, 0.0).unwrap();
        let bands = vec![DistanceBand::new("Inner", 0.0, 20.0), DistanceBand::new("Outer", 50.0, 100.0)];
        let nowhere = AnalogChannel::new(1, "NOWHERE", 145.0, 145.6);
        let gap = located(2, "GAP", km_north(30.0), 0.0);

        assert!(assign_bands(&[&nowhere, &gap], reference, &bands).is_empty());
    }

    #[test]
    fn test_no_bands() {
        let reference = Coordinates::new(0.0, 0.0).unwrap();
        let near = located(1, "NEAR", 0.0, 0.0);
        assert!(assign_bands(&[&near], reference, &[]).is_empty());
    }
}
