//! Proximity ordering of channels and zones

use std::collections::HashMap;

use dmrgen_common::{ChannelId, ChannelRecord, Coordinates, Zone};
use serde::{Deserialize, Serialize};

use super::distance::haversine_km;

/// Where entities without a usable distance end up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPlacement {
    First,
    #[default]
    Last,
}

/// Stable sort by a distance key, with keyless items grouped at one end.
fn sort_by_key_with_missing<T>(items: Vec<T>, key: impl Fn(&T) -> Option<f64>, placement: MissingPlacement) -> Vec<T> {
    let mut known: Vec<(f64, T)> = Vec::new();
    let mut unknown = Vec::new();
    for item in items {
        match key(&item) {
            Some(distance) => known.push((distance, item)),
            None => unknown.push(item),
        }
    }

    known.sort_by(|a, b| a.0.total_cmp(&b.0));
    let known = known.into_iter().map(|(_, item)| item);

    match placement {
        MissingPlacement::First => unknown.into_iter().chain(known).collect(),
        MissingPlacement::Last => known.chain(unknown).collect(),
    }
}

/// Order channels by distance from `reference`, nearest first.
pub fn sort_channels_by_distance<T: ChannelRecord>(
    channels: Vec<T>,
    reference: Coordinates,
    placement: MissingPlacement,
) -> Vec<T> {
    sort_by_key_with_missing(
        channels,
        |channel| channel.coordinates().map(|location| haversine_km(reference, location)),
        placement,
    )
}

/// Order zones by the distance of their nearest located member.
///
/// `channels` is the lookup table for zone members; members missing from
/// it, or lacking coordinates, do not contribute.
pub fn sort_zones_by_distance(
    zones: Vec<Zone>,
    channels: &[&dyn ChannelRecord],
    reference: Coordinates,
    placement: MissingPlacement,
) -> Vec<Zone> {
    let located: HashMap<ChannelId, Coordinates> = channels
        .iter()
        .filter_map(|channel| channel.coordinates().map(|location| (channel.id(), location)))
        .collect();

    sort_by_key_with_missing(
        zones,
        |zone| {
            zone.channels
                .iter()
                .filter_map(|id| located.get(id))
                .map(|location| haversine_km(reference, *location))
                .min_by(f64::total_cmp)
        },
        placement,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmrgen_common::{AnalogChannel, GroupingHints};

    fn channel(id: u32, name: &str, coords: Option<(f64, f64)>) -> AnalogChannel {
        let mut ch = AnalogChannel::new(id, name, 145.0, 145.6);
        if let Some((lat, lng)) = coords {
            ch.hints = GroupingHints {
                lat: Some(lat),
                lng: Some(lng),
                ..Default::default()
            };
        }
        ch
    }

    fn origin() -> Coordinates {
        Coordinates::new(0.0, 0.0).unwrap()
    }

    fn names<T: ChannelRecord>(channels: &[T]) -> Vec<&str> {
        channels.iter().map(|c| c.name()).collect()
    }

    #[test]
    fn test_sort_channels_missing_last() {
        let input = vec![
            channel(1, "FAR", Some((2.0, 0.0))),
            channel(2, "NONE1", None),
            channel(3, "NEAR", Some((0.5, 0.0))),
            channel(4, "NONE2", None),
        ];
        let sorted = sort_channels_by_distance(input, origin(), MissingPlacement::Last);
        assert_eq!(names(&sorted), vec!["NEAR", "FAR", "NONE1", "NONE2"]);
    }

    #[test]
    fn test_sort_channels_missing_first() {
        let input = vec![
            channel(1, "FAR", Some((2.0, 0.0))),
            channel(2, "NONE", None),
            channel(3, "NEAR", Some((0.5, 0.0))),
        ];
        let sorted = sort_channels_by_distance(input, origin(), MissingPlacement::First);
        assert_eq!(names(&sorted), vec!["NONE", "NEAR", "FAR"]);
    }

    #[test]
    fn test_sort_channels_is_stable() {
        let input = vec![
            channel(1, "B", Some((1.0, 0.0))),
            channel(2, "A", Some((1.0, 0.0))),
        ];
        let sorted = sort_channels_by_distance(input, origin(), MissingPlacement::Last);
        assert_eq!(names(&sorted), vec!["B", "A"]);
    }

    #[test]
    fn test_sort_zones_by_nearest_member() {
        let near = channel(1, "NEAR", Some((0.1, 0.0)));
        let far = channel(2, "FAR", Some((3.0, 0.0)));
        let mid = channel(3, "MID", Some((1.0, 0.0)));
        let none = channel(4, "NONE", None);
        let lookup: Vec<&dyn ChannelRecord> = vec![&near, &far, &mid, &none];

        let zones = vec![
            Zone { id: 1, name: "Unlocated".into(), channels: vec![4] },
            Zone { id: 2, name: "Mixed".into(), channels: vec![2, 1] },
            Zone { id: 3, name: "Middle".into(), channels: vec![3] },
        ];

        let sorted = sort_zones_by_distance(zones, &lookup, origin(), MissingPlacement::Last);
        let order: Vec<&str> = sorted.iter().map(|z| z.name.as_str()).collect();
        assert_eq!(order, vec!["Mixed", "Middle", "Unlocated"]);
    }
}
