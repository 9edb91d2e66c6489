//! Filter chain and inclusion predicates
//!
//! A [`FilterChain`] accepts an entity only if every predicate accepts it
//! and stops at the first rejection, reporting that predicate's reason.
//! Predicates never fail: missing or malformed fields fall back to the
//! configured [`MissingData`] policy.

use dmrgen_common::{ChannelRecord, Coordinates, Sequence};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{GenerationState, Source};
use crate::module::geo::haversine_km;

/// Outcome of a predicate, with a human-readable reason either way
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub include: bool,
    pub reason: String,
}

impl Decision {
    pub fn accept(reason: impl Into<String>) -> Self {
        Self {
            include: true,
            reason: reason.into(),
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            include: false,
            reason: reason.into(),
        }
    }
}

/// What to do with entities lacking the field a predicate looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingData {
    Accept,
    #[default]
    Reject,
}

impl MissingData {
    fn decide(self, what: &str) -> Decision {
        match self {
            MissingData::Accept => Decision::accept(format!("no {}, accepted by policy", what)),
            MissingData::Reject => Decision::reject(format!("no {}, rejected by policy", what)),
        }
    }
}

/// One inclusion test.
pub trait Predicate<T: ?Sized> {
    fn name(&self) -> &'static str;

    fn should_include(&self, entity: &T) -> Decision;
}

// ============ Chain ============

/// Ordered list of predicates, all of which must accept.
pub struct FilterChain<T: ?Sized> {
    predicates: Vec<Box<dyn Predicate<T>>>,
}

impl<T: ?Sized> FilterChain<T> {
    pub fn new() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }

    pub fn with(mut self, predicate: impl Predicate<T> + 'static) -> Self {
        self.predicates.push(Box::new(predicate));
        self
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn should_include(&self, entity: &T) -> Decision {
        for predicate in &self.predicates {
            let decision = predicate.should_include(entity);
            if !decision.include {
                return Decision::reject(format!("{}: {}", predicate.name(), decision.reason));
            }
        }
        Decision::accept(format!("accepted by {} predicates", self.predicates.len()))
    }
}

impl<T: ?Sized> Default for FilterChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ChannelRecord> FilterChain<T> {
    /// Keep the accepted channels, in order, logging each rejection.
    pub fn apply(&self, channels: Vec<T>) -> Vec<T> {
        channels
            .into_iter()
            .filter(|channel| {
                let decision = self.should_include(channel);
                if !decision.include {
                    tracing::debug!("Filtered out '{}': {}", channel.name(), decision.reason);
                }
                decision.include
            })
            .collect()
    }
}

/// Producer adaptor applying a filter chain to another source.
///
/// Identifiers of rejected entities were already allocated upstream and
/// stay unused.
pub struct Filtered<S, T> {
    source: S,
    chain: FilterChain<T>,
    state: GenerationState<T>,
}

impl<S: Source<T>, T: ChannelRecord + Clone> Filtered<S, T> {
    pub fn new(source: S, chain: FilterChain<T>) -> Self {
        Self {
            source,
            chain,
            state: GenerationState::NotStarted,
        }
    }
}

impl<S: Source<T>, T: ChannelRecord + Clone> Source<T> for Filtered<S, T> {
    fn label(&self) -> String {
        format!("{} (filtered)", self.source.label())
    }

    fn produce(&mut self, seq: &mut Sequence) -> Vec<T> {
        let source = &mut self.source;
        let chain = &self.chain;
        self.state
            .get_or_generate(|| {
                let all = source.produce(seq);
                let total = all.len();
                let kept = chain.apply(all);
                tracing::info!("{}: {} of {} channels passed the filter", source.label(), kept.len(), total);
                kept
            })
            .to_vec()
    }
}

// ============ Predicates ============

/// Accepts channels within `max_distance_km` of a reference point.
#[derive(Debug, Clone)]
pub struct DistanceFilter {
    pub reference: Coordinates,
    pub max_distance_km: f64,
    pub missing: MissingData,
}

impl DistanceFilter {
    pub fn new(reference: Coordinates, max_distance_km: f64) -> Self {
        Self {
            reference,
            max_distance_km,
            missing: MissingData::Reject,
        }
    }

    pub fn with_missing(mut self, missing: MissingData) -> Self {
        self.missing = missing;
        self
    }
}

impl<T: ChannelRecord + ?Sized> Predicate<T> for DistanceFilter {
    fn name(&self) -> &'static str {
        "distance"
    }

    fn should_include(&self, entity: &T) -> Decision {
        let Some(location) = entity.coordinates() else {
            return self.missing.decide("coordinates");
        };

        let distance = haversine_km(self.reference, location);
        if distance <= self.max_distance_km {
            Decision::accept(format!("{:.1} km <= {:.1} km", distance, self.max_distance_km))
        } else {
            Decision::reject(format!("{:.1} km > {:.1} km", distance, self.max_distance_km))
        }
    }
}

/// Accepts channels whose receive frequency lies in one of the ranges.
#[derive(Debug, Clone)]
pub struct BandFilter {
    /// Inclusive `[min, max]` MHz ranges
    pub ranges: Vec<(f64, f64)>,
    pub missing: MissingData,
}

impl BandFilter {
    /// 2 m (144–148 MHz) and 70 cm (420–450 MHz)
    pub fn default_ranges() -> Vec<(f64, f64)> {
        vec![(144.0, 148.0), (420.0, 450.0)]
    }

    pub fn new(ranges: Vec<(f64, f64)>) -> Self {
        Self {
            ranges,
            missing: MissingData::Reject,
        }
    }
}

impl Default for BandFilter {
    fn default() -> Self {
        Self::new(Self::default_ranges())
    }
}

impl<T: ChannelRecord + ?Sized> Predicate<T> for BandFilter {
    fn name(&self) -> &'static str {
        "band"
    }

    fn should_include(&self, entity: &T) -> Decision {
        let freq = entity.rx_freq();
        if !freq.is_finite() || freq <= 0.0 {
            return self.missing.decide("receive frequency");
        }

        match self.ranges.iter().find(|(min, max)| *min <= freq && freq <= *max) {
            Some((min, max)) => Decision::accept(format!("{:.4} MHz in {}-{} MHz", freq, min, max)),
            None => Decision::reject(format!("{:.4} MHz outside all {} bands", freq, self.ranges.len())),
        }
    }
}

/// Accepts channels inside an inclusive latitude/longitude box.
#[derive(Debug, Clone)]
pub struct RegionFilter {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
    pub missing: MissingData,
}

impl<T: ChannelRecord + ?Sized> Predicate<T> for RegionFilter {
    fn name(&self) -> &'static str {
        "region"
    }

    fn should_include(&self, entity: &T) -> Decision {
        let Some(location) = entity.coordinates() else {
            return self.missing.decide("coordinates");
        };

        let inside = (self.min_lat..=self.max_lat).contains(&location.lat)
            && (self.min_lng..=self.max_lng).contains(&location.lng);
        if inside {
            Decision::accept(format!("({:.4}, {:.4}) inside region", location.lat, location.lng))
        } else {
            Decision::reject(format!("({:.4}, {:.4}) outside region", location.lat, location.lng))
        }
    }
}

/// Accepts channels whose repeater callsign (or, lacking one, name)
/// matches a pattern.
#[derive(Debug, Clone)]
pub struct CallsignFilter {
    pub pattern: Regex,
}

impl CallsignFilter {
    pub fn new(pattern: Regex) -> Self {
        Self { pattern }
    }
}

impl<T: ChannelRecord + ?Sized> Predicate<T> for CallsignFilter {
    fn name(&self) -> &'static str {
        "callsign"
    }

    fn should_include(&self, entity: &T) -> Decision {
        let callsign = entity
            .hints()
            .rpt_callsign
            .as_deref()
            .unwrap_or_else(|| entity.name());

        if self.pattern.is_match(callsign) {
            Decision::accept(format!("{} matches {}", callsign, self.pattern))
        } else {
            Decision::reject(format!("{} does not match {}", callsign, self.pattern))
        }
    }
}
