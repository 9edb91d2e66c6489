//! Producer contract
//!
//! A producer turns one data source into entities of one kind, drawing
//! identifiers from the [`Sequence`] of that kind. Generation happens at
//! most once per producer: the first call moves it from
//! [`GenerationState::NotStarted`] to [`GenerationState::Generated`] and
//! every later call hands back the stored result without touching the
//! allocator again.

pub mod aggregator;
pub mod filter;

pub use aggregator::Aggregator;
pub use filter::{
    BandFilter, CallsignFilter, Decision, DistanceFilter, FilterChain, Filtered, MissingData,
    Predicate, RegionFilter,
};

use dmrgen_common::Sequence;

/// The pure generation step of a producer.
pub trait Generate {
    type Entity: Clone;

    /// Human-readable name used in diagnostics.
    fn label(&self) -> String;

    /// Build the entities, allocating exactly one identifier per entity.
    fn generate(&self, seq: &mut Sequence) -> Vec<Self::Entity>;
}

/// Anything that can hand out the entities of one kind for a run.
///
/// Implemented by [`Producer`], [`Aggregator`] and [`Filtered`], so
/// combinators nest freely.
pub trait Source<T> {
    fn label(&self) -> String;

    fn produce(&mut self, seq: &mut Sequence) -> Vec<T>;
}

impl<T, S: Source<T> + ?Sized> Source<T> for &mut S {
    fn label(&self) -> String {
        (**self).label()
    }

    fn produce(&mut self, seq: &mut Sequence) -> Vec<T> {
        (**self).produce(seq)
    }
}

impl<T, S: Source<T> + ?Sized> Source<T> for Box<S> {
    fn label(&self) -> String {
        (**self).label()
    }

    fn produce(&mut self, seq: &mut Sequence) -> Vec<T> {
        (**self).produce(seq)
    }
}

/// Generate-once state of a producer
#[derive(Debug, Clone)]
pub enum GenerationState<T> {
    NotStarted,
    Generated(Vec<T>),
}

impl<T> GenerationState<T> {
    pub fn is_generated(&self) -> bool {
        matches!(self, GenerationState::Generated(_))
    }

    /// Stored result, if generation already happened.
    pub fn entities(&self) -> Option<&[T]> {
        match self {
            GenerationState::Generated(items) => Some(items),
            GenerationState::NotStarted => None,
        }
    }

    /// Run `generate` on the first call only, then return the stored result.
    pub fn get_or_generate(&mut self, generate: impl FnOnce() -> Vec<T>) -> &[T] {
        if let GenerationState::NotStarted = self {
            *self = GenerationState::Generated(generate());
        }
        match self {
            GenerationState::Generated(items) => items,
            GenerationState::NotStarted => &[],
        }
    }
}

impl<T> Default for GenerationState<T> {
    fn default() -> Self {
        GenerationState::NotStarted
    }
}

/// A [`Generate`] implementation plus its generate-once state.
pub struct Producer<G: Generate> {
    generator: G,
    state: GenerationState<G::Entity>,
}

impl<G: Generate> Producer<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            state: GenerationState::NotStarted,
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn is_generated(&self) -> bool {
        self.state.is_generated()
    }

    /// Entities of this producer, generating them on first use.
    pub fn entities(&mut self, seq: &mut Sequence) -> &[G::Entity] {
        let generator = &self.generator;
        self.state.get_or_generate(|| {
            let items = generator.generate(seq);
            tracing::debug!("{} generated {} entities", generator.label(), items.len());
            items
        })
    }
}

impl<G: Generate> Source<G::Entity> for Producer<G> {
    fn label(&self) -> String {
        self.generator.label()
    }

    fn produce(&mut self, seq: &mut Sequence) -> Vec<G::Entity> {
        self.entities(seq).to_vec()
    }
}
