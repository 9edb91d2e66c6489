//! Fan-in of several producers of the same entity kind
//!
//! The constituent order is the order identifiers get allocated in, and
//! therefore the serialized order. It is fixed at construction and can be
//! inspected with [`Aggregator::order`].

use super::Source;
use dmrgen_common::Sequence;

pub struct Aggregator<'a, T> {
    label: String,
    sources: Vec<Box<dyn Source<T> + 'a>>,
    warn_on_empty: bool,
}

impl<'a, T> Aggregator<'a, T> {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            sources: Vec::new(),
            warn_on_empty: true,
        }
    }

    /// Append a constituent; it runs after every constituent added before it.
    pub fn with(mut self, source: impl Source<T> + 'a) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Whether a constituent producing zero entities is reported.
    pub fn warn_on_empty(mut self, warn: bool) -> Self {
        self.warn_on_empty = warn;
        self
    }

    /// Labels of the constituents in allocation order.
    pub fn order(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.label()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl<'a, T> Source<T> for Aggregator<'a, T> {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn produce(&mut self, seq: &mut Sequence) -> Vec<T> {
        let mut out = Vec::new();

        for source in self.sources.iter_mut() {
            let items = source.produce(seq);
            if items.is_empty() && self.warn_on_empty {
                tracing::warn!("{}: producer '{}' yielded no entities", self.label, source.label());
            }
            out.extend(items);
        }

        tracing::debug!("{}: {} entities from {} producers", self.label, out.len(), self.sources.len());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::generator::tests::Numbered;
    use crate::module::generator::Producer;

    #[test]
    fn test_aggregator_preserves_producer_order() {
        let mut agg = Aggregator::new("test")
            .with(Producer::new(Numbered { name: "a", count: 2 }))
            .with(Producer::new(Numbered { name: "b", count: 1 }))
            .with(Producer::new(Numbered { name: "c", count: 2 }));
        let mut seq = Sequence::new();

        let items = agg.produce(&mut seq);
        let names: Vec<&str> = items.iter().map(|i| i.1.as_str()).collect();

        assert_eq!(names, vec!["a0", "a1", "b0", "c0", "c1"]);
        assert_eq!(items.iter().map(|i| i.0).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
        assert_eq!(agg.order(), vec!["numbered a", "numbered b", "numbered c"]);
    }

    #[test]
    fn test_aggregator_tolerates_empty_producer() {
        let mut agg = Aggregator::new("test")
            .with(Producer::new(Numbered { name: "empty", count: 0 }))
            .with(Producer::new(Numbered { name: "b", count: 1 }));
        let mut seq = Sequence::new();

        let items = agg.produce(&mut seq);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].0, 1);
    }

    #[test]
    fn test_aggregator_repeat_call_reuses_cached_producers() {
        let mut agg = Aggregator::new("test")
            .with(Producer::new(Numbered { name: "a", count: 3 }))
            .warn_on_empty(false);
        let mut seq = Sequence::new();

        let first = agg.produce(&mut seq);
        let second = agg.produce(&mut seq);
        assert_eq!(first, second);
        assert_eq!(seq.allocated(), 3);
    }

    #[test]
    fn test_aggregator_over_borrowed_producer() {
        let mut shared = Producer::new(Numbered { name: "s", count: 2 });
        let mut seq = Sequence::new();
        {
            let mut agg = Aggregator::new("borrowed").with(&mut shared);
            assert_eq!(agg.produce(&mut seq).len(), 2);
        }
        assert!(shared.is_generated());
        assert_eq!(shared.produce(&mut seq)[1].0, 2);
    }
}
