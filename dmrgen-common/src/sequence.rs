//! Per-run identifier allocator

/// Monotonic identifier source for one entity kind.
///
/// Every entity kind gets its own `Sequence` per run. Identifiers start at
/// the origin (1 unless configured otherwise), strictly increase and are
/// never handed out twice by the same instance.
#[derive(Debug, Clone)]
pub struct Sequence {
    next: u32,
    origin: u32,
}

impl Sequence {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(origin: u32) -> Self {
        Self { next: origin, origin }
    }

    /// Allocate the next identifier.
    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Number of identifiers handed out so far.
    pub fn allocated(&self) -> u32 {
        self.next - self.origin
    }

    /// The identifier the next call to [`Sequence::next_id`] will return.
    pub fn peek(&self) -> u32 {
        self.next
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_starts_at_one() {
        let mut seq = Sequence::new();
        assert_eq!(seq.next_id(), 1);
        assert_eq!(seq.next_id(), 2);
        assert_eq!(seq.allocated(), 2);
    }

    #[test]
    fn test_sequence_custom_origin() {
        let mut seq = Sequence::starting_at(100);
        assert_eq!(seq.peek(), 100);
        assert_eq!(seq.next_id(), 100);
        assert_eq!(seq.peek(), 101);
    }

    #[test]
    fn test_sequence_strictly_increasing() {
        let mut seq = Sequence::new();
        let ids: Vec<u32> = (0..500).map(|_| seq.next_id()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }
}
