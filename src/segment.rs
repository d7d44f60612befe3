use {
    super::{InvariantViolation, Payload, UsageResult},
    std::ops::{Deref, Range},
};

/// Milliseconds since epoch, or any other monotonic unit the caller picks.
pub type Timestamp = u64;

/// A half-open stretch of time with a constant payload.
///
/// Range bounded inclusively below and exclusively above i.e. `[from..to)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<P> {
    pub from: Timestamp,
    pub to: Timestamp,
    pub payload: P,
}

impl<P> Segment<P> {
    /// Creates a new segment.
    pub fn new(from: Timestamp, to: Timestamp, payload: P) -> Self {
        Self { from, to, payload }
    }

    /// Returns the time range of the segment.
    pub fn range(&self) -> Range<Timestamp> {
        self.from..self.to
    }

    /// Length of the segment.
    pub fn duration(&self) -> Timestamp {
        self.to.saturating_sub(self.from)
    }

    /// Whether the given instant falls into `[from..to)`.
    pub fn contains(&self, t: Timestamp) -> bool {
        self.from <= t && t < self.to
    }

    /// Whether the other segment starts exactly where this one ends.
    pub fn touches(&self, next: &Self) -> bool {
        self.to == next.from
    }
}

/// Chronologically ordered, disjoint and coalesced segments of one resource.
///
/// Invariants (always held):
///    - every segment is non-empty, `from < to`
///    - segments are sorted by `from` and do not overlap
///    - no two touching segments carry equal payloads
///
/// Uncovered time is simply absent from the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentList<P>(pub(crate) Vec<Segment<P>>);

impl<P> Default for SegmentList<P> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<P> Deref for SegmentList<P> {
    type Target = [Segment<P>];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a, P> IntoIterator for &'a SegmentList<P> {
    type Item = &'a Segment<P>;
    type IntoIter = std::slice::Iter<'a, Segment<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<P> IntoIterator for SegmentList<P> {
    type Item = Segment<P>;
    type IntoIter = std::vec::IntoIter<Segment<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<P: Payload> SegmentList<P> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps already built segments, rejecting them if any invariant is
    /// broken.
    pub fn from_segments(segments: Vec<Segment<P>>) -> UsageResult<Self> {
        let list = Self(segments);
        list.check_invariants()?;
        Ok(list)
    }

    /// Segment covering the given instant.
    pub fn at(&self, t: Timestamp) -> Option<&Segment<P>> {
        let idx = self.0.partition_point(|s| s.to <= t);
        self.0.get(idx).filter(|s| s.contains(t))
    }

    /// Total covered time.
    pub fn covered(&self) -> Timestamp {
        self.0.iter().map(Segment::duration).sum()
    }

    /// Earliest start and latest end, `None` for an empty list.
    pub fn span(&self) -> Option<Range<Timestamp>> {
        Some(self.0.first()?.from..self.0.last()?.to)
    }

    /// Checks ordering, disjointness and coalescing.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for (idx, segment) in self.0.iter().enumerate() {
            if segment.from >= segment.to {
                return Err(InvariantViolation::EmptySegment(idx));
            }
            let Some(prev) = idx.checked_sub(1).map(|i| &self.0[i]) else {
                continue;
            };
            if prev.to > segment.from {
                return Err(InvariantViolation::Unordered(idx));
            }
            if prev.touches(segment) && prev.payload == segment.payload {
                return Err(InvariantViolation::Uncoalesced(idx));
            }
        }
        Ok(())
    }
}
