use crate::segment::Timestamp;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    /// Claim range is empty or reversed
    #[error("Empty or reversed range: [{start}, {end})")]
    EmptyRange { start: Timestamp, end: Timestamp },

    /// Claim targets a resource that is not in the pool
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// Claim handed to the fold of another resource
    #[error("Claim for {resource} folded into {expected}")]
    MisroutedClaim { resource: String, expected: String },

    /// Same node reported twice
    #[error("Duplicate node in pool: {0}")]
    DuplicateNode(String),

    /// Slices must be at least one millisecond wide
    #[error("Slice width must be positive")]
    ZeroSliceWidth,

    /// Chart width is used as a divisor when deriving the slice width
    #[error("Chart width must be positive")]
    InvalidChartWidth,

    /// Segments supplied by the caller break an ordering or merge invariant
    #[error("Invalid segment list: {0}")]
    InvalidSegments(#[from] InvariantViolation),
}

/// Broken segment list invariant.
///
/// Index refers to the offending segment (or the second of an offending
/// pair).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("Segment {0} is empty or reversed")]
    EmptySegment(usize),

    #[error("Segment {0} overlaps or precedes its predecessor")]
    Unordered(usize),

    #[error("Segment {0} touches its predecessor with an equal payload")]
    Uncoalesced(usize),
}

pub type UsageResult<T> = Result<T, UsageError>;
