use {
    super::{Sharer, Timestamp, UsageError, UsageResult},
    std::ops::Range,
};

/// One sharer's asserted occupancy of one resource over `[start..end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim<S: Sharer> {
    sharer: S,
    resource: String,
    start: Timestamp,
    end: Timestamp,
    load: u64,
}

impl<S: Sharer> Claim<S> {
    /// Creates a new claim with unit load.
    ///
    /// Fails if the range is empty or reversed.
    pub fn new(
        sharer: S,
        resource: impl Into<String>,
        start: Timestamp,
        end: Timestamp,
    ) -> UsageResult<Self> {
        if start >= end {
            return Err(UsageError::EmptyRange { start, end });
        }
        Ok(Self {
            sharer,
            resource: resource.into(),
            start,
            end,
            load: 1,
        })
    }

    /// Sets the load contributed when the claim is aggregated into a rack.
    pub fn with_load(mut self, load: u64) -> Self {
        self.load = load;
        self
    }

    pub fn sharer(&self) -> &S {
        &self.sharer
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    pub fn range(&self) -> Range<Timestamp> {
        self.start..self.end
    }

    pub fn load(&self) -> u64 {
        self.load
    }
}
