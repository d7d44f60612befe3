use {
    super::{Payload, Segment, SegmentList, Timestamp, UsageError, UsageResult},
    std::ops::Range,
};

impl<P: Payload> SegmentList<P> {
    /// Folds a claim over `[start..end)` into the list.
    ///
    /// Afterwards every instant of `[start..end)` is covered by exactly one
    /// segment whose payload has absorbed the contribution. Time outside the
    /// range keeps its payload, and time covered by neither the list nor the
    /// range stays uncovered.
    ///
    /// Boundary segments straddling `start` or `end` are split, gaps inside
    /// the range are filled with seeded segments, and touching segments that
    /// end up with equal payloads are coalesced.
    pub fn accumulate(
        &mut self,
        contribution: &P::Contribution,
        start: Timestamp,
        end: Timestamp,
    ) -> UsageResult<()> {
        if start >= end {
            return Err(UsageError::EmptyRange { start, end });
        }

        let Range { start: mut lo, end: mut hi } = self.overlapping(start, end);
        if lo == hi {
            // Range falls entirely into a gap (or past either end).
            self.0
                .insert(lo, Segment::new(start, end, P::seed(contribution)));
            self.coalesce(lo.saturating_sub(1)..lo + 2);
            self.debug_check();
            return Ok(());
        }

        if self.0[lo].from < start {
            self.split(lo, start);
            lo += 1;
            hi += 1;
        }
        if self.0[hi - 1].to > end {
            self.split(hi - 1, end);
        }

        let mut run = Vec::with_capacity(2 * (hi - lo) + 1);
        let mut cursor = start;
        for mut segment in self.0.drain(lo..hi) {
            if cursor < segment.from {
                run.push(Segment::new(cursor, segment.from, P::seed(contribution)));
            }
            segment.payload.absorb(contribution);
            cursor = segment.to;
            run.push(segment);
        }
        if cursor < end {
            run.push(Segment::new(cursor, end, P::seed(contribution)));
        }
        debug_assert!(
            run.first().map(|s| s.from) == Some(start) && run.last().map(|s| s.to) == Some(end),
            "affected run must cover exactly [{start}..{end})"
        );

        let len = run.len();
        self.0.splice(lo..lo, run);
        self.coalesce(lo.saturating_sub(1)..lo + len + 1);
        self.debug_check();
        Ok(())
    }

    /// Index range of the segments overlapping `[start..end)`.
    ///
    /// Empty when the range touches no segment, in which case `start` of the
    /// returned range is the insertion position.
    fn overlapping(&self, start: Timestamp, end: Timestamp) -> Range<usize> {
        let lo = self.0.partition_point(|s| s.to <= start);
        let hi = self.0.partition_point(|s| s.from < end);
        lo..hi.max(lo)
    }

    /// Cuts the segment at `idx` in two at `at`, both halves keeping the
    /// payload.
    fn split(&mut self, idx: usize, at: Timestamp) {
        let segment = &mut self.0[idx];
        debug_assert!(segment.from < at && at < segment.to);
        let tail = Segment::new(at, segment.to, segment.payload.clone());
        segment.to = at;
        self.0.insert(idx + 1, tail);
    }

    /// Merges touching, equal-payload neighbours within the given index
    /// window.
    fn coalesce(&mut self, window: Range<usize>) {
        let mut end = window.end.min(self.0.len());
        let mut idx = window.start + 1;
        while idx < end {
            let (prev, next) = (&self.0[idx - 1], &self.0[idx]);
            if prev.touches(next) && prev.payload == next.payload {
                let merged = self.0.remove(idx);
                self.0[idx - 1].to = merged.to;
                end -= 1;
            } else {
                idx += 1;
            }
        }
    }

    fn debug_check(&self) {
        debug_assert!(
            self.check_invariants().is_ok(),
            "segment list invariant broken: {:?}",
            self.check_invariants()
        );
    }
}
