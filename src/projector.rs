use {
    super::{
        NodeUsage,
        Pool,
        PoolUsage,
        ResourceIdx,
        Segment,
        Sharer,
        SharerSet,
        Timestamp,
        UsageError,
        UsageResult,
    },
    auto_impl::auto_impl,
    std::{hash::BuildHasher, ops::Range},
};

/// Policy deciding how wide one slice of a shared segment is.
#[auto_impl(&, Box, Arc)]
pub trait SliceWidth {
    /// Slice width for a chart showing the given time window.
    ///
    /// `None` means nothing is shown yet.
    fn slice_width(&self, window: Option<&Range<Timestamp>>) -> Timestamp;
}

/// Constant slice width, regardless of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedWidth(pub Timestamp);

impl SliceWidth for FixedWidth {
    fn slice_width(&self, _window: Option<&Range<Timestamp>>) -> Timestamp {
        self.0
    }
}

/// Slice width that keeps slices a constant number of pixels wide.
///
/// The window is spread over the chart width, so one slice lasts
/// `window * pixels_per_slice / chart_width` milliseconds (at least one).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelScale {
    pub pixels_per_slice: u32,
    pub chart_width_px: u32,
}

impl SliceWidth for PixelScale {
    fn slice_width(&self, window: Option<&Range<Timestamp>>) -> Timestamp {
        let Some(window) = window else {
            return 1;
        };
        if self.chart_width_px == 0 {
            return 1;
        }
        let len = u128::from(window.end.saturating_sub(window.start));
        let width = len * u128::from(self.pixels_per_slice) / u128::from(self.chart_width_px);
        Timestamp::try_from(width).unwrap_or(Timestamp::MAX).max(1)
    }
}

/// Part of a resource's timeline drawn for one viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSpan {
    pub from: Timestamp,
    pub to: Timestamp,
}

/// Render span placed on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSpan {
    pub resource: ResourceIdx,
    pub span: RenderSpan,
}

/// Turns segments into spans for one viewer.
///
/// A segment the viewer has for itself becomes a single span. A segment
/// shared by `k` sharers is cut into a repeating cycle of `k` slices, the
/// viewer getting the slice at its rank among the sorted sharers. Since ranks
/// only depend on the ids, the pattern is the same on every refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceProjector {
    slice_width: Timestamp,
}

impl SliceProjector {
    /// Creates a projector cutting shared segments into slices of the given
    /// width.
    pub fn new(slice_width: Timestamp) -> UsageResult<Self> {
        if slice_width == 0 {
            return Err(UsageError::ZeroSliceWidth);
        }
        Ok(Self { slice_width })
    }

    /// Creates a projector with the width the policy picks for the window.
    pub fn with_policy<W: SliceWidth>(
        policy: W,
        window: Option<&Range<Timestamp>>,
    ) -> UsageResult<Self> {
        Self::new(policy.slice_width(window))
    }

    pub fn slice_width(&self) -> Timestamp {
        self.slice_width
    }

    /// Spans of the viewer on one resource, in chronological order.
    pub fn project<S: Sharer>(&self, usage: &NodeUsage<S>, viewer: &S) -> Vec<RenderSpan> {
        let mut spans = Vec::new();
        for segment in usage {
            self.project_segment(segment, viewer, &mut spans);
        }
        spans
    }

    /// Spans of the viewer on every node of the pool.
    ///
    /// Sorted by resource index; spans of one resource stay chronological.
    pub fn project_pool<S, H>(
        &self,
        pool: &Pool<H>,
        usage: &PoolUsage<S>,
        viewer: &S,
    ) -> Vec<ResourceSpan>
    where
        S: Sharer,
        H: BuildHasher,
    {
        let mut spans = Vec::new();
        for (id, node_usage) in usage.nodes() {
            let Some(resource) = pool.idx(id) else {
                continue;
            };
            spans.extend(
                self.project(node_usage, viewer)
                    .into_iter()
                    .map(|span| ResourceSpan { resource, span }),
            );
        }
        spans.sort_by_key(|span| span.resource);
        spans
    }

    fn project_segment<S: Sharer>(
        &self,
        segment: &Segment<SharerSet<S>>,
        viewer: &S,
        spans: &mut Vec<RenderSpan>,
    ) {
        let sharers = &segment.payload;
        let Some(rank) = sharers.rank(viewer) else {
            return;
        };
        if !sharers.is_shared() {
            spans.push(RenderSpan {
                from: segment.from,
                to: segment.to,
            });
            return;
        }

        let width = self.slice_width;
        let cycle = width.saturating_mul(sharers.len() as Timestamp);
        let offset = width.saturating_mul(rank as Timestamp);
        let mut from = segment.from.saturating_add(offset);
        while from < segment.to {
            spans.push(RenderSpan {
                from,
                to: from.saturating_add(width).min(segment.to),
            });
            from = from.saturating_add(cycle);
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::SegmentList, std::sync::Arc};

    fn usage(claims: &[(&'static str, Timestamp, Timestamp)]) -> NodeUsage<&'static str> {
        let mut usage = SegmentList::new();
        for (sharer, start, end) in claims {
            usage.accumulate(sharer, *start, *end).unwrap();
        }
        usage
    }

    fn spans(spans: &[RenderSpan]) -> Vec<(Timestamp, Timestamp)> {
        spans.iter().map(|s| (s.from, s.to)).collect()
    }

    #[test]
    fn exclusive_segment_is_solid() {
        let usage = usage(&[("A", 0, 100), ("B", 200, 300)]);
        let projector = SliceProjector::new(10).unwrap();
        assert_eq!(spans(&projector.project(&usage, &"A")), vec![(0, 100)]);
        assert_eq!(spans(&projector.project(&usage, &"B")), vec![(200, 300)]);
        assert!(projector.project(&usage, &"C").is_empty());
    }

    #[test]
    fn shared_segment_is_sliced_by_rank() {
        let usage = usage(&[("B", 0, 45), ("A", 0, 45)]);
        let projector = SliceProjector::new(10).unwrap();

        // Cycle of 20: A owns [0,10) of each cycle, B [10,20).
        assert_eq!(
            spans(&projector.project(&usage, &"A")),
            vec![(0, 10), (20, 30), (40, 45)]
        );
        assert_eq!(spans(&projector.project(&usage, &"B")), vec![(10, 20), (30, 40)]);
    }

    #[test]
    fn slices_follow_segments() {
        let usage = usage(&[("A", 0, 100), ("B", 50, 150), ("C", 50, 80)]);
        let projector = SliceProjector::new(10).unwrap();

        // [0,50){A} solid, [50,80){A,B,C} cycle 30, [80,100){A,B} cycle 20.
        assert_eq!(
            spans(&projector.project(&usage, &"A")),
            vec![(0, 50), (50, 60), (80, 90)]
        );
        assert_eq!(
            spans(&projector.project(&usage, &"B")),
            vec![(60, 70), (90, 100), (100, 150)]
        );
        assert_eq!(spans(&projector.project(&usage, &"C")), vec![(70, 80)]);
    }

    #[test]
    fn wide_slices_are_truncated() {
        let usage = usage(&[("A", 0, 15), ("B", 0, 15)]);
        let projector = SliceProjector::new(10).unwrap();
        assert_eq!(spans(&projector.project(&usage, &"A")), vec![(0, 10)]);
        assert_eq!(spans(&projector.project(&usage, &"B")), vec![(10, 15)]);

        // Slice of the second sharer starts past the segment end.
        let projector = SliceProjector::new(20).unwrap();
        assert_eq!(spans(&projector.project(&usage, &"A")), vec![(0, 15)]);
        assert!(projector.project(&usage, &"B").is_empty());
    }

    #[test]
    fn slice_width_policies() {
        assert_eq!(SliceProjector::new(0), Err(UsageError::ZeroSliceWidth));

        let scale = PixelScale {
            pixels_per_slice: 10,
            chart_width_px: 1000,
        };
        assert_eq!(scale.slice_width(Some(&(0..100_000))), 1000);
        assert_eq!(scale.slice_width(Some(&(0..50))), 1);
        assert_eq!(scale.slice_width(None), 1);

        let boxed: Box<dyn SliceWidth> = Box::new(FixedWidth(25));
        let projector = SliceProjector::with_policy(&boxed, None).unwrap();
        assert_eq!(projector.slice_width(), 25);

        let shared = Arc::new(scale);
        let projector = SliceProjector::with_policy(shared, Some(&(0..200_000))).unwrap();
        assert_eq!(projector.slice_width(), 2000);

        assert_eq!(
            SliceProjector::with_policy(FixedWidth(0), None),
            Err(UsageError::ZeroSliceWidth)
        );
    }
}
