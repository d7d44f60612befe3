use {
    super::{Atlas, FixedWidth, Node, PixelScale, SliceWidth, Timestamp, UsageError, UsageResult},
    rapidhash::RapidBuildHasher,
    serde::Deserialize,
    std::hash::BuildHasher,
};

/// Atlas settings.
///
/// Slices of shared segments are `pixels_per_slice` wide on a chart
/// `chart_width_px` wide, unless `slice_width_ms` pins their width in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub pixels_per_slice: u32,
    pub chart_width_px: u32,
    pub slice_width_ms: Option<Timestamp>,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            pixels_per_slice: 10,
            chart_width_px: 1000,
            slice_width_ms: None,
        }
    }
}

impl AtlasConfig {
    /// Checks that the configured slice width can never be zero.
    pub fn validate(&self) -> UsageResult<()> {
        match self.slice_width_ms {
            Some(0) => Err(UsageError::ZeroSliceWidth),
            Some(_) => Ok(()),
            None if self.pixels_per_slice == 0 => Err(UsageError::ZeroSliceWidth),
            None if self.chart_width_px == 0 => Err(UsageError::InvalidChartWidth),
            None => Ok(()),
        }
    }

    /// Slice width policy the settings describe.
    pub fn slice_policy(&self) -> Box<dyn SliceWidth + Send + Sync> {
        match self.slice_width_ms {
            Some(width) => Box::new(FixedWidth(width)),
            None => Box::new(PixelScale {
                pixels_per_slice: self.pixels_per_slice,
                chart_width_px: self.chart_width_px,
            }),
        }
    }
}

/// Atlas builder.
pub struct AtlasBuilder<H: BuildHasher = RapidBuildHasher>(Vec<Node>, AtlasConfig, H);

impl AtlasBuilder {
    /// Create new atlas builder over the given nodes.
    pub fn new<I: IntoIterator<Item = Node>>(nodes: I) -> Self {
        Self::with_build_hasher(nodes, RapidBuildHasher::default())
    }
}

impl<H: BuildHasher> AtlasBuilder<H> {
    /// Create new atlas builder using the given hasher for node lookups.
    pub fn with_build_hasher<I>(nodes: I, build_hasher: H) -> Self
    where
        I: IntoIterator<Item = Node>,
    {
        Self(nodes.into_iter().collect(), AtlasConfig::default(), build_hasher)
    }

    /// Replace all settings at once.
    pub fn with_config(mut self, config: AtlasConfig) -> Self {
        self.1 = config;
        self
    }

    /// Keep slices the given number of pixels wide.
    pub fn with_pixels_per_slice(mut self, pixels: u32) -> Self {
        self.1.pixels_per_slice = pixels;
        self
    }

    /// Width of the chart the slices are drawn on.
    pub fn with_chart_width(mut self, pixels: u32) -> Self {
        self.1.chart_width_px = pixels;
        self
    }

    /// Pin the slice width, in milliseconds.
    pub fn with_slice_width(mut self, width: Timestamp) -> Self {
        self.1.slice_width_ms = Some(width);
        self
    }

    /// Build the atlas.
    pub fn build(self) -> UsageResult<Atlas<H>> {
        self.1.validate()?;
        Atlas::with_build_hasher(self.0, self.1, self.2)
    }
}
