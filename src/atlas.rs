use {
    super::{
        AppRegistry,
        AppReport,
        AtlasConfig,
        Claim,
        Node,
        Pool,
        PoolUsage,
        ResourceSpan,
        SliceProjector,
        SliceWidth,
        Timestamp,
        UsageBuilder,
        UsageError,
        UsageResult,
    },
    parking_lot::{Mutex, RwLock},
    rapidhash::RapidBuildHasher,
    std::{collections::BTreeSet, hash::BuildHasher, ops::Range, sync::Arc},
    tracing::{debug, warn},
};

/// Everything one refresh computed.
///
/// Snapshots are immutable; a refresh publishes a new one instead of
/// updating the current one.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    now: Timestamp,
    usage: PoolUsage<String>,
    window: Option<Range<Timestamp>>,
    projector: Option<SliceProjector>,
    redraw: BTreeSet<String>,
    skipped: usize,
}

impl Snapshot {
    fn empty() -> Self {
        Self {
            now: 0,
            usage: PoolUsage::default(),
            window: None,
            projector: None,
            redraw: BTreeSet::new(),
            skipped: 0,
        }
    }

    /// Refresh time the snapshot was taken at.
    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn usage(&self) -> &PoolUsage<String> {
        &self.usage
    }

    /// Time covered by any usage.
    pub fn window(&self) -> Option<&Range<Timestamp>> {
        self.window.as_ref()
    }

    /// Slice width used for shared segments, `None` before the first
    /// refresh.
    pub fn slice_width(&self) -> Option<Timestamp> {
        self.projector.map(|projector| projector.slice_width())
    }

    /// Apps whose spans changed and have to be drawn again.
    pub fn redraw(&self) -> &BTreeSet<String> {
        &self.redraw
    }

    /// Number of claims left out because they failed validation.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

/// Usage atlas of a pool of nodes.
///
/// Each [`refresh`](Self::refresh) runs a full cycle: reports update the app
/// registry, claims are derived and folded into fresh usage of every node and
/// rack, and the result is published as a new [`Snapshot`]. Readers holding an
/// older snapshot keep seeing it unchanged; they never observe a partially
/// rebuilt state.
pub struct Atlas<H: BuildHasher = RapidBuildHasher> {
    pool: Pool<H>,
    config: AtlasConfig,
    slice_policy: Box<dyn SliceWidth + Send + Sync>,
    registry: Mutex<AppRegistry>,
    snapshot: RwLock<Arc<Snapshot>>,
}

impl Atlas {
    /// Creates an atlas over the given nodes, with default settings.
    pub fn new<I: IntoIterator<Item = Node>>(nodes: I) -> UsageResult<Self> {
        Self::with_build_hasher(nodes, AtlasConfig::default(), RapidBuildHasher::default())
    }
}

impl<H: BuildHasher> Atlas<H> {
    /// Creates an atlas over the given nodes.
    pub fn with_build_hasher<I>(nodes: I, config: AtlasConfig, build_hasher: H) -> UsageResult<Self>
    where
        I: IntoIterator<Item = Node>,
    {
        config.validate()?;
        Ok(Self {
            pool: Pool::with_build_hasher(nodes, build_hasher)?,
            slice_policy: config.slice_policy(),
            config,
            registry: Mutex::new(AppRegistry::new()),
            snapshot: RwLock::new(Arc::new(Snapshot::empty())),
        })
    }

    pub fn pool(&self) -> &Pool<H> {
        &self.pool
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.read().clone()
    }

    /// Runs one refresh cycle over the app reports taken at `now`.
    ///
    /// Claims that fail validation or target nodes outside of the pool are
    /// skipped and logged. Returns the published snapshot.
    pub fn refresh<'a, I>(&self, apps: I, now: Timestamp) -> UsageResult<Arc<Snapshot>>
    where
        I: IntoIterator<Item = &'a AppReport>,
    {
        let mut registry = self.registry.lock();
        registry.ingest(apps, now);

        let mut claims = Vec::new();
        let mut skipped = 0;
        for claim in registry.claims() {
            match claim.and_then(|claim| self.check_resource(claim)) {
                Ok(claim) => claims.push(claim),
                Err(err) => {
                    warn!(%err, "skipping claim");
                    skipped += 1;
                }
            }
        }

        let usage = UsageBuilder::new(&self.pool).build_all(&claims)?;
        let window = usage.window();
        let projector = SliceProjector::with_policy(&self.slice_policy, window.as_ref())?;
        let redraw = usage.needs_redraw(&registry.take_changed());
        debug!(
            now,
            claims = claims.len(),
            skipped,
            redraw = redraw.len(),
            slice_width = projector.slice_width(),
            "atlas refreshed"
        );

        let snapshot = Arc::new(Snapshot {
            now,
            usage,
            window,
            projector: Some(projector),
            redraw,
            skipped,
        });
        *self.snapshot.write() = snapshot.clone();
        Ok(snapshot)
    }

    /// Spans of the app on every node, as of the latest snapshot.
    pub fn spans(&self, app: &str) -> Vec<ResourceSpan> {
        let snapshot = self.snapshot();
        let Some(projector) = snapshot.projector else {
            return Vec::new();
        };
        projector.project_pool(&self.pool, &snapshot.usage, &app.to_string())
    }

    fn check_resource(&self, claim: Claim<String>) -> UsageResult<Claim<String>> {
        if self.pool.contains(claim.resource()) {
            Ok(claim)
        } else {
            Err(UsageError::UnknownResource(claim.resource().to_string()))
        }
    }
}
