use {
    super::{Claim, Load, Pool, SegmentList, Sharer, SharerSet, Timestamp, UsageError, UsageResult},
    std::{
        collections::{BTreeMap, BTreeSet},
        hash::BuildHasher,
        ops::Range,
    },
    tracing::{debug, trace},
};

/// Which sharers occupy a node, over time.
pub type NodeUsage<S> = SegmentList<SharerSet<S>>;

/// Aggregated load of a rack, over time.
pub type RackLoad = SegmentList<Load>;

/// Which nodes of a rack are in use, over time.
pub type RackOccupancy = SegmentList<SharerSet<String>>;

/// Usage of a rack, viewed as a single resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RackUsage {
    load: RackLoad,
    occupancy: RackOccupancy,
    size: usize,
}

impl RackUsage {
    /// Sum of the loads of all claims on the rack's nodes.
    pub fn load(&self) -> &RackLoad {
        &self.load
    }

    /// Nodes of the rack in use.
    pub fn occupancy(&self) -> &RackOccupancy {
        &self.occupancy
    }

    /// Number of nodes on the rack.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Fraction of the rack's nodes in use at the given instant.
    pub fn occupied_fraction(&self, t: Timestamp) -> f64 {
        if self.size == 0 {
            return 0.0;
        }
        let used = self.occupancy.at(t).map_or(0, |s| s.payload.len());
        used as f64 / self.size as f64
    }
}

/// Usage of every resource of a pool, as of one refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolUsage<S: Sharer> {
    nodes: BTreeMap<String, NodeUsage<S>>,
    racks: BTreeMap<String, RackUsage>,
}

impl<S: Sharer> Default for PoolUsage<S> {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
            racks: BTreeMap::new(),
        }
    }
}

impl<S: Sharer> PoolUsage<S> {
    /// Usage of the node with the given short id.
    pub fn node(&self, id: &str) -> Option<&NodeUsage<S>> {
        self.nodes.get(id)
    }

    /// Usage of the rack with the given id.
    pub fn rack(&self, id: &str) -> Option<&RackUsage> {
        self.racks.get(id)
    }

    /// Iterator over node usages, sorted by node id.
    pub fn nodes(&self) -> impl Iterator<Item = (&str, &NodeUsage<S>)> {
        self.nodes.iter().map(|(id, usage)| (id.as_str(), usage))
    }

    /// Iterator over rack usages, sorted by rack id.
    pub fn racks(&self) -> impl Iterator<Item = (&str, &RackUsage)> {
        self.racks.iter().map(|(id, usage)| (id.as_str(), usage))
    }

    /// Time covered by any node, from the earliest start to the latest end.
    pub fn window(&self) -> Option<Range<Timestamp>> {
        self.nodes
            .values()
            .filter_map(SegmentList::span)
            .reduce(|a, b| a.start.min(b.start)..a.end.max(b.end))
    }

    /// Sharers whose rendering must be refreshed.
    ///
    /// A sharer's slices depend on everyone it shares a segment with, so on
    /// top of the changed sharers themselves, every sharer found in a shared
    /// segment together with a changed one is included.
    pub fn needs_redraw(&self, changed: &BTreeSet<S>) -> BTreeSet<S> {
        let mut redraw = changed.clone();
        if changed.is_empty() {
            return redraw;
        }
        for segment in self.nodes.values().flat_map(|usage| usage.iter()) {
            let sharers = &segment.payload;
            if sharers.is_shared() && sharers.iter().any(|s| changed.contains(s)) {
                redraw.extend(sharers.iter().cloned());
            }
        }
        redraw
    }
}

/// Rebuilds resource usage from a snapshot of claims.
///
/// Nothing is carried over between builds: every list starts out empty and
/// is folded from the given claims only.
pub struct UsageBuilder<'a, H: BuildHasher> {
    pool: &'a Pool<H>,
}

impl<'a, H: BuildHasher> UsageBuilder<'a, H> {
    /// Creates a builder for the resources of the given pool.
    pub fn new(pool: &'a Pool<H>) -> Self {
        Self { pool }
    }

    /// Folds claims into the usage of a single node.
    ///
    /// Every claim has to target the node. The result does not depend on the
    /// order of the claims.
    pub fn build<'c, S, I>(&self, resource: &str, claims: I) -> UsageResult<NodeUsage<S>>
    where
        S: Sharer + 'c,
        I: IntoIterator<Item = &'c Claim<S>>,
    {
        if !self.pool.contains(resource) {
            return Err(UsageError::UnknownResource(resource.to_string()));
        }

        let mut usage = NodeUsage::new();
        for claim in claims {
            if claim.resource() != resource {
                return Err(UsageError::MisroutedClaim {
                    resource: claim.resource().to_string(),
                    expected: resource.to_string(),
                });
            }
            usage.accumulate(claim.sharer(), claim.start(), claim.end())?;
        }
        trace!(resource, segments = usage.len(), "node usage rebuilt");

        Ok(usage)
    }

    /// Folds claims into the usage of every node and rack of the pool.
    ///
    /// Nodes and racks without claims get empty lists. Fails, building
    /// nothing, if any claim targets a node outside of the pool.
    pub fn build_all<S: Sharer>(&self, claims: &[Claim<S>]) -> UsageResult<PoolUsage<S>> {
        let mut by_node = BTreeMap::<&str, Vec<&Claim<S>>>::new();
        for claim in claims {
            if !self.pool.contains(claim.resource()) {
                return Err(UsageError::UnknownResource(claim.resource().to_string()));
            }
            by_node.entry(claim.resource()).or_default().push(claim);
        }

        let mut usage = PoolUsage::default();
        for (_, node) in self.pool.nodes() {
            let claims = by_node.get(node.id()).map(Vec::as_slice).unwrap_or_default();
            let node_usage = self.build(node.id(), claims.iter().copied())?;
            usage.nodes.insert(node.id().to_string(), node_usage);
        }

        for rack in self.pool.racks() {
            let mut load = RackLoad::new();
            let mut occupancy = RackOccupancy::new();
            let rack_claims = rack
                .nodes()
                .iter()
                .filter_map(|node| by_node.get(node.as_str()))
                .flatten();
            for claim in rack_claims {
                load.accumulate(&claim.load(), claim.start(), claim.end())?;
                occupancy.accumulate(&claim.resource().to_string(), claim.start(), claim.end())?;
            }
            trace!(rack = rack.id(), segments = load.len(), "rack usage rebuilt");
            usage.racks.insert(
                rack.id().to_string(),
                RackUsage {
                    load,
                    occupancy,
                    size: rack.size(),
                },
            );
        }

        debug!(
            claims = claims.len(),
            nodes = usage.nodes.len(),
            racks = usage.racks.len(),
            "pool usage rebuilt"
        );
        Ok(usage)
    }
}
