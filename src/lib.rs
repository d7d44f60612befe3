//! Occupancy timelines of applications sharing the nodes of a cluster.
//!
//! Applications (sharers) claim nodes (resources) over half-open time
//! intervals. For every resource the claims are folded into a
//! [`SegmentList`]: a minimal, chronologically ordered partition of the
//! covered time in which every segment records exactly who was active
//! during it. Racks are tracked as aggregate resources, accumulating a
//! numeric [`Load`] or the set of nodes in use.
//!
//! A [`SliceProjector`] turns the segments seen by one application into
//! render spans: a solid span where the application has the node for itself,
//! and a stable checkerboard of slices where it shares the node with others.
//!
//! [`Atlas`] drives the whole cycle from resource manager reports and
//! publishes each result as an immutable [`Snapshot`].

mod accumulator;
mod atlas;
mod builder;
mod claim;
mod error;
mod payload;
mod pool;
mod projector;
mod report;
mod segment;
mod tracker;
mod usage;


pub use {
    atlas::{Atlas, Snapshot},
    builder::{AtlasBuilder, AtlasConfig},
    claim::Claim,
    error::{InvariantViolation, UsageError, UsageResult},
    payload::{Load, Payload, Sharer, SharerSet},
    pool::{Node, Pool, Rack, ResourceIdx, UNDEFINED_RACK, short_node_id},
    projector::{FixedWidth, PixelScale, RenderSpan, ResourceSpan, SliceProjector, SliceWidth},
    report::{AppReport, AppState, ClusterReport, ContainerReport, NodeReport},
    segment::{Segment, SegmentList, Timestamp},
    tracker::{AppRegistry, TrackedApp},
    usage::{NodeUsage, PoolUsage, RackLoad, RackOccupancy, RackUsage, UsageBuilder},
};
