use {
    super::{UsageError, UsageResult},
    rapidhash::RapidBuildHasher,
    std::{
        collections::{BTreeMap, BTreeSet, HashMap},
        hash::BuildHasher,
        ops::Index,
    },
};

/// Rack assigned to nodes that report none.
pub const UNDEFINED_RACK: &str = "undefined";

/// Position of a resource in the pool's display order.
///
/// Racks are ordered by id, nodes by id within their rack; the index is the
/// node's position in that order.
pub type ResourceIdx = usize;

/// Compute node that applications occupy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    id: String,
    full_id: String,
    rack: String,
}

impl Node {
    /// Creates a node from the id and rack the resource manager reports.
    ///
    /// The node is identified by its host label, so `node4.example.com:8041`
    /// becomes `node4`. A single leading `/` is stripped from the rack, and a
    /// missing or blank rack is replaced by [`UNDEFINED_RACK`].
    pub fn new(full_id: impl Into<String>, rack: Option<&str>) -> Self {
        let full_id = full_id.into();
        Self {
            id: short_node_id(&full_id).to_string(),
            rack: rack_id(rack),
            full_id,
        }
    }

    /// Short node id, used as the resource id everywhere else.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn full_id(&self) -> &str {
        &self.full_id
    }

    pub fn rack(&self) -> &str {
        &self.rack
    }
}

/// Host label of a fully qualified node id.
pub fn short_node_id(full_id: &str) -> &str {
    full_id.split_once('.').map_or(full_id, |(host, _)| host)
}

fn rack_id(rack: Option<&str>) -> String {
    match rack.map(str::trim) {
        None | Some("") => UNDEFINED_RACK.to_string(),
        Some(rack) => rack.strip_prefix('/').unwrap_or(rack).to_string(),
    }
}

/// Group of nodes, tracked as one aggregate resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rack {
    id: String,
    nodes: Vec<String>,
}

impl Rack {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Ids of the nodes on the rack, sorted.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Number of nodes on the rack.
    pub fn size(&self) -> usize {
        self.nodes.len()
    }
}

/// Managed pool of resources.
///
/// Nodes are keyed by their short id. Every node is assigned a
/// [`ResourceIdx`] once, when the pool is built; the pool does not change
/// afterwards.
pub struct Pool<H: BuildHasher = RapidBuildHasher> {
    nodes: HashMap<String, (ResourceIdx, Node), H>,
    racks: BTreeMap<String, Rack>,
}

impl<H: BuildHasher> Index<&str> for Pool<H> {
    type Output = Node;

    fn index(&self, id: &str) -> &Self::Output {
        self.node(id).expect("Node not found")
    }
}

impl Pool {
    /// Creates a pool of the given nodes.
    pub fn new<I: IntoIterator<Item = Node>>(nodes: I) -> UsageResult<Self> {
        Self::with_build_hasher(nodes, RapidBuildHasher::default())
    }
}

impl<H: BuildHasher> Pool<H> {
    /// Creates a pool of the given nodes with the given hasher.
    ///
    /// Fails if two nodes share a short id.
    pub fn with_build_hasher<I>(nodes: I, build_hasher: H) -> UsageResult<Self>
    where
        I: IntoIterator<Item = Node>,
    {
        let mut by_rack = BTreeMap::<String, Vec<Node>>::new();
        let mut seen = BTreeSet::new();
        for node in nodes {
            if !seen.insert(node.id().to_string()) {
                return Err(UsageError::DuplicateNode(node.id().to_string()));
            }
            by_rack.entry(node.rack().to_string()).or_default().push(node);
        }

        let mut pool = Self {
            nodes: HashMap::with_capacity_and_hasher(seen.len(), build_hasher),
            racks: BTreeMap::new(),
        };
        let mut idx: ResourceIdx = 0;
        for (rack_id, mut nodes) in by_rack {
            nodes.sort_by(|a, b| a.id.cmp(&b.id));
            let rack = Rack {
                id: rack_id.clone(),
                nodes: nodes.iter().map(|node| node.id.clone()).collect(),
            };
            for node in nodes {
                pool.nodes.insert(node.id.clone(), (idx, node));
                idx += 1;
            }
            pool.racks.insert(rack_id, rack);
        }

        Ok(pool)
    }

    /// Returns the node with the given short id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id).map(|(_, node)| node)
    }

    /// Returns the display index of the node with the given short id.
    pub fn idx(&self, id: &str) -> Option<ResourceIdx> {
        self.nodes.get(id).map(|(idx, _)| *idx)
    }

    /// Whether the pool has a node with the given short id.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Returns the rack with the given id.
    pub fn rack(&self, id: &str) -> Option<&Rack> {
        self.racks.get(id)
    }

    /// Number of nodes in the pool.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterator over the nodes, in no particular order.
    pub fn nodes(&self) -> impl Iterator<Item = (ResourceIdx, &Node)> {
        self.nodes.values().map(|(idx, node)| (*idx, node))
    }

    /// Iterator over the racks, sorted by id.
    pub fn racks(&self) -> impl Iterator<Item = &Rack> {
        self.racks.values()
    }
}
