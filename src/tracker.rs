use {
    super::{AppReport, AppState, Claim, Timestamp, UsageResult, short_node_id},
    std::collections::{BTreeMap, BTreeSet},
    tracing::{trace, warn},
};

/// Application as remembered across refreshes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedApp {
    id: String,
    name: String,
    start_time: Timestamp,
    finish_time: Timestamp,
    finished: bool,
    changed: bool,
    /// Node short id to `(first seen start, last seen end)`.
    nodes: BTreeMap<String, (Timestamp, Timestamp)>,
}

impl TrackedApp {
    fn new(report: &AppReport) -> Self {
        Self {
            id: report.application_id.clone(),
            name: report.app_name.clone(),
            start_time: report.start_time,
            finish_time: 0,
            finished: false,
            changed: false,
            nodes: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    /// Finish time, or the refresh time while the app is running.
    pub fn finish_time(&self) -> Timestamp {
        self.finish_time
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether the app was updated since changes were last taken.
    pub fn has_changed(&self) -> bool {
        self.changed
    }

    /// Usage interval on the given node.
    pub fn usage(&self, node: &str) -> Option<(Timestamp, Timestamp)> {
        self.nodes.get(node).copied()
    }

    /// Number of nodes the app has been seen on.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Keeps track of applications between refreshes and derives their claims.
///
/// A running app claims every node one of its containers runs on, from the
/// container's creation until the refresh time. Once a node is on record
/// only its end moves. When an app finishes its usage is frozen as last seen,
/// and further reports about it are ignored.
#[derive(Debug, Clone, Default)]
pub struct AppRegistry {
    apps: BTreeMap<String, TrackedApp>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the application reports of one refresh taken at `now`.
    pub fn ingest<'a, I>(&mut self, reports: I, now: Timestamp)
    where
        I: IntoIterator<Item = &'a AppReport>,
    {
        for report in reports {
            let id = report.application_id.as_str();
            if self.apps.get(id).is_some_and(TrackedApp::is_finished) {
                continue;
            }

            match report.state {
                AppState::Running => {
                    let app = self
                        .apps
                        .entry(id.to_string())
                        .or_insert_with(|| TrackedApp::new(report));
                    app.changed = true;
                    app.start_time = report.start_time;
                    app.finish_time = now;
                    // Oldest container per node, whatever the report order.
                    let mut created = BTreeMap::<&str, Timestamp>::new();
                    for container in &report.containers {
                        created
                            .entry(short_node_id(&container.node))
                            .and_modify(|start| *start = (*start).min(container.creation_time))
                            .or_insert(container.creation_time);
                    }
                    for (node, start) in created {
                        app.nodes
                            .entry(node.to_string())
                            .and_modify(|(_, end)| *end = now)
                            .or_insert((start, now));
                    }
                }
                AppState::Finished => {
                    // Apps that finished before tracking started have no
                    // container data worth showing.
                    let Some(app) = self.apps.get_mut(id) else {
                        trace!(app = id, "skipping app finished before tracking");
                        continue;
                    };
                    app.changed = true;
                    app.finished = true;
                    app.finish_time = if report.finish_time == 0 {
                        now
                    } else {
                        report.finish_time
                    };
                }
                AppState::Other => {
                    warn!(app = id, "skipping app in unsupported state");
                }
            }
        }
    }

    /// Claims of all tracked apps.
    ///
    /// Usage intervals that are empty (a container created at the refresh
    /// time) or reversed come out as errors.
    pub fn claims(&self) -> impl Iterator<Item = UsageResult<Claim<String>>> + '_ {
        self.apps.values().flat_map(|app| {
            app.nodes
                .iter()
                .map(move |(node, (start, end))| {
                    Claim::new(app.id.clone(), node.as_str(), *start, *end)
                })
        })
    }

    /// Ids of the apps updated since the last call, clearing their flags.
    pub fn take_changed(&mut self) -> BTreeSet<String> {
        self.apps
            .values_mut()
            .filter(|app| app.changed)
            .map(|app| {
                app.changed = false;
                app.id.clone()
            })
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&TrackedApp> {
        self.apps.get(id)
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}
