use {
    super::{Node, Timestamp},
    serde::Deserialize,
};

/// Cluster state as served by the resource manager on each poll.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClusterReport {
    #[serde(default)]
    pub nodes: Vec<NodeReport>,
    #[serde(default)]
    pub apps: Vec<AppReport>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeReport {
    pub node_id: String,
    #[serde(default)]
    pub rack: Option<String>,
}

impl NodeReport {
    /// Node of the pool the report describes.
    pub fn to_node(&self) -> Node {
        Node::new(self.node_id.as_str(), self.rack.as_deref())
    }
}

/// Application state, as far as usage tracking is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppState {
    Running,
    Finished,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppReport {
    pub application_id: String,
    #[serde(default)]
    pub app_name: String,
    #[serde(default)]
    pub start_time: Timestamp,
    /// Zero while the application has not finished.
    #[serde(default)]
    pub finish_time: Timestamp,
    pub state: AppState,
    /// Live containers; only reported for running applications.
    #[serde(default)]
    pub containers: Vec<ContainerReport>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerReport {
    /// Fully qualified id of the node the container runs on.
    pub node: String,
    pub creation_time: Timestamp,
    #[serde(default)]
    pub finish_time: Timestamp,
}
