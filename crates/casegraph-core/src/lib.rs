use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub String);

impl NodeKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeKey {
    fn from(s: &str) -> Self {
        NodeKey(s.to_string())
    }
}

impl std::fmt::Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// `key` is the identity everywhere; `id` is only a display alias.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Node {
    pub key: NodeKey,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    // analysis annotations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagerank_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub betweenness_centrality: Option<f64>,
}

impl Node {
    pub fn new(key: &str, name: &str, node_type: &str) -> Self {
        Self {
            key: NodeKey(key.to_string()),
            id: key.to_string(),
            name: name.to_string(),
            node_type: node_type.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LinkEnd {
    Key(NodeKey),
    Node(Box<Node>),
}

impl LinkEnd {
    pub fn key(&self) -> &NodeKey {
        match self {
            LinkEnd::Key(k) => k,
            LinkEnd::Node(n) => &n.key,
        }
    }
}

impl From<&str> for LinkEnd {
    fn from(s: &str) -> Self {
        LinkEnd::Key(NodeKey::from(s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Link {
    pub source: LinkEnd,
    pub target: LinkEnd,
    #[serde(rename = "type", default)]
    pub link_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,
}

impl Link {
    pub fn new(source: &str, target: &str, link_type: &str) -> Self {
        Self {
            source: LinkEnd::from(source),
            target: LinkEnd::from(target),
            link_type: link_type.to_string(),
            properties: BTreeMap::new(),
        }
    }

    pub fn source_key(&self) -> &NodeKey {
        self.source.key()
    }

    pub fn target_key(&self) -> &NodeKey {
        self.target.key()
    }

    pub fn identity(&self) -> (NodeKey, NodeKey, String) {
        (
            self.source_key().clone(),
            self.target_key().clone(),
            self.link_type.clone(),
        )
    }

    pub fn normalized(mut self) -> Self {
        if let LinkEnd::Node(n) = self.source {
            self.source = LinkEnd::Key(n.key);
        }
        if let LinkEnd::Node(n) = self.target {
            self.target = LinkEnd::Key(n.key);
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Graph {
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        Self { nodes, links }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

impl DateRange {
    pub fn new(start: Option<&str>, end: Option<&str>) -> Self {
        Self {
            start: start.map(str::to_string),
            end: end.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    ShortestPaths,
    #[serde(rename = "pagerank")]
    PageRank,
    Communities,
    Betweenness,
}

impl AnalysisKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ShortestPaths => "shortest_paths",
            Self::PageRank => "pagerank",
            Self::Communities => "communities",
            Self::Betweenness => "betweenness",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum AnalysisRequest {
    ShortestPaths {
        keys: Vec<NodeKey>,
        limit: usize,
    },
    #[serde(rename = "pagerank")]
    PageRank {
        keys: Option<Vec<NodeKey>>,
        top_n: usize,
        iterations: u32,
        damping_factor: f64,
    },
    Communities {
        keys: Option<Vec<NodeKey>>,
        resolution: f64,
        iterations: u32,
    },
    Betweenness {
        keys: Option<Vec<NodeKey>>,
        top_n: usize,
        normalized: bool,
    },
}

impl AnalysisRequest {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            Self::ShortestPaths { .. } => AnalysisKind::ShortestPaths,
            Self::PageRank { .. } => AnalysisKind::PageRank,
            Self::Communities { .. } => AnalysisKind::Communities,
            Self::Betweenness { .. } => AnalysisKind::Betweenness,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CommunitySummary {
    pub size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub kind: AnalysisKind,
    #[serde(flatten)]
    pub graph: Graph,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub communities: BTreeMap<String, CommunitySummary>,
}

impl AnalysisResult {
    pub fn new(kind: AnalysisKind, graph: Graph) -> Self {
        Self {
            kind,
            graph,
            communities: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.graph.nodes.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Connection {
    pub key: NodeKey,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default)]
    pub relationship: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NodeDetail {
    pub key: NodeKey,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TimelineEvent {
    pub key: NodeKey,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub event_type: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default)]
    pub connections: Vec<NodeKey>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Request {
    Graph { range: DateRange },
    NodeDetail { key: NodeKey },
    Neighbours { key: NodeKey, depth: u32 },
    Analysis { request: AnalysisRequest },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Response {
    Graph { graph: Graph },
    NodeDetail { detail: NodeDetail },
    Neighbours { graph: Graph },
    Analysis { result: AnalysisResult },
    Error { message: String },
}
