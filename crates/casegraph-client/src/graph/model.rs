use casegraph_core::{DateRange, Graph, Node, NodeKey};
use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Debug, Default)]
pub struct GraphModel {
    graph: Graph,
    range: Option<DateRange>,
    index: HashMap<NodeKey, usize>,
    link_ids: HashSet<(NodeKey, NodeKey, String)>,
}

impl GraphModel {
    pub fn clear(&mut self) {
        self.graph = Graph::default();
        self.range = None;
        self.index.clear();
        self.link_ids.clear();
    }

    // first occurrence of a key wins; links are stored with bare-key endpoints
    pub fn load(&mut self, range: DateRange, graph: Graph) {
        self.clear();
        self.range = Some(range);
        self.merge(graph);
    }

    pub fn merge(&mut self, incoming: Graph) -> (usize, usize) {
        let mut added_nodes = 0;
        for node in incoming.nodes {
            if self.index.contains_key(&node.key) {
                continue;
            }
            self.index.insert(node.key.clone(), self.graph.nodes.len());
            self.graph.nodes.push(node);
            added_nodes += 1;
        }

        let mut added_links = 0;
        for link in incoming.links {
            let link = link.normalized();
            if !self.link_ids.insert(link.identity()) {
                continue;
            }
            self.graph.links.push(link);
            added_links += 1;
        }
        (added_nodes, added_links)
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn range(&self) -> Option<&DateRange> {
        self.range.as_ref()
    }

    pub fn node(&self, key: &NodeKey) -> Option<&Node> {
        self.index.get(key).and_then(|&i| self.graph.nodes.get(i))
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.graph.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.graph.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.graph.links.len()
    }

    pub fn neighbour_map(&self) -> HashMap<&NodeKey, BTreeSet<&NodeKey>> {
        let mut out: HashMap<&NodeKey, BTreeSet<&NodeKey>> = HashMap::new();
        for link in &self.graph.links {
            let (s, t) = (link.source_key(), link.target_key());
            if s == t {
                continue;
            }
            out.entry(s).or_default().insert(t);
            out.entry(t).or_default().insert(s);
        }
        out
    }
}
