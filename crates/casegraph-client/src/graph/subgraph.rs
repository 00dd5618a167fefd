use casegraph_core::{AnalysisResult, Graph, NodeKey};
use std::borrow::Cow;
use std::collections::BTreeSet;

// link validity is judged against `keys` alone, never inherited from `source`
pub fn induced_subgraph(source: &Graph, keys: &BTreeSet<NodeKey>) -> Graph {
    let nodes = source
        .nodes
        .iter()
        .filter(|n| keys.contains(&n.key))
        .cloned()
        .collect();
    let links = source
        .links
        .iter()
        .filter(|l| keys.contains(l.source_key()) && keys.contains(l.target_key()))
        .cloned()
        .collect();
    Graph::new(nodes, links)
}

#[derive(Debug, Default)]
pub struct SubgraphState {
    pub keys: BTreeSet<NodeKey>,
    pub analysis: Option<AnalysisResult>,
    pub narrative: Option<String>,
}

impl SubgraphState {
    pub fn add_keys<I: IntoIterator<Item = NodeKey>>(&mut self, keys: I) -> usize {
        let before = self.keys.len();
        self.keys.extend(keys);
        self.drop_analysis();
        self.keys.len() - before
    }

    pub fn remove_keys<'a, I: IntoIterator<Item = &'a NodeKey>>(&mut self, keys: I) -> usize {
        let before = self.keys.len();
        for k in keys {
            self.keys.remove(k);
        }
        self.drop_analysis();
        before - self.keys.len()
    }

    pub fn install_analysis(&mut self, result: AnalysisResult, narrative: String) {
        self.keys = result.graph.nodes.iter().map(|n| n.key.clone()).collect();
        self.analysis = Some(result);
        self.narrative = Some(narrative);
    }

    pub fn drop_analysis(&mut self) {
        self.analysis = None;
        self.narrative = None;
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.drop_analysis();
    }

    pub fn render_source<'a>(&'a self, full: &Graph) -> Cow<'a, Graph> {
        match &self.analysis {
            Some(result) => Cow::Borrowed(&result.graph),
            None => Cow::Owned(induced_subgraph(full, &self.keys)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::query::tests::{arb_graph, arb_key};
    use casegraph_core::{AnalysisKind, Link, Node};
    use proptest::prelude::*;

    fn abc() -> Graph {
        Graph::new(
            vec![
                Node::new("A", "A", "person"),
                Node::new("B", "B", "person"),
                Node::new("C", "C", "person"),
            ],
            vec![
                Link::new("A", "B", "knows"),
                Link::new("B", "C", "knows"),
                Link::new("A", "C", "knows"),
            ],
        )
    }

    fn keys(ks: &[&str]) -> BTreeSet<NodeKey> {
        ks.iter().map(|k| NodeKey::from(*k)).collect()
    }

    #[test]
    fn induced_subgraph_of_two_nodes_keeps_one_link() {
        let sub = induced_subgraph(&abc(), &keys(&["A", "B"]));
        let names: Vec<_> = sub.nodes.iter().map(|n| n.key.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(sub.links.len(), 1);
        assert_eq!(sub.links[0].source_key().as_str(), "A");
        assert_eq!(sub.links[0].target_key().as_str(), "B");
    }

    proptest! {
        #[test]
        fn induced_subgraph_is_closed_over_its_key_set(
            g in arb_graph(),
            picked in prop::collection::btree_set(arb_key(), 0..6),
        ) {
            let set: BTreeSet<NodeKey> = picked.into_iter().map(NodeKey).collect();
            let sub = induced_subgraph(&g, &set);

            for n in &sub.nodes {
                prop_assert!(set.contains(&n.key));
                prop_assert!(g.nodes.iter().any(|m| m.key == n.key));
            }
            for l in &sub.links {
                prop_assert!(set.contains(l.source_key()));
                prop_assert!(set.contains(l.target_key()));
            }
            let expected_nodes = g.nodes.iter().filter(|n| set.contains(&n.key)).count();
            let expected_links = g
                .links
                .iter()
                .filter(|l| set.contains(l.source_key()) && set.contains(l.target_key()))
                .count();
            prop_assert_eq!(sub.nodes.len(), expected_nodes);
            prop_assert_eq!(sub.links.len(), expected_links);
        }
    }

    #[test]
    fn analysis_overrides_render_source() {
        let g = abc();
        let mut st = SubgraphState::default();
        st.add_keys(keys(&["A", "B"]));

        let result = AnalysisResult::new(
            AnalysisKind::PageRank,
            Graph::new(vec![Node::new("C", "C", "person")], vec![]),
        );
        st.install_analysis(result, "top node: C".into());

        let src = st.render_source(&g);
        assert!(matches!(src, Cow::Borrowed(_)));
        assert_eq!(src.nodes.len(), 1);
        assert_eq!(st.keys, keys(&["C"]));

        st.add_keys(keys(&["A"]));
        assert!(st.analysis.is_none());
        assert!(st.narrative.is_none());
        assert_eq!(st.render_source(&g).nodes.len(), 2);
    }

    #[test]
    fn add_is_idempotent_and_remove_is_set_difference() {
        let mut st = SubgraphState::default();
        assert_eq!(st.add_keys(keys(&["A", "B"])), 2);
        assert_eq!(st.add_keys(keys(&["B"])), 0);
        let gone = keys(&["B", "Z"]);
        assert_eq!(st.remove_keys(gone.iter()), 1);
        assert_eq!(st.keys, keys(&["A"]));
    }
}
