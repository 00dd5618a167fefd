use casegraph_core::{AnalysisResult, DateRange, Graph, Node, NodeDetail, NodeKey, TimelineEvent};
use std::borrow::Cow;
use std::collections::{BTreeSet, VecDeque};

use crate::graph::explain::describe_analysis;
use crate::graph::geo::{map_points, GeoPoint};
use crate::graph::layout::{Pane, PaneLayout};
use crate::graph::model::GraphModel;
use crate::graph::query;
use crate::graph::selection::{SelectModifiers, Selection, SelectionSource};
use crate::graph::subgraph::SubgraphState;
use crate::graph::timeline::{events_from_model, filter_events, TimelineContext};
use crate::net::Incoming;
use crate::util::config::QueryMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchDetails { generation: u64, keys: Vec<NodeKey> },
}

#[derive(Debug, Default)]
pub struct QueryState {
    pub mode: QueryMode,
    pub input: String,
    pub active: String,
}

#[derive(Debug, Default)]
pub struct DetailState {
    pub generation: u64,
    pub records: Vec<NodeDetail>,
    pub loading: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadingState {
    pub graph: bool,
    pub expand: bool,
    pub analysis: bool,
}

impl LoadingState {
    pub fn any(&self) -> bool {
        self.graph || self.expand || self.analysis
    }
}

// Only the mutators below write these slices.
#[derive(Debug, Default)]
pub struct Session {
    model: GraphModel,
    displayed: Option<Graph>,
    events: Vec<TimelineEvent>,
    query: QueryState,
    selection: Selection,
    subgraph: SubgraphState,
    timeline: TimelineContext,
    layout: PaneLayout,
    details: DetailState,
    loading: LoadingState,
    notices: VecDeque<Notice>,
    effects: Vec<Effect>,
}

impl Session {
    pub fn new(mode: QueryMode) -> Self {
        let mut st = Self::default();
        st.query.mode = mode;
        st
    }

    // ----- Read side -----

    pub fn full_graph(&self) -> &Graph {
        self.model.graph()
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn displayed_graph(&self) -> &Graph {
        self.displayed.as_ref().unwrap_or_else(|| self.model.graph())
    }

    pub fn selection(&self) -> &[Node] {
        self.selection.nodes()
    }

    pub fn selected_keys(&self) -> Vec<NodeKey> {
        self.selection.keys()
    }

    pub fn subgraph_keys(&self) -> &BTreeSet<NodeKey> {
        &self.subgraph.keys
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.subgraph.analysis.as_ref()
    }

    pub fn narrative(&self) -> Option<&str> {
        self.subgraph.narrative.as_deref()
    }

    pub fn subgraph_render_source(&self) -> Cow<'_, Graph> {
        self.subgraph.render_source(self.model.graph())
    }

    pub fn timeline_context(&self) -> &BTreeSet<NodeKey> {
        self.timeline.keys()
    }

    pub fn timeline_events(&self) -> &[TimelineEvent] {
        &self.events
    }

    pub fn visible_events(&self) -> Vec<&TimelineEvent> {
        filter_events(&self.events, &self.timeline)
    }

    pub fn layout(&self) -> PaneLayout {
        self.layout
    }

    pub fn details(&self) -> &[NodeDetail] {
        &self.details.records
    }

    pub fn detail_for(&self, key: &NodeKey) -> Option<&NodeDetail> {
        self.details.records.iter().find(|d| &d.key == key)
    }

    pub fn details_loading(&self) -> bool {
        self.details.loading
    }

    pub fn loading(&self) -> LoadingState {
        self.loading
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn displayed_map_points(&self) -> Vec<GeoPoint> {
        map_points(&self.displayed_graph().nodes)
    }

    pub fn selected_map_points(&self) -> Vec<GeoPoint> {
        map_points(self.selection.nodes())
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    pub fn notify(&mut self, notice: Notice) {
        match &notice {
            Notice::Info(msg) => tracing::info!(%msg, "notice"),
            Notice::Error(msg) => tracing::warn!(%msg, "error notice"),
        }
        self.notices.push_back(notice);
    }

    // ----- Network completions -----

    pub fn begin_graph_load(&mut self) -> bool {
        if self.loading.graph {
            return false;
        }
        self.loading.graph = true;
        true
    }

    pub fn begin_expand(&mut self) -> bool {
        if self.loading.expand {
            return false;
        }
        self.loading.expand = true;
        true
    }

    pub fn begin_analysis(&mut self) -> bool {
        if self.loading.analysis {
            return false;
        }
        self.loading.analysis = true;
        true
    }

    pub fn apply(&mut self, inc: Incoming) {
        tracing::debug!(kind = inc.label(), "applying completion");
        match inc {
            Incoming::Graph { range, result } => {
                self.loading.graph = false;
                match result {
                    Ok(graph) => self.load_graph(range, graph),
                    Err(e) => {
                        self.model.clear();
                        self.rebuild_derived();
                        self.notify(Notice::Error(format!("Failed to load graph: {e}")));
                    }
                }
            }
            Incoming::Neighbours { key, result } => {
                self.loading.expand = false;
                match result {
                    Ok(graph) => self.merge_neighbours(&key, graph),
                    Err(e) => {
                        self.notify(Notice::Error(format!("Failed to expand {key}: {e}")));
                    }
                }
            }
            Incoming::Details { generation, result } => {
                if generation != self.details.generation {
                    tracing::debug!(
                        generation,
                        current = self.details.generation,
                        "ignoring stale detail completion"
                    );
                    return;
                }
                self.details.loading = false;
                match result {
                    Ok(records) => self.details.records = records,
                    Err(e) => {
                        self.details.records.clear();
                        self.notify(Notice::Error(format!("Failed to load node details: {e}")));
                    }
                }
            }
            Incoming::Analysis { kind, result } => {
                self.loading.analysis = false;
                match result {
                    Ok(result) => {
                        self.apply_analysis_result(result);
                    }
                    Err(e) => {
                        self.notify(Notice::Error(format!("{} failed: {e}", kind.as_str())));
                    }
                }
            }
        }
    }

    // ----- Full graph store -----

    pub fn load_graph(&mut self, range: DateRange, graph: Graph) {
        tracing::info!(
            nodes = graph.nodes.len(),
            links = graph.links.len(),
            ?range,
            "full graph loaded"
        );
        self.model.load(range, graph);
        self.rebuild_derived();
    }

    pub fn merge_neighbours(&mut self, key: &NodeKey, graph: Graph) {
        let (nodes, links) = self.model.merge(graph);
        tracing::info!(%key, nodes, links, "merged neighbourhood");
        if nodes > 0 || links > 0 {
            self.rebuild_derived();
        }
        self.notify(Notice::Info(format!(
            "Expanded {key}: {nodes} new nodes, {links} new links"
        )));
    }

    fn rebuild_derived(&mut self) {
        self.events = events_from_model(&self.model);
        self.refresh_projection();
    }

    fn refresh_projection(&mut self) {
        self.displayed = match query::filter(self.model.graph(), &self.query.active) {
            Cow::Borrowed(_) => None,
            Cow::Owned(g) => Some(g),
        };
    }

    // ----- Query -----

    pub fn set_query_input(&mut self, text: &str) {
        self.query.input = text.to_string();
        if self.query.mode == QueryMode::Filter {
            self.apply_query(text.to_string());
        }
    }

    pub fn execute_search(&mut self) {
        self.apply_query(self.query.input.clone());
    }

    pub fn set_query_mode(&mut self, mode: QueryMode) {
        let prev = self.query.mode;
        self.query.mode = mode;
        if prev == QueryMode::Search && mode == QueryMode::Filter {
            self.execute_search();
        }
    }

    fn apply_query(&mut self, q: String) {
        if q == self.query.active {
            return;
        }
        self.query.active = q;
        self.refresh_projection();
    }

    // ----- Selection -----

    pub fn select(&mut self, node: Node, source: SelectionSource, mods: impl Into<SelectModifiers>) {
        self.selection.select(node, mods.into());
        self.after_selection_change(source);
    }

    pub fn select_key(
        &mut self,
        key: &NodeKey,
        source: SelectionSource,
        mods: impl Into<SelectModifiers>,
    ) -> bool {
        match self.resolve_node(key).cloned() {
            Some(node) => {
                self.select(node, source, mods);
                true
            }
            None => false,
        }
    }

    // The store first, then the active analysis: whole-graph algorithms can
    // return nodes outside the loaded date range.
    fn resolve_node(&self, key: &NodeKey) -> Option<&Node> {
        self.model.node(key).or_else(|| {
            self.subgraph
                .analysis
                .as_ref()?
                .graph
                .nodes
                .iter()
                .find(|n| &n.key == key)
        })
    }

    pub fn clear_selection(&mut self, source: SelectionSource) {
        self.selection.clear();
        self.after_selection_change(source);
    }

    pub fn background_click(&mut self, pane: Pane) {
        match pane {
            Pane::Main => {
                self.selection.clear();
                self.timeline.clear();
                self.request_details(Vec::new());
            }
            // the subgraph pane is a lens onto the selection, not a surface for it
            Pane::Subgraph => {}
        }
    }

    fn after_selection_change(&mut self, source: SelectionSource) {
        let keys = self.selection.keys();
        if source != SelectionSource::Timeline {
            self.timeline.overwrite(keys.iter().cloned());
        }
        self.request_details(keys);
    }

    fn request_details(&mut self, keys: Vec<NodeKey>) {
        self.details.generation += 1;
        if keys.is_empty() {
            self.details.records.clear();
            self.details.loading = false;
        } else {
            self.details.loading = true;
        }
        self.effects.push(Effect::FetchDetails {
            generation: self.details.generation,
            keys,
        });
    }

    // ----- Subgraph -----

    pub fn add_selection_to_subgraph(&mut self) {
        if self.selection.is_empty() {
            self.notify(Notice::Info("Select nodes to add to the subgraph".into()));
            return;
        }
        let added = self.subgraph.add_keys(self.selection.keys());
        tracing::debug!(added, total = self.subgraph.keys.len(), "added selection to subgraph");
        self.layout.open_split();
    }

    pub fn remove_selection_from_subgraph(&mut self) {
        let keys = self.selection.keys();
        let removed = self.subgraph.remove_keys(keys.iter());
        tracing::debug!(removed, total = self.subgraph.keys.len(), "removed selection from subgraph");
    }

    pub fn select_all_subgraph_nodes(&mut self) {
        let keys = &self.subgraph.keys;
        let mut nodes: Vec<Node> = self
            .model
            .graph()
            .nodes
            .iter()
            .filter(|n| keys.contains(&n.key))
            .cloned()
            .collect();
        if let Some(result) = &self.subgraph.analysis {
            nodes.extend(
                result
                    .graph
                    .nodes
                    .iter()
                    .filter(|n| keys.contains(&n.key) && !self.model.contains(&n.key))
                    .cloned(),
            );
        }
        self.selection.replace(nodes);
        self.after_selection_change(SelectionSource::Subgraph);
    }

    pub fn apply_analysis_result(&mut self, result: AnalysisResult) -> bool {
        if result.is_empty() {
            self.notify(Notice::Info(format!(
                "No results found for {}",
                result.kind.as_str()
            )));
            return false;
        }

        let nodes: Vec<Node> = result
            .graph
            .nodes
            .iter()
            .map(|n| self.model.node(&n.key).unwrap_or(n).clone())
            .collect();
        let narrative = describe_analysis(&result);
        tracing::info!(
            kind = result.kind.as_str(),
            nodes = result.graph.nodes.len(),
            replaced_keys = self.subgraph.keys.len(),
            "analysis result installed"
        );

        self.subgraph.install_analysis(result, narrative);
        self.selection.replace(nodes);
        self.after_selection_change(SelectionSource::Subgraph);
        self.layout.open_split();
        true
    }

    pub fn close_subgraph(&mut self) {
        self.subgraph.drop_analysis();
        self.layout.close();
    }

    pub fn clear_subgraph(&mut self) {
        self.subgraph.clear();
    }

    // leaving split is always a close, so any analysis goes with it
    pub fn toggle_layout(&mut self) {
        if self.layout.is_split() {
            self.close_subgraph();
        } else {
            self.layout.open_split();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casegraph_core::{AnalysisKind, Link};

    fn node(key: &str, name: &str, ty: &str) -> Node {
        Node::new(key, name, ty)
    }

    fn keys(ks: &[&str]) -> Vec<NodeKey> {
        ks.iter().map(|k| NodeKey::from(*k)).collect()
    }

    fn key_set(ks: &[&str]) -> BTreeSet<NodeKey> {
        keys(ks).into_iter().collect()
    }

    fn loaded() -> Session {
        let mut meeting = node("M", "Board meeting", "event");
        meeting.date = Some("2020-05-01".into());
        let mut transfer = node("T", "Transfer", "event");
        transfer.date = Some("2020-06-01".into());

        let mut st = Session::default();
        st.load_graph(
            DateRange::default(),
            Graph::new(
                vec![
                    node("A", "Alice", "person"),
                    node("B", "Bob", "person"),
                    node("C", "Carol Ltd", "company"),
                    meeting,
                    transfer,
                ],
                vec![
                    Link::new("A", "B", "knows"),
                    Link::new("B", "C", "director_of"),
                    Link::new("A", "C", "owns"),
                    Link::new("A", "M", "attended"),
                    Link::new("C", "T", "sent"),
                ],
            ),
        );
        st
    }

    fn pagerank(ks: &[&str]) -> AnalysisResult {
        let nodes = ks
            .iter()
            .enumerate()
            .map(|(i, k)| {
                let mut n = node(k, k, "person");
                n.pagerank_score = Some(1.0 / (i as f64 + 1.0));
                n
            })
            .collect();
        AnalysisResult::new(AnalysisKind::PageRank, Graph::new(nodes, vec![]))
    }

    fn select(st: &mut Session, key: &str, source: SelectionSource, multi: bool) {
        let mods = SelectModifiers {
            multi_select: multi,
        };
        assert!(st.select_key(&NodeKey::from(key), source, mods));
    }

    #[test]
    fn filter_mode_applies_on_every_edit() {
        let mut st = loaded();
        st.set_query_input("person");
        assert_eq!(st.displayed_graph().nodes.len(), 2);
        assert_eq!(st.displayed_graph().links.len(), 1);

        st.set_query_input("");
        assert!(std::ptr::eq(st.displayed_graph(), st.full_graph()));
    }

    #[test]
    fn search_mode_stages_until_execute_or_mode_switch() {
        let mut st = Session::new(QueryMode::Search);
        st.load_graph(DateRange::default(), loaded().full_graph().clone());

        st.set_query_input("company");
        assert_eq!(st.displayed_graph().nodes.len(), 5);
        st.execute_search();
        assert_eq!(st.displayed_graph().nodes.len(), 1);

        st.set_query_input("person");
        assert_eq!(st.displayed_graph().nodes.len(), 1);
        st.set_query_mode(QueryMode::Filter);
        assert_eq!(st.query().active, "person");
        assert_eq!(st.displayed_graph().nodes.len(), 2);
    }

    #[test]
    fn graph_selection_overwrites_timeline_context() {
        let mut st = loaded();
        select(&mut st, "A", SelectionSource::Graph, false);
        select(&mut st, "B", SelectionSource::Graph, true);
        assert_eq!(st.timeline_context(), &key_set(&["A", "B"]));
        assert_eq!(st.selected_keys(), keys(&["A", "B"]));

        select(&mut st, "C", SelectionSource::Graph, false);
        assert_eq!(st.timeline_context(), &key_set(&["C"]));
    }

    #[test]
    fn timeline_selection_leaves_context_alone() {
        let mut st = loaded();
        select(&mut st, "A", SelectionSource::Graph, false);
        let visible: Vec<_> = st.visible_events().iter().map(|e| e.key.0.clone()).collect();
        assert_eq!(visible, vec!["M"]);

        select(&mut st, "M", SelectionSource::Timeline, false);
        assert_eq!(st.selected_keys(), keys(&["M"]));
        assert_eq!(st.timeline_context(), &key_set(&["A"]));
        assert_eq!(st.visible_events().len(), 1);
    }

    #[test]
    fn every_selection_change_requests_details() {
        let mut st = loaded();
        select(&mut st, "A", SelectionSource::Graph, false);
        select(&mut st, "B", SelectionSource::Timeline, true);
        let effects = st.take_effects();
        assert_eq!(
            effects,
            vec![
                Effect::FetchDetails {
                    generation: 1,
                    keys: keys(&["A"])
                },
                Effect::FetchDetails {
                    generation: 2,
                    keys: keys(&["A", "B"])
                },
            ]
        );
        assert!(st.details_loading());
    }

    #[test]
    fn stale_detail_completions_are_ignored() {
        let mut st = loaded();
        select(&mut st, "A", SelectionSource::Graph, false);
        select(&mut st, "B", SelectionSource::Graph, false);

        st.apply(Incoming::Details {
            generation: 1,
            result: Ok(vec![NodeDetail {
                key: NodeKey::from("A"),
                ..Default::default()
            }]),
        });
        assert!(st.details().is_empty());
        assert!(st.details_loading());

        st.apply(Incoming::Details {
            generation: 2,
            result: Ok(vec![NodeDetail {
                key: NodeKey::from("B"),
                ..Default::default()
            }]),
        });
        assert!(st.detail_for(&NodeKey::from("B")).is_some());
        assert!(!st.details_loading());
    }

    #[test]
    fn detail_failure_resets_collection_and_reports() {
        let mut st = loaded();
        select(&mut st, "A", SelectionSource::Graph, false);
        st.apply(Incoming::Details {
            generation: 1,
            result: Ok(vec![NodeDetail {
                key: NodeKey::from("A"),
                ..Default::default()
            }]),
        });
        select(&mut st, "B", SelectionSource::Graph, true);
        st.apply(Incoming::Details {
            generation: 2,
            result: Err("timeout".into()),
        });
        assert!(st.details().is_empty());
        assert_eq!(st.selected_keys(), keys(&["A", "B"]));
        assert_eq!(
            st.take_notices(),
            vec![Notice::Error("Failed to load node details: timeout".into())]
        );
    }

    #[test]
    fn main_background_click_clears_selection_details_and_context() {
        let mut st = loaded();
        select(&mut st, "A", SelectionSource::Graph, false);
        st.apply(Incoming::Details {
            generation: 1,
            result: Ok(vec![NodeDetail {
                key: NodeKey::from("A"),
                ..Default::default()
            }]),
        });

        st.background_click(Pane::Main);
        assert!(st.selection().is_empty());
        assert!(st.details().is_empty());
        assert!(st.timeline_context().is_empty());
        assert_eq!(st.visible_events().len(), 2);
        let last = st.take_effects().pop();
        assert_eq!(
            last,
            Some(Effect::FetchDetails {
                generation: 2,
                keys: vec![]
            })
        );
    }

    #[test]
    fn subgraph_background_click_keeps_selection() {
        let mut st = loaded();
        select(&mut st, "A", SelectionSource::Graph, false);
        select(&mut st, "B", SelectionSource::Graph, true);
        st.take_effects();

        st.background_click(Pane::Subgraph);
        assert_eq!(st.selected_keys(), keys(&["A", "B"]));
        assert_eq!(st.timeline_context(), &key_set(&["A", "B"]));
        assert!(st.take_effects().is_empty());
    }

    #[test]
    fn subgraph_resolves_from_full_graph_even_when_filtered_out() {
        let mut st = loaded();
        select(&mut st, "A", SelectionSource::Graph, false);
        select(&mut st, "B", SelectionSource::Graph, true);
        st.add_selection_to_subgraph();
        assert!(st.layout().is_split());

        st.set_query_input("company");
        assert_eq!(st.displayed_graph().nodes.len(), 1);

        let sub = st.subgraph_render_source();
        assert_eq!(sub.nodes.len(), 2);
        assert_eq!(sub.links.len(), 1);
    }

    #[test]
    fn add_selection_during_analysis_drops_the_analysis() {
        let mut st = loaded();
        assert!(st.apply_analysis_result(pagerank(&["C"])));
        assert!(st.analysis().is_some());
        assert!(st.narrative().is_some());

        st.clear_selection(SelectionSource::Graph);
        select(&mut st, "A", SelectionSource::Graph, true);
        select(&mut st, "B", SelectionSource::Graph, true);
        st.add_selection_to_subgraph();

        assert!(st.analysis().is_none());
        assert!(st.narrative().is_none());
        assert_eq!(st.subgraph_keys(), &key_set(&["A", "B", "C"]));
        let sub = st.subgraph_render_source();
        assert!(matches!(sub, Cow::Owned(_)));
        assert_eq!(sub.nodes.len(), 3);
        assert_eq!(sub.links.len(), 3);
    }

    #[test]
    fn remove_selection_is_set_difference_and_drops_analysis() {
        let mut st = loaded();
        st.apply_analysis_result(pagerank(&["A", "B", "C"]));
        st.clear_selection(SelectionSource::Graph);
        select(&mut st, "B", SelectionSource::Graph, false);

        st.remove_selection_from_subgraph();
        assert!(st.analysis().is_none());
        assert_eq!(st.subgraph_keys(), &key_set(&["A", "C"]));
        assert_eq!(st.subgraph_render_source().links.len(), 1);
    }

    #[test]
    fn analysis_result_overwrites_selection_context_and_layout() {
        let mut st = loaded();
        st.take_effects();
        assert!(st.apply_analysis_result(pagerank(&["C", "A"])));

        assert_eq!(st.selected_keys(), keys(&["C", "A"]));
        assert_eq!(st.selection()[0].name, "Carol Ltd");
        assert_eq!(st.timeline_context(), &key_set(&["A", "C"]));
        assert_eq!(st.subgraph_keys(), &key_set(&["A", "C"]));
        assert!(st.layout().is_split());
        assert!(matches!(st.subgraph_render_source(), Cow::Borrowed(_)));
        assert_eq!(
            st.take_effects(),
            vec![Effect::FetchDetails {
                generation: 1,
                keys: keys(&["C", "A"])
            }]
        );
    }

    #[test]
    fn analysis_result_discards_manual_curation() {
        let mut st = loaded();
        select(&mut st, "A", SelectionSource::Graph, false);
        select(&mut st, "B", SelectionSource::Graph, true);
        st.add_selection_to_subgraph();
        assert_eq!(st.subgraph_keys(), &key_set(&["A", "B"]));

        st.apply_analysis_result(pagerank(&["C"]));
        assert_eq!(st.subgraph_keys(), &key_set(&["C"]));
    }

    #[test]
    fn empty_analysis_result_changes_nothing() {
        let mut st = loaded();
        select(&mut st, "A", SelectionSource::Graph, false);
        st.add_selection_to_subgraph();
        st.apply_analysis_result(pagerank(&["B"]));
        st.close_subgraph();
        st.take_effects();
        st.take_notices();

        let keys_before = st.subgraph_keys().clone();
        let selection_before = st.selected_keys();
        let context_before = st.timeline_context().clone();
        let layout_before = st.layout();

        let changed = st.apply_analysis_result(AnalysisResult::new(
            AnalysisKind::Communities,
            Graph::default(),
        ));

        assert!(!changed);
        assert_eq!(st.subgraph_keys(), &keys_before);
        assert_eq!(st.selected_keys(), selection_before);
        assert_eq!(st.timeline_context(), &context_before);
        assert_eq!(st.layout(), layout_before);
        assert!(st.analysis().is_none());
        assert!(st.take_effects().is_empty());
        assert_eq!(
            st.take_notices(),
            vec![Notice::Info("No results found for communities".into())]
        );
    }

    #[test]
    fn empty_result_keeps_an_active_analysis() {
        let mut st = loaded();
        st.apply_analysis_result(pagerank(&["A"]));
        st.apply(Incoming::Analysis {
            kind: AnalysisKind::Betweenness,
            result: Ok(AnalysisResult::new(AnalysisKind::Betweenness, Graph::default())),
        });
        assert_eq!(st.analysis().map(|a| a.kind), Some(AnalysisKind::PageRank));

        st.apply(Incoming::Analysis {
            kind: AnalysisKind::ShortestPaths,
            result: Err("backend down".into()),
        });
        assert_eq!(st.analysis().map(|a| a.kind), Some(AnalysisKind::PageRank));
        assert!(!st.loading().analysis);
    }

    #[test]
    fn select_all_subgraph_nodes_pushes_membership_into_selection() {
        let mut st = loaded();
        select(&mut st, "C", SelectionSource::Graph, false);
        select(&mut st, "A", SelectionSource::Graph, true);
        st.add_selection_to_subgraph();
        st.background_click(Pane::Main);

        st.select_all_subgraph_nodes();
        // full-graph order, not click order
        assert_eq!(st.selected_keys(), keys(&["A", "C"]));
        assert_eq!(st.timeline_context(), &key_set(&["A", "C"]));
        assert!(st.details_loading());
    }

    #[test]
    fn analysis_nodes_resolve_when_the_store_lacks_them() {
        let mut st = loaded();
        st.apply_analysis_result(pagerank(&["A", "Z"]));
        st.apply(Incoming::Graph {
            range: DateRange::default(),
            result: Err("socket closed".into()),
        });
        assert!(st.full_graph().nodes.is_empty());
        st.background_click(Pane::Main);

        st.select_all_subgraph_nodes();
        assert_eq!(st.selected_keys(), keys(&["A", "Z"]));
        assert_eq!(st.selection()[1].pagerank_score, Some(0.5));

        st.background_click(Pane::Main);
        assert!(st.select_key(&NodeKey::from("Z"), SelectionSource::Graph, SelectModifiers::SINGLE));
        assert!(!st.select_key(&NodeKey::from("B"), SelectionSource::Graph, SelectModifiers::SINGLE));
        assert_eq!(st.selected_keys(), keys(&["Z"]));
    }

    #[test]
    fn select_all_prefers_store_nodes_over_analysis_copies() {
        let mut st = loaded();
        st.apply_analysis_result(pagerank(&["C", "Z"]));
        st.background_click(Pane::Main);

        st.select_all_subgraph_nodes();
        assert_eq!(st.selected_keys(), keys(&["C", "Z"]));
        assert_eq!(st.selection()[0].name, "Carol Ltd");
    }

    #[test]
    fn close_subgraph_returns_to_single_and_keeps_keys() {
        let mut st = loaded();
        st.apply_analysis_result(pagerank(&["A", "B"]));
        st.close_subgraph();
        assert_eq!(st.layout(), PaneLayout::Single);
        assert!(st.analysis().is_none());
        assert!(st.narrative().is_none());
        assert_eq!(st.subgraph_keys(), &key_set(&["A", "B"]));

        st.clear_subgraph();
        assert!(st.subgraph_keys().is_empty());
    }

    #[test]
    fn filtering_and_selection_never_move_the_layout() {
        let mut st = loaded();
        st.set_query_input("person");
        select(&mut st, "A", SelectionSource::Graph, false);
        st.background_click(Pane::Main);
        assert_eq!(st.layout(), PaneLayout::Single);

        st.toggle_layout();
        st.set_query_input("");
        select(&mut st, "B", SelectionSource::Graph, false);
        assert_eq!(st.layout(), PaneLayout::Split);
    }

    #[test]
    fn toggling_out_of_split_closes_the_analysis() {
        let mut st = loaded();
        st.apply_analysis_result(pagerank(&["A"]));
        assert!(st.layout().is_split());

        st.toggle_layout();
        assert_eq!(st.layout(), PaneLayout::Single);
        assert!(st.analysis().is_none());
        assert!(st.narrative().is_none());
        assert_eq!(st.subgraph_keys(), &key_set(&["A"]));

        st.toggle_layout();
        assert!(st.layout().is_split());
        assert!(st.analysis().is_none());
        assert_eq!(st.subgraph_render_source().nodes.len(), 1);
    }

    #[test]
    fn graph_load_failure_empties_the_store() {
        let mut st = loaded();
        assert!(st.begin_graph_load());
        assert!(!st.begin_graph_load());

        st.apply(Incoming::Graph {
            range: DateRange::new(Some("2021-01-01"), None),
            result: Err("connect UDS /tmp/casegraph.sock".into()),
        });
        assert!(st.full_graph().nodes.is_empty());
        assert!(st.displayed_graph().nodes.is_empty());
        assert!(st.timeline_events().is_empty());
        assert!(!st.loading().graph);
        assert!(matches!(st.take_notices().as_slice(), [Notice::Error(_)]));
    }

    #[test]
    fn neighbour_merge_extends_store_and_projection() {
        let mut st = loaded();
        st.set_query_input("person");
        assert!(st.begin_expand());
        st.apply(Incoming::Neighbours {
            key: NodeKey::from("B"),
            result: Ok(Graph::new(
                vec![node("B", "Bob", "person"), node("D", "Dan", "person")],
                vec![Link::new("B", "D", "knows"), Link::new("A", "B", "knows")],
            )),
        });
        assert!(!st.loading().expand);
        assert_eq!(st.full_graph().nodes.len(), 6);
        assert_eq!(st.full_graph().links.len(), 6);
        assert_eq!(st.displayed_graph().nodes.len(), 3);
        assert_eq!(st.displayed_graph().links.len(), 2);
        assert_eq!(
            st.take_notices(),
            vec![Notice::Info("Expanded B: 1 new nodes, 1 new links".into())]
        );
    }

    #[test]
    fn add_with_empty_selection_is_a_notice() {
        let mut st = loaded();
        st.add_selection_to_subgraph();
        assert_eq!(st.layout(), PaneLayout::Single);
        assert!(st.subgraph_keys().is_empty());
        assert_eq!(st.take_notices().len(), 1);
    }
}
