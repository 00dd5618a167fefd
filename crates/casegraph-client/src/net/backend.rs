use anyhow::Result;
use casegraph_core::{AnalysisRequest, AnalysisResult, DateRange, Graph, NodeDetail, NodeKey};
use futures_util::future::BoxFuture;

// futures are 'static so they can go straight into a spawned task
pub trait Backend: Send + Sync {
    fn fetch_graph(&self, range: DateRange) -> BoxFuture<'static, Result<Graph>>;

    fn fetch_node_detail(&self, key: NodeKey) -> BoxFuture<'static, Result<NodeDetail>>;

    fn fetch_neighbours(&self, key: NodeKey, depth: u32) -> BoxFuture<'static, Result<Graph>>;

    fn analyze(&self, request: AnalysisRequest) -> BoxFuture<'static, Result<AnalysisResult>>;
}
