use casegraph_core::{AnalysisKind, AnalysisResult, DateRange, Graph, NodeDetail, NodeKey};

#[derive(Debug, Clone)]
pub enum Incoming {
    Graph {
        range: DateRange,
        result: Result<Graph, String>,
    },
    Neighbours {
        key: NodeKey,
        result: Result<Graph, String>,
    },
    Details {
        generation: u64,
        result: Result<Vec<NodeDetail>, String>,
    },
    Analysis {
        kind: AnalysisKind,
        result: Result<AnalysisResult, String>,
    },
}

impl Incoming {
    pub fn label(&self) -> &'static str {
        match self {
            Incoming::Graph { .. } => "graph",
            Incoming::Neighbours { .. } => "neighbours",
            Incoming::Details { .. } => "details",
            Incoming::Analysis { .. } => "analysis",
        }
    }
}

pub(crate) fn render_error(e: anyhow::Error) -> String {
    format!("{e:#}")
}
