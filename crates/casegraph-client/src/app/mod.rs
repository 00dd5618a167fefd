use casegraph_core::{AnalysisKind, AnalysisRequest, DateRange, NodeKey};
use crossbeam_channel::{Receiver, Sender};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

use crate::graph::{Effect, Notice, Session};
use crate::net::protocol::render_error;
use crate::net::{Backend, DetailLoader, Incoming};
use crate::util::config::ClientConfig;

pub struct App {
    pub session: Session,
    cfg: ClientConfig,
    backend: Arc<dyn Backend>,
    runtime: Handle,
    tx: Sender<Incoming>,
    rx: Receiver<Incoming>,
    details: DetailLoader,
}

impl App {
    pub fn new(cfg: ClientConfig, backend: Arc<dyn Backend>, runtime: Handle) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        let details = DetailLoader::new(
            Arc::clone(&backend),
            tx.clone(),
            cfg.details.clone(),
            runtime.clone(),
        );
        Self {
            session: Session::new(cfg.query_mode),
            cfg,
            backend,
            runtime,
            tx,
            rx,
            details,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.cfg
    }

    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        for msg in self.rx.try_iter().take(100_000) {
            self.session.apply(msg);
            applied += 1;
        }
        for effect in self.session.take_effects() {
            match effect {
                Effect::FetchDetails { generation, keys } => self.details.request(generation, keys),
            }
        }
        applied
    }

    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = Incoming> + Send + 'static,
    {
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let _ = tx.send(fut.await);
        });
    }

    pub fn load_graph(&mut self, range: DateRange) -> bool {
        if !self.session.begin_graph_load() {
            tracing::debug!("graph load already in flight");
            return false;
        }
        tracing::info!(?range, "loading graph");
        let call = self.backend.fetch_graph(range.clone());
        self.spawn(async move {
            Incoming::Graph {
                range,
                result: call.await.map_err(render_error),
            }
        });
        true
    }

    pub fn load_default_graph(&mut self) -> bool {
        let range = self.cfg.date_range.clone();
        self.load_graph(range)
    }

    pub fn expand(&mut self, key: NodeKey) -> bool {
        if !self.session.begin_expand() {
            tracing::debug!(%key, "expansion already in flight");
            return false;
        }
        let depth = self.cfg.neighbour_depth;
        tracing::info!(%key, depth, "expanding neighbourhood");
        let call = self.backend.fetch_neighbours(key.clone(), depth);
        self.spawn(async move {
            Incoming::Neighbours {
                key,
                result: call.await.map_err(render_error),
            }
        });
        true
    }

    pub fn run_analysis(&mut self, request: AnalysisRequest) -> bool {
        if !self.session.begin_analysis() {
            tracing::debug!("analysis already in flight");
            return false;
        }
        let kind = request.kind();
        tracing::info!(kind = kind.as_str(), "running analysis");
        let call = self.backend.analyze(request);
        self.spawn(async move {
            Incoming::Analysis {
                kind,
                result: call.await.map_err(render_error),
            }
        });
        true
    }

    pub fn analyze_selection(&mut self, kind: AnalysisKind) -> bool {
        let keys = self.session.selected_keys();
        if kind == AnalysisKind::ShortestPaths && keys.len() < 2 {
            self.session.notify(Notice::Error(
                "Shortest paths needs at least two selected nodes".into(),
            ));
            return false;
        }
        let request = self.cfg.analysis.request(kind, keys);
        self.run_analysis(request)
    }

    pub async fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            self.pump();
            if !self.session.loading().any() && !self.session.details_loading() {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                tracing::warn!(?timeout, "gave up waiting for pending operations");
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}
