use anyhow::Result;
use casegraph_core::{NodeDetail, NodeKey};
use crossbeam_channel::Sender;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::net::protocol::render_error;
use crate::net::{Backend, Incoming};
use crate::util::config::DetailLoaderConfig;

pub fn plan_batches(keys: &[NodeKey], batch_size: usize) -> Vec<Vec<NodeKey>> {
    let mut seen = HashSet::new();
    let unique: Vec<NodeKey> = keys
        .iter()
        .filter(|k| seen.insert(*k))
        .cloned()
        .collect();
    unique
        .chunks(batch_size.max(1))
        .map(<[NodeKey]>::to_vec)
        .collect()
}

pub async fn fetch_batched(
    backend: &dyn Backend,
    keys: &[NodeKey],
    batch_size: usize,
    pause: Duration,
) -> Result<Vec<NodeDetail>> {
    let batches = plan_batches(keys, batch_size);
    let mut out = Vec::with_capacity(keys.len());
    for (i, batch) in batches.into_iter().enumerate() {
        if i > 0 && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
        let fetches = batch.into_iter().map(|k| backend.fetch_node_detail(k));
        out.extend(futures_util::future::try_join_all(fetches).await?);
    }
    Ok(out)
}

// A task whose generation is no longer the latest never reports back.
pub struct DetailLoader {
    backend: Arc<dyn Backend>,
    tx: Sender<Incoming>,
    cfg: DetailLoaderConfig,
    runtime: Handle,
    latest: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
}

impl DetailLoader {
    pub fn new(
        backend: Arc<dyn Backend>,
        tx: Sender<Incoming>,
        cfg: DetailLoaderConfig,
        runtime: Handle,
    ) -> Self {
        Self {
            backend,
            tx,
            cfg,
            runtime,
            latest: Arc::new(AtomicU64::new(0)),
            pending: None,
        }
    }

    pub fn latest_generation(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn request(&mut self, generation: u64, keys: Vec<NodeKey>) {
        self.latest.store(generation, Ordering::SeqCst);
        if let Some(task) = self.pending.take() {
            task.abort();
        }
        if keys.is_empty() {
            return;
        }

        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        let latest = Arc::clone(&self.latest);
        let debounce = self.cfg.debounce();
        let pause = self.cfg.batch_pause();
        let batch_size = self.cfg.batch_size;

        self.pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(debounce).await;
            if latest.load(Ordering::SeqCst) != generation {
                return;
            }
            tracing::debug!(generation, keys = keys.len(), "fetching node details");
            let result = fetch_batched(backend.as_ref(), &keys, batch_size, pause)
                .await
                .map_err(render_error);
            if latest.load(Ordering::SeqCst) != generation {
                tracing::debug!(generation, "dropping superseded detail load");
                return;
            }
            let _ = tx.send(Incoming::Details { generation, result });
        }));
    }
}
