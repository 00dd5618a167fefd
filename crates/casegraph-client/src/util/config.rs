use anyhow::Context;
use casegraph_core::{AnalysisKind, AnalysisRequest, DateRange, NodeKey};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    #[default]
    Filter,
    Search,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailLoaderConfig {
    pub debounce_ms: u64,
    pub batch_size: usize,
    pub batch_pause_ms: u64,
}

impl Default for DetailLoaderConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            batch_size: 10,
            batch_pause_ms: 50,
        }
    }
}

impl DetailLoaderConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisDefaults {
    pub shortest_path_limit: usize,
    pub pagerank_top_n: usize,
    pub pagerank_iterations: u32,
    pub pagerank_damping: f64,
    pub community_resolution: f64,
    pub community_iterations: u32,
    pub betweenness_top_n: usize,
    pub betweenness_normalized: bool,
}

impl Default for AnalysisDefaults {
    fn default() -> Self {
        Self {
            shortest_path_limit: 5,
            pagerank_top_n: 20,
            pagerank_iterations: 20,
            pagerank_damping: 0.85,
            community_resolution: 1.0,
            community_iterations: 10,
            betweenness_top_n: 20,
            betweenness_normalized: true,
        }
    }
}

impl AnalysisDefaults {
    // empty keys means the whole graph, except for shortest paths
    pub fn request(&self, kind: AnalysisKind, keys: Vec<NodeKey>) -> AnalysisRequest {
        let scope = (!keys.is_empty()).then(|| keys.clone());
        match kind {
            AnalysisKind::ShortestPaths => AnalysisRequest::ShortestPaths {
                keys,
                limit: self.shortest_path_limit,
            },
            AnalysisKind::PageRank => AnalysisRequest::PageRank {
                keys: scope,
                top_n: self.pagerank_top_n,
                iterations: self.pagerank_iterations,
                damping_factor: self.pagerank_damping,
            },
            AnalysisKind::Communities => AnalysisRequest::Communities {
                keys: scope,
                resolution: self.community_resolution,
                iterations: self.community_iterations,
            },
            AnalysisKind::Betweenness => AnalysisRequest::Betweenness {
                keys: scope,
                top_n: self.betweenness_top_n,
                normalized: self.betweenness_normalized,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub socket_path: String,
    pub query_mode: QueryMode,
    pub neighbour_depth: u32,
    pub date_range: DateRange,
    pub details: DetailLoaderConfig,
    pub analysis: AnalysisDefaults,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            query_mode: QueryMode::Filter,
            neighbour_depth: 1,
            date_range: DateRange::default(),
            details: DetailLoaderConfig::default(),
            analysis: AnalysisDefaults::default(),
        }
    }
}

pub fn default_socket_path() -> String {
    static CACHED: OnceLock<String> = OnceLock::new();
    CACHED
        .get_or_init(|| {
            if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
                format!("{dir}/casegraph.sock")
            } else {
                "/tmp/casegraph.sock".to_string()
            }
        })
        .clone()
}

fn config_file_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "casegraph")?;
    Some(proj.config_dir().join("client.toml"))
}

pub fn load_or_default() -> ClientConfig {
    let Some(path) = config_file_path() else {
        return ClientConfig::default();
    };
    load_or_default_from_path(&path)
}

pub(crate) fn load_or_default_from_path(path: &Path) -> ClientConfig {
    let Ok(contents) = fs::read_to_string(path) else {
        return ClientConfig::default();
    };
    toml::from_str(&contents).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable client config");
        ClientConfig::default()
    })
}

pub fn save(cfg: &ClientConfig) -> anyhow::Result<()> {
    let Some(path) = config_file_path() else {
        return Err(anyhow::anyhow!("no config directory available"));
    };
    save_to_path(cfg, &path)
}

pub(crate) fn save_to_path(cfg: &ClientConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let data = toml::to_string_pretty(cfg).context("failed to serialize client config")?;
    fs::write(path, data)
        .with_context(|| format!("failed to write client config {}", path.display()))?;
    Ok(())
}
