use anyhow::{bail, Context, Result};
use casegraph_core::{
    AnalysisRequest, AnalysisResult, DateRange, Graph, NodeDetail, NodeKey, Request, Response,
};
use futures_util::future::BoxFuture;
use futures_util::{FutureExt, SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::UnixStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::net::Backend;

#[derive(Debug, Clone)]
pub struct UdsBackend {
    sock_path: Arc<str>,
}

impl UdsBackend {
    pub fn new(sock_path: impl Into<String>) -> Self {
        Self {
            sock_path: Arc::from(sock_path.into()),
        }
    }

    pub fn sock_path(&self) -> &str {
        &self.sock_path
    }

    fn call(&self, request: Request) -> BoxFuture<'static, Result<Response>> {
        let sock_path = Arc::clone(&self.sock_path);
        async move { roundtrip(&sock_path, request).await }.boxed()
    }
}

async fn roundtrip(sock_path: &str, request: Request) -> Result<Response> {
    let stream = UnixStream::connect(sock_path)
        .await
        .with_context(|| format!("connect UDS {sock_path}"))?;
    let mut framed = Framed::new(stream, LengthDelimitedCodec::new());

    tracing::debug!(sock_path, request = ?std::mem::discriminant(&request), "backend request");
    framed
        .send(tokio_util::bytes::Bytes::from(serde_json::to_vec(&request)?))
        .await
        .context("send request")?;

    let Some(frame) = framed.next().await else {
        bail!("backend closed the connection before responding");
    };
    let bytes = frame.context("read response")?;
    let response: Response = serde_json::from_slice(&bytes).context("decode response")?;
    if let Response::Error { message } = response {
        bail!("backend error: {message}");
    }
    Ok(response)
}

fn unexpected(what: &str, got: &Response) -> anyhow::Error {
    anyhow::anyhow!("expected {what} response, got {:?}", std::mem::discriminant(got))
}

impl Backend for UdsBackend {
    fn fetch_graph(&self, range: DateRange) -> BoxFuture<'static, Result<Graph>> {
        let call = self.call(Request::Graph { range });
        async move {
            match call.await? {
                Response::Graph { graph } => Ok(graph),
                other => Err(unexpected("graph", &other)),
            }
        }
        .boxed()
    }

    fn fetch_node_detail(&self, key: NodeKey) -> BoxFuture<'static, Result<NodeDetail>> {
        let call = self.call(Request::NodeDetail { key: key.clone() });
        async move {
            match call.await.with_context(|| format!("detail for {key}"))? {
                Response::NodeDetail { detail } => Ok(detail),
                other => Err(unexpected("node detail", &other)),
            }
        }
        .boxed()
    }

    fn fetch_neighbours(&self, key: NodeKey, depth: u32) -> BoxFuture<'static, Result<Graph>> {
        let call = self.call(Request::Neighbours { key, depth });
        async move {
            match call.await? {
                Response::Neighbours { graph } => Ok(graph),
                other => Err(unexpected("neighbours", &other)),
            }
        }
        .boxed()
    }

    fn analyze(&self, request: AnalysisRequest) -> BoxFuture<'static, Result<AnalysisResult>> {
        let call = self.call(Request::Analysis { request });
        async move {
            match call.await? {
                Response::Analysis { result } => Ok(result),
                other => Err(unexpected("analysis", &other)),
            }
        }
        .boxed()
    }
}
