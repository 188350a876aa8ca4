use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use lexrag::config::{ArtifactArgs, EmbedderArgs};
use lexrag::retriever::{Retrieved, Retriever};
use lexrag::telemetry::init_tracing;
use lexrag::ChunkType;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(
    name = "lexrag-retriever",
    about = "HTTP API that serves top-k retrieval over the lexrag index"
)]
struct ApiCli {
    /// Address to bind the HTTP server to (host:port).
    #[arg(long, env = "LEXRAG_BIND", default_value = "127.0.0.1:8080")]
    bind: String,

    /// Default top-k when the client does not override it.
    #[arg(long, env = "LEXRAG_TOP_K", default_value_t = 3)]
    default_top_k: usize,

    /// Maximum top-k allowed per request.
    #[arg(long, env = "LEXRAG_MAX_TOP_K", default_value_t = 10)]
    max_top_k: usize,

    /// Max cached query embeddings kept in-memory (0 disables caching).
    #[arg(long, env = "LEXRAG_EMBEDDING_CACHE", default_value_t = 1024)]
    embedding_cache_size: usize,

    #[command(flatten)]
    artifacts: ArtifactArgs,

    #[command(flatten)]
    embedder: EmbedderArgs,
}

#[derive(Clone)]
struct AppState {
    retriever: Arc<Retriever>,
    default_top_k: usize,
    max_top_k: usize,
    embedding_cache: Option<Arc<Mutex<LruCache<String, Vec<f32>>>>>,
}

#[derive(Debug, Deserialize)]
struct QueryRequest {
    query: String,
    #[serde(default)]
    top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
struct QueryResponse {
    chunks: Vec<ResponseChunk>,
    meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
struct ResponseMeta {
    top_k: usize,
    latency_ms: f64,
}

#[derive(Debug, Serialize)]
struct ResponseChunk {
    source: String,
    id: Option<u32>,
    title: String,
    body: String,
    chunk_type: ChunkType,
    score: f32,
    rank: usize,
}

impl ResponseChunk {
    fn from_result(result: &Retrieved<'_>, rank: usize) -> Self {
        let chunk = result.chunk;
        Self {
            source: chunk.source_id().to_string(),
            id: chunk.sequence_id(),
            title: chunk.title().to_string(),
            body: chunk.body().to_string(),
            chunk_type: chunk.chunk_type(),
            score: result.score,
            rank,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = ApiCli::parse();

    // blocking HTTP clients inside the embedder must be built outside the async runtime
    let retriever = Retriever::open(&cli.artifacts.paths(), cli.embedder.build()?)?;
    let state = AppState {
        retriever: Arc::new(retriever),
        default_top_k: cli.default_top_k.max(1),
        max_top_k: cli.max_top_k.max(1),
        embedding_cache: build_cache(cli.embedding_cache_size),
    };
    let addr: SocketAddr = cli
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", cli.bind))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    runtime.block_on(serve(addr, state))
}

async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/query", post(query_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("lexrag-retriever listening on http://{addr}");
    axum::serve(listener, app)
        .await
        .context("server shutdown")?;
    Ok(())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn query_handler(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, (StatusCode, Json<ErrorBody>)> {
    if request.query.trim().is_empty() {
        return Err(bad_request("query text must not be empty"));
    }
    if request.top_k == Some(0) {
        return Err(bad_request("top_k must be at least 1"));
    }
    let top_k = request
        .top_k
        .unwrap_or(state.default_top_k)
        .clamp(1, state.max_top_k);
    let start = Instant::now();

    let chunks = if state.retriever.is_empty() {
        Vec::new()
    } else {
        let embedding = embed_query(&state, request.query)
            .await
            .map_err(internal_error)?;
        state
            .retriever
            .search_embedding(&embedding, top_k)
            .map_err(|err| internal_error(err.into()))?
            .iter()
            .enumerate()
            .map(|(idx, result)| ResponseChunk::from_result(result, idx + 1))
            .collect()
    };

    Ok(Json(QueryResponse {
        chunks,
        meta: ResponseMeta {
            top_k,
            latency_ms: start.elapsed().as_secs_f64() * 1000.0,
        },
    }))
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            message: message.into(),
        }),
    )
}

fn internal_error(err: anyhow::Error) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            message: format!("{err:#}"),
        }),
    )
}

async fn embed_query(state: &AppState, query: String) -> Result<Vec<f32>> {
    if let Some(cache) = &state.embedding_cache {
        if let Some(hit) = {
            let mut guard = cache.lock().await;
            guard.get(&query).cloned()
        } {
            debug!("query embedding cache hit");
            return Ok(hit);
        }
    }

    let retriever = state.retriever.clone();
    let query_clone = query.clone();
    let embedding = tokio::task::spawn_blocking(move || retriever.embed_query(&query_clone))
        .await
        .map_err(|err| anyhow!("embedding task join error: {err}"))??;

    if let Some(cache) = &state.embedding_cache {
        let mut guard = cache.lock().await;
        guard.put(query, embedding.clone());
    }
    Ok(embedding)
}

fn build_cache(size: usize) -> Option<Arc<Mutex<LruCache<String, Vec<f32>>>>> {
    NonZeroUsize::new(size).map(|capacity| Arc::new(Mutex::new(LruCache::new(capacity))))
}
