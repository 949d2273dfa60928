//! The router's external HTTP surface (spec §6), wired with `axum`: one
//! `Router<AppState>` per concern, `with_state`, CORS + tracing layers
//! over the whole thing.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response as AxumResponse};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use districache_common::Error;

use crate::addr::node_url;
use crate::context::RouterContext;
use crate::{cluster, data, observability};

type AppState = Arc<RouterContext>;

/// Builds the full router: data, cluster, observability, chaos, and
/// partition endpoints (spec §6), with CORS and request tracing layered
/// over the top because the original prototype is driven by a browser
/// dashboard even though building that dashboard is out of scope.
pub fn build(ctx: Arc<RouterContext>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/data/{key}", get(get_data))
        .route("/data", post(post_data))
        .route("/cluster/add-node", post(add_node))
        .route("/cluster/remove-node/{port}", delete(remove_node))
        .route("/cluster/stats", get(cluster_stats))
        .route("/cluster/map", get(cluster_map))
        .route("/stats/global", get(stats_global))
        .route("/debug/keys", get(debug_keys))
        .route("/chaos/start", post(chaos_start))
        .route("/chaos/stop", post(chaos_stop))
        .route("/chaos/status", get(chaos_status))
        .route("/partition/create", post(partition_create))
        .route("/partition/remove", post(partition_remove))
        .route("/partition/list", get(partition_list))
        .route("/partition/clear", post(partition_clear))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

fn error_status(err: &Error) -> StatusCode {
    match err {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::InvalidArgument(_) | Error::BadRequest(_) => StatusCode::BAD_REQUEST,
        Error::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        Error::Transport(_) | Error::Partitioned(_) => StatusCode::BAD_GATEWAY,
    }
}

fn error_response(err: Error) -> AxumResponse {
    (error_status(&err), Json(json!({ "detail": err.to_string() }))).into_response()
}

async fn health(State(ctx): State<AppState>) -> impl IntoResponse {
    Json(json!({ "status": "healthy", "nodes": ctx.ring.stats() }))
}

#[derive(Debug, Deserialize)]
struct DataQuery {
    #[serde(default)]
    bypass_cache: bool,
}

async fn get_data(State(ctx): State<AppState>, Path(key): Path<String>, Query(query): Query<DataQuery>) -> AxumResponse {
    match data::read(&ctx, &key, query.bypass_cache).await {
        Ok(resp) => Json(resp).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
struct WriteBody {
    key: String,
    value: String,
    ttl: Option<u64>,
}

async fn post_data(State(ctx): State<AppState>, Json(body): Json<WriteBody>) -> AxumResponse {
    let ttl = body.ttl.map(Duration::from_secs);
    match data::write(&ctx, &body.key, &body.value, ttl).await {
        Ok(outcome) => Json(json!({
            "status": "success",
            "message": format!(
                "Key '{}' written to database and replicated to {}/{} nodes",
                body.key,
                outcome.replicated_count,
                outcome.replicated_count + outcome.failed_replications.len(),
            ),
            "key": body.key,
            "ttl": body.ttl,
            "nodes": outcome.successful_nodes,
            "failed_replications": outcome.failed_replications,
        }))
        .into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
struct AddNodeBody {
    port: u16,
    #[serde(default = "default_host")]
    host: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

async fn add_node(State(ctx): State<AppState>, Json(body): Json<AddNodeBody>) -> AxumResponse {
    match cluster::add_node(&ctx, &body.host, body.port).await {
        Ok(stats) => Json(json!({
            "status": "success",
            "message": format!("Node {} added to cluster", node_url(&body.host, body.port)),
            "node_url": node_url(&body.host, body.port),
            "ring_stats": stats,
        }))
        .into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
struct RemoveNodeQuery {
    #[serde(default = "default_host")]
    host: String,
}

async fn remove_node(State(ctx): State<AppState>, Path(port): Path<u16>, Query(query): Query<RemoveNodeQuery>) -> AxumResponse {
    match cluster::remove_node(&ctx, &query.host, port) {
        Ok(stats) => Json(json!({
            "status": "success",
            "message": format!("Node {} removed from cluster", node_url(&query.host, port)),
            "node_url": node_url(&query.host, port),
            "ring_stats": stats,
        }))
        .into_response(),
        Err(err) => error_response(err),
    }
}

async fn cluster_stats(State(ctx): State<AppState>) -> impl IntoResponse {
    Json(observability::cluster_stats(&ctx).await)
}

async fn cluster_map(State(ctx): State<AppState>) -> impl IntoResponse {
    Json(json!({ "nodes": ctx.ring.nodes_metadata() }))
}

async fn stats_global(State(ctx): State<AppState>) -> impl IntoResponse {
    Json(observability::global_stats(&ctx).await)
}

async fn debug_keys(State(ctx): State<AppState>) -> impl IntoResponse {
    Json(observability::all_keys(&ctx).await)
}

async fn chaos_start(State(ctx): State<AppState>) -> AxumResponse {
    match ctx.chaos.start(Arc::clone(&ctx.ring)) {
        Ok(()) => Json(json!({
            "status": "success",
            "message": "Chaos controller started; nodes will be randomly removed",
            "min_nodes_threshold": ctx.chaos.min_nodes(),
        }))
        .into_response(),
        Err(err) => error_response(err),
    }
}

async fn chaos_stop(State(ctx): State<AppState>) -> impl IntoResponse {
    ctx.chaos.stop();
    Json(json!({ "status": "success", "message": "Chaos controller stopped" }))
}

async fn chaos_status(State(ctx): State<AppState>) -> impl IntoResponse {
    Json(ctx.chaos.status(&ctx.ring))
}

#[derive(Debug, Deserialize)]
struct PartitionQuery {
    source_port: String,
    target_port: String,
}

async fn partition_create(State(ctx): State<AppState>, Query(query): Query<PartitionQuery>) -> impl IntoResponse {
    ctx.partitions.create(&query.source_port, &query.target_port);
    Json(json!({ "status": "success", "message": format!("Partition created between {} and {}", query.source_port, query.target_port) }))
}

async fn partition_remove(State(ctx): State<AppState>, Query(query): Query<PartitionQuery>) -> impl IntoResponse {
    ctx.partitions.remove(&query.source_port, &query.target_port);
    Json(json!({ "status": "success", "message": format!("Partition removed between {} and {}", query.source_port, query.target_port) }))
}

async fn partition_list(State(ctx): State<AppState>) -> impl IntoResponse {
    let pairs: Vec<[String; 2]> = ctx.partitions.list().into_iter().map(|(a, b)| [a, b]).collect();
    Json(json!({ "partitions": pairs }))
}

async fn partition_clear(State(ctx): State<AppState>) -> impl IntoResponse {
    ctx.partitions.clear_all();
    Json(json!({ "status": "success", "message": "All partitions cleared" }))
}
