//! Stage gateway server built on axum.

use super::GatewayConfig;
use super::api::{
    AnalyzeResponse, ChallengeRequest, ChallengeResponse, ErrorResponse, PapersRequest,
    RankResponse, ReportRequest, ReportResponse, SearchRequest, SearchResponse,
};
use crate::error::StageError;
use crate::pipeline::PipelineStages;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Stages shared by every handler.
pub type SharedStages = Arc<dyn PipelineStages>;

/// A handler failure, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    /// The request body could not be decoded.
    BadRequest(String),
    Stage(StageError),
}

impl From<StageError> for ApiError {
    fn from(e: StageError) -> Self {
        ApiError::Stage(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Stage(e) if e.is_invalid_request() => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Stage(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %message, "Stage request failed");
        }
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Permissive CORS: any origin, the configured request headers.
fn cors_layer(config: &GatewayConfig) -> CorsLayer {
    let headers: Vec<HeaderName> = config
        .allowed_headers
        .iter()
        .filter_map(|h| h.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(AllowHeaders::list(headers))
}

/// Build an axum Router with one route per stage plus `/health`.
pub fn router(config: &GatewayConfig, stages: SharedStages) -> Router {
    Router::new()
        .route("/search", post(search_handler))
        .route("/rank", post(rank_handler))
        .route("/analyze", post(analyze_handler))
        .route("/generate-report", post(report_handler))
        .route("/challenge", post(challenge_handler))
        .route("/health", get(health_handler))
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
        .with_state(stages)
}

async fn search_handler(
    State(stages): State<SharedStages>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(req) = body?;
    let papers = stages.search(&req.topic).await?;
    Ok(Json(SearchResponse { papers }))
}

async fn rank_handler(
    State(stages): State<SharedStages>,
    body: Result<Json<PapersRequest>, JsonRejection>,
) -> Result<Json<RankResponse>, ApiError> {
    let Json(req) = body?;
    let ranked_papers = stages.rank(&req.topic, &req.papers).await?;
    Ok(Json(RankResponse { ranked_papers }))
}

async fn analyze_handler(
    State(stages): State<SharedStages>,
    body: Result<Json<PapersRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(req) = body?;
    let analysis = stages.analyze(&req.topic, &req.papers).await?;
    Ok(Json(AnalyzeResponse { analysis }))
}

async fn report_handler(
    State(stages): State<SharedStages>,
    body: Result<Json<ReportRequest>, JsonRejection>,
) -> Result<Json<ReportResponse>, ApiError> {
    let Json(req) = body?;
    let report = stages
        .generate_report(&req.topic, &req.papers, &req.analysis)
        .await?;
    Ok(Json(ReportResponse { report }))
}

async fn challenge_handler(
    State(stages): State<SharedStages>,
    body: Result<Json<ChallengeRequest>, JsonRejection>,
) -> Result<Json<ChallengeResponse>, ApiError> {
    let Json(req) = body?;
    let challenges = stages.challenge(&req.topic, &req.report).await?;
    Ok(Json(ChallengeResponse { challenges }))
}

/// Health check endpoint.
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Start the gateway on the configured address.
///
/// Runs until cancelled.
pub async fn run(config: &GatewayConfig, stages: SharedStages) -> Result<(), std::io::Error> {
    let app = router(config, stages);
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Gateway listening");
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::MockLlmProvider;
    use crate::config::PipelineConfig;
    use crate::pipeline::{FixedPaperSource, LocalStages};
    use crate::types::{Catalog, Paper};
    use axum::body::Body;
    use tower::ServiceExt;

    fn app(responses: &[&str]) -> Router {
        let stages = LocalStages::with_provider(
            Arc::new(FixedPaperSource::new(
                "arXiv",
                vec![Paper::new("A", Catalog::Arxiv)],
            )),
            Arc::new(FixedPaperSource::new("Semantic Scholar", Vec::new())),
            Arc::new(MockLlmProvider::with_responses(responses.iter().copied())),
            PipelineConfig::default(),
        );
        router(&GatewayConfig::default(), Arc::new(stages))
    }

    async fn send(app: Router, req: axum::http::Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = ServiceExt::<axum::http::Request<Body>>::oneshot(app, req)
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), 1_000_000)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn post_json(uri: &str, body: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let req = axum::http::Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(app(&[]), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_search_endpoint() {
        let (status, json) = send(app(&[]), post_json("/search", r#"{"topic":"gnn"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["papers"].as_array().unwrap().len(), 1);
        assert_eq!(json["papers"][0]["source"], "arxiv");
    }

    #[tokio::test]
    async fn test_blank_topic_is_bad_request() {
        let (status, json) = send(app(&[]), post_json("/search", r#"{"topic":""}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Topic is required");
    }

    #[tokio::test]
    async fn test_stage_failure_is_500_with_error_field() {
        // No queued responses: the mock provider fails the call.
        let (status, json) = send(
            app(&[]),
            post_json("/challenge", r##"{"topic":"gnn","report":"# R"}"##),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"].as_str().unwrap().contains("no queued responses"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let (status, json) = send(app(&[]), post_json("/rank", "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }
}
