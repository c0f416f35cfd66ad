//! REST API tests for the stage gateway, driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use litreview_core::gateway::router;
use litreview_core::pipeline::FixedPaperSource;
use litreview_core::{
    AnalysisResult, Catalog, GatewayConfig, LocalStages, MockLlmProvider, Paper, PipelineConfig,
    PipelineStages, RemoteStages, StageError,
};
use serde_json::{Value, json};
use tower::ServiceExt;

fn stages(provider: Arc<MockLlmProvider>) -> Arc<dyn PipelineStages> {
    let mut paper = Paper::new("Neural Message Passing for Quantum Chemistry", Catalog::Arxiv);
    paper.year = 2017;
    Arc::new(LocalStages::with_provider(
        Arc::new(FixedPaperSource::new("arXiv", vec![paper])),
        Arc::new(FixedPaperSource::new("Semantic Scholar", Vec::new())),
        provider,
        PipelineConfig::default(),
    ))
}

fn app(provider: Arc<MockLlmProvider>) -> Router {
    router(&GatewayConfig::default(), stages(provider))
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
    let resp = ServiceExt::<Request<Body>>::oneshot(app, req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, json)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_options_preflight_returns_cors_headers() {
    for uri in ["/search", "/rank", "/analyze", "/generate-report", "/challenge"] {
        let req = Request::builder()
            .method("OPTIONS")
            .uri(uri)
            .header("origin", "http://localhost:5173")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .body(Body::empty())
            .unwrap();
        let (status, headers, _) = call(app(Arc::new(MockLlmProvider::new())), req).await;

        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(headers["access-control-allow-origin"], "*");
        let allowed = headers["access-control-allow-headers"].to_str().unwrap();
        for header in ["authorization", "x-client-info", "apikey", "content-type"] {
            assert!(allowed.contains(header), "{uri} missing {header}");
        }
    }
}

#[tokio::test]
async fn test_rank_endpoint() {
    let provider = Arc::new(MockLlmProvider::with_responses([
        r#"[{"index":2,"score":0.9},{"index":1,"score":0.2}]"#,
    ]));
    let papers = vec![
        Paper::new("Low", Catalog::Arxiv),
        Paper::new("High", Catalog::SemanticScholar),
    ];
    let (status, headers, json) = call(
        app(provider),
        post("/rank", json!({ "topic": "gnn", "papers": papers })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(json["ranked_papers"][0]["title"], "High");
    assert_eq!(json["ranked_papers"][0]["relevance_score"], 0.9);
    assert_eq!(json["ranked_papers"][1]["relevance_score"], 0.2);
}

#[tokio::test]
async fn test_analyze_endpoint_falls_back_on_garbage() {
    let provider = Arc::new(MockLlmProvider::with_responses(["definitely not json"]));
    let (status, _, json) = call(
        app(provider),
        post("/analyze", json!({ "topic": "gnn", "papers": [] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["analysis"]["summary"], "Analysis could not be parsed.");
    assert_eq!(json["analysis"]["claims"], json!([]));
    assert_eq!(json["analysis"]["contradictions"], json!([]));
    assert_eq!(json["analysis"]["gaps"], json!([]));
}

#[tokio::test]
async fn test_generate_report_and_challenge_endpoints() {
    let provider = Arc::new(MockLlmProvider::with_responses([
        "# Executive Summary\n\nShort.",
        "1. **Methodological Concerns** - thin evidence",
    ]));
    let app = app(provider);

    let (status, _, json) = call(
        app.clone(),
        post(
            "/generate-report",
            json!({ "topic": "gnn", "papers": [], "analysis": AnalysisResult::fallback() }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["report"], "# Executive Summary\n\nShort.");

    let (status, _, json) = call(
        app,
        post("/challenge", json!({ "topic": "gnn", "report": "# Executive Summary" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["challenges"].as_str().unwrap().contains("Methodological"));
}

#[tokio::test]
async fn test_completion_failure_is_500_with_error() {
    let provider = Arc::new(MockLlmProvider::new());
    provider.queue_error(litreview_core::LlmError::Status {
        status: 502,
        body: "bad gateway".into(),
    });
    let (status, headers, json) = call(
        app(provider),
        post("/rank", json!({ "topic": "gnn", "papers": [Paper::new("A", Catalog::Arxiv)] })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(json["error"], "API returned status 502: bad gateway");
}

#[tokio::test]
async fn test_remote_stages_against_served_gateway() {
    let provider = Arc::new(MockLlmProvider::new());
    let app = app(provider);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let remote = RemoteStages::new(format!("http://{addr}"), Some(10)).unwrap();
    let papers = remote.search("graph neural networks").await.unwrap();
    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0].year, 2017);
    assert!(papers[0].youtube_url.is_some());

    // The mock provider has nothing queued, so the gateway answers 500.
    let err = remote.rank("gnn", &papers).await.unwrap_err();
    assert!(matches!(err, StageError::Transport { status: 500, .. }));
}
