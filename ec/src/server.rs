//! HTTP API
//!
//! Routes:
//!   GET  /health
//!   POST /api/analyze-xml             multipart upload of an .xml file
//!   POST /api/analyze-xml-content     {"xml_content": "..."}
//!   GET  /api/sessions
//!   GET  /api/sessions/:session_id
//!   GET  /api/sessions/:session_id/diagram
//!   GET  /sessions/*                  session folders, served statically

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::config::{Config, ServerConfig};
use crate::diagram::DIAGRAM_FILE;
use crate::extractor::{ExtractionResult, WorkflowExtractor};
use crate::pipeline::PipelineError;
use crate::session::{self, SessionError};

/// Service name reported by the health check
pub const SERVICE_NAME: &str = "PowerCenter XML Analyzer";

/// Shared, read-only state of the server
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub extractor: Arc<WorkflowExtractor>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let extractor = WorkflowExtractor::new(&config);
        Self::with_extractor(config, extractor)
    }

    pub fn with_extractor(config: Config, extractor: WorkflowExtractor) -> Self {
        Self {
            config: Arc::new(config),
            extractor: Arc::new(extractor),
        }
    }
}

/// Error body returned to API clients: `{"detail": "..."}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, "{}", self.detail);
        }
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<eyre::Report> for ApiError {
    fn from(err: eyre::Report) -> Self {
        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::Parse(parse)) => Self::bad_request(format!("Error processing XML: {}", parse)),
            _ => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error processing XML: {:#}", err),
            ),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidId(_) => Self::bad_request(err.to_string()),
            SessionError::NotFound(_) => Self::not_found("Session not found"),
            SessionError::Io { .. } => Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        }
    }
}

/// Body of `POST /api/analyze-xml-content`
#[derive(Debug, Deserialize)]
pub struct AnalyzeContentRequest {
    #[serde(default)]
    pub xml_content: String,
}

/// Response of both analysis endpoints
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub session_id: String,
    pub session_folder: String,
    pub summary: String,
    pub repository_info: Value,
    pub transformations_count: usize,
    pub errors: Vec<String>,
    pub success: bool,
}

impl From<ExtractionResult> for AnalysisResponse {
    fn from(result: ExtractionResult) -> Self {
        Self {
            session_id: result.session_id,
            session_folder: result.session_folder.display().to_string(),
            summary: result.summary,
            repository_info: result.repository.to_json(),
            transformations_count: result.analyses.len(),
            errors: result.warnings,
            success: true,
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let development = std::env::var("ENVIRONMENT").is_ok_and(|v| v == "development");
    let sessions_dir = state.extractor.sessions_dir().to_path_buf();
    let cors = cors_layer(&state.config.server, development);

    Router::new()
        .route("/health", get(health))
        .route("/api/analyze-xml", post(analyze_xml_file))
        .route("/api/analyze-xml-content", post(analyze_xml_content))
        .route("/api/sessions", get(list_sessions))
        .route("/api/sessions/:session_id", get(get_session))
        .route("/api/sessions/:session_id/diagram", get(get_session_diagram))
        .nest_service("/sessions", ServeDir::new(sessions_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy: the configured allow-list, or any origin in development
pub fn cors_layer(config: &ServerConfig, development: bool) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if development {
        debug!("cors_layer: development mode, allowing any origin");
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Bind `addr` and serve until the process exits
pub async fn serve(config: Config, addr: &str) -> Result<()> {
    std::fs::create_dir_all(&config.output.sessions_dir).context(format!(
        "Failed to create sessions directory {}",
        config.output.sessions_dir.display()
    ))?;

    let state = AppState::new(config);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, router(state)).await.context("Server error")?;
    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

async fn analyze_xml_file(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<AnalysisResponse>, ApiError> {
    debug!("analyze_xml_file: called");
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if !file_name.ends_with(".xml") {
            return Err(ApiError::bad_request("Only XML files are allowed"));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;
        let xml = String::from_utf8(bytes.to_vec()).map_err(|_| ApiError::bad_request("XML file must be UTF-8"))?;

        info!("Analyzing uploaded file {}", file_name);
        let result = state.extractor.extract_content(xml).await?;
        return Ok(Json(result.into()));
    }
    Err(ApiError::bad_request("No file uploaded"))
}

async fn analyze_xml_content(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeContentRequest>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    debug!(len = request.xml_content.len(), "analyze_xml_content: called");
    if request.xml_content.trim().is_empty() {
        return Err(ApiError::bad_request("XML content is required"));
    }
    let result = state.extractor.extract_content(request.xml_content).await?;
    Ok(Json(result.into()))
}

async fn list_sessions(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let sessions = session::list_sessions(state.extractor.sessions_dir())?;
    Ok(Json(json!({ "sessions": sessions })))
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<session::SessionDetail>, ApiError> {
    let detail = session::load_session(state.extractor.sessions_dir(), &session_id)?;
    Ok(Json(detail))
}

async fn get_session_diagram(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response, ApiError> {
    let folder = match session::session_folder(state.extractor.sessions_dir(), &session_id) {
        Ok(folder) => folder,
        Err(SessionError::NotFound(_)) => return Err(ApiError::not_found("Diagram not found")),
        Err(e) => return Err(e.into()),
    };

    let path = folder.join(DIAGRAM_FILE);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(ApiError::not_found("Diagram not found")),
        Err(e) => {
            return Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error getting diagram: {}", e),
            ));
        }
    };
    Ok(([(header::CONTENT_TYPE, "image/png")], bytes).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use crate::sample::generate_sample_xml;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "ec-test-boundary";

    fn app(dir: &TempDir) -> Router {
        let extractor = WorkflowExtractor::with_pipeline(Pipeline::mock(), dir.path().join("sessions"));
        router(AppState::with_extractor(Config::default(), extractor))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn send_json(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = send(app, request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_content(xml: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/analyze-xml-content")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "xml_content": xml }).to_string()))
            .unwrap()
    }

    fn post_upload(file_name: &str, content: &str) -> Request<Body> {
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
             Content-Type: application/xml\r\n\r\n{c}\r\n--{b}--\r\n",
            b = BOUNDARY,
            f = file_name,
            c = content
        );
        Request::builder()
            .method("POST")
            .uri("/api/analyze-xml")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send_json(app(&dir), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "healthy", "service": "PowerCenter XML Analyzer" }));
    }

    #[tokio::test]
    async fn test_analyze_content() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send_json(app(&dir), post_content(&generate_sample_xml())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["transformations_count"], 3);
        assert_eq!(body["repository_info"]["repository_name"], "SALES_DW_REPO");
        assert_eq!(
            body["summary"],
            "Mock workflow summary for SALES_DW_REPO with 3 transformations"
        );
        assert_eq!(body["errors"], json!([]));
    }

    #[tokio::test]
    async fn test_analyze_blank_content() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send_json(app(&dir), post_content("   ")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "XML content is required");
    }

    #[tokio::test]
    async fn test_analyze_malformed_content() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send_json(app(&dir), post_content("<POWERMART><SOURCE>")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().starts_with("Error processing XML"));
    }

    #[tokio::test]
    async fn test_upload_xml() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send_json(app(&dir), post_upload("sample.xml", &generate_sample_xml())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["transformations_count"], 3);
    }

    #[tokio::test]
    async fn test_upload_rejects_other_extensions() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send_json(app(&dir), post_upload("sample.txt", "hello")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Only XML files are allowed");
    }

    #[tokio::test]
    async fn test_session_endpoints() {
        let dir = TempDir::new().unwrap();
        let (_, analysis) = send_json(app(&dir), post_content(&generate_sample_xml())).await;
        let session_id = analysis["session_id"].as_str().unwrap().to_string();

        let (status, list) = send_json(app(&dir), get("/api/sessions")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["sessions"][0]["session_id"], session_id.as_str());
        assert_eq!(list["sessions"][0]["has_summary"], true);

        let (status, detail) = send_json(app(&dir), get(&format!("/api/sessions/{}", session_id))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(detail["summary"].as_str().unwrap().contains("## Executive Summary"));
        assert_eq!(
            detail["diagram_url"],
            format!("/sessions/{}/workflow_diagram.png", session_id)
        );

        let (status, png) = send(app(&dir), get(&format!("/api/sessions/{}/diagram", session_id))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(png.starts_with(b"\x89PNG"));

        let (status, report) = send(
            app(&dir),
            get(&format!("/sessions/{}/workflow_summary.md", session_id)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(report).unwrap().contains(&session_id));
    }

    #[tokio::test]
    async fn test_missing_session() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send_json(app(&dir), get("/api/sessions/20240101_0000_ffff")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Session not found");

        let (status, body) = send_json(app(&dir), get("/api/sessions/20240101_0000_ffff/diagram")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Diagram not found");
    }

    #[tokio::test]
    async fn test_invalid_session_id() {
        let dir = TempDir::new().unwrap();
        let (status, _) = send_json(app(&dir), get("/api/sessions/bad.id")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_without_sessions() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send_json(app(&dir), get("/api/sessions")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "sessions": [] }));
    }

    #[tokio::test]
    async fn test_cors_allow_list() {
        let dir = TempDir::new().unwrap();
        let request = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "http://localhost:5173")
            .body(Body::empty())
            .unwrap();
        let response = app(&dir).oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:5173"
        );

        let request = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "http://evil.example")
            .body(Body::empty())
            .unwrap();
        let response = app(&dir).oneshot(request).await.unwrap();
        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }
}
