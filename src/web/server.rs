//! Axum web server for the report builder UI
//!
//! Renders result sets and forwards query, schema and export calls to the
//! report server.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::render::{to_html, Grid, HeaderStrategy, Renderer};
use crate::report::{decode_rows, ExportFormat, QueryConfig, ResultRow, RowError};
use crate::rpc::protocol::{ColumnDescriptor, ExportReceipt};
use crate::rpc::{ReportClient, RpcError};

/// Application state shared across handlers
pub struct AppState {
    pub client: ReportClient,
    pub renderer: Renderer,
}

/// Build the axum router with all routes
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/render", post(render_grid))
        .route("/api/render/html", post(render_html))
        .route("/api/query/execute", post(execute_query))
        .route("/api/query/preview", post(preview_query))
        .route("/api/tables", get(list_tables))
        .route("/api/tables/{table}/columns", get(table_columns))
        .route("/api/export", post(export))
        .layer(cors)
        .with_state(state)
}

/// Start the web server
pub async fn serve(
    client: ReportClient,
    renderer: Renderer,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(Arc::new(AppState { client, renderer }));

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "report builder UI listening");

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Envelope
// ============================================================================

/// `{success, data}` on success, `{success: false, message}` otherwise.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        Json(Self {
            success: true,
            data: Some(data),
            message: None,
        })
        .into_response()
    }
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ApiResponse::<()> {
        success: false,
        data: None,
        message: Some(message.into()),
    };
    (status, Json(body)).into_response()
}

fn rpc_failure(err: RpcError) -> Response {
    tracing::warn!(error = %err, "report server call failed");
    let status = match err {
        RpcError::Remote { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::BAD_GATEWAY,
    };
    failure(status, err.user_message())
}

fn row_failure(err: RowError) -> Response {
    failure(StatusCode::BAD_REQUEST, err.to_string())
}

// ============================================================================
// API Handlers
// ============================================================================

#[derive(Deserialize)]
struct RenderRequest {
    rows: Value,
    #[serde(default)]
    header_strategy: Option<HeaderStrategy>,
}

impl RenderRequest {
    fn render(&self, renderer: &Renderer) -> Result<Grid, RowError> {
        let rows = decode_rows(&self.rows)?;
        let renderer = match self.header_strategy {
            Some(strategy) => renderer.clone().with_header_strategy(strategy),
            None => renderer.clone(),
        };
        Ok(renderer.render(&rows))
    }
}

#[derive(Serialize)]
struct QueryResult {
    rows: Vec<ResultRow>,
    grid: Grid,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_count: Option<u64>,
}

/// POST /api/render - Render posted rows as a grid
async fn render_grid(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RenderRequest>,
) -> Response {
    match req.render(&state.renderer) {
        Ok(grid) => ApiResponse::ok(grid),
        Err(e) => row_failure(e),
    }
}

/// POST /api/render/html - Render posted rows as an HTML table
async fn render_html(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RenderRequest>,
) -> Response {
    match req.render(&state.renderer) {
        Ok(grid) => ApiResponse::ok(to_html(&grid)),
        Err(e) => row_failure(e),
    }
}

/// POST /api/query/execute - Execute a query config and render the result
async fn execute_query(
    State(state): State<Arc<AppState>>,
    Json(config): Json<QueryConfig>,
) -> Response {
    if let Err(e) = config.validate() {
        return failure(StatusCode::BAD_REQUEST, e.to_string());
    }
    match state.client.execute_query(&config).await {
        Ok(resp) => ApiResponse::ok(QueryResult {
            grid: state.renderer.render(&resp.data),
            rows: resp.data,
            count: resp.count,
            total_count: None,
        }),
        Err(e) => rpc_failure(e),
    }
}

#[derive(Deserialize)]
struct PreviewRequest {
    query: String,
}

/// POST /api/query/preview - Preview a query
async fn preview_query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PreviewRequest>,
) -> Response {
    if req.query.trim().is_empty() {
        return failure(StatusCode::BAD_REQUEST, "Please enter a query");
    }
    match state.client.preview_query(&req.query).await {
        Ok(resp) => ApiResponse::ok(QueryResult {
            grid: state.renderer.render(&resp.data),
            rows: resp.data,
            count: None,
            total_count: resp.total_count,
        }),
        Err(e) => rpc_failure(e),
    }
}

/// GET /api/tables - Tables available to queries
async fn list_tables(State(state): State<Arc<AppState>>) -> Response {
    match state.client.get_available_tables().await {
        Ok(tables) => ApiResponse::ok(tables),
        Err(e) => rpc_failure(e),
    }
}

/// GET /api/tables/{table}/columns - Columns of one table
async fn table_columns(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
) -> Response {
    match state.client.get_table_columns(&table).await {
        Ok(columns) => ApiResponse::<Vec<ColumnDescriptor>>::ok(columns),
        Err(e) => rpc_failure(e),
    }
}

#[derive(Deserialize)]
struct ExportRequest {
    #[serde(default)]
    format: ExportFormat,
    report_name: String,
    data: Value,
}

/// POST /api/export - Forward rows to the server's exporter
async fn export(State(state): State<Arc<AppState>>, Json(req): Json<ExportRequest>) -> Response {
    let rows = match decode_rows(&req.data) {
        Ok(rows) if rows.is_empty() => {
            return failure(StatusCode::BAD_REQUEST, "Please run preview first")
        }
        Ok(rows) => rows,
        Err(e) => return row_failure(e),
    };
    match state.client.export(req.format, &req.report_name, &rows).await {
        Ok(receipt) => ApiResponse::<ExportReceipt>::ok(receipt),
        Err(e) => rpc_failure(e),
    }
}
