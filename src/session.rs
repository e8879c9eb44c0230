//! The report a user is working on and the last result fetched for it.
//!
//! A session is shared (`Arc<ReportSession>`) between whatever issues calls
//! concurrently. Every fetch takes a [`Ticket`] before going to the server;
//! when the answer comes back it is stored only if no newer fetch was
//! started in the meantime.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

use crate::render::{Grid, Renderer};
use crate::report::{
    ConfigError, DefinitionError, ExportFormat, QueryConfig, ReportDefinition, ReportStatistics,
    ResultRow,
};
use crate::rpc::protocol::{CreatedReport, ExportReceipt};
use crate::rpc::{ReportClient, RpcError};

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("invalid query config: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid report: {0}")]
    Definition(#[from] DefinitionError),

    /// Export or statistics asked for before anything was executed.
    #[error("no data to export; run the report first")]
    NoData,

    #[error("no report loaded")]
    NoReport,

    /// A newer fetch started while this one was in flight.
    #[error("result discarded; a newer request is pending")]
    Superseded,
}

impl SessionError {
    /// Message for the user, flattening server failures.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rpc(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Marks one fetch; only the most recent ticket may store its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// Rows of a preview; not stored in the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub grid: Grid,
    pub rows: Vec<ResultRow>,
    /// Rows the query matched before the preview limit.
    pub total_count: Option<u64>,
}

#[derive(Debug, Default)]
struct State {
    report: Option<ReportDefinition>,
    rows: Option<Vec<ResultRow>>,
}

#[derive(Debug)]
pub struct ReportSession {
    client: ReportClient,
    renderer: Renderer,
    latest: AtomicU64,
    state: Mutex<State>,
}

impl ReportSession {
    pub fn new(client: ReportClient) -> Self {
        Self::with_renderer(client, Renderer::new())
    }

    pub fn with_renderer(client: ReportClient, renderer: Renderer) -> Self {
        Self {
            client,
            renderer,
            latest: AtomicU64::new(0),
            state: Mutex::new(State::default()),
        }
    }

    pub fn client(&self) -> &ReportClient {
        &self.client
    }

    // ------------------------------------------------------------------------
    // Tickets
    // ------------------------------------------------------------------------

    /// Start a fetch. Issuing a ticket makes every earlier one stale.
    pub fn begin(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Store `rows` as the current result if `ticket` is still the latest.
    pub async fn accept(&self, ticket: Ticket, rows: Vec<ResultRow>) -> bool {
        let mut state = self.state.lock().await;
        // Checked under the lock so a newer accept cannot be overwritten.
        if !self.is_current(ticket) {
            tracing::warn!(ticket = ticket.0, "discarding stale result");
            return false;
        }
        state.rows = Some(rows);
        true
    }

    // ------------------------------------------------------------------------
    // Reports
    // ------------------------------------------------------------------------

    /// Fetch a saved report and make it the current one.
    pub async fn load_report(&self, report_name: &str) -> SessionResult<ReportDefinition> {
        let definition = self.client.get_report(report_name).await?;
        self.state.lock().await.report = Some(definition.clone());
        Ok(definition)
    }

    /// Validate locally, save on the server, and make it the current report.
    pub async fn create_report(&self, definition: ReportDefinition) -> SessionResult<CreatedReport> {
        definition.validate()?;
        let created = self.client.create_report(&definition).await?;

        let mut saved = definition;
        if created.report_name.is_some() {
            saved.name = created.report_name.clone();
        }
        self.state.lock().await.report = Some(saved);
        Ok(created)
    }

    pub async fn current_report(&self) -> Option<ReportDefinition> {
        self.state.lock().await.report.clone()
    }

    // ------------------------------------------------------------------------
    // Results
    // ------------------------------------------------------------------------

    /// Run a query, store its rows, and render them.
    pub async fn execute(&self, config: &QueryConfig) -> SessionResult<Grid> {
        config.validate()?;
        let ticket = self.begin();
        let response = self.client.execute_query(config).await?;
        tracing::info!(rows = response.data.len(), count = ?response.count, "query executed");

        let grid = self.renderer_for_current().await.render(&response.data);
        if !self.accept(ticket, response.data).await {
            return Err(SessionError::Superseded);
        }
        Ok(grid)
    }

    /// Run the current report's own query.
    pub async fn execute_current(&self) -> SessionResult<Grid> {
        let config = self
            .current_report()
            .await
            .ok_or(SessionError::NoReport)?
            .to_query_config();
        self.execute(&config).await
    }

    /// Render a row-limited preview; the stored result is left alone.
    pub async fn preview(&self, query: &str) -> SessionResult<Preview> {
        if query.trim().is_empty() {
            return Err(ConfigError::EmptyQuery.into());
        }
        let response = self.client.preview_query(query).await?;
        Ok(Preview {
            grid: self.renderer.render(&response.data),
            rows: response.data,
            total_count: response.total_count,
        })
    }

    /// Render the stored result; the placeholder if nothing was executed.
    pub async fn render_current(&self) -> Grid {
        let renderer = self.renderer_for_current().await;
        let state = self.state.lock().await;
        renderer.render(state.rows.as_deref().unwrap_or_default())
    }

    pub async fn rows(&self) -> Option<Vec<ResultRow>> {
        self.state.lock().await.rows.clone()
    }

    pub async fn statistics(&self) -> Option<ReportStatistics> {
        let state = self.state.lock().await;
        ReportStatistics::compute(state.rows.as_deref()?)
    }

    /// Send the stored result to the server's exporter.
    pub async fn export(&self, format: ExportFormat, report_name: &str) -> SessionResult<ExportReceipt> {
        let rows = self.rows().await.ok_or(SessionError::NoData)?;
        let receipt = self.client.export(format, report_name, &rows).await?;
        tracing::info!(%format, report_name, "report exported");
        Ok(receipt)
    }

    /// Renderer with the current report's column formats applied.
    async fn renderer_for_current(&self) -> Renderer {
        let state = self.state.lock().await;
        match &state.report {
            Some(report) => self.renderer.clone().with_column_formats(&report.columns),
            None => self.renderer.clone(),
        }
    }
}
