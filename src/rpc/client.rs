//! Typed client for the report server.

use std::sync::Arc;

use futures::future::join_all;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::error::{RpcError, RpcResult};
use super::http::HttpTransport;
use super::process::ProcessTransport;
use super::protocol::{
    methods, Acknowledgement, ColumnDescriptor, ColumnsResponse, CreateReportParams,
    CreatedReport, ExecuteQueryParams, ExportParams, ExportReceipt, ListReportsParams, NoParams,
    PreviewQueryParams, QueryResponse, RawQueryResponse, ReportListResponse, ReportNameParams,
    ReportResponse, ReportSummary, TableColumnsParams, TablesResponse, UpdateReportParams,
};
use super::transport::Transport;
use crate::config::{Settings, TransportKind};
use crate::report::{encode_rows, ExportFormat, QueryConfig, ReportDefinition, ResultRow};

/// Calls the report server through any [`Transport`].
///
/// # Example
///
/// ```ignore
/// use reportgrid::rpc::ReportClient;
///
/// let client = ReportClient::from_settings(&settings)?;
/// let rows = client.execute_query(&config).await?.data;
/// ```
#[derive(Clone)]
pub struct ReportClient {
    transport: Arc<dyn Transport>,
    namespace: String,
}

impl ReportClient {
    pub fn new(transport: Arc<dyn Transport>, namespace: impl Into<String>) -> Self {
        Self {
            transport,
            namespace: namespace.into(),
        }
    }

    /// Build the transport the settings ask for.
    pub fn from_settings(settings: &Settings) -> RpcResult<Self> {
        let server = settings
            .server
            .resolved()
            .map_err(|e| RpcError::InvalidConfig(e.to_string()))?;
        let transport: Arc<dyn Transport> = match server.transport {
            TransportKind::Http => Arc::new(HttpTransport::from_settings(&server)?),
            TransportKind::Process => {
                Arc::new(ProcessTransport::from_settings(&server, &settings.bridge)?)
            }
        };
        Ok(Self::new(transport, server.method_namespace))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Send one call and decode the payload of a successful envelope.
    pub async fn request<P, R>(&self, method: &str, params: P) -> RpcResult<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let method = methods::qualify(&self.namespace, method);
        let params = serde_json::to_value(params).map_err(RpcError::SerializeFailed)?;
        tracing::debug!(%method, transport = self.transport.name(), "rpc call");

        let response = self.transport.call(&method, params).await?;
        if !response.success {
            let message = response
                .message
                .unwrap_or_else(|| format!("{method} failed"));
            tracing::debug!(%method, %message, "rpc call rejected");
            return Err(RpcError::remote(message));
        }
        serde_json::from_value(response.into_payload()).map_err(RpcError::DeserializeFailed)
    }

    // ------------------------------------------------------------------------
    // Reports
    // ------------------------------------------------------------------------

    pub async fn create_report(&self, definition: &ReportDefinition) -> RpcResult<CreatedReport> {
        let report_config = serde_json::to_string(definition).map_err(RpcError::SerializeFailed)?;
        self.request(methods::CREATE_REPORT, CreateReportParams { report_config })
            .await
    }

    pub async fn get_report(&self, report_name: &str) -> RpcResult<ReportDefinition> {
        let response: ReportResponse = self
            .request(
                methods::GET_REPORT,
                ReportNameParams {
                    report_name: report_name.to_string(),
                },
            )
            .await?;
        Ok(response.data)
    }

    /// Replace the fields present in `changes`.
    pub async fn update_report(
        &self,
        report_name: &str,
        changes: &Value,
    ) -> RpcResult<Acknowledgement> {
        let report_config = serde_json::to_string(changes).map_err(RpcError::SerializeFailed)?;
        self.request(
            methods::UPDATE_REPORT,
            UpdateReportParams {
                report_name: report_name.to_string(),
                report_config,
            },
        )
        .await
    }

    pub async fn delete_report(&self, report_name: &str) -> RpcResult<Acknowledgement> {
        self.request(
            methods::DELETE_REPORT,
            ReportNameParams {
                report_name: report_name.to_string(),
            },
        )
        .await
    }

    pub async fn list_reports(&self) -> RpcResult<Vec<ReportSummary>> {
        let response: ReportListResponse = self
            .request(methods::LIST_REPORTS, ListReportsParams::default())
            .await?;
        Ok(response.data)
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub async fn execute_query(&self, config: &QueryConfig) -> RpcResult<QueryResponse> {
        let query_config = config.to_wire().map_err(RpcError::SerializeFailed)?;
        let raw: RawQueryResponse = self
            .request(methods::EXECUTE_QUERY, ExecuteQueryParams { query_config })
            .await?;
        Ok(QueryResponse::try_from(raw)?)
    }

    /// Run a query with the server's preview row limit.
    pub async fn preview_query(&self, query: &str) -> RpcResult<QueryResponse> {
        let raw: RawQueryResponse = self
            .request(
                methods::PREVIEW_QUERY,
                PreviewQueryParams {
                    query: query.to_string(),
                },
            )
            .await?;
        Ok(QueryResponse::try_from(raw)?)
    }

    pub async fn get_available_tables(&self) -> RpcResult<Vec<String>> {
        let response: TablesResponse = self
            .request(methods::GET_AVAILABLE_TABLES, NoParams::default())
            .await?;
        Ok(response.data)
    }

    pub async fn get_table_columns(&self, table_name: &str) -> RpcResult<Vec<ColumnDescriptor>> {
        let response: ColumnsResponse = self
            .request(
                methods::GET_TABLE_COLUMNS,
                TableColumnsParams {
                    table_name: table_name.to_string(),
                },
            )
            .await?;
        Ok(response.data)
    }

    /// Columns of several tables, fetched concurrently. Results keep the
    /// order of `tables`.
    pub async fn get_columns_batch(
        &self,
        tables: &[String],
    ) -> Vec<(String, RpcResult<Vec<ColumnDescriptor>>)> {
        let lookups = tables.iter().map(|table| async move {
            (table.clone(), self.get_table_columns(table).await)
        });
        join_all(lookups).await
    }

    // ------------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------------

    pub async fn export(
        &self,
        format: ExportFormat,
        report_name: &str,
        rows: &[ResultRow],
    ) -> RpcResult<ExportReceipt> {
        let data = serde_json::to_string(&encode_rows(rows)).map_err(RpcError::SerializeFailed)?;
        self.request(
            methods::export(format),
            ExportParams {
                report_name: report_name.to_string(),
                data,
            },
        )
        .await
    }
}

impl std::fmt::Debug for ReportClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportClient")
            .field("transport", &self.transport.name())
            .field("namespace", &self.namespace)
            .finish()
    }
}
