//! Request and response shapes of the report server's call contract.
//!
//! Every response is an envelope with a `success` flag. On success the
//! remaining keys (`data`, `count`, `report_name`, ...) form the typed
//! payload; on failure `message` carries the reason.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::report::definition::ReportDefinition;
use crate::report::row::{decode_rows, ResultRow, RowError};

// ============================================================================
// Envelopes
// ============================================================================

/// Request line sent over the process transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Unique request ID for correlation.
    pub id: String,
    /// Fully qualified method path.
    pub method: String,
    pub params: Value,
}

/// Response envelope received from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Request ID (process transport only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub success: bool,
    /// Confirmation text on success, failure reason otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Everything else the server sent.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl ResponseEnvelope {
    pub fn ok(payload: Map<String, Value>) -> Self {
        Self {
            id: None,
            success: true,
            message: None,
            payload,
        }
    }

    /// Successful envelope carrying `data`.
    pub fn with_data(data: Value) -> Self {
        let mut payload = Map::new();
        payload.insert("data".to_string(), data);
        Self::ok(payload)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            id: None,
            success: false,
            message: Some(message.into()),
            payload: Map::new(),
        }
    }

    /// Payload as one JSON object, `message` included.
    pub fn into_payload(self) -> Value {
        let mut payload = self.payload;
        if let Some(message) = self.message {
            payload.insert("message".to_string(), Value::String(message));
        }
        Value::Object(payload)
    }
}

// ============================================================================
// Request Parameters
// ============================================================================

/// Parameters for `report.create_report`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateReportParams {
    /// JSON-encoded [`ReportDefinition`].
    pub report_config: String,
}

/// Parameters for `report.get_report` and `report.delete_report`.
#[derive(Debug, Clone, Serialize)]
pub struct ReportNameParams {
    pub report_name: String,
}

/// Parameters for `report.update_report`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateReportParams {
    pub report_name: String,
    /// JSON-encoded fields to change.
    pub report_config: String,
}

/// Parameters for `report.list_reports`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListReportsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Map<String, Value>>,
}

/// Parameters for `query_engine.execute_query`.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteQueryParams {
    /// JSON-encoded query config.
    pub query_config: String,
}

/// Parameters for `query_engine.preview_query`.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewQueryParams {
    pub query: String,
}

/// Parameters for `query_engine.get_table_columns`.
#[derive(Debug, Clone, Serialize)]
pub struct TableColumnsParams {
    pub table_name: String,
}

/// Parameters for the `export.export_to_*` calls.
#[derive(Debug, Clone, Serialize)]
pub struct ExportParams {
    pub report_name: String,
    /// JSON-encoded result rows.
    pub data: String,
}

/// No parameters.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NoParams {}

// ============================================================================
// Response Types
// ============================================================================

/// Response of `report.get_report`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportResponse {
    pub data: ReportDefinition,
}

/// Response of `report.create_report`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedReport {
    /// Server-assigned document name.
    #[serde(default)]
    pub report_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of calls that only confirm.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub message: Option<String>,
}

/// One entry of `report.list_reports`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub name: String,
    #[serde(default)]
    pub report_name: Option<String>,
    #[serde(default)]
    pub data_source: Option<String>,
    #[serde(default)]
    pub query_type: Option<String>,
    #[serde(default)]
    pub modified: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportListResponse {
    #[serde(default)]
    pub data: Vec<ReportSummary>,
}

/// Response of `execute_query` and `preview_query`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryResponse {
    pub data: Vec<ResultRow>,
    /// Rows returned (execute).
    pub count: Option<u64>,
    /// Rows matched before the preview cut (preview).
    pub total_count: Option<u64>,
}

/// Query response before its rows are decoded.
#[derive(Debug, Clone, Deserialize)]
pub struct RawQueryResponse {
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub total_count: Option<u64>,
}

impl TryFrom<RawQueryResponse> for QueryResponse {
    type Error = RowError;

    fn try_from(raw: RawQueryResponse) -> Result<Self, Self::Error> {
        Ok(Self {
            data: decode_rows(&raw.data)?,
            count: raw.count,
            total_count: raw.total_count,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TablesResponse {
    #[serde(default)]
    pub data: Vec<String>,
}

/// One column of a table as described by the server's schema catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    #[serde(rename = "COLUMN_NAME")]
    pub name: String,
    #[serde(rename = "DATA_TYPE", default)]
    pub data_type: String,
    #[serde(rename = "IS_NULLABLE", default, deserialize_with = "deserialize_yes_no")]
    pub is_nullable: bool,
}

/// `IS_NULLABLE` arrives as `"YES"`/`"NO"` (or occasionally a boolean).
fn deserialize_yes_no<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Flag(bool),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Flag(b) => b,
        Raw::Text(s) => s.eq_ignore_ascii_case("yes") || s.eq_ignore_ascii_case("true"),
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnsResponse {
    #[serde(default)]
    pub data: Vec<ColumnDescriptor>,
}

/// Confirmation of an export call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportReceipt {
    pub file_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Inline document text (CSV).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Inline document payload (PDF).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

// ============================================================================
// Method Names
// ============================================================================

/// Method paths relative to the configured namespace.
pub mod methods {
    use crate::report::ExportFormat;

    pub const CREATE_REPORT: &str = "report.create_report";
    pub const GET_REPORT: &str = "report.get_report";
    pub const UPDATE_REPORT: &str = "report.update_report";
    pub const DELETE_REPORT: &str = "report.delete_report";
    pub const LIST_REPORTS: &str = "report.list_reports";
    pub const EXECUTE_QUERY: &str = "query_engine.execute_query";
    pub const PREVIEW_QUERY: &str = "query_engine.preview_query";
    pub const GET_AVAILABLE_TABLES: &str = "query_engine.get_available_tables";
    pub const GET_TABLE_COLUMNS: &str = "query_engine.get_table_columns";
    pub const EXPORT_TO_PDF: &str = "export.export_to_pdf";
    pub const EXPORT_TO_EXCEL: &str = "export.export_to_excel";
    pub const EXPORT_TO_CSV: &str = "export.export_to_csv";

    /// Export call for a format.
    pub fn export(format: ExportFormat) -> &'static str {
        match format {
            ExportFormat::Pdf => EXPORT_TO_PDF,
            ExportFormat::Excel => EXPORT_TO_EXCEL,
            ExportFormat::Csv => EXPORT_TO_CSV,
        }
    }

    /// Join a namespace and a relative method path.
    pub fn qualify(namespace: &str, method: &str) -> String {
        let namespace = namespace.trim_matches('.');
        if namespace.is_empty() {
            method.to_string()
        } else {
            format!("{namespace}.{method}")
        }
    }
}
