//! Report domain model.
//!
//! Typed result rows and their wire decoding, the query config sent to the
//! server, saved report definitions, export formats, cell formatting and
//! local result statistics.

pub mod definition;
pub mod export;
pub mod format;
pub mod query;
pub mod row;
pub mod stats;

pub use definition::{
    validate_sql_query, Alignment, ColumnSpec, DefinitionError, FilterSpec, GroupingSpec,
    ReportDefinition, SortOrder,
};
pub use export::{ExportFormat, UnknownFormat};
pub use format::CellFormat;
pub use query::{
    Aggregation, ConfigError, Filter, FilterOperator, QueryConfig, QueryType, SubtotalField,
};
pub use row::{
    decode_rows, encode_rows, CellValue, DataRow, Fields, GroupHeaderRow, ResultRow, RowError,
    RowKind, SubtotalRow,
};
pub use stats::ReportStatistics;
