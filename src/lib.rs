//! # reportgrid
//!
//! Client side of a report builder: assembles report queries, calls the
//! report server over a fixed call contract, and renders the flat result
//! sets it returns as display grids.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Designer (query, grouping, filter rows)           │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [QueryConfig / ReportDefinition]
//! ┌─────────────────────────────────────────────────────────┐
//! │        ReportSession (current report + result)           │
//! │        ReportClient ── Transport (HTTP | process)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [decode: Data | GroupHeader | Subtotal]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  [ResultRow]                             │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [render]
//! ┌─────────────────────────────────────────────────────────┐
//! │          Grid (headers, styled cells | placeholder)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [paint]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  HTML table / text                       │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod designer;
pub mod render;
pub mod report;
pub mod rpc;
pub mod session;

#[cfg(feature = "ui")]
pub mod web;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::designer::ReportDesigner;
    pub use crate::render::{render, to_html, to_text, Grid, HeaderStrategy, Renderer};
    pub use crate::report::{
        decode_rows, CellValue, ExportFormat, QueryConfig, QueryType, ReportDefinition, ResultRow,
    };
    pub use crate::rpc::{ReportClient, RpcError, Transport};
    pub use crate::session::{ReportSession, SessionError};
}

pub use render::{render, Grid};
pub use report::{decode_rows, ResultRow};
