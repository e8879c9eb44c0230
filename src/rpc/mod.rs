//! Report server communication.
//!
//! The server owns report storage, query execution and export; this crate
//! only sends it calls and decodes the answers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     ReportClient (Async)                        │
//! │  - Typed calls: report.*, query_engine.*, export.*              │
//! │  - Namespace-qualified method paths                             │
//! │  - success:false envelopes become RpcError::Remote              │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │  dyn Transport
//!                 ┌──────────────┴──────────────┐
//!                 ▼                             ▼
//! ┌───────────────────────────┐   ┌───────────────────────────────┐
//! │       HttpTransport       │   │       ProcessTransport        │
//! │  POST /api/method/<name>  │   │  NDJSON over stdin/stdout     │
//! │  token auth, cookies      │   │  request ids, reader task     │
//! └───────────────────────────┘   └───────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use reportgrid::rpc::ReportClient;
//!
//! let client = ReportClient::from_settings(&settings)?;
//! let tables = client.get_available_tables().await?;
//! ```

mod client;
mod error;
pub mod http;
pub mod process;
pub mod protocol;
mod transport;

pub use client::ReportClient;
pub use error::{RpcError, RpcResult};
pub use http::HttpTransport;
pub use process::ProcessTransport;
pub use transport::Transport;
