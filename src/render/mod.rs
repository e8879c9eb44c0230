//! Rendering of result sets.
//!
//! ```text
//!   [ResultRow]  ──render──▶  Grid  ──paint──▶  HTML / text
//! ```
//!
//! The engine knows nothing about presentation; painters know nothing about
//! row variants.

pub mod engine;
pub mod grid;
pub mod html;
pub mod text;

pub use engine::{derive_headers, render, HeaderStrategy, Renderer, DEFAULT_PLACEHOLDER};
pub use grid::{CellStyle, Grid, GridCell, GridRow};
pub use html::to_html;
pub use text::to_text;
