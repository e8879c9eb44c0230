//! The tabular render engine.
//!
//! Turns a flat, already-materialized result set into a [`Grid`]. Headers
//! are derived once per call and applied to every row whatever its variant.
//! Rendering never fails: anything missing becomes a blank cell.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::grid::{CellStyle, Grid, GridCell, GridRow};
use crate::report::definition::ColumnSpec;
use crate::report::format::CellFormat;
use crate::report::row::{is_reserved, CellValue, ResultRow, SUBTOTAL_SUFFIX};

/// Default text of the placeholder grid.
pub const DEFAULT_PLACEHOLDER: &str = "No data available";

/// How the header set is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderStrategy {
    /// The first row's non-reserved keys, in order. Columns introduced by
    /// later rows are not shown.
    #[default]
    FirstRow,
    /// Every row is scanned; columns appear in order of first appearance.
    Union,
}

/// Renders result rows into grids.
#[derive(Debug, Clone)]
pub struct Renderer {
    header_strategy: HeaderStrategy,
    placeholder: String,
    formats: HashMap<String, CellFormat>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            header_strategy: HeaderStrategy::FirstRow,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            formats: HashMap::new(),
        }
    }

    pub fn with_header_strategy(mut self, strategy: HeaderStrategy) -> Self {
        self.header_strategy = strategy;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_format(mut self, column: impl Into<String>, format: CellFormat) -> Self {
        self.formats.insert(column.into(), format);
        self
    }

    /// Pick up formats implied by a report's column specs.
    pub fn with_column_formats<'a>(mut self, columns: impl IntoIterator<Item = &'a ColumnSpec>) -> Self {
        for column in columns {
            if let Some(format) = CellFormat::for_column(column) {
                self.formats.insert(column.field_name.clone(), format);
            }
        }
        self
    }

    pub fn header_strategy(&self) -> HeaderStrategy {
        self.header_strategy
    }

    pub fn render(&self, rows: &[ResultRow]) -> Grid {
        if rows.is_empty() {
            return Grid::Empty {
                placeholder: self.placeholder.clone(),
            };
        }

        let headers = derive_headers(rows, self.header_strategy);
        let rows = rows.iter().map(|row| self.render_row(row, &headers)).collect();
        Grid::Table { headers, rows }
    }

    fn render_row(&self, row: &ResultRow, headers: &[String]) -> GridRow {
        let style = match row {
            ResultRow::Data(_) => CellStyle::Normal,
            ResultRow::GroupHeader(_) => CellStyle::GroupHeader,
            ResultRow::Subtotal(_) => CellStyle::Subtotal,
        };

        let cells = headers
            .iter()
            .map(|column| {
                let value = match row {
                    ResultRow::Data(data) => data
                        .fields
                        .get(column)
                        .filter(|v| v.is_truthy())
                        .map(|v| self.display(column, v)),
                    ResultRow::GroupHeader(header) => {
                        header.group_key.get(column).map(ToString::to_string)
                    }
                    ResultRow::Subtotal(subtotal) => {
                        subtotal.subtotal(column).map(|v| self.display(column, v))
                    }
                };
                GridCell::new(value.unwrap_or_default(), style)
            })
            .collect();

        GridRow { style, cells }
    }

    fn display(&self, column: &str, value: &CellValue) -> String {
        match self.formats.get(column) {
            Some(format) if !matches!(value, CellValue::Null) => format.apply(value),
            _ => value.to_string(),
        }
    }
}

/// Render with the default settings.
pub fn render(rows: &[ResultRow]) -> Grid {
    Renderer::new().render(rows)
}

/// Derive the header set for `rows`.
pub fn derive_headers(rows: &[ResultRow], strategy: HeaderStrategy) -> Vec<String> {
    match strategy {
        HeaderStrategy::FirstRow => rows
            .first()
            .map(|row| row.column_keys().map(str::to_string).collect())
            .unwrap_or_default(),
        HeaderStrategy::Union => {
            let mut headers: Vec<String> = Vec::new();
            let mut push = |column: &str| {
                if !is_reserved(column) && !headers.iter().any(|h| h == column) {
                    headers.push(column.to_string());
                }
            };
            for row in rows {
                match row {
                    ResultRow::Data(data) => data.fields.keys().for_each(&mut push),
                    ResultRow::GroupHeader(header) => {
                        header.group_key.keys().for_each(&mut push);
                        header.fields.keys().for_each(&mut push);
                    }
                    ResultRow::Subtotal(subtotal) => subtotal
                        .fields
                        .keys()
                        .map(|k| k.strip_suffix(SUBTOTAL_SUFFIX).filter(|b| !b.is_empty()).unwrap_or(k))
                        .for_each(&mut push),
                }
            }
            headers
        }
    }
}
