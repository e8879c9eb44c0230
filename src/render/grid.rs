//! Technology-neutral display grid.

use serde::{Deserialize, Serialize};

/// Style tag of a rendered row and its cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStyle {
    #[default]
    Normal,
    GroupHeader,
    Subtotal,
}

impl CellStyle {
    /// Group headers and subtotals are painted emphasized.
    pub fn is_emphasized(self) -> bool {
        !matches!(self, CellStyle::Normal)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    pub value: String,
    pub style: CellStyle,
}

impl GridCell {
    pub fn new(value: impl Into<String>, style: CellStyle) -> Self {
        Self {
            value: value.into(),
            style,
        }
    }

    pub fn blank(style: CellStyle) -> Self {
        Self::new(String::new(), style)
    }

    pub fn is_blank(&self) -> bool {
        self.value.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRow {
    pub style: CellStyle,
    pub cells: Vec<GridCell>,
}

impl GridRow {
    pub fn values(&self) -> Vec<&str> {
        self.cells.iter().map(|c| c.value.as_str()).collect()
    }
}

/// Result of rendering: either a table or the "no data" placeholder,
/// never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Grid {
    Empty { placeholder: String },
    Table { headers: Vec<String>, rows: Vec<GridRow> },
}

impl Grid {
    pub fn is_empty(&self) -> bool {
        matches!(self, Grid::Empty { .. })
    }

    pub fn headers(&self) -> &[String] {
        match self {
            Grid::Empty { .. } => &[],
            Grid::Table { headers, .. } => headers,
        }
    }

    pub fn rows(&self) -> &[GridRow] {
        match self {
            Grid::Empty { .. } => &[],
            Grid::Table { rows, .. } => rows,
        }
    }

    pub fn placeholder(&self) -> Option<&str> {
        match self {
            Grid::Empty { placeholder } => Some(placeholder),
            Grid::Table { .. } => None,
        }
    }

    /// Cell text only, row by row.
    pub fn to_values(&self) -> Vec<Vec<String>> {
        self.rows()
            .iter()
            .map(|row| row.cells.iter().map(|c| c.value.clone()).collect())
            .collect()
    }
}
