//! HTML table painter.

use std::fmt::Write;

use super::grid::{CellStyle, Grid, GridRow};

/// CSS classes of the painted table.
pub const DEFAULT_TABLE_CLASS: &str = "table table-striped table-hover";

/// Paint a grid as an HTML fragment.
pub fn to_html(grid: &Grid) -> String {
    to_html_with_class(grid, DEFAULT_TABLE_CLASS)
}

pub fn to_html_with_class(grid: &Grid, table_class: &str) -> String {
    let (headers, rows) = match grid {
        Grid::Empty { placeholder } => return format!("<p>{}</p>", escape(placeholder)),
        Grid::Table { headers, rows } => (headers, rows),
    };

    let mut html = String::new();
    let _ = write!(html, "<table class=\"{}\"><thead><tr>", escape(table_class));
    for header in headers {
        let _ = write!(html, "<th>{}</th>", escape(header));
    }
    html.push_str("</tr></thead><tbody>");
    for row in rows {
        paint_row(&mut html, row);
    }
    html.push_str("</tbody></table>");
    html
}

fn paint_row(html: &mut String, row: &GridRow) {
    match row_class(row.style) {
        Some(class) => {
            let _ = write!(html, "<tr class=\"{class}\">");
        }
        None => html.push_str("<tr>"),
    }
    for cell in &row.cells {
        // Subtotal cells are always bold; group headers only where keyed.
        let strong = match cell.style {
            CellStyle::Subtotal => true,
            CellStyle::GroupHeader => !cell.is_blank(),
            CellStyle::Normal => false,
        };
        if strong {
            let _ = write!(html, "<td><strong>{}</strong></td>", escape(&cell.value));
        } else {
            let _ = write!(html, "<td>{}</td>", escape(&cell.value));
        }
    }
    html.push_str("</tr>");
}

fn row_class(style: CellStyle) -> Option<&'static str> {
    match style {
        CellStyle::Normal => None,
        CellStyle::GroupHeader => Some("group-header"),
        CellStyle::Subtotal => Some("subtotal"),
    }
}

/// Escape text for element content and double-quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_subtotal_cells_stay_bold() {
        use crate::render::render;
        use crate::report::ResultRow;

        let rows = vec![
            ResultRow::data([("region", "EU"), ("amount", "5")]),
            ResultRow::group_header([("region", "EU")]),
            ResultRow::subtotal([("amount", 5i64)]),
        ];
        let html = to_html(&render(&rows));
        assert!(html.contains(
            "<tr class=\"group-header\"><td><strong>EU</strong></td><td></td></tr>"
        ));
        assert!(html.contains(
            "<tr class=\"subtotal\"><td><strong></strong></td><td><strong>5</strong></td></tr>"
        ));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>\"A&B\"</b>"), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
    }
}
