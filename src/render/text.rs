//! Fixed-width text painter for terminals.

use super::grid::Grid;

const SEPARATOR: &str = " | ";

/// Paint a grid as aligned text; the placeholder paints as its message.
///
/// Trailing padding is trimmed from every line.
pub fn to_text(grid: &Grid) -> String {
    let (headers, rows) = match grid {
        Grid::Empty { placeholder } => return placeholder.clone(),
        Grid::Table { headers, rows } => (headers, rows),
    };

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(&row.cells) {
            *width = (*width).max(cell.value.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(line(headers.iter().map(String::as_str), &widths));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in rows {
        lines.push(line(row.cells.iter().map(|c| c.value.as_str()), &widths));
    }
    lines.join("\n")
}

fn line<'a>(values: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = values
        .zip(widths)
        .map(|(value, width)| format!("{value:<width$}"))
        .collect();
    padded.join(SEPARATOR).trim_end().to_string()
}
