//! Display formatting for typed report columns.

use chrono::NaiveDate;

use super::definition::ColumnSpec;
use super::row::CellValue;

/// Input layout of date values coming back from the server.
const WIRE_DATE: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellFormat {
    /// `$1,234.50`
    Currency { precision: usize },
    /// `12.50%`
    Percentage { precision: usize },
    /// chrono `strftime` pattern applied to a `YYYY-MM-DD` value.
    Date { pattern: String },
}

impl CellFormat {
    /// Format implied by a column's `field_type`, if any.
    pub fn for_column(column: &ColumnSpec) -> Option<Self> {
        let field_type = column.field_type.as_deref()?.trim().to_ascii_lowercase();
        match field_type.as_str() {
            "currency" => Some(CellFormat::Currency { precision: 2 }),
            "percent" | "percentage" => Some(CellFormat::Percentage { precision: 2 }),
            "date" => Some(CellFormat::Date {
                pattern: column
                    .format
                    .clone()
                    .filter(|p| p.contains('%'))
                    .unwrap_or_else(|| WIRE_DATE.to_string()),
            }),
            _ => None,
        }
    }

    /// Format a value; anything that does not fit the format is shown as-is.
    pub fn apply(&self, value: &CellValue) -> String {
        let formatted = match self {
            CellFormat::Currency { precision } => value.as_f64().map(|v| format_currency(v, *precision)),
            CellFormat::Percentage { precision } => {
                value.as_f64().map(|v| format_percentage(v, *precision))
            }
            CellFormat::Date { pattern } => match value {
                CellValue::Text(s) => format_date(s, pattern),
                _ => None,
            },
        };
        formatted.unwrap_or_else(|| value.to_string())
    }
}

/// `1234.5` -> `$1,234.50`; negatives keep the sign after the symbol.
pub fn format_currency(value: f64, precision: usize) -> String {
    let fixed = format!("{:.*}", precision, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    match frac_part {
        Some(frac) => format!("${sign}{grouped}.{frac}"),
        None => format!("${sign}{grouped}"),
    }
}

pub fn format_percentage(value: f64, precision: usize) -> String {
    format!("{:.*}%", precision, value)
}

/// Reformat a `YYYY-MM-DD` date; `None` when the input does not parse.
pub fn format_date(value: &str, pattern: &str) -> Option<String> {
    NaiveDate::parse_from_str(value.trim(), WIRE_DATE)
        .ok()
        .map(|date| date.format(pattern).to_string())
}
