//! Summary statistics over a result set.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::row::{CellValue, ResultRow};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericFieldStats {
    pub field: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub sum: f64,
    pub count: usize,
    pub avg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextFieldStats {
    pub field: String,
    pub unique_values: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportStatistics {
    pub total_rows: usize,
    pub data_rows: usize,
    pub generated_at: DateTime<Utc>,
    pub numeric_fields: Vec<NumericFieldStats>,
    pub text_fields: Vec<TextFieldStats>,
}

impl ReportStatistics {
    /// Compute statistics; `None` for an empty result.
    ///
    /// Fields are classified from the first row's value. Aggregates cover
    /// data rows only; a missing or null numeric value counts as zero.
    pub fn compute(rows: &[ResultRow]) -> Option<Self> {
        let first = rows.first()?;

        let mut numeric_fields = Vec::new();
        let mut text_fields = Vec::new();
        for (field, value) in first.fields().iter() {
            if value.as_f64().is_some() {
                numeric_fields.push(NumericFieldStats {
                    field: field.to_string(),
                    min: None,
                    max: None,
                    sum: 0.0,
                    count: 0,
                    avg: None,
                });
            } else {
                text_fields.push(TextFieldStats {
                    field: field.to_string(),
                    unique_values: BTreeSet::new(),
                });
            }
        }

        let data = rows.iter().filter_map(|row| match row {
            ResultRow::Data(data) => Some(&data.fields),
            _ => None,
        });

        let mut data_rows = 0;
        for fields in data {
            data_rows += 1;

            for stats in &mut numeric_fields {
                let value = match fields.get(&stats.field) {
                    None | Some(CellValue::Null) => Some(0.0),
                    Some(v) => v.as_f64(),
                };
                // Non-numeric values in a numeric column are skipped.
                let Some(value) = value else { continue };
                stats.sum += value;
                stats.count += 1;
                stats.min = Some(stats.min.map_or(value, |m| m.min(value)));
                stats.max = Some(stats.max.map_or(value, |m| m.max(value)));
            }

            for stats in &mut text_fields {
                if let Some(value) = fields.get(&stats.field) {
                    stats.unique_values.insert(value.to_string());
                }
            }
        }

        for stats in &mut numeric_fields {
            if stats.count > 0 {
                stats.avg = Some(stats.sum / stats.count as f64);
            }
        }

        Some(Self {
            total_rows: rows.len(),
            data_rows,
            generated_at: Utc::now(),
            numeric_fields,
            text_fields,
        })
    }

    pub fn numeric(&self, field: &str) -> Option<&NumericFieldStats> {
        self.numeric_fields.iter().find(|s| s.field == field)
    }

    pub fn text(&self, field: &str) -> Option<&TextFieldStats> {
        self.text_fields.iter().find(|s| s.field == field)
    }
}
