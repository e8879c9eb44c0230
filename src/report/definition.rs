//! Saved report definitions (the "report descriptor").

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::query::{Filter, FilterOperator, QueryConfig, QueryType, SubtotalField};

/// Statements a report query may never start with.
const FORBIDDEN_STATEMENTS: &[&str] = &["DROP", "DELETE", "TRUNCATE", "INSERT", "UPDATE", "ALTER"];

/// Server document fields that belong to the stored copy, not the design.
const SERVER_OWNED_FIELDS: &[&str] = &["owner", "creation", "modified", "modified_by", "docstatus", "idx"];

/// Validation failures of a report definition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    #[error("report name is required")]
    MissingName,

    #[error("report query is required")]
    MissingQuery,

    #[error("{query_type} query must start with {expected}")]
    WrongStatement {
        query_type: QueryType,
        expected: &'static str,
    },

    #[error("query cannot start with {0}")]
    ForbiddenStatement(&'static str),

    #[error("query must start with SELECT or CALL")]
    NotAQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Display settings of one report column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub field_name: String,
    #[serde(default)]
    pub display_label: Option<String>,
    /// Free-form type hint: `Text`, `Number`, `Currency`, `Date`, ...
    #[serde(default)]
    pub field_type: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default, deserialize_with = "blank_as_default")]
    pub alignment: Option<Alignment>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default = "default_true", deserialize_with = "deserialize_check_or_true")]
    pub visible: bool,
}

impl ColumnSpec {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            display_label: None,
            field_type: None,
            width: None,
            alignment: None,
            format: None,
            visible: true,
        }
    }

    /// Label to show for the column; falls back to the field name.
    pub fn label(&self) -> &str {
        self.display_label.as_deref().unwrap_or(&self.field_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingSpec {
    pub field_name: String,
    #[serde(default, deserialize_with = "blank_as_default")]
    pub sort_order: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub field_name: String,
    #[serde(default, deserialize_with = "blank_as_default")]
    pub operator: FilterOperator,
    #[serde(default, deserialize_with = "blank_as_default")]
    pub filter_value: String,
    #[serde(default = "default_filter_type", deserialize_with = "deserialize_filter_type")]
    pub filter_type: String,
    #[serde(default, deserialize_with = "deserialize_check")]
    pub mandatory: bool,
}

/// A saved report as stored by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDefinition {
    /// Server document identity; absent until saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub report_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub data_source: Option<String>,
    #[serde(default, deserialize_with = "blank_as_default")]
    pub query_type: QueryType,
    #[serde(default, deserialize_with = "blank_as_default")]
    pub report_query: String,
    #[serde(default = "default_true", deserialize_with = "deserialize_check_or_true")]
    pub enabled: bool,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub grouping_fields: Vec<GroupingSpec>,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    #[serde(default, deserialize_with = "deserialize_subtotal_config")]
    pub subtotal_config: Vec<SubtotalField>,
    /// Any other document fields, kept so an update round-trips them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_true() -> bool {
    true
}

fn default_filter_type() -> String {
    "Static".to_string()
}

/// Check fields arrive as `0`/`1` from the server, as booleans from files.
fn check_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Flag(bool),
        Int(i64),
        Text(String),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Flag(b) => Some(b),
        Raw::Int(n) => Some(n != 0),
        Raw::Text(s) => match s.trim() {
            "" => None,
            "0" => Some(false),
            "1" => Some(true),
            other => Some(other.eq_ignore_ascii_case("true")),
        },
        Raw::Null(()) => None,
    })
}

fn deserialize_check<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(check_flag(deserializer)?.unwrap_or(false))
}

fn deserialize_check_or_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(check_flag(deserializer)?.unwrap_or(true))
}

/// Unset fields arrive as `null` or `""`; both mean the default.
fn blank_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(T::default()),
        Value::String(s) if s.is_empty() => Ok(T::default()),
        value => serde_json::from_value(value).map_err(serde::de::Error::custom),
    }
}

fn deserialize_filter_type<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let filter_type: String = blank_as_default(deserializer)?;
    Ok(if filter_type.is_empty() {
        default_filter_type()
    } else {
        filter_type
    })
}

/// Accept the subtotal config as an array, a JSON-encoded array string, or null.
fn deserialize_subtotal_config<'de, D>(deserializer: D) -> Result<Vec<SubtotalField>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<SubtotalField>),
        Encoded(String),
        Null(()),
    }

    match Raw::deserialize(deserializer)? {
        Raw::List(fields) => Ok(fields),
        Raw::Encoded(s) if s.trim().is_empty() => Ok(Vec::new()),
        Raw::Encoded(s) => serde_json::from_str(&s).map_err(serde::de::Error::custom),
        Raw::Null(()) => Ok(Vec::new()),
    }
}

impl ReportDefinition {
    pub fn new(report_name: impl Into<String>, report_query: impl Into<String>) -> Self {
        Self {
            name: None,
            report_name: report_name.into(),
            description: None,
            data_source: None,
            query_type: QueryType::Sql,
            report_query: report_query.into(),
            enabled: true,
            columns: Vec::new(),
            grouping_fields: Vec::new(),
            filters: Vec::new(),
            subtotal_config: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Check the definition the way the server does before saving.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.report_name.trim().is_empty() {
            return Err(DefinitionError::MissingName);
        }
        let query = self.report_query.trim();
        if query.is_empty() {
            return Err(DefinitionError::MissingQuery);
        }

        let expected = match self.query_type {
            QueryType::Sql => Some("SELECT"),
            QueryType::StoredProcedure => Some("CALL"),
            QueryType::View => None,
        };
        match expected {
            Some(keyword) if !starts_with_keyword(query, keyword) => {
                Err(DefinitionError::WrongStatement {
                    query_type: self.query_type,
                    expected: keyword,
                })
            }
            _ => Ok(()),
        }
    }

    /// Query config this definition describes.
    pub fn to_query_config(&self) -> QueryConfig {
        QueryConfig {
            query: self.report_query.clone(),
            query_type: self.query_type,
            grouping_fields: self
                .grouping_fields
                .iter()
                .map(|g| g.field_name.clone())
                .collect(),
            subtotal_fields: self.subtotal_config.clone(),
            filters: self
                .filters
                .iter()
                .map(|f| Filter::new(f.field_name.clone(), f.operator, f.filter_value.clone()))
                .collect(),
        }
    }

    /// Copy under a new name, dropping the server identity.
    pub fn clone_as(&self, new_name: impl Into<String>) -> Self {
        let mut copy = self.clone();
        copy.name = None;
        copy.report_name = new_name.into();
        copy.extra.retain(|k, _| !SERVER_OWNED_FIELDS.contains(&k.as_str()) && k != "doctype");
        copy
    }

    /// Column spec for `field`, if the definition declares one.
    pub fn column(&self, field: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.field_name == field)
    }
}

/// Reject destructive statements; require `SELECT` or `CALL`.
pub fn validate_sql_query(query: &str) -> Result<(), DefinitionError> {
    let query = query.trim();
    if let Some(&keyword) = FORBIDDEN_STATEMENTS
        .iter()
        .find(|k| starts_with_keyword(query, k))
    {
        return Err(DefinitionError::ForbiddenStatement(keyword));
    }
    if starts_with_keyword(query, "SELECT") || starts_with_keyword(query, "CALL") {
        Ok(())
    } else {
        Err(DefinitionError::NotAQuery)
    }
}

fn starts_with_keyword(query: &str, keyword: &str) -> bool {
    query
        .get(..keyword.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(keyword))
}
