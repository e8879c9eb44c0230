//! Query configuration sent to the report server's query engine.
//!
//! The server treats the config as opaque instructions; the only local
//! concern is that it is well formed before it goes over the wire.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors in a query configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("query cannot be empty")]
    EmptyQuery,

    #[error("grouping field {0} has no name")]
    EmptyGroupingField(usize),

    #[error("filter {0} has no field")]
    EmptyFilterField(usize),

    #[error("subtotal {0} has no field")]
    EmptySubtotalField(usize),

    #[error("unknown query type: {0}")]
    UnknownQueryType(String),

    #[error("unknown filter operator: {0}")]
    UnknownOperator(String),

    #[error("unknown aggregation: {0}")]
    UnknownAggregation(String),

    #[error("malformed filter {0:?}; expected \"<field> <operator> <value>\"")]
    MalformedFilter(String),
}

/// What kind of statement `query` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryType {
    #[default]
    Sql,
    StoredProcedure,
    View,
}

impl QueryType {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryType::Sql => "SQL",
            QueryType::StoredProcedure => "STORED_PROCEDURE",
            QueryType::View => "VIEW",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace([' ', '-'], "_").as_str() {
            "SQL" => Ok(QueryType::Sql),
            "STORED_PROCEDURE" | "PROCEDURE" => Ok(QueryType::StoredProcedure),
            "VIEW" => Ok(QueryType::View),
            _ => Err(ConfigError::UnknownQueryType(s.to_string())),
        }
    }
}

/// Comparison applied by a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterOperator {
    #[default]
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "LIKE")]
    Like,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 5] = [
        FilterOperator::Eq,
        FilterOperator::Ne,
        FilterOperator::Gt,
        FilterOperator::Lt,
        FilterOperator::Like,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterOperator::Eq => "=",
            FilterOperator::Ne => "!=",
            FilterOperator::Gt => ">",
            FilterOperator::Lt => "<",
            FilterOperator::Like => "LIKE",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownOperator(s.to_string()))
    }
}

/// A single `field <op> value` condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    #[serde(default)]
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: String,
}

impl Filter {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

impl FromStr for Filter {
    type Err = ConfigError;

    /// Parse `"<field> <operator> <value>"`; the value may contain spaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ConfigError::MalformedFilter(s.to_string());
        let mut parts = s.trim().splitn(3, char::is_whitespace);
        let field = parts.next().filter(|f| !f.is_empty()).ok_or_else(malformed)?;
        let operator = parts.next().ok_or_else(malformed)?.parse()?;
        let value = parts.next().unwrap_or("").trim();
        Ok(Filter::new(field, operator, value))
    }
}

/// Aggregate computed for a subtotal column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Aggregation {
    #[default]
    Sum,
    Avg,
    Count,
    Max,
    Min,
}

impl FromStr for Aggregation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUM" => Ok(Aggregation::Sum),
            "AVG" | "AVERAGE" => Ok(Aggregation::Avg),
            "COUNT" => Ok(Aggregation::Count),
            "MAX" => Ok(Aggregation::Max),
            "MIN" => Ok(Aggregation::Min),
            _ => Err(ConfigError::UnknownAggregation(s.to_string())),
        }
    }
}

/// A column to aggregate at the end of each group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtotalField {
    pub field: String,
    #[serde(default)]
    pub operation: Aggregation,
}

impl FromStr for SubtotalField {
    type Err = ConfigError;

    /// Parse `"field"` or `"field:OP"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, operation) = match s.split_once(':') {
            Some((field, op)) => (field, op.parse()?),
            None => (s, Aggregation::Sum),
        };
        Ok(SubtotalField {
            field: field.trim().to_string(),
            operation,
        })
    }
}

/// The user-assembled description of what to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryConfig {
    pub query: String,
    #[serde(default)]
    pub query_type: QueryType,
    #[serde(default)]
    pub grouping_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtotal_fields: Vec<SubtotalField>,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

impl QueryConfig {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, query_type: QueryType) -> Self {
        self.query_type = query_type;
        self
    }

    pub fn group_by(mut self, field: impl Into<String>) -> Self {
        self.grouping_fields.push(field.into());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn subtotal(mut self, field: impl Into<String>, operation: Aggregation) -> Self {
        self.subtotal_fields.push(SubtotalField {
            field: field.into(),
            operation,
        });
        self
    }

    /// Check the config is complete enough to send.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.query.trim().is_empty() {
            return Err(ConfigError::EmptyQuery);
        }
        if let Some(i) = self.grouping_fields.iter().position(|f| f.trim().is_empty()) {
            return Err(ConfigError::EmptyGroupingField(i));
        }
        if let Some(i) = self.filters.iter().position(|f| f.field.trim().is_empty()) {
            return Err(ConfigError::EmptyFilterField(i));
        }
        if let Some(i) = self.subtotal_fields.iter().position(|f| f.field.trim().is_empty()) {
            return Err(ConfigError::EmptySubtotalField(i));
        }
        Ok(())
    }

    /// JSON string form carried in the `query_config` request field.
    pub fn to_wire(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
