//! Report designer form state.
//!
//! Holds what the user typed into the designer (query, query type, column
//! list, grouping rows, filter rows) and packages it into a [`QueryConfig`]
//! or a draft [`ReportDefinition`]. Rows may be half-filled while editing;
//! blank rows are skipped when packaging.

use chrono::{DateTime, Utc};

use crate::report::{
    ColumnSpec, ConfigError, Filter, FilterOperator, FilterSpec, GroupingSpec, QueryConfig,
    QueryType, ReportDefinition, SortOrder,
};

/// One grouping row of the form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupingEntry {
    pub field: String,
    pub sort_order: SortOrder,
}

/// One filter row of the form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterEntry {
    pub field: String,
    pub operator: FilterOperator,
    pub value: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReportDesigner {
    pub query: String,
    pub query_type: QueryType,
    columns: Vec<String>,
    grouping: Vec<GroupingEntry>,
    filters: Vec<FilterEntry>,
}

impl ReportDesigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a saved definition into the form.
    pub fn from_definition(definition: &ReportDefinition) -> Self {
        Self {
            query: definition.report_query.clone(),
            query_type: definition.query_type,
            columns: definition
                .columns
                .iter()
                .map(|c| c.field_name.clone())
                .collect(),
            grouping: definition
                .grouping_fields
                .iter()
                .map(|g| GroupingEntry {
                    field: g.field_name.clone(),
                    sort_order: g.sort_order,
                })
                .collect(),
            filters: definition
                .filters
                .iter()
                .map(|f| FilterEntry {
                    field: f.field_name.clone(),
                    operator: f.operator,
                    value: f.filter_value.clone(),
                })
                .collect(),
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>, query_type: QueryType) {
        self.query = query.into();
        self.query_type = query_type;
    }

    // ------------------------------------------------------------------------
    // Rows
    // ------------------------------------------------------------------------

    pub fn add_column(&mut self, field: impl Into<String>) -> usize {
        self.columns.push(field.into());
        self.columns.len() - 1
    }

    pub fn remove_column(&mut self, index: usize) -> Option<String> {
        (index < self.columns.len()).then(|| self.columns.remove(index))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn add_grouping(&mut self, field: impl Into<String>, sort_order: SortOrder) -> usize {
        self.grouping.push(GroupingEntry {
            field: field.into(),
            sort_order,
        });
        self.grouping.len() - 1
    }

    pub fn remove_grouping(&mut self, index: usize) -> Option<GroupingEntry> {
        (index < self.grouping.len()).then(|| self.grouping.remove(index))
    }

    pub fn grouping_entries(&self) -> &[GroupingEntry] {
        &self.grouping
    }

    pub fn add_filter(
        &mut self,
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> usize {
        self.filters.push(FilterEntry {
            field: field.into(),
            operator,
            value: value.into(),
        });
        self.filters.len() - 1
    }

    pub fn remove_filter(&mut self, index: usize) -> Option<FilterEntry> {
        (index < self.filters.len()).then(|| self.filters.remove(index))
    }

    pub fn filter_entries(&self) -> &[FilterEntry] {
        &self.filters
    }

    // ------------------------------------------------------------------------
    // Packaging
    // ------------------------------------------------------------------------

    /// Non-blank grouping fields in form order.
    pub fn grouping_fields(&self) -> Vec<String> {
        self.grouping
            .iter()
            .map(|g| g.field.trim())
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Filter rows with a non-blank field.
    pub fn filters(&self) -> Vec<Filter> {
        self.filters
            .iter()
            .filter(|f| !f.field.trim().is_empty())
            .map(|f| Filter::new(f.field.trim(), f.operator, f.value.clone()))
            .collect()
    }

    pub fn query_config(&self) -> Result<QueryConfig, ConfigError> {
        if self.query.trim().is_empty() {
            return Err(ConfigError::EmptyQuery);
        }
        let config = QueryConfig {
            query: self.query.clone(),
            query_type: self.query_type,
            grouping_fields: self.grouping_fields(),
            subtotal_fields: Vec::new(),
            filters: self.filters(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Unsaved definition named after the creation instant.
    pub fn draft_definition(&self, now: DateTime<Utc>) -> ReportDefinition {
        let mut definition = ReportDefinition::new(
            format!("New Report {}", now.timestamp_millis()),
            self.query.clone(),
        );
        definition.query_type = self.query_type;
        definition.columns = self
            .columns
            .iter()
            .filter(|c| !c.trim().is_empty())
            .map(|c| ColumnSpec::new(c.trim()))
            .collect();
        definition.grouping_fields = self
            .grouping
            .iter()
            .filter(|g| !g.field.trim().is_empty())
            .map(|g| GroupingSpec {
                field_name: g.field.trim().to_string(),
                sort_order: g.sort_order,
            })
            .collect();
        definition.filters = self
            .filters()
            .into_iter()
            .map(|f| FilterSpec {
                field_name: f.field,
                operator: f.operator,
                filter_value: f.value,
                filter_type: "Static".to_string(),
                mandatory: false,
            })
            .collect();
        definition
    }
}

/// Name under which an ad-hoc result is exported.
pub fn export_report_name(now: DateTime<Utc>) -> String {
    format!("CustomReport_{}", now.timestamp_millis())
}
