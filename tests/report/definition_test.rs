#[cfg(test)]
mod tests {
    use reportgrid::report::{
        validate_sql_query, Aggregation, Alignment, DefinitionError, ExportFormat, FilterOperator,
        QueryConfig, QueryType, ReportDefinition, SortOrder,
    };
    use serde_json::json;

    fn stored_report() -> ReportDefinition {
        serde_json::from_value(json!({
            "name": "REP-0007",
            "doctype": "Report Definition",
            "owner": "admin@example.com",
            "modified": "2024-03-01 10:00:00",
            "report_name": "Regional Sales",
            "data_source": "erp",
            "query_type": "SQL",
            "report_query": "  select region, amount from sales",
            "columns": [
                {"field_name": "region", "display_label": "Region"},
                {"field_name": "amount", "field_type": "Currency", "alignment": "Right"}
            ],
            "grouping_fields": [{"field_name": "region", "sort_order": "Descending"}],
            "filters": [{"field_name": "amount", "operator": ">", "filter_value": "100"}],
            "subtotal_config": [{"field": "amount", "operation": "SUM"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_stored_report_decodes() {
        let report = stored_report();
        assert_eq!(report.name.as_deref(), Some("REP-0007"));
        assert!(report.enabled);
        assert_eq!(report.columns[0].label(), "Region");
        assert_eq!(report.columns[1].label(), "amount");
        assert_eq!(report.grouping_fields[0].sort_order, SortOrder::Descending);
        assert_eq!(report.filters[0].operator, FilterOperator::Gt);
        assert_eq!(report.filters[0].filter_type, "Static");
        assert!(report.validate().is_ok());
    }

    #[test]
    fn test_to_query_config() {
        let config = stored_report().to_query_config();
        assert_eq!(config.query_type, QueryType::Sql);
        assert_eq!(config.grouping_fields, vec!["region"]);
        assert_eq!(config.filters[0].field, "amount");
        assert_eq!(config.filters[0].value, "100");
        assert_eq!(config.subtotal_fields[0].operation, Aggregation::Sum);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rules() {
        assert_eq!(
            ReportDefinition::new("  ", "SELECT 1").validate(),
            Err(DefinitionError::MissingName)
        );
        assert_eq!(
            ReportDefinition::new("A", "   ").validate(),
            Err(DefinitionError::MissingQuery)
        );
        assert_eq!(
            ReportDefinition::new("A", "CALL refresh()").validate(),
            Err(DefinitionError::WrongStatement {
                query_type: QueryType::Sql,
                expected: "SELECT",
            })
        );

        let mut procedure = ReportDefinition::new("A", "call refresh()");
        procedure.query_type = QueryType::StoredProcedure;
        assert!(procedure.validate().is_ok());

        let mut view = ReportDefinition::new("A", "sales_view");
        view.query_type = QueryType::View;
        assert!(view.validate().is_ok());
    }

    #[test]
    fn test_validate_sql_query() {
        assert!(validate_sql_query("SELECT * FROM t").is_ok());
        assert!(validate_sql_query("  call proc()").is_ok());
        assert_eq!(
            validate_sql_query("drop table t"),
            Err(DefinitionError::ForbiddenStatement("DROP"))
        );
        assert_eq!(
            validate_sql_query("UPDATE t SET a = 1"),
            Err(DefinitionError::ForbiddenStatement("UPDATE"))
        );
        assert_eq!(validate_sql_query("WITH x AS (SELECT 1)"), Err(DefinitionError::NotAQuery));
    }

    #[test]
    fn test_clone_as_clears_server_identity() {
        let copy = stored_report().clone_as("Regional Sales v2");
        assert_eq!(copy.report_name, "Regional Sales v2");
        assert!(copy.name.is_none());
        assert!(copy.extra.is_empty());
        assert_eq!(copy.columns.len(), 2);

        let value = serde_json::to_value(&copy).unwrap();
        assert!(value.get("name").is_none());
        assert!(value.get("doctype").is_none());
    }

    #[test]
    fn test_null_subtotal_config() {
        let report: ReportDefinition = serde_json::from_value(json!({
            "report_name": "A",
            "report_query": "SELECT 1",
            "subtotal_config": null
        }))
        .unwrap();
        assert!(report.subtotal_config.is_empty());
    }

    #[test]
    fn test_query_config_validation() {
        let config = QueryConfig::new("SELECT 1").group_by("");
        assert!(config.validate().is_err());
        assert!(QueryConfig::new("").validate().is_err());
    }

    #[test]
    fn test_export_format_parsing() {
        assert_eq!("PDF".parse::<ExportFormat>(), Ok(ExportFormat::Pdf));
        assert_eq!("excel".parse::<ExportFormat>(), Ok(ExportFormat::Excel));
        assert_eq!("Csv".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert!("docx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_server_document_shape_decodes() {
        // Check fields as 0/1, unset fields as null or "".
        let report: ReportDefinition = serde_json::from_value(json!({
            "name": "REP-0009",
            "doctype": "Report Definition",
            "docstatus": 0,
            "report_name": "Sales",
            "description": null,
            "data_source": null,
            "query_type": "SQL",
            "report_query": "SELECT region, amount FROM sales",
            "enabled": 1,
            "columns": [
                {"name": "c1", "parent": "REP-0009", "idx": 1, "field_name": "region",
                 "display_label": null, "width": null, "alignment": "", "visible": 1},
                {"name": "c2", "parent": "REP-0009", "idx": 2, "field_name": "amount",
                 "alignment": "Right", "visible": 0}
            ],
            "grouping_fields": [{"field_name": "region", "sort_order": null}],
            "filters": [
                {"field_name": "amount", "operator": ">", "filter_value": null,
                 "filter_type": null, "mandatory": 0},
                {"field_name": "region", "operator": "", "filter_value": "EU",
                 "filter_type": "Static", "mandatory": 1}
            ],
            "subtotal_config": null
        }))
        .unwrap();

        assert!(report.enabled);
        assert!(report.columns[0].visible);
        assert_eq!(report.columns[0].alignment, None);
        assert!(!report.columns[1].visible);
        assert_eq!(report.columns[1].alignment, Some(Alignment::Right));
        assert_eq!(report.grouping_fields[0].sort_order, SortOrder::Ascending);
        assert_eq!(report.filters[0].filter_value, "");
        assert_eq!(report.filters[0].filter_type, "Static");
        assert!(!report.filters[0].mandatory);
        assert_eq!(report.filters[1].operator, FilterOperator::Eq);
        assert!(report.filters[1].mandatory);
        assert!(report.subtotal_config.is_empty());
        assert!(report.validate().is_ok());
    }

    #[test]
    fn test_disabled_report_and_null_query() {
        let report: ReportDefinition = serde_json::from_value(json!({
            "report_name": "Draft",
            "report_query": null,
            "query_type": null,
            "enabled": 0
        }))
        .unwrap();
        assert!(!report.enabled);
        assert_eq!(report.query_type, QueryType::Sql);
        assert_eq!(report.validate(), Err(DefinitionError::MissingQuery));
    }
}
