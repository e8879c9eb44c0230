#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use reportgrid::report::{
        ExportFormat, Filter, FilterOperator, QueryConfig, ReportDefinition, ResultRow,
    };
    use reportgrid::rpc::protocol::ResponseEnvelope;
    use reportgrid::rpc::{ReportClient, RpcError, RpcResult, Transport};
    use serde_json::{json, Value};

    /// Answers each method with a canned response and records every call.
    #[derive(Default)]
    struct ScriptedTransport {
        responses: HashMap<String, Value>,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl ScriptedTransport {
        fn answer(mut self, method: &str, response: Value) -> Self {
            self.responses.insert(method.to_string(), response);
            self
        }

        fn calls(&self) -> Vec<(String, Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn call(&self, method: &str, params: Value) -> RpcResult<ResponseEnvelope> {
            self.calls
                .lock()
                .unwrap()
                .push((method.to_string(), params));
            match self.responses.get(method) {
                Some(response) => serde_json::from_value(response.clone())
                    .map_err(RpcError::DeserializeFailed),
                None => Err(RpcError::TransportClosed),
            }
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn client(transport: ScriptedTransport) -> (ReportClient, Arc<ScriptedTransport>) {
        let transport = Arc::new(transport);
        (ReportClient::new(transport.clone(), "jmit_report_builder.api"), transport)
    }

    #[tokio::test]
    async fn test_execute_query_sends_json_string_config() {
        let (client, transport) = client(ScriptedTransport::default().answer(
            "jmit_report_builder.api.query_engine.execute_query",
            json!({
                "success": true,
                "data": [
                    {"region": "EU", "amount": 10},
                    {"_type": "SUBTOTAL", "amount_subtotal": 10}
                ],
                "count": 2
            }),
        ));

        let config = QueryConfig::new("SELECT region, amount FROM sales")
            .group_by("region")
            .filter(Filter::new("amount", FilterOperator::Gt, "5"));
        let response = client.execute_query(&config).await.unwrap();

        assert_eq!(response.count, Some(2));
        assert_eq!(response.data.len(), 2);
        assert!(matches!(response.data[1], ResultRow::Subtotal(_)));

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        let sent = calls[0].1["query_config"].as_str().unwrap();
        let decoded: QueryConfig = serde_json::from_str(sent).unwrap();
        assert_eq!(decoded, config);
    }

    #[tokio::test]
    async fn test_failure_envelope_surfaces_server_message() {
        let (client, _) = client(ScriptedTransport::default().answer(
            "jmit_report_builder.api.report.get_report",
            json!({"success": false, "message": "Report Missing not found"}),
        ));

        let err = client.get_report("Missing").await.unwrap_err();
        assert!(matches!(err, RpcError::Remote { .. }));
        assert_eq!(err.user_message(), "Report Missing not found");
    }

    #[tokio::test]
    async fn test_bad_rows_are_a_row_error() {
        let (client, _) = client(ScriptedTransport::default().answer(
            "jmit_report_builder.api.query_engine.preview_query",
            json!({"success": true, "data": [{"_type": "BANNER"}], "total_count": 1}),
        ));

        let err = client.preview_query("SELECT 1").await.unwrap_err();
        assert!(matches!(err, RpcError::Rows(_)));
    }

    #[tokio::test]
    async fn test_create_report_params() {
        let (client, transport) = client(ScriptedTransport::default().answer(
            "jmit_report_builder.api.report.create_report",
            json!({"success": true, "report_name": "REP-0001", "message": "Report created successfully"}),
        ));

        let created = client
            .create_report(&ReportDefinition::new("Sales", "SELECT 1"))
            .await
            .unwrap();
        assert_eq!(created.report_name.as_deref(), Some("REP-0001"));

        let sent = transport.calls()[0].1["report_config"].as_str().unwrap().to_string();
        let definition: ReportDefinition = serde_json::from_str(&sent).unwrap();
        assert_eq!(definition.report_name, "Sales");
    }

    #[tokio::test]
    async fn test_columns_batch_keeps_order_and_errors() {
        let (client, _) = client(ScriptedTransport::default().answer(
            "jmit_report_builder.api.query_engine.get_table_columns",
            json!({
                "success": true,
                "data": [{"COLUMN_NAME": "id", "DATA_TYPE": "int", "IS_NULLABLE": "NO"}]
            }),
        ));

        let tables = vec!["customers".to_string(), "orders".to_string()];
        let results = client.get_columns_batch(&tables).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "customers");
        assert_eq!(results[1].0, "orders");
        let columns = results[0].1.as_ref().unwrap();
        assert_eq!(columns[0].name, "id");
        assert!(!columns[0].is_nullable);
    }

    #[tokio::test]
    async fn test_export_routes_by_format() {
        let (client, transport) = client(
            ScriptedTransport::default()
                .answer(
                    "jmit_report_builder.api.export.export_to_csv",
                    json!({"success": true, "file_type": "csv", "content": "a\n1\n"}),
                )
                .answer(
                    "jmit_report_builder.api.export.export_to_excel",
                    json!({"success": true, "file_type": "excel", "filename": "Sales.xlsx"}),
                ),
        );
        let rows = vec![ResultRow::data([("a", 1i64)])];

        let csv = client.export(ExportFormat::Csv, "Sales", &rows).await.unwrap();
        assert_eq!(csv.content.as_deref(), Some("a\n1\n"));
        let excel = client.export(ExportFormat::Excel, "Sales", &rows).await.unwrap();
        assert_eq!(excel.filename.as_deref(), Some("Sales.xlsx"));

        let calls = transport.calls();
        assert_eq!(calls[0].1["report_name"], "Sales");
        assert_eq!(calls[0].1["data"], r#"[{"a":1}]"#);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_retriable() {
        let (client, _) = client(ScriptedTransport::default());
        let err = client.get_available_tables().await.unwrap_err();
        assert!(err.is_retriable());
        assert_eq!(err.user_message(), "The report server could not be reached");
    }
}
