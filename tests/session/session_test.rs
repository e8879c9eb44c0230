#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use reportgrid::render::to_text;
    use reportgrid::report::{ExportFormat, QueryConfig, ReportDefinition};
    use reportgrid::rpc::protocol::ResponseEnvelope;
    use reportgrid::rpc::{ReportClient, RpcResult, Transport};
    use reportgrid::session::{ReportSession, SessionError};
    use serde_json::{json, Value};

    /// A tiny in-memory report server.
    struct FakeServer;

    #[async_trait]
    impl Transport for FakeServer {
        async fn call(&self, method: &str, params: Value) -> RpcResult<ResponseEnvelope> {
            let method = method.trim_start_matches("api.");
            let response = match method {
                "report.get_report" => match params["report_name"].as_str() {
                    Some("Sales") => json!({
                        "success": true,
                        "data": {
                            "name": "REP-0001",
                            "report_name": "Sales",
                            "report_query": "SELECT region, amount FROM sales",
                            "columns": [{"field_name": "amount", "field_type": "Currency"}],
                            "grouping_fields": [{"field_name": "region"}]
                        }
                    }),
                    _ => json!({"success": false, "message": "Report not found"}),
                },
                "report.create_report" => {
                    json!({"success": true, "report_name": "REP-0002", "message": "Report created successfully"})
                }
                "query_engine.execute_query" => json!({
                    "success": true,
                    "data": [
                        {"_type": "GROUP_HEADER", "_group_key": {"region": "EU"}, "_record_count": 1},
                        {"region": "EU", "amount": 1200},
                        {"_type": "SUBTOTAL", "amount_subtotal": 1200}
                    ],
                    "count": 3
                }),
                "query_engine.preview_query" => json!({
                    "success": true,
                    "data": [{"n": 1}],
                    "total_count": 40
                }),
                "export.export_to_csv" => json!({
                    "success": true,
                    "file_type": "csv",
                    "content": params["data"].as_str().unwrap_or_default().to_string()
                }),
                _ => json!({"success": false, "message": format!("unknown method {method}")}),
            };
            Ok(serde_json::from_value(response).unwrap())
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    fn session() -> ReportSession {
        ReportSession::new(ReportClient::new(Arc::new(FakeServer), "api"))
    }

    #[tokio::test]
    async fn test_export_before_execute_fails() {
        let err = session().export(ExportFormat::Csv, "Sales").await.unwrap_err();
        assert!(matches!(err, SessionError::NoData));
    }

    #[tokio::test]
    async fn test_load_and_execute_current_applies_column_formats() {
        let session = session();
        let report = session.load_report("Sales").await.unwrap();
        assert_eq!(report.name.as_deref(), Some("REP-0001"));

        let grid = session.execute_current().await.unwrap();
        // The first row is a group header, so no columns are derived.
        assert!(grid.headers().is_empty());

        let stats = session.statistics().await.unwrap();
        assert_eq!(stats.total_rows, 3);
        assert_eq!(stats.data_rows, 1);
    }

    #[tokio::test]
    async fn test_execute_then_export() {
        let session = session();
        let grid = session
            .execute(&QueryConfig::new("SELECT region, amount FROM sales"))
            .await
            .unwrap();
        assert_eq!(grid.rows().len(), 3);

        let receipt = session.export(ExportFormat::Csv, "Sales").await.unwrap();
        let sent: Value = serde_json::from_str(receipt.content.as_deref().unwrap()).unwrap();
        assert_eq!(sent[0]["_type"], "GROUP_HEADER");
        assert_eq!(sent[2]["amount_subtotal"], 1200);
    }

    #[tokio::test]
    async fn test_preview_leaves_stored_result() {
        let session = session();
        session
            .execute(&QueryConfig::new("SELECT region, amount FROM sales"))
            .await
            .unwrap();

        let preview = session.preview("SELECT n FROM t").await.unwrap();
        assert_eq!(preview.total_count, Some(40));
        assert_eq!(to_text(&preview.grid), "n\n-\n1");
        assert_eq!(session.rows().await.map(|r| r.len()), Some(3));
    }

    #[tokio::test]
    async fn test_invalid_config_is_not_sent() {
        let err = session().execute(&QueryConfig::new(" ")).await.unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }

    #[tokio::test]
    async fn test_remote_failure_message() {
        let err = session().load_report("Nope").await.unwrap_err();
        assert_eq!(err.user_message(), "Report not found");
    }

    #[tokio::test]
    async fn test_create_report_becomes_current() {
        let session = session();
        let created = session
            .create_report(ReportDefinition::new("Margins", "SELECT 1"))
            .await
            .unwrap();
        assert_eq!(created.report_name.as_deref(), Some("REP-0002"));

        let current = session.current_report().await.unwrap();
        assert_eq!(current.name.as_deref(), Some("REP-0002"));
        assert_eq!(current.report_name, "Margins");
    }

    #[tokio::test]
    async fn test_only_latest_ticket_is_stored() {
        let session = session();
        let stale = session.begin();
        let fresh = session.begin();
        assert!(!session.is_current(stale));

        assert!(session.accept(fresh, Vec::new()).await);
        assert!(!session.accept(stale, Vec::new()).await);
    }
}
