#[cfg(test)]
mod tests {
    use reportgrid::report::{decode_rows, ReportStatistics};
    use serde_json::json;

    #[test]
    fn test_grouped_result_statistics() {
        let rows = decode_rows(&json!([
            {"region": "EU", "amount": 100, "active": true},
            {"_type": "GROUP_HEADER", "_group_key": {"region": "EU"}},
            {"region": "EU", "amount": "50", "active": false},
            {"region": "US", "amount": null, "active": true},
            {"_type": "SUBTOTAL", "amount_subtotal": 150}
        ]))
        .unwrap();

        let stats = ReportStatistics::compute(&rows).unwrap();
        assert_eq!(stats.total_rows, 5);
        assert_eq!(stats.data_rows, 3);

        let amount = stats.numeric("amount").unwrap();
        assert_eq!(amount.count, 3);
        assert_eq!(amount.sum, 150.0);
        assert_eq!(amount.min, Some(0.0));
        assert_eq!(amount.max, Some(100.0));
        assert_eq!(amount.avg, Some(50.0));

        let active = stats.numeric("active").unwrap();
        assert_eq!(active.sum, 2.0);

        let region = stats.text("region").unwrap();
        assert_eq!(
            region.unique_values.iter().collect::<Vec<_>>(),
            vec!["EU", "US"]
        );
        assert!(stats.numeric("region").is_none());
    }

    #[test]
    fn test_text_in_numeric_column_is_skipped() {
        let rows = decode_rows(&json!([
            {"amount": 10},
            {"amount": "n/a"},
            {"amount": 20}
        ]))
        .unwrap();

        let amount = ReportStatistics::compute(&rows).unwrap().numeric("amount").cloned().unwrap();
        assert_eq!(amount.count, 2);
        assert_eq!(amount.avg, Some(15.0));
    }
}
