#[cfg(test)]
mod tests {
    use reportgrid::report::{decode_rows, encode_rows, CellValue, ResultRow, RowError, RowKind};
    use serde_json::json;

    #[test]
    fn test_discriminator_values() {
        let rows = decode_rows(&json!([
            {"a": 1},
            {"_type": null, "a": 2},
            {"_type": "GROUP_HEADER", "_group_key": {"a": "x"}},
            {"_type": "SUBTOTAL", "a_subtotal": 3}
        ]))
        .unwrap();

        let kinds: Vec<RowKind> = rows.iter().map(ResultRow::kind).collect();
        assert_eq!(
            kinds,
            vec![RowKind::Data, RowKind::Data, RowKind::GroupHeader, RowKind::Subtotal]
        );
    }

    #[test]
    fn test_unknown_type_names_the_row() {
        let err = decode_rows(&json!([{"a": 1}, {"_type": "FOOTER"}])).unwrap_err();
        assert_eq!(
            err,
            RowError::AtRow {
                index: 1,
                source: Box::new(RowError::UnknownRowType("FOOTER".to_string())),
            }
        );
        assert_eq!(err.to_string(), "row 1: unknown row type \"FOOTER\"");
    }

    #[test]
    fn test_non_object_row_and_non_array_result() {
        assert!(matches!(
            decode_rows(&json!([1])),
            Err(RowError::AtRow { index: 0, .. })
        ));
        assert_eq!(
            decode_rows(&json!({"a": 1})),
            Err(RowError::NotAnArray("an object"))
        );
        assert_eq!(decode_rows(&json!(null)), Ok(Vec::new()));
    }

    #[test]
    fn test_missing_group_key_decodes_empty() {
        let rows = decode_rows(&json!([
            {"_type": "GROUP_HEADER"},
            {"_type": "GROUP_HEADER", "_group_key": "EU"}
        ]))
        .unwrap();

        for row in &rows {
            match row {
                ResultRow::GroupHeader(header) => assert!(header.group_key.is_empty()),
                other => panic!("expected group header, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_key_order_preserved() {
        let rows = decode_rows(&json!([{"zeta": 1, "alpha": 2, "mid": 3}])).unwrap();
        let keys: Vec<&str> = rows[0].column_keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_nested_values_keep_json_text() {
        let rows = decode_rows(&json!([{"tags": ["a", "b"], "meta": {"k": 1}}])).unwrap();
        let fields = rows[0].fields();
        assert_eq!(fields.get("tags"), Some(&CellValue::text("[\"a\",\"b\"]")));
        assert_eq!(fields.get("meta"), Some(&CellValue::text("{\"k\":1}")));
    }

    #[test]
    fn test_reencode_matches_wire_shape() {
        let wire = json!([
            {"region": "EU", "amount": 10.5},
            {"_type": "GROUP_HEADER", "_group_key": {"region": "EU"}, "_record_count": 2},
            {"_type": "SUBTOTAL", "_group_key": {"region": "EU"}, "amount_subtotal": 21}
        ]);
        let rows = decode_rows(&wire).unwrap();
        assert_eq!(encode_rows(&rows), wire);
        assert_eq!(
            serde_json::to_string(&rows[1]).unwrap(),
            r#"{"_type":"GROUP_HEADER","_group_key":{"region":"EU"},"_record_count":2}"#
        );
    }

    #[test]
    fn test_builders() {
        let row = ResultRow::subtotal([("amount", 5i64)]);
        match &row {
            ResultRow::Subtotal(subtotal) => {
                assert_eq!(subtotal.subtotal("amount"), Some(&CellValue::Int(5)));
                assert_eq!(subtotal.subtotal("region"), None);
            }
            other => panic!("expected subtotal, got {:?}", other),
        }
    }
}
