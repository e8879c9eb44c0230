#[cfg(test)]
mod tests {
    use reportgrid::render::{derive_headers, render, CellStyle, Grid, HeaderStrategy, Renderer};
    use reportgrid::report::{decode_rows, CellValue, ResultRow};
    use serde_json::json;

    fn rows(value: serde_json::Value) -> Vec<ResultRow> {
        decode_rows(&value).unwrap()
    }

    #[test]
    fn test_grouped_example() {
        let grid = render(&rows(json!([
            {"A": 1, "B": 2},
            {"_type": "GROUP_HEADER", "_group_key": {"A": "g1"}},
            {"_type": "SUBTOTAL", "B_subtotal": 10}
        ])));

        assert_eq!(grid.headers(), ["A", "B"]);
        assert_eq!(
            grid.to_values(),
            vec![
                vec!["1".to_string(), "2".to_string()],
                vec!["g1".to_string(), String::new()],
                vec![String::new(), "10".to_string()],
            ]
        );

        let styles: Vec<CellStyle> = grid.rows().iter().map(|r| r.style).collect();
        assert_eq!(
            styles,
            vec![CellStyle::Normal, CellStyle::GroupHeader, CellStyle::Subtotal]
        );
        assert!(grid.rows()[1].cells.iter().all(|c| c.style.is_emphasized()));
        assert!(grid.rows()[2].cells.iter().all(|c| c.style.is_emphasized()));
    }

    #[test]
    fn test_empty_input_yields_placeholder_only() {
        let grid = render(&[]);
        assert!(grid.is_empty());
        assert_eq!(grid.placeholder(), Some("No data available"));
        assert!(grid.headers().is_empty());
        assert!(grid.rows().is_empty());
    }

    #[test]
    fn test_one_grid_row_per_input_row() {
        let input = rows(json!([
            {"region": "EU", "amount": 1},
            {"_type": "GROUP_HEADER", "_group_key": {"region": "EU"}, "_record_count": 2},
            {"region": "EU", "amount": 2},
            {"region": "EU", "amount": 3},
            {"_type": "SUBTOTAL", "amount_subtotal": 5}
        ]));
        let grid = render(&input);
        assert_eq!(grid.rows().len(), input.len());
        assert!(grid.placeholder().is_none());
    }

    #[test]
    fn test_falsy_data_values_render_blank() {
        let grid = render(&rows(json!([
            {"zero": 0, "empty": "", "no": false, "nothing": null, "yes": "x", "float_zero": 0.0}
        ])));
        assert_eq!(grid.rows()[0].values(), vec!["", "", "", "", "x", ""]);
    }

    #[test]
    fn test_group_header_values_are_not_truthiness_filtered() {
        let grid = render(&rows(json!([
            {"level": 1, "amount": 9},
            {"_type": "GROUP_HEADER", "_group_key": {"level": 0}}
        ])));
        assert_eq!(grid.rows()[1].values(), vec!["0", ""]);
    }

    #[test]
    fn test_group_key_missing_column_renders_blank() {
        let grid = render(&rows(json!([
            {"region": "EU", "country": "FR", "amount": 1},
            {"_type": "GROUP_HEADER", "_group_key": {"country": "FR"}}
        ])));
        assert_eq!(grid.rows()[1].values(), vec!["", "FR", ""]);
    }

    #[test]
    fn test_subtotal_missing_column_renders_blank() {
        let grid = render(&rows(json!([
            {"region": "EU", "qty": 2, "amount": 1},
            {"_type": "SUBTOTAL", "qty_subtotal": 0, "amount": 99}
        ])));
        assert_eq!(grid.rows()[1].values(), vec!["", "0", ""]);
    }

    #[test]
    fn test_headers_follow_first_row_key_order() {
        let grid = render(&rows(json!([
            {"zeta": 1, "_hidden": 2, "alpha": 3},
            {"alpha": 4, "zeta": 5, "extra": 6}
        ])));
        assert_eq!(grid.headers(), ["zeta", "alpha"]);
        assert_eq!(grid.rows()[1].values(), vec!["5", "4"]);
    }

    #[test]
    fn test_group_header_first_gives_no_columns() {
        let input = rows(json!([
            {"_type": "GROUP_HEADER", "_group_key": {"region": "EU"}},
            {"region": "EU", "amount": 5}
        ]));

        let grid = render(&input);
        assert!(grid.headers().is_empty());
        assert!(grid.rows().iter().all(|r| r.cells.is_empty()));
        assert_eq!(grid.rows().len(), 2);
    }

    #[test]
    fn test_union_headers_cover_every_row() {
        let input = rows(json!([
            {"_type": "GROUP_HEADER", "_group_key": {"region": "EU"}},
            {"region": "EU", "amount": 5},
            {"_type": "SUBTOTAL", "amount_subtotal": 5, "tax_subtotal": 1}
        ]));

        assert_eq!(
            derive_headers(&input, HeaderStrategy::Union),
            vec!["region", "amount", "tax"]
        );
        let grid = Renderer::new()
            .with_header_strategy(HeaderStrategy::Union)
            .render(&input);
        assert_eq!(
            grid.to_values(),
            vec![
                vec!["EU".to_string(), String::new(), String::new()],
                vec!["EU".to_string(), "5".to_string(), String::new()],
                vec![String::new(), "5".to_string(), "1".to_string()],
            ]
        );
    }

    #[test]
    fn test_integral_floats_drop_fraction() {
        let grid = render(&[
            ResultRow::data([("total", CellValue::Float(10.0))]),
            ResultRow::subtotal([("total", CellValue::Float(12.5))]),
        ]);
        assert_eq!(grid.to_values(), vec![vec!["10"], vec!["12.5"]]);
    }

    #[test]
    fn test_grid_serializes_tagged() {
        let value = serde_json::to_value(render(&[])).unwrap();
        assert_eq!(value, json!({"kind": "empty", "placeholder": "No data available"}));

        let grid: Grid = serde_json::from_value(serde_json::to_value(render(&rows(json!([
            {"a": 1}
        ]))))
        .unwrap())
        .unwrap();
        assert_eq!(grid.headers(), ["a"]);
    }
}
