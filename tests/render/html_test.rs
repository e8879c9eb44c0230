#[cfg(test)]
mod tests {
    use reportgrid::render::{render, to_html, to_text, Renderer};
    use reportgrid::report::decode_rows;
    use serde_json::json;

    #[test]
    fn test_grouped_table_markup() {
        let rows = decode_rows(&json!([
            {"A": 1, "B": 2},
            {"_type": "GROUP_HEADER", "_group_key": {"A": "g1"}},
            {"_type": "SUBTOTAL", "B_subtotal": 10}
        ]))
        .unwrap();

        insta::assert_snapshot!(to_html(&render(&rows)), @r#"<table class="table table-striped table-hover"><thead><tr><th>A</th><th>B</th></tr></thead><tbody><tr><td>1</td><td>2</td></tr><tr class="group-header"><td><strong>g1</strong></td><td></td></tr><tr class="subtotal"><td><strong></strong></td><td><strong>10</strong></td></tr></tbody></table>"#);
    }

    #[test]
    fn test_placeholder_paragraph() {
        assert_eq!(to_html(&render(&[])), "<p>No data available</p>");
        let grid = Renderer::new().with_placeholder("<none>").render(&[]);
        assert_eq!(to_html(&grid), "<p>&lt;none&gt;</p>");
    }

    #[test]
    fn test_cell_markup_is_escaped() {
        let rows = decode_rows(&json!([
            {"<b>name</b>": "<script>alert('x')</script>"}
        ]))
        .unwrap();
        let html = to_html(&render(&rows));

        assert!(html.contains("<th>&lt;b&gt;name&lt;/b&gt;</th>"));
        assert!(html.contains("<td>&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;</td>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_text_layout() {
        let rows = decode_rows(&json!([
            {"customer": "Acme", "orders": 12},
            {"customer": "Globex", "orders": 3}
        ]))
        .unwrap();

        insta::assert_snapshot!(to_text(&render(&rows)), @r"
        customer | orders
        ---------+-------
        Acme     | 12
        Globex   | 3
        ");
    }
}
