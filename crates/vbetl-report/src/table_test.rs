use serde_json::json;

use super::*;

fn row(pairs: &[(&str, Cell)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

#[test]
fn parse_infers_types() {
    assert_eq!(Cell::parse(""), Cell::Empty);
    assert_eq!(Cell::parse("42"), Cell::Int(42));
    assert_eq!(Cell::parse("-3"), Cell::Int(-3));
    assert_eq!(Cell::parse("2.5"), Cell::Float(2.5));
    assert_eq!(Cell::parse("abc"), Cell::Text("abc".into()));
    assert_eq!(Cell::parse("NaN"), Cell::Text("NaN".into()));
}

#[test]
fn parse_keeps_leading_zero_ids_as_text() {
    assert_eq!(Cell::parse("007"), Cell::Text("007".into()));
    assert_eq!(Cell::parse("+5"), Cell::Text("+5".into()));
}

#[test]
fn from_json_handles_scalars_and_nesting() {
    assert_eq!(Cell::from_json(&json!(null)), Cell::Empty);
    assert_eq!(Cell::from_json(&json!(7)), Cell::Int(7));
    assert_eq!(Cell::from_json(&json!(1.5)), Cell::Float(1.5));
    assert_eq!(Cell::from_json(&json!("")), Cell::Empty);
    assert_eq!(Cell::from_json(&json!(true)), Cell::Text("true".into()));
    assert_eq!(
        Cell::from_json(&json!({"a": 1})),
        Cell::Text(r#"{"a":1}"#.into())
    );
}

#[test]
fn from_f64_collapses_integral_values() {
    assert_eq!(Cell::from_f64(3.0), Cell::Int(3));
    assert_eq!(Cell::from_f64(3.25), Cell::Float(3.25));
}

#[test]
fn from_rows_puts_sorted_extras_after_fixed_columns() {
    let rows = vec![
        row(&[("id", "a".into()), ("zeta", Cell::Int(1))]),
        row(&[("id", "b".into()), ("alpha", Cell::Int(2))]),
    ];
    let table = Table::from_rows(&["id", "title"], rows);
    assert_eq!(table.columns(), ["id", "title", "alpha", "zeta"]);
    assert_eq!(table.cell(0, "alpha"), &Cell::Empty);
    assert_eq!(table.cell(1, "alpha"), &Cell::Int(2));
}

#[test]
fn absent_cells_are_written_empty() {
    let rows = vec![
        row(&[("id", "a".into()), ("x", Cell::Int(1))]),
        row(&[("id", "b".into())]),
    ];
    let table = Table::from_rows(&["id"], rows);
    let csv = String::from_utf8(table.to_csv_bytes().unwrap()).unwrap();
    assert_eq!(csv, "id,x\na,1\nb,\n");
}

#[test]
fn csv_values_with_commas_are_quoted() {
    let table = Table::from_rows(&["tags"], vec![row(&[("tags", "a, b".into())])]);
    let csv = String::from_utf8(table.to_csv_bytes().unwrap()).unwrap();
    assert_eq!(csv, "tags\n\"a, b\"\n");
}

#[test]
fn read_csv_pads_short_records() {
    let data = "id,views,title\nv1,10,Intro\nv2,5\n";
    let table = Table::from_csv_reader(data.as_bytes(), "inline").unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.cell(0, "views"), &Cell::Int(10));
    assert_eq!(table.cell(1, "title"), &Cell::Empty);
}

#[test]
fn read_csv_rejects_duplicate_header() {
    let data = "id,id\n1,2\n";
    let err = Table::from_csv_reader(data.as_bytes(), "inline").unwrap_err();
    assert!(matches!(err, ReportError::DuplicateColumn { column, .. } if column == "id"));
}

#[test]
fn csv_file_round_trip_preserves_cells() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let table = Table::from_rows(
        &["id", "views"],
        vec![row(&[("id", "v1".into()), ("views", Cell::Int(3))])],
    );
    table.write_csv(&path).unwrap();
    let back = Table::read_csv(&path).unwrap();
    assert_eq!(back, table);
}

#[test]
fn numeric_columns_ignore_empty_cells() {
    let data = "id,views,notes\na,1,x\nb,,\n";
    let table = Table::from_csv_reader(data.as_bytes(), "inline").unwrap();
    assert_eq!(table.numeric_columns(), ["views"]);
}

#[test]
fn rename_select_and_drop() {
    let data = "video_id,views,date\nv1,1,2024-01-01\n";
    let mut table = Table::from_csv_reader(data.as_bytes(), "inline").unwrap();
    table.drop_columns(&["date"]);
    assert_eq!(table.columns(), ["video_id", "views"]);

    table.rename_columns(|c| (c != "video_id").then(|| format!("v_{c}")));
    assert_eq!(table.columns(), ["video_id", "v_views"]);
    assert_eq!(table.cell(0, "v_views"), &Cell::Int(1));

    let picked = table.select(&["v_views".to_owned()]);
    assert_eq!(picked.columns(), ["v_views"]);
}

#[test]
fn fill_empty_covers_absent_keys() {
    let mut table = Table::from_rows(
        &["a", "b"],
        vec![row(&[("a", Cell::Empty)]), row(&[("a", Cell::Int(1)), ("b", Cell::Int(2))])],
    );
    table.fill_empty(&Cell::Int(0));
    assert_eq!(table.cell(0, "a"), &Cell::Int(0));
    assert_eq!(table.cell(0, "b"), &Cell::Int(0));
    assert_eq!(table.cell(1, "b"), &Cell::Int(2));
}

#[test]
fn json_is_pretty_printed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.json");
    write_json_pretty(&path, &json!([{"id": "v1"}])).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\n  {\n    \"id\": \"v1\""), "{text}");
}
