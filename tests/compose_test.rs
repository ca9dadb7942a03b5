//! Integration tests for request composition: both layout passes end to end.

use std::sync::Arc;

use pdf_compose::config::FontCacheConfig;
use pdf_compose::tree::{Element, Table, WidthSpec};
use pdf_compose::{
    ComposedDocument, Engine, EngineConfig, FontCache, GenerationRequest, InMemoryFetcher,
    OfflineFetcher,
};
use serde_json::{json, Value};

fn offline_engine(config: EngineConfig) -> Engine {
    Engine::with_fetcher(config, Arc::new(OfflineFetcher))
}

fn compose(body: Value) -> ComposedDocument {
    let request = GenerationRequest::from_value(json!({ "pageBodyContent": body })).expect("valid request");
    offline_engine(EngineConfig::default())
        .compose(&request)
        .expect("composes")
}

fn table_spec(rows: Value) -> Value {
    json!([
        ["page-body-root", {"cat": "container", "direction": "vertical", "children": ["orders"]}],
        ["orders", {
            "cat": "plugin-table",
            "columns": [
                ["table-root", {"cat": "container", "direction": "horizontal", "children": ["row"]}],
                ["row", {"cat": "container", "direction": "horizontal", "children": ["id", "item", "qty"]}],
                ["id", {"cat": "text", "value": "Id"}],
                ["item", {"cat": "text", "value": "Item"}],
                ["qty", {"cat": "text", "value": "Qty"}]
            ],
            "bindings": {
                "table-root": rows,
                "id": {"value": "id"},
                "item": {"value": "item.name"},
                "qty": {"value": "qty"}
            }
        }]
    ])
}

fn inline_rows(rows: Value) -> Value {
    json!({"shape": "list", "request": "data", "value": rows.to_string()})
}

/// The first table carrying a registry key, i.e. a data-bound table
fn bound_table(element: &Element) -> Option<&Table> {
    let mut found = None;
    element.visit(&mut |e| {
        if let Element::Table(table) = e {
            if found.is_none() && table.key.is_some() {
                found = Some(table);
            }
        }
    });
    found
}

fn body_rows(document: &ComposedDocument) -> &Table {
    let body = document.page_sets[0].body.as_ref().expect("body");
    let outer = bound_table(body).expect("bound table");
    let Element::Table(rows) = &outer.rows[1].cells[0].content else {
        panic!("body rows expected");
    };
    rows
}

#[test]
fn test_simple_text_page() {
    let document = compose(json!([
        ["page-body-root", {"cat": "container", "direction": "vertical", "children": ["greeting"]}],
        ["greeting", {"cat": "text", "value": "Hello"}]
    ]));
    assert_eq!(document.page_sets.len(), 1);
    let body = document.page_sets[0].body.as_ref().expect("body");
    assert_eq!(body.texts(), ["Hello"]);
    assert!(document.page_sets[0].header.is_none());
}

#[test]
fn test_unreachable_rows_keep_the_header() {
    let spec = table_spec(json!({"shape": "list", "request": "url", "value": "http://rows.invalid/orders"}));
    let request = GenerationRequest::from_value(json!({ "pageBodyContent": spec })).expect("valid request");
    let engine = Engine::with_fetcher(EngineConfig::default(), Arc::new(InMemoryFetcher::new()));
    let document = engine.compose(&request).expect("composes");

    let body = document.page_sets[0].body.as_ref().expect("body");
    assert_eq!(body.texts(), ["Id", "Item", "Qty"]);
    assert!(body_rows(&document).rows.is_empty());
}

#[test]
fn test_remote_rows_are_fetched() {
    let fetcher = InMemoryFetcher::new();
    fetcher.add(
        "http://rows.test/orders",
        json!([{"id": 7, "item": {"name": "Lamp"}, "qty": 2}]).to_string(),
    );
    let spec = table_spec(json!({"shape": "list", "request": "url", "value": "http://rows.test/orders"}));
    let request = GenerationRequest::from_value(json!({ "pageBodyContent": spec })).expect("valid request");
    let engine = Engine::with_fetcher(EngineConfig::default(), Arc::new(fetcher));
    let document = engine.compose(&request).expect("composes");

    let rows = body_rows(&document);
    assert_eq!(rows.rows.len(), 1);
    let texts: Vec<&str> = rows.rows[0]
        .cells
        .iter()
        .flat_map(|cell| cell.content.texts())
        .collect();
    assert_eq!(texts, ["7", "Lamp", "2"]);
}

#[test]
fn test_record_cap() {
    let rows: Vec<Value> = (0..250).map(|i| json!({"id": i, "qty": 1})).collect();
    let document = compose(table_spec(inline_rows(Value::Array(rows))));

    let rows = body_rows(&document);
    assert_eq!(rows.rows.len(), 100);
    assert_eq!(rows.rows[0].cells[0].content.texts(), ["0"]);
    assert_eq!(rows.rows[99].cells[0].content.texts(), ["99"]);
}

#[test]
fn test_colspan_is_clamped() {
    let document = compose(table_spec(inline_rows(json!([
        {"id": 1, "item": {"name": {"colspan": 5, "value": "wide"}}, "qty": 3}
    ]))));

    let row = &body_rows(&document).rows[0];
    assert_eq!(row.cells.len(), 2);
    assert_eq!(row.cells[1].colspan, 2);
    assert_eq!(row.cells[1].content.texts(), ["wide"]);
}

#[test]
fn test_column_percentages_sum_to_100() {
    let document = compose(table_spec(inline_rows(json!([{"id": 1}]))));

    let columns = &body_rows(&document).columns;
    assert_eq!(columns.len(), 3);
    let total: f32 = columns
        .iter()
        .map(|column| match column {
            WidthSpec::Percent(p) => *p,
            other => panic!("percentage expected, got {other:?}"),
        })
        .sum();
    assert!((total - 100.0).abs() < 0.01, "total was {total}");
}

#[test]
fn test_failed_binding_leaves_tokens_literal() {
    let document = compose(json!([
        ["page-body-root", {"cat": "container", "children": ["letter"]}],
        ["letter", {
            "cat": "text",
            "value": "Dear ${name},",
            "bindings": [{"shape": "object", "request": "url", "value": "http://people.invalid/1"}]
        }]
    ]));
    let body = document.page_sets[0].body.as_ref().expect("body");
    assert_eq!(body.texts(), ["Dear ${name},"]);

    let document = compose(json!([
        ["page-body-root", {"cat": "container", "children": ["letter"]}],
        ["letter", {
            "cat": "text",
            "value": "Dear ${name},",
            "bindings": [{"shape": "object", "request": "data", "value": "{not json"}]
        }]
    ]));
    let body = document.page_sets[0].body.as_ref().expect("body");
    assert_eq!(body.texts(), ["Dear ${name},"]);
}

#[test]
fn test_parsing_is_idempotent() {
    let spec = json!({
        "config": {"page": {"pageNumberLeadingEnabled": true, "pageNumberLeading": 3}},
        "pages": [{
            "rectangle": "A4",
            "pageHeaderContent": [
                ["page-header-root", {"cat": "container", "direction": "horizontal", "children": ["logo", "title"]}],
                ["logo", {"cat": "placeholder", "width": 40, "height": 20}],
                ["title", {"cat": "text", "value": "Report", "bold": true}]
            ],
            "pageBodyContent": table_spec(inline_rows(json!([{"id": 1}])))
        }]
    })
    .to_string();
    let first = GenerationRequest::from_json_str(&spec).expect("parses");
    let second = GenerationRequest::from_json_str(&spec).expect("parses");
    assert_eq!(first, second);
    assert_eq!(first.pages[0].header.root_key(), "page-header-root");
    assert_eq!(first.pages[0].header.children_of("page-header-root"), ["logo", "title"]);
}

#[test]
fn test_leading_page_override() {
    let request = GenerationRequest::from_value(json!({
        "config": {"page": {"pageNumberLeadingEnabled": true, "pageNumberLeading": 3}},
        "pages": [{"pageBodyContent": []}]
    }))
    .expect("valid request");
    let document = offline_engine(EngineConfig::default())
        .compose(&request)
        .expect("composes");
    assert_eq!(document.numbering.leading, -2);
    assert_eq!(document.numbering.number(0), 3);
}

#[test]
fn test_unknown_fonts_fall_back_to_the_default() {
    let fonts = FontCache::new(FontCacheConfig::default(), None);
    let default = fonts.get_font(None);
    assert!(Arc::ptr_eq(&fonts.get_font(Some("comic-sans")), &default));
    assert!(Arc::ptr_eq(&fonts.get_font(Some("  ")), &default));
}

#[test]
fn test_pages_of_a_request_compose_in_order() {
    let page = |text: &str| {
        json!({"pageBodyContent": [
            ["page-body-root", {"cat": "container", "children": ["t"]}],
            ["t", {"cat": "text", "value": text}]
        ]})
    };
    let request = GenerationRequest::from_value(json!({"pages": [page("one"), page("two")]})).expect("valid request");
    let document = offline_engine(EngineConfig::default())
        .compose(&request)
        .expect("composes");
    let texts: Vec<Vec<&str>> = document
        .page_sets
        .iter()
        .map(|set| set.body.as_ref().map(Element::texts).unwrap_or_default())
        .collect();
    assert_eq!(texts, [vec!["one"], vec!["two"]]);
}
