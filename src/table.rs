//! Data-bound tables.
//!
//! A table node is built twice. In the measurement pass only the header is
//! built and the table registers itself and its leaf columns, so sizing the
//! page records how wide each column's header cell came out. The rendering
//! pass builds the header again, turns the recorded widths into column
//! percentages and fills the body from the row source.

use crate::binding::{display_value, lookup_path};
use crate::compositor::{arrange, Phase, MAX_DEPTH};
use crate::config::TableConfig;
use crate::element::{padding, ElementBuilder, RunStyle};
use crate::error::{Error, Result};
use crate::layout::Margins;
use crate::model::{ColumnBinding, ContentNode, ContentTree, TableNode, TextNode, TABLE_ROOT};
use crate::pagination::DIVIDER_WEIGHT;
use crate::registry::{Registry, RegistryKey};
use crate::style::{gap_to_padding, resolve_colour, HorizontalAlignment, VerticalAlignment};
use crate::tree::{Block, Cell, Element, Grid, ImageBox, Row, Stroke, Table, WidthSpec};
use crate::units::Pt;
use serde_json::Value;

/// Height of a table-cell image that does not give a positive one
pub const DEFAULT_CELL_IMAGE_HEIGHT: f32 = 16.0;

/// Gap of body cells when the table names none
const DEFAULT_BODY_GAP: &str = "compact";

/// Where the pixels of a table-cell image come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CellImageKind {
    #[default]
    Base64,
    Url,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellImage {
    pub source: String,
    pub kind: CellImageKind,
    pub height: Pt,
}

/// A row value as it will be rendered in its cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Image(CellImage),
    List(Vec<String>),
    ColspanText { text: String, colspan: usize },
    ColspanImage { image: CellImage, colspan: usize },
    ColspanList { items: Vec<String>, colspan: usize },
}

impl CellValue {
    /// Columns the value asks to span, before clamping
    pub fn colspan(&self) -> usize {
        match self {
            CellValue::ColspanText { colspan, .. }
            | CellValue::ColspanImage { colspan, .. }
            | CellValue::ColspanList { colspan, .. } => (*colspan).max(1),
            _ => 1,
        }
    }
}

/// Classify the value a column binding found in a row.
///
/// Objects marked `type: image` are images, objects with `colspan` and
/// `value` span columns, scalars are text and lists are lists. Anything
/// else, including a missing value, is empty text.
pub fn classify_cell(value: Option<&Value>) -> CellValue {
    match value {
        Some(Value::String(s)) => CellValue::Text(s.clone()),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => CellValue::Text(display_value(v)),
        Some(Value::Array(items)) => CellValue::List(items.iter().map(display_value).collect()),
        Some(Value::Object(map)) => {
            let is_image = map
                .get("type")
                .and_then(Value::as_str)
                .is_some_and(|t| t.eq_ignore_ascii_case("image"));
            if is_image {
                let image = CellImage {
                    source: map.get("value").map(display_value).unwrap_or_default(),
                    kind: match map.get("imageType").and_then(Value::as_str) {
                        Some(kind) if kind.eq_ignore_ascii_case("url") => CellImageKind::Url,
                        _ => CellImageKind::Base64,
                    },
                    height: Pt(number(map.get("height"))
                        .map(|h| h as f32)
                        .filter(|h| *h > 0.0)
                        .unwrap_or(DEFAULT_CELL_IMAGE_HEIGHT)),
                };
                return match map.get("colspan") {
                    Some(colspan) => CellValue::ColspanImage {
                        image,
                        colspan: span(colspan),
                    },
                    None => CellValue::Image(image),
                };
            }

            match (map.get("colspan"), map.get("value")) {
                (Some(colspan), Some(v @ (Value::String(_) | Value::Number(_) | Value::Bool(_)))) => {
                    CellValue::ColspanText {
                        text: display_value(v),
                        colspan: span(colspan),
                    }
                }
                (Some(colspan), Some(Value::Array(items))) => CellValue::ColspanList {
                    items: items.iter().map(display_value).collect(),
                    colspan: span(colspan),
                },
                _ => CellValue::Text(String::new()),
            }
        }
        Some(Value::Null) | None => CellValue::Text(String::new()),
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn span(value: &Value) -> usize {
    match number(Some(value)) {
        Some(n) if n >= 1.0 => n as usize,
        Some(_) => 1,
        None => {
            log::warn!("ignoring unreadable colspan {value}");
            1
        }
    }
}

/// Columns a cell starting at `column` may span: at least one, and never
/// more than the columns that remain in the row
pub fn clamp_colspan(requested: usize, column: usize, columns: usize) -> usize {
    requested
        .max(1)
        .min(columns.saturating_sub(column).max(1))
}

/// Turn measured header-cell widths into percentages of the table width.
///
/// Every column but the first gets `column_border_adjustment` added for the
/// border line it shares with its neighbour, and the table width loses its
/// two outer borders. The result is normalised so the columns fill the table
/// exactly. Without usable measurements the columns share the width evenly.
pub fn column_percentages(widths: &[Pt], table_width: Pt, config: &TableConfig) -> Vec<f32> {
    if widths.is_empty() {
        return Vec::new();
    }
    let even = || vec![100.0 / widths.len() as f32; widths.len()];

    let usable = table_width.0 - 2.0 * config.border_width;
    if usable <= 0.0 {
        return even();
    }
    let raw: Vec<f32> = widths
        .iter()
        .enumerate()
        .map(|(i, width)| {
            let adjustment = if i == 0 { 0.0 } else { config.column_border_adjustment };
            ((width.0 + adjustment) * 100.0 / usable).max(0.0)
        })
        .collect();
    let total: f32 = raw.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return even();
    }
    raw.iter().map(|p| p * 100.0 / total).collect()
}

/// Leaf columns of a column tree in left-to-right order: text nodes placed
/// directly in a horizontal container. A tree without any falls back to the
/// first text node directly under its root.
pub fn leaf_columns(tree: &ContentTree) -> Vec<String> {
    fn collect(tree: &ContentTree, key: &str, in_row: bool, depth: usize, out: &mut Vec<String>) {
        if depth > MAX_DEPTH {
            log::warn!("column tree is nested too deeply at `{key}`");
            return;
        }
        match tree.get(key) {
            Some(ContentNode::Container(container)) => {
                for child in &container.children {
                    collect(tree, child, container.is_horizontal(), depth + 1, out);
                }
            }
            Some(ContentNode::Text(_)) if in_row && !out.iter().any(|k| k == key) => {
                out.push(key.to_string())
            }
            _ => {}
        }
    }

    let mut columns = Vec::new();
    for child in tree.children_of(TABLE_ROOT) {
        collect(tree, child, false, 1, &mut columns);
    }
    if columns.is_empty() {
        if let Some(first) = tree
            .children_of(TABLE_ROOT)
            .iter()
            .find(|key| tree.get(key.as_str()).is_some_and(ContentNode::is_text))
        {
            columns.push(first.clone());
        }
    }
    columns
}

/// Builds data-bound tables in both passes
#[derive(Debug, Clone, Copy)]
pub struct TableLayoutEngine<'a> {
    elements: ElementBuilder<'a>,
    config: &'a TableConfig,
}

impl<'a> TableLayoutEngine<'a> {
    pub fn new(elements: ElementBuilder<'a>, config: &'a TableConfig) -> Self {
        Self { elements, config }
    }

    /// Build the table stored under `key`: a boxed table whose first row is
    /// the header and, when rendering, whose second row is the body
    pub fn build(&self, key: &str, node: &TableNode, phase: &mut Phase<'_>) -> Result<Element> {
        let mut outer = Table {
            key: Some(RegistryKey::table(key)),
            columns: vec![WidthSpec::Star(1.0)],
            header_rows: 1,
            grid: Grid::Full,
            stroke: Stroke::default(),
            margin: padding(&node.style),
            ..Table::default()
        };
        if node.columns.children_of(TABLE_ROOT).is_empty() {
            log::debug!("table `{key}` has no columns");
            return Ok(Element::Table(outer));
        }

        let columns = leaf_columns(&node.columns);
        if let Phase::Measure(recorder) = phase {
            recorder.register_table(key);
            for column in &columns {
                recorder.register_column(key, column);
            }
        }

        let header = self.header(key, node, &columns);
        outer.rows.push(Row::new(vec![Cell::new(header)]));

        if let Phase::Render(registry) = phase {
            if let Some(body) = self.body(key, node, registry)? {
                outer.rows.push(Row::new(vec![Cell::new(body)]));
            }
        }
        Ok(Element::Table(outer))
    }

    /// The header rows followed by a divider
    fn header(&self, table: &str, node: &TableNode, columns: &[String]) -> Element {
        let gap = Margins::all(gap_to_padding(node.gap.as_deref()));
        let mut rows: Vec<Row> = node
            .columns
            .children_of(TABLE_ROOT)
            .iter()
            .filter_map(|key| self.header_cell(&node.columns, key, table, columns, gap, 1))
            .map(|cell| Row::new(vec![cell]))
            .collect();

        let mut divider = Cell::new(Element::Block(Block {
            width: Pt::ZERO,
            height: DIVIDER_WEIGHT,
            fill: None,
        }));
        divider.rule_top = Some(DIVIDER_WEIGHT);
        rows.push(Row::new(vec![divider]));

        Element::Table(Table::stack(rows))
    }

    fn header_cell(
        &self,
        tree: &ContentTree,
        key: &str,
        table: &str,
        columns: &[String],
        gap: Margins,
        depth: usize,
    ) -> Option<Cell> {
        if depth > MAX_DEPTH {
            log::warn!("column tree is nested too deeply at `{key}`");
            return None;
        }
        let node = tree.get(key)?;
        match node {
            ContentNode::Container(container) => {
                let children = container
                    .children
                    .iter()
                    .filter_map(|child| {
                        let cell = self.header_cell(tree, child, table, columns, gap, depth + 1)?;
                        Some((cell, tree.get(child).and_then(ContentNode::style)))
                    })
                    .collect();
                arrange(container, children, Grid::InnerOnly).map(Cell::new)
            }
            ContentNode::Text(text) => {
                let mut cell = self.header_text(text, gap);
                if columns.iter().any(|c| c == key) {
                    cell.key = Some(RegistryKey::column(table, key));
                }
                Some(cell)
            }
            other => {
                let style = other.style()?;
                Some(self.elements.cell(self.elements.leaf(other)?, style))
            }
        }
    }

    fn header_text(&self, node: &TextNode, gap: Margins) -> Cell {
        Cell::new(self.elements.text(node))
            .with_padding(gap)
            .with_alignment(
                HorizontalAlignment::resolve(node.style.horizontal.as_deref()),
                VerticalAlignment::Middle,
            )
            .with_fill(resolve_colour(node.style.background.as_deref()))
    }

    /// The data rows, in percentage columns derived from the measured header.
    /// Tables without a row source have no body.
    fn body(&self, table: &str, node: &TableNode, registry: &Registry) -> Result<Option<Element>> {
        let measured = registry.table(table).ok_or_else(|| Error::LayoutInvariant {
            table: table.to_string(),
        })?;
        let Some(source) = &node.row_source else {
            log::debug!("table `{table}` has no row source");
            return Ok(None);
        };
        if measured.columns.is_empty() {
            return Err(Error::LayoutInvariant {
                table: table.to_string(),
            });
        }

        let percentages =
            column_percentages(&measured.column_widths(), measured.width, self.config);
        let keys: Vec<&str> = measured.columns.keys().map(String::as_str).collect();

        let data = self
            .elements
            .bindings()
            .resolve_list(source, self.config.max_records);
        log::debug!("table `{table}` has {} body row(s)", data.len());

        let gap = Margins::all(gap_to_padding(Some(
            node.gap.as_deref().unwrap_or(DEFAULT_BODY_GAP),
        )));
        let rows = data
            .iter()
            .map(|record| self.body_row(record, &keys, node, gap))
            .collect();

        Ok(Some(Element::Table(Table {
            columns: percentages.into_iter().map(WidthSpec::Percent).collect(),
            rows,
            grid: Grid::InnerOnly,
            ..Table::default()
        })))
    }

    fn body_row(&self, record: &Value, columns: &[&str], node: &TableNode, gap: Margins) -> Row {
        let mut cells = Vec::with_capacity(columns.len());
        let mut next = 0;
        for (index, column) in columns.iter().enumerate() {
            if index < next {
                continue;
            }
            let binding = node.column_bindings.get(*column);
            let value = match binding {
                Some(binding) => classify_cell(
                    binding
                        .value
                        .as_deref()
                        .and_then(|path| lookup_path(record, path)),
                ),
                None => CellValue::Text(String::new()),
            };
            let span = clamp_colspan(value.colspan(), index, columns.len());
            let column_style = node.columns.get(column).and_then(ContentNode::style);
            cells.push(
                self.body_cell(value, binding, column_style, gap)
                    .with_colspan(span),
            );
            next = index + span;
        }
        Row::new(cells)
    }

    fn body_cell(
        &self,
        value: CellValue,
        binding: Option<&ColumnBinding>,
        column: Option<&crate::model::NodeStyle>,
        gap: Margins,
    ) -> Cell {
        let halign =
            HorizontalAlignment::resolve(binding.and_then(|b| b.horizontal.as_deref()));
        let fill = resolve_colour(binding.and_then(|b| b.background.as_deref()));
        let style = binding
            .map(RunStyle::of_column)
            .unwrap_or_default()
            .or(column.map(RunStyle::of).unwrap_or_default());

        let cell = match value {
            CellValue::Text(text) | CellValue::ColspanText { text, .. } => {
                Cell::new(Element::Text(self.elements.run(text, style)))
                    .with_padding(gap)
                    .with_alignment(halign, VerticalAlignment::Middle)
            }
            CellValue::Image(image) | CellValue::ColspanImage { image, .. } => {
                Cell::new(self.cell_image(&image))
                    .with_padding(gap)
                    .with_alignment(HorizontalAlignment::Center, VerticalAlignment::Middle)
            }
            CellValue::List(items) | CellValue::ColspanList { items, .. } => {
                let rows = items
                    .into_iter()
                    .map(|item| {
                        Row::new(vec![Cell::new(Element::Text(self.elements.run(item, style)))
                            .with_padding(gap)
                            .with_alignment(halign, VerticalAlignment::Middle)])
                    })
                    .collect();
                Cell::new(Element::Table(Table {
                    grid: Grid::HorizontalRules,
                    ..Table::stack(rows)
                }))
                .with_alignment(halign, VerticalAlignment::Middle)
            }
        };
        cell.with_fill(fill)
    }

    /// An image scaled to the requested height, keeping its aspect ratio
    fn cell_image(&self, image: &CellImage) -> Element {
        let loaded = match image.kind {
            CellImageKind::Url => self.elements.images().load_url(&image.source),
            CellImageKind::Base64 => self.elements.images().load_base64(&image.source),
        };
        let width = if loaded.height > 0.0 {
            image.height * (loaded.width / loaded.height)
        } else {
            image.height
        };
        Element::Image(ImageBox {
            image: loaded,
            width,
            height: image.height,
        })
    }
}
