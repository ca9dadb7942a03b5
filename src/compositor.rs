//! Two-pass composition of page specifications into render trees.
//!
//! The measurement pass builds every page with a write-only
//! [RegistryRecorder], sizes the result so the recorder learns the widths of
//! data-bound tables and their columns, and keeps only the frozen
//! [Registry]. The rendering pass rebuilds the same pages reading that
//! registry, so table bodies are laid out in the measured proportions. Pages
//! of one request share a registry, so a table measured on any page lends
//! its widths to the same table on every other page.

use crate::binding::BindingResolver;
use crate::config::EngineConfig;
use crate::element::ElementBuilder;
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::font::FontCache;
use crate::image::ImageLoader;
use crate::layout;
use crate::model::{ContainerNode, ContentNode, ContentTree, GenerationRequest, NodeStyle, PageDefinition};
use crate::pagination::{PageConfig, PageNumbering};
use crate::registry::{Registry, RegistryRecorder};
use crate::style::{resolve_colour, HorizontalAlignment, VerticalAlignment};
use crate::table::TableLayoutEngine;
use crate::tree::{Cell, ComposedDocument, Element, Grid, PageSet, Row, Table, WidthSpec};
use crate::units::Pt;

/// Containers nested deeper than this are cut off
pub const MAX_DEPTH: usize = 64;

/// Which pass a build belongs to. Measuring can only record into the
/// registry and rendering can only read it.
pub enum Phase<'p> {
    Measure(&'p mut RegistryRecorder),
    Render(&'p Registry),
}

/// How a child claims its share of a horizontal container
pub fn column_width(style: Option<&NodeStyle>) -> WidthSpec {
    let Some(style) = style else {
        return WidthSpec::Star(1.0);
    };
    match (style.wild_star, style.flex_value) {
        (Some(false), Some(value)) => match style.flex_unit.as_deref().map(str::trim) {
            Some("%") => WidthSpec::Percent(value),
            _ => WidthSpec::Absolute(Pt(value)),
        },
        _ => WidthSpec::Star(1.0),
    }
}

/// Lay out the cells of a container's children: side by side in one row
/// for a horizontal container, stacked otherwise. A container without
/// children contributes nothing.
pub fn arrange(
    container: &ContainerNode,
    children: Vec<(Cell, Option<&NodeStyle>)>,
    grid: Grid,
) -> Option<Element> {
    if children.is_empty() {
        return None;
    }

    let table = if container.is_horizontal() {
        let valign = VerticalAlignment::resolve(container.style.vertical.as_deref());
        let columns = children.iter().map(|(_, style)| column_width(*style)).collect();
        let cells = children
            .into_iter()
            .map(|(mut cell, style)| {
                cell.valign = valign;
                with_background(cell, style)
            })
            .collect();
        Table {
            columns,
            rows: vec![Row::new(cells)],
            grid,
            ..Table::default()
        }
    } else {
        let rows = children
            .into_iter()
            .map(|(cell, style)| Row::new(vec![with_background(cell, style)]))
            .collect();
        Table {
            grid,
            ..Table::stack(rows)
        }
    };
    Some(Element::Table(table))
}

fn with_background(cell: Cell, style: Option<&NodeStyle>) -> Cell {
    match style.and_then(|s| resolve_colour(s.background.as_deref())) {
        Some(fill) => cell.with_fill(Some(fill)),
        None => cell,
    }
}

/// Composes the pages of a request in two passes
#[derive(Debug, Clone, Copy)]
pub struct PageCompositor<'a> {
    config: &'a EngineConfig,
    fonts: &'a FontCache,
    fetcher: &'a dyn Fetcher,
}

impl<'a> PageCompositor<'a> {
    pub fn new(config: &'a EngineConfig, fonts: &'a FontCache, fetcher: &'a dyn Fetcher) -> Self {
        Self {
            config,
            fonts,
            fetcher,
        }
    }

    /// Both passes over every page, then the numbering overrides
    pub fn compose_request(&self, request: &GenerationRequest) -> Result<ComposedDocument> {
        let registry = self.measure(&request.pages)?;
        log::debug!("measured {} table(s)", registry.len());
        let page_sets = self.compose(&request.pages, &registry)?;
        Ok(ComposedDocument {
            page_sets,
            numbering: PageNumbering::from_overrides(&request.pagination),
        })
    }

    /// The measurement pass: build and size every page, keeping only the
    /// widths recorded for data-bound tables
    pub fn measure(&self, pages: &[PageDefinition]) -> Result<Registry> {
        let mut recorder = RegistryRecorder::new();
        for page in pages {
            let set = self.build(page, &mut Phase::Measure(&mut recorder))?;
            let config = &set.config;
            let regions = [
                (&set.header, config.header_width()),
                (&set.body, config.body_width()),
                (&set.footer, config.footer_width()),
            ];
            for (element, width) in regions {
                if let Some(element) = element {
                    layout::height(element, width, &mut recorder);
                }
            }
        }
        Ok(recorder.finish())
    }

    /// The rendering pass: rebuild every page using the measured widths
    pub fn compose(&self, pages: &[PageDefinition], registry: &Registry) -> Result<Vec<PageSet>> {
        pages
            .iter()
            .map(|page| self.build(page, &mut Phase::Render(registry)))
            .collect()
    }

    fn build(&self, page: &PageDefinition, phase: &mut Phase<'_>) -> Result<PageSet> {
        let config = PageConfig::resolve(&page.settings);
        let elements = ElementBuilder::new(
            self.fonts,
            ImageLoader::new(self.fetcher, self.config.image_dir.as_deref()),
            BindingResolver::new(self.fetcher),
            &config.defaults,
        );
        let regions = RegionBuilder {
            elements,
            tables: TableLayoutEngine::new(elements, &self.config.table),
        };

        let header = regions.region(&page.header, phase)?;
        let body = regions.region(&page.body, phase)?;
        let footer = regions.region(&page.footer, phase)?;
        Ok(PageSet {
            config,
            header,
            body,
            footer,
        })
    }
}

struct RegionBuilder<'b> {
    elements: ElementBuilder<'b>,
    tables: TableLayoutEngine<'b>,
}

impl RegionBuilder<'_> {
    /// The render tree of one region, rooted at its root node
    fn region(&self, tree: &ContentTree, phase: &mut Phase<'_>) -> Result<Option<Element>> {
        let Some(root) = tree.root() else {
            if !tree.is_empty() {
                log::warn!("content tree has no `{}` node", tree.root_key());
            }
            return Ok(None);
        };
        let cell = self.node(tree, tree.root_key(), phase, 0)?;
        Ok(cell.map(|cell| match root {
            ContentNode::Container(_) => cell.content,
            _ => Element::Table(Table::stack(vec![Row::new(vec![cell])])),
        }))
    }

    fn node(
        &self,
        tree: &ContentTree,
        key: &str,
        phase: &mut Phase<'_>,
        depth: usize,
    ) -> Result<Option<Cell>> {
        if depth > MAX_DEPTH {
            log::warn!("content is nested too deeply at `{key}`");
            return Ok(None);
        }
        let Some(node) = tree.get(key) else {
            log::warn!("content node `{key}` is missing");
            return Ok(None);
        };

        match node {
            ContentNode::Container(container) => {
                let mut children = Vec::with_capacity(container.children.len());
                for child in &container.children {
                    if let Some(cell) = self.node(tree, child, phase, depth + 1)? {
                        children.push((cell, tree.get(child).and_then(ContentNode::style)));
                    }
                }
                Ok(arrange(container, children, Grid::None).map(Cell::new))
            }
            ContentNode::Table(table) => Ok(Some(Cell::new(self.tables.build(key, table, phase)?))),
            leaf => Ok(self.elements.leaf(leaf).map(|element| match leaf.style() {
                Some(style) => self.elements.cell(element, style),
                None => Cell::new(element).with_alignment(
                    HorizontalAlignment::Left,
                    VerticalAlignment::Top,
                ),
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FontCacheConfig;
    use crate::fetch::OfflineFetcher;
    use serde_json::json;

    fn page(body: serde_json::Value) -> PageDefinition {
        serde_json::from_value(json!({ "pageBodyContent": body })).expect("valid page")
    }

    fn compose(pages: &[PageDefinition]) -> Result<Vec<PageSet>> {
        let config = EngineConfig::default();
        let fonts = FontCache::new(FontCacheConfig::default(), None);
        let compositor = PageCompositor::new(&config, &fonts, &OfflineFetcher);
        let registry = compositor.measure(pages)?;
        compositor.compose(pages, &registry)
    }

    #[test]
    fn flex_widths() {
        let style = |wild: Option<bool>, value: Option<f32>, unit: Option<&str>| NodeStyle {
            wild_star: wild,
            flex_value: value,
            flex_unit: unit.map(String::from),
            ..NodeStyle::default()
        };
        assert_eq!(column_width(None), WidthSpec::Star(1.0));
        assert_eq!(
            column_width(Some(&style(Some(true), Some(30.0), Some("%")))),
            WidthSpec::Star(1.0)
        );
        assert_eq!(
            column_width(Some(&style(Some(false), Some(30.0), Some("%")))),
            WidthSpec::Percent(30.0)
        );
        assert_eq!(
            column_width(Some(&style(Some(false), Some(80.0), Some("px")))),
            WidthSpec::Absolute(Pt(80.0))
        );
    }

    #[test]
    fn horizontal_containers_propagate_alignment_and_background() {
        let pages = [page(json!([
            ["page-body-root", {"cat": "container", "direction": "vertical", "children": ["row", "empty"]}],
            ["row", {"cat": "container", "direction": "horizontal", "vertical": "bottom", "children": ["a", "b"]}],
            ["a", {"cat": "text", "value": "A", "background": "#ff0000"}],
            ["b", {"cat": "text", "value": "B", "wildStar": false, "flexValue": 25, "flexUnit": "%"}],
            ["empty", {"cat": "container", "direction": "horizontal", "children": []}]
        ]))];
        let sets = compose(&pages).expect("composes");
        let Some(Element::Table(root)) = &sets[0].body else {
            panic!("body table expected");
        };
        // the empty container contributes nothing
        assert_eq!(root.rows.len(), 1);
        let Element::Table(row) = &root.rows[0].cells[0].content else {
            panic!("row table expected");
        };
        assert_eq!(row.columns, vec![WidthSpec::Star(1.0), WidthSpec::Percent(25.0)]);
        let cells = &row.rows[0].cells;
        assert!(cells.iter().all(|c| c.valign == VerticalAlignment::Bottom));
        assert!(cells[0].fill.is_some());
        assert!(cells[1].fill.is_none());
    }

    #[test]
    fn tables_share_measurements_across_pages() {
        let table = json!({
            "cat": "plugin-table",
            "columns": [
                ["table-root", {"cat": "container", "direction": "horizontal", "children": ["row"]}],
                ["row", {"cat": "container", "direction": "horizontal", "children": ["x", "y"]}],
                ["x", {"cat": "text", "value": "X"}],
                ["y", {"cat": "text", "value": "Y"}]
            ],
            "bindings": {
                "table-root": {"shape": "list", "request": "data", "value": "[{\"x\": 1, \"y\": 2}]"},
                "x": {"value": "x"},
                "y": {"value": "y"}
            }
        });
        let pages = [
            page(json!([["page-body-root", {"cat": "container", "children": ["t"]}], ["t", table.clone()]])),
            page(json!([["page-body-root", {"cat": "container", "children": ["t"]}], ["t", table]])),
        ];
        let sets = compose(&pages).expect("composes");
        assert_eq!(sets.len(), 2);
        for set in &sets {
            let body = set.body.as_ref().expect("body");
            assert_eq!(body.texts(), ["X", "Y", "1", "2"]);
        }
    }

    #[test]
    fn missing_regions_are_empty() {
        let sets = compose(&[PageDefinition::default()]).expect("composes");
        assert!(sets[0].header.is_none());
        assert!(sets[0].body.is_none());
        assert!(sets[0].footer.is_none());
    }
}
