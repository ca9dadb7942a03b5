//! Sizing of render elements. Widths flow down from the container, heights
//! come back up; tables report the widths they hand out to a [WidthObserver].

use super::text::{widest_line, wrap_text};
use crate::registry::RegistryKey;
use crate::table::clamp_colspan;
use crate::tree::{Cell, Element, ImageBox, Row, TextRun, WidthSpec};
use crate::units::Pt;

/// Receives the width given to every keyed table and header cell while sizing
pub trait WidthObserver {
    fn observe(&mut self, key: &RegistryKey, width: Pt);
}

/// Sizing without recording anything
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreWidths;

impl WidthObserver for IgnoreWidths {
    fn observe(&mut self, _key: &RegistryKey, _width: Pt) {}
}

/// Position of a cell within its row, relative to the table's inner left edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSlot {
    pub x: Pt,
    pub width: Pt,
    pub column: usize,
    pub span: usize,
}

/// Distribute a table width over its columns: absolute widths first, then
/// percentages of the whole width, then star weights share what is left
pub fn resolve_columns(specs: &[WidthSpec], width: Pt) -> Vec<Pt> {
    let fixed: Pt = specs
        .iter()
        .map(|spec| match *spec {
            WidthSpec::Absolute(w) => w.non_negative(),
            WidthSpec::Percent(p) => width * (p.max(0.0) / 100.0),
            WidthSpec::Star(_) => Pt::ZERO,
        })
        .sum();
    let stars: f32 = specs
        .iter()
        .map(|spec| match *spec {
            WidthSpec::Star(weight) => weight.max(0.0),
            _ => 0.0,
        })
        .sum();
    let remaining = (width - fixed).non_negative();

    specs
        .iter()
        .map(|spec| match *spec {
            WidthSpec::Absolute(w) => w.non_negative(),
            WidthSpec::Percent(p) => width * (p.max(0.0) / 100.0),
            WidthSpec::Star(weight) if stars > 0.0 => remaining * (weight.max(0.0) / stars),
            WidthSpec::Star(_) => Pt::ZERO,
        })
        .collect()
}

/// Place the cells of a row onto the columns. Spans are clamped to the
/// columns that remain; cells beyond the last column are not placed.
pub fn row_slots<'r>(row: &'r Row, columns: &[Pt]) -> Vec<(&'r Cell, CellSlot)> {
    let mut slots = Vec::with_capacity(row.cells.len());
    let mut column = 0;
    let mut x = Pt::ZERO;
    for cell in &row.cells {
        if column >= columns.len() {
            break;
        }
        let span = clamp_colspan(cell.colspan, column, columns.len());
        let width: Pt = columns[column..column + span].iter().copied().sum();
        slots.push((
            cell,
            CellSlot {
                x,
                width,
                column,
                span,
            },
        ));
        x += width;
        column += span;
    }
    slots
}

/// Width left for a cell's content once its padding is taken off
pub fn content_width(cell: &Cell, slot: &CellSlot) -> Pt {
    (slot.width - cell.padding.horizontal()).non_negative()
}

pub fn row_height(row: &Row, columns: &[Pt], observer: &mut dyn WidthObserver) -> Pt {
    row_slots(row, columns)
        .into_iter()
        .map(|(cell, slot)| {
            if let Some(key) = &cell.key {
                observer.observe(key, slot.width);
            }
            height(&cell.content, content_width(cell, &slot), observer) + cell.padding.vertical()
        })
        .fold(Pt::ZERO, Pt::max)
}

/// Height the element occupies when laid out at `width`
pub fn height(element: &Element, width: Pt, observer: &mut dyn WidthObserver) -> Pt {
    match element {
        Element::Text(run) => text_height(run, width),
        Element::Image(image) => fit_image(image, width).1,
        Element::Block(block) => block.height.non_negative(),
        Element::Link(link) => height(&link.child, width, observer),
        Element::PageBreak => Pt::ZERO,
        Element::Table(table) => {
            let inner = (width - table.margin.horizontal()).non_negative();
            if let Some(key) = &table.key {
                observer.observe(key, inner);
            }
            let columns = resolve_columns(&table.columns, inner);
            let rows: Pt = table
                .rows
                .iter()
                .map(|row| row_height(row, &columns, observer))
                .sum();
            table.margin.vertical() + rows
        }
    }
}

pub fn text_height(run: &TextRun, width: Pt) -> Pt {
    let lines = wrap_text(&run.text, &run.font, run.size, width).len();
    run.font.line_height(run.size) * lines as f32
}

/// Width the element would like, if it has one; tables take whatever they are given
pub fn natural_width(element: &Element) -> Option<Pt> {
    match element {
        Element::Text(run) => Some(widest_line(&run.text, &run.font, run.size)),
        Element::Image(image) => Some(image.width),
        Element::Block(block) => Some(block.width.non_negative()),
        Element::Link(link) => natural_width(&link.child),
        Element::PageBreak => Some(Pt::ZERO),
        Element::Table(_) => None,
    }
}

/// Images wider than the space available shrink, keeping their aspect ratio
pub fn fit_image(image: &ImageBox, width: Pt) -> (Pt, Pt) {
    if image.width > width && image.width > Pt::ZERO {
        let scale = width / image.width;
        (width, image.height * scale)
    } else {
        (image.width, image.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{Font, StandardFont};
    use crate::registry::RegistryRecorder;
    use crate::tree::{Block, Table};
    use std::sync::Arc;

    fn text(value: &str) -> Element {
        Element::Text(TextRun {
            text: value.to_string(),
            font: Arc::new(Font::standard(StandardFont::Helvetica)),
            size: Pt(10.0),
            colour: crate::colour::colours::BLACK,
            underline: false,
        })
    }

    #[test]
    fn columns_share_the_width() {
        let widths = resolve_columns(
            &[
                WidthSpec::Absolute(Pt(100.0)),
                WidthSpec::Percent(25.0),
                WidthSpec::Star(1.0),
                WidthSpec::Star(3.0),
            ],
            Pt(400.0),
        );
        assert_eq!(widths, vec![Pt(100.0), Pt(100.0), Pt(50.0), Pt(150.0)]);
    }

    #[test]
    fn spans_are_clamped_to_the_remaining_columns() {
        let row = Row::new(vec![
            Cell::new(text("a")),
            Cell::new(text("b")).with_colspan(5),
            Cell::new(text("dropped")),
        ]);
        let slots = row_slots(&row, &[Pt(10.0), Pt(20.0), Pt(30.0)]);
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[1].1.span, 2);
        assert_eq!(slots[1].1.x, Pt(10.0));
        assert_eq!(slots[1].1.width, Pt(50.0));
    }

    #[test]
    fn keyed_cells_report_their_width() {
        let mut header = Cell::new(text("Name"));
        header.key = Some(RegistryKey::column("t", "name"));
        let table = Table {
            key: Some(RegistryKey::table("t")),
            columns: vec![WidthSpec::Star(1.0), WidthSpec::Star(1.0)],
            rows: vec![Row::new(vec![header, Cell::new(text("other"))])],
            ..Table::default()
        };

        let mut recorder = RegistryRecorder::new();
        recorder.register_column("t", "name");
        height(&Element::Table(table), Pt(300.0), &mut recorder);
        let registry = recorder.finish();
        let measured = registry.table("t").expect("registered");
        assert_eq!(measured.width, Pt(300.0));
        assert_eq!(measured.column_widths(), vec![Pt(150.0)]);
    }

    #[test]
    fn row_height_is_the_tallest_cell() {
        let row = Row::new(vec![
            Cell::new(Element::Block(Block {
                width: Pt(5.0),
                height: Pt(40.0),
                fill: None,
            })),
            Cell::new(text("x")).with_padding(crate::layout::Margins::all(Pt(2.0))),
        ]);
        assert_eq!(row_height(&row, &[Pt(50.0), Pt(50.0)], &mut IgnoreWidths), Pt(40.0));
    }
}
