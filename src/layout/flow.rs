//! Placement of the render tree onto pages.
//!
//! Headers and footers are drawn whole on every page. The body flows from
//! page to page: elements that do not fit move to the next page, tables are
//! split between rows (descending into single-cell rows that hold a table)
//! and repeat their header rows on every page they continue onto. An element
//! that does not fit even on an empty page is placed anyway and overflows.

use super::measure::{
    content_width, fit_image, height, natural_width, resolve_columns, row_height, row_slots,
    IgnoreWidths,
};
use super::text::wrap_text;
use crate::colour::{colours, Colour};
use crate::font::FontHandle;
use crate::image::ImageHandle;
use crate::rect::Rect;
use crate::style::{HorizontalAlignment, VerticalAlignment};
use crate::tree::{Cell, Element, Grid, Row, Table, TextRun};
use crate::units::Pt;

/// A drawing instruction in page coordinates (origin bottom-left, y up)
#[derive(Debug, Clone)]
pub enum Primitive {
    Text {
        x: Pt,
        baseline: Pt,
        text: String,
        font: FontHandle,
        size: Pt,
        colour: Colour,
    },
    Image {
        rect: Rect,
        image: ImageHandle,
    },
    Fill {
        rect: Rect,
        colour: Colour,
    },
    Line {
        from: (Pt, Pt),
        to: (Pt, Pt),
        width: Pt,
        colour: Colour,
    },
    Link {
        rect: Rect,
        uri: String,
    },
}

/// Everything drawn on one physical page
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub width: Pt,
    pub height: Pt,
    pub primitives: Vec<Primitive>,
}

/// The area body content flows through on every page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x: Pt,
    pub top: Pt,
    pub width: Pt,
    pub bottom: Pt,
}

/// Draw an element whole with its top-left corner at (`x`, `top`). Returns
/// the height used.
pub fn draw(
    element: &Element,
    x: Pt,
    top: Pt,
    width: Pt,
    align: HorizontalAlignment,
    out: &mut Vec<Primitive>,
) -> Pt {
    match element {
        Element::Text(run) => draw_text(run, x, top, width, align, out),
        Element::Image(image) => {
            let (w, h) = fit_image(image, width);
            let rect = Rect::from_top_left(x + offset(align, width, w), top, w, h);
            out.push(Primitive::Image {
                rect,
                image: image.image.clone(),
            });
            h
        }
        Element::Block(block) => {
            let w = block.width.non_negative().min(width);
            let h = block.height.non_negative();
            if let Some(colour) = block.fill {
                let rect = Rect::from_top_left(x + offset(align, width, w), top, w, h);
                out.push(Primitive::Fill { rect, colour });
            }
            h
        }
        Element::Link(link) => {
            let h = draw(&link.child, x, top, width, align, out);
            let w = natural_width(&link.child).unwrap_or(width).min(width);
            out.push(Primitive::Link {
                rect: Rect::from_top_left(x + offset(align, width, w), top, w, h),
                uri: link.uri.clone(),
            });
            h
        }
        Element::PageBreak => Pt::ZERO,
        Element::Table(table) => {
            let inner_x = x + table.margin.left;
            let inner_width = (width - table.margin.horizontal()).non_negative();
            let columns = resolve_columns(&table.columns, inner_width);
            let rows: Vec<(&Row, Pt)> = table
                .rows
                .iter()
                .map(|row| (row, row_height(row, &columns, &mut IgnoreWidths)))
                .collect();
            let body = draw_rows(
                table,
                &rows,
                &columns,
                inner_x,
                top - table.margin.top,
                inner_width,
                out,
            );
            table.margin.vertical() + body
        }
    }
}

fn draw_text(
    run: &TextRun,
    x: Pt,
    top: Pt,
    width: Pt,
    align: HorizontalAlignment,
    out: &mut Vec<Primitive>,
) -> Pt {
    let line_height = run.font.line_height(run.size);
    let ascent = run.font.ascent(run.size);
    let lines = wrap_text(&run.text, &run.font, run.size, width);
    for (i, line) in lines.iter().enumerate() {
        if line.text.is_empty() {
            continue;
        }
        let line_x = x + offset(align, width, line.width);
        let baseline = top - ascent - line_height * i as f32;
        out.push(Primitive::Text {
            x: line_x,
            baseline,
            text: line.text.clone(),
            font: run.font.clone(),
            size: run.size,
            colour: run.colour,
        });
        if run.underline {
            let y = baseline - run.size * 0.12;
            out.push(Primitive::Line {
                from: (line_x, y),
                to: (line_x + line.width, y),
                width: run.size * 0.06,
                colour: run.colour,
            });
        }
    }
    line_height * lines.len() as f32
}

fn offset(align: HorizontalAlignment, available: Pt, used: Pt) -> Pt {
    let free = (available - used).non_negative();
    match align {
        HorizontalAlignment::Left => Pt::ZERO,
        HorizontalAlignment::Center => free / 2.0,
        HorizontalAlignment::Right => free,
    }
}

/// Draw a run of rows of one table, with its grid, starting at `top`.
/// Returns the height of the rows.
fn draw_rows(
    table: &Table,
    rows: &[(&Row, Pt)],
    columns: &[Pt],
    x: Pt,
    top: Pt,
    width: Pt,
    out: &mut Vec<Primitive>,
) -> Pt {
    if rows.is_empty() {
        return Pt::ZERO;
    }

    let mut lines: Vec<Primitive> = Vec::new();
    let stroke = table.stroke;
    let mut line = |from: (Pt, Pt), to: (Pt, Pt), weight: Pt| {
        lines.push(Primitive::Line {
            from,
            to,
            width: weight,
            colour: stroke.colour,
        })
    };

    let mut y = top;
    for (i, &(row, row_h)) in rows.iter().enumerate() {
        let slots = row_slots(row, columns);
        for (cell, slot) in &slots {
            let cell_x = x + slot.x;
            if let Some(colour) = cell.fill {
                out.push(Primitive::Fill {
                    rect: Rect::from_top_left(cell_x, y, slot.width, row_h),
                    colour,
                });
            }
            draw_cell(cell, cell_x, y, row_h, content_width(cell, slot), out);
            if let Some(weight) = cell.rule_top {
                line((cell_x, y), (cell_x + slot.width, y), weight);
            }
        }

        let vertical_lines = matches!(table.grid, Grid::Full | Grid::InnerOnly);
        if vertical_lines {
            for (_, slot) in slots.iter().skip(1) {
                let lx = x + slot.x;
                line((lx, y), (lx, y - row_h), stroke.width);
            }
        }
        if i > 0 && table.grid != Grid::None {
            line((x, y), (x + width, y), stroke.width);
        }
        y -= row_h;
    }

    let used = top - y;
    if table.grid == Grid::Full {
        line((x, top), (x + width, top), stroke.width);
        line((x, y), (x + width, y), stroke.width);
        line((x, top), (x, y), stroke.width);
        line((x + width, top), (x + width, y), stroke.width);
    }
    out.extend(lines);
    used
}

fn draw_cell(
    cell: &Cell,
    x: Pt,
    top: Pt,
    row_height: Pt,
    inner_width: Pt,
    out: &mut Vec<Primitive>,
) {
    let content_height = height(&cell.content, inner_width, &mut IgnoreWidths);
    let free = (row_height - cell.padding.vertical() - content_height).non_negative();
    let shift = match cell.valign {
        VerticalAlignment::Top => Pt::ZERO,
        VerticalAlignment::Middle => free / 2.0,
        VerticalAlignment::Bottom => free,
    };
    draw(
        &cell.content,
        x + cell.padding.left,
        top - cell.padding.top - shift,
        inner_width,
        cell.halign,
        out,
    );
}

/// A table's header rows, redrawn at the top of each continuation page
#[derive(Clone)]
struct Repeat<'a> {
    table: &'a Table,
    rows: Vec<(&'a Row, Pt)>,
    columns: Vec<Pt>,
    x: Pt,
    width: Pt,
}

/// Rows of one table collected for the current page, drawn in one go
struct Segment<'a> {
    table: &'a Table,
    columns: Vec<Pt>,
    x: Pt,
    width: Pt,
    top: Pt,
    rows: Vec<(&'a Row, Pt)>,
}

/// Flows body content over as many pages as it needs
pub struct BodyFlow<'a> {
    frame: Frame,
    pages: Vec<Vec<Primitive>>,
    cursor: Pt,
    /// Nothing but repeated headers has been placed on the current page
    fresh: bool,
    repeats: Vec<Repeat<'a>>,
}

impl<'a> BodyFlow<'a> {
    pub fn new(frame: Frame) -> Self {
        BodyFlow {
            frame,
            pages: vec![Vec::new()],
            cursor: frame.top,
            fresh: true,
            repeats: Vec::new(),
        }
    }

    /// Primitives of every body page; always at least one page
    pub fn finish(self) -> Vec<Vec<Primitive>> {
        self.pages
    }

    pub fn place(&mut self, element: &'a Element) {
        let frame = self.frame;
        self.place_at(element, frame.x, frame.width, HorizontalAlignment::Left);
    }

    fn remaining(&self) -> Pt {
        self.cursor - self.frame.bottom
    }

    fn out(&mut self) -> &mut Vec<Primitive> {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.cursor = self.frame.top;
        self.fresh = true;

        let repeats = std::mem::take(&mut self.repeats);
        for repeat in &repeats {
            let top = self.cursor;
            let mut out = Vec::new();
            let used = draw_rows(
                repeat.table,
                &repeat.rows,
                &repeat.columns,
                repeat.x,
                top,
                repeat.width,
                &mut out,
            );
            self.out().extend(out);
            self.cursor -= used;
        }
        self.repeats = repeats;
    }

    fn place_at(&mut self, element: &'a Element, x: Pt, width: Pt, align: HorizontalAlignment) {
        match element {
            Element::PageBreak => {
                if !self.fresh {
                    self.new_page();
                }
            }
            Element::Table(table) => self.place_table(table, x, width),
            other => {
                let h = height(other, width, &mut IgnoreWidths);
                if h > self.remaining() && !self.fresh {
                    self.new_page();
                }
                if h > self.remaining() {
                    log::warn!("content taller than the page body, it will overflow");
                }
                let top = self.cursor;
                let mut out = Vec::new();
                draw(other, x, top, width, align, &mut out);
                self.out().extend(out);
                self.cursor -= h;
                self.fresh = false;
            }
        }
    }

    fn flush(&mut self, segment: Segment<'a>) {
        let mut out = Vec::new();
        draw_rows(
            segment.table,
            &segment.rows,
            &segment.columns,
            segment.x,
            segment.top,
            segment.width,
            &mut out,
        );
        self.out().extend(out);
    }

    fn place_table(&mut self, table: &'a Table, x: Pt, width: Pt) {
        let inner_x = x + table.margin.left;
        let inner_width = (width - table.margin.horizontal()).non_negative();
        let columns = resolve_columns(&table.columns, inner_width);
        let measured: Vec<(&'a Row, Pt)> = table
            .rows
            .iter()
            .map(|row| (row, row_height(row, &columns, &mut IgnoreWidths)))
            .collect();

        let header_count = table.header_rows.min(measured.len());
        let (header, body) = measured.split_at(header_count);
        let header_height: Pt = header.iter().map(|&(_, h)| h).sum();
        let first_body = body.first().map(|&(_, h)| h).unwrap_or_default();

        // keep the header together with the first body row
        if table.margin.top + header_height + first_body > self.remaining() && !self.fresh {
            self.new_page();
        }
        self.cursor -= table.margin.top;

        let segment_at = |top: Pt| Segment {
            table,
            columns: columns.clone(),
            x: inner_x,
            width: inner_width,
            top,
            rows: Vec::new(),
        };
        let mut segment = segment_at(self.cursor);
        for &(row, h) in header {
            segment.rows.push((row, h));
            self.cursor -= h;
            self.fresh = false;
        }
        let repeating = !header.is_empty();
        if repeating {
            self.repeats.push(Repeat {
                table,
                rows: header.to_vec(),
                columns: columns.clone(),
                x: inner_x,
                width: inner_width,
            });
        }

        for &(row, h) in body {
            if row.is_page_break() {
                self.flush(std::mem::replace(&mut segment, segment_at(self.cursor)));
                if !self.fresh {
                    self.new_page();
                }
                segment = segment_at(self.cursor);
                continue;
            }

            // rows that overflow or hold a page break further down are split
            // inside their nested table when they have one
            if h > self.remaining() || row.contains_page_break() {
                if let Some((cell, inner, slot_x, slot_width)) = nested_table(row, &columns) {
                    self.flush(std::mem::replace(&mut segment, segment_at(self.cursor)));
                    self.cursor -= cell.padding.top;
                    self.place_table(
                        inner,
                        inner_x + slot_x + cell.padding.left,
                        (slot_width - cell.padding.horizontal()).non_negative(),
                    );
                    self.cursor -= cell.padding.bottom;
                    segment = segment_at(self.cursor);
                    continue;
                }
            }

            if h <= self.remaining() {
                segment.rows.push((row, h));
                self.cursor -= h;
                self.fresh = false;
                continue;
            }

            if !self.fresh {
                self.flush(std::mem::replace(&mut segment, segment_at(self.cursor)));
                self.new_page();
                segment = segment_at(self.cursor);
            }
            if h > self.remaining() {
                log::warn!("table row taller than the page body, it will overflow");
            }
            segment.rows.push((row, h));
            self.cursor -= h;
            self.fresh = false;
        }

        self.flush(segment);
        if repeating {
            self.repeats.pop();
        }
        self.cursor -= table.margin.bottom;
    }
}

/// A row made of a single cell holding a table can be split inside that table
fn nested_table<'a>(row: &'a Row, columns: &[Pt]) -> Option<(&'a Cell, &'a Table, Pt, Pt)> {
    let slots = row_slots(row, columns);
    let [(cell, slot)] = slots.as_slice() else {
        return None;
    };
    let cell: &'a Cell = cell;
    match &cell.content {
        Element::Table(inner) => Some((cell, inner, slot.x, slot.width)),
        _ => None,
    }
}

/// Draw a horizontal rule across a region
pub fn rule(x: Pt, y: Pt, width: Pt, weight: Pt) -> Primitive {
    Primitive::Line {
        from: (x, y),
        to: (x + width, y),
        width: weight,
        colour: colours::BLACK,
    }
}
