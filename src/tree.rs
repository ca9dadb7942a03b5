//! The render tree: what the compositor produces and the backend lays out.

use crate::colour::Colour;
use crate::font::FontHandle;
use crate::image::ImageHandle;
use crate::layout::Margins;
use crate::pagination::PageConfig;
use crate::registry::RegistryKey;
use crate::style::{HorizontalAlignment, VerticalAlignment};
use crate::units::Pt;

/// One node of the render tree
#[derive(Debug, Clone)]
pub enum Element {
    Text(TextRun),
    Image(ImageBox),
    /// A box reserving space, optionally filled
    Block(Block),
    /// Content that links to a URI
    Link(Link),
    Table(Table),
    /// Forces the following content onto a new page
    PageBreak,
}

impl Element {
    /// Walk this element and everything nested inside it
    pub fn visit<'e>(&'e self, f: &mut impl FnMut(&'e Element)) {
        f(self);
        match self {
            Element::Link(link) => link.child.visit(f),
            Element::Table(table) => {
                for cell in table.rows.iter().flat_map(|row| row.cells.iter()) {
                    cell.content.visit(f);
                }
            }
            _ => {}
        }
    }

    /// Whether a forced page break sits anywhere in this element
    pub fn contains_page_break(&self) -> bool {
        let mut found = false;
        self.visit(&mut |element| found |= matches!(element, Element::PageBreak));
        found
    }

    /// The text of every text run, in document order
    pub fn texts(&self) -> Vec<&str> {
        let mut texts = Vec::new();
        self.visit(&mut |element| {
            if let Element::Text(run) = element {
                texts.push(run.text.as_str());
            }
        });
        texts
    }
}

/// A run of text in a single font, wrapped to the width it is given
#[derive(Debug, Clone)]
pub struct TextRun {
    pub text: String,
    pub font: FontHandle,
    pub size: Pt,
    pub colour: Colour,
    pub underline: bool,
}

#[derive(Debug, Clone)]
pub struct ImageBox {
    pub image: ImageHandle,
    pub width: Pt,
    pub height: Pt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub width: Pt,
    pub height: Pt,
    pub fill: Option<Colour>,
}

#[derive(Debug, Clone)]
pub struct Link {
    pub uri: String,
    pub child: Box<Element>,
}

/// How a column claims its share of the table width
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WidthSpec {
    /// A weighted share of whatever the fixed columns leave
    Star(f32),
    /// Percentage of the table width
    Percent(f32),
    Absolute(Pt),
}

/// Which lines of a table are drawn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Grid {
    #[default]
    None,
    /// Outer border and every line between cells
    Full,
    /// Every line between cells, no outer border
    InnerOnly,
    /// Only the horizontal lines between rows
    HorizontalRules,
}

/// Line weight and colour of a table's grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: Pt,
    pub colour: Colour,
}

impl Default for Stroke {
    fn default() -> Self {
        Stroke {
            width: Pt(1.0),
            colour: crate::colour::colours::BLACK,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Set on data-bound tables whose width the measurement pass records
    pub key: Option<RegistryKey>,
    pub columns: Vec<WidthSpec>,
    pub rows: Vec<Row>,
    /// Leading rows repeated at the top of every page the table spans
    pub header_rows: usize,
    pub grid: Grid,
    pub stroke: Stroke,
    pub margin: Margins,
}

impl Table {
    /// A single-column table stacking its rows
    pub fn stack(rows: Vec<Row>) -> Table {
        Table {
            columns: vec![WidthSpec::Star(1.0)],
            rows,
            ..Table::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Row {
        Row { cells }
    }

    /// A row holding only a forced page break
    pub fn is_page_break(&self) -> bool {
        matches!(self.cells.as_slice(), [cell] if matches!(cell.content, Element::PageBreak))
    }

    pub fn contains_page_break(&self) -> bool {
        self.cells.iter().any(|cell| cell.content.contains_page_break())
    }
}

#[derive(Debug, Clone)]
pub struct Cell {
    pub content: Element,
    pub colspan: usize,
    pub padding: Margins,
    pub halign: HorizontalAlignment,
    pub valign: VerticalAlignment,
    pub fill: Option<Colour>,
    /// Rule drawn along the top edge, independent of the table grid
    pub rule_top: Option<Pt>,
    /// Set on header cells of leaf columns; the measurement pass records their width
    pub key: Option<RegistryKey>,
}

impl Cell {
    pub fn new(content: Element) -> Cell {
        Cell {
            content,
            colspan: 1,
            padding: Margins::empty(),
            halign: HorizontalAlignment::Left,
            valign: VerticalAlignment::Top,
            fill: None,
            rule_top: None,
            key: None,
        }
    }

    pub fn with_colspan(mut self, colspan: usize) -> Cell {
        self.colspan = colspan.max(1);
        self
    }

    pub fn with_padding(mut self, padding: Margins) -> Cell {
        self.padding = padding;
        self
    }

    pub fn with_alignment(mut self, halign: HorizontalAlignment, valign: VerticalAlignment) -> Cell {
        self.halign = halign;
        self.valign = valign;
        self
    }

    pub fn with_fill(mut self, fill: Option<Colour>) -> Cell {
        self.fill = fill;
        self
    }
}

/// The assembled content of one page specification, handed to the backend
#[derive(Debug, Clone)]
pub struct PageSet {
    pub config: PageConfig,
    pub header: Option<Element>,
    pub body: Option<Element>,
    pub footer: Option<Element>,
}

/// The final output of composition: every page set, in order, plus the
/// page numbering applied to the whole document
#[derive(Debug, Clone)]
pub struct ComposedDocument {
    pub page_sets: Vec<PageSet>,
    pub numbering: crate::pagination::PageNumbering,
}
