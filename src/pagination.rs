//! Page geometry and page numbering.

use crate::colour::{colours, Colour};
use crate::error::{Error, Result};
use crate::layout::{Frame, Margins};
use crate::model::{PageSettings, PaginationOverrides};
use crate::pagesize::{self, PageOrientation, PageSize};
use crate::style::{
    resolve_colour, PAGE_COUNT_TOKEN, PAGE_INDEX_TOKEN, PAGE_NUMBER_TOKEN,
};
use crate::units::Pt;

/// Font size used when a page specification names none
pub const DEFAULT_FONT_SIZE: f32 = 10.0;

/// Weight of the rules separating header and footer from the body
pub const DIVIDER_WEIGHT: Pt = Pt(1.0);

/// Page-wide text defaults, the last tier of every style lookup
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultStyle {
    pub font: Option<String>,
    pub font_size: Pt,
    pub font_colour: Colour,
    pub background: Option<Colour>,
}

impl Default for DefaultStyle {
    fn default() -> Self {
        DefaultStyle {
            font: None,
            font_size: Pt(DEFAULT_FONT_SIZE),
            font_colour: colours::BLACK,
            background: None,
        }
    }
}

/// Resolved page geometry of one page specification
#[derive(Debug, Clone, PartialEq)]
pub struct PageConfig {
    pub size: PageSize,
    pub margins: Margins,
    pub body_padding: Margins,
    pub header_margins: Margins,
    pub footer_margins: Margins,
    pub hide_header_on_first_page: bool,
    pub hide_footer_on_first_page: bool,
    pub defaults: DefaultStyle,
}

impl Default for PageConfig {
    fn default() -> Self {
        PageConfig::resolve(&PageSettings::default())
    }
}

impl PageConfig {
    pub fn resolve(settings: &PageSettings) -> PageConfig {
        let size = pagesize::by_name(settings.rectangle.as_deref());
        let size = match settings.orientation.as_deref().map(str::trim) {
            Some(o) if o.eq_ignore_ascii_case("landscape") => size.landscape(),
            _ => size.portrait(),
        };

        let s = settings;
        PageConfig {
            size,
            margins: Margins::from_sides(s.m_top, s.m_right, s.m_bottom, s.m_left),
            body_padding: Margins::from_sides(
                s.m_top_body,
                s.m_right_body,
                s.m_bottom_body,
                s.m_left_body,
            ),
            header_margins: Margins::from_sides(
                s.m_top_header,
                s.m_right_header,
                s.m_bottom_header,
                s.m_left_header,
            ),
            footer_margins: Margins::from_sides(
                s.m_top_footer,
                s.m_right_footer,
                s.m_bottom_footer,
                s.m_left_footer,
            ),
            hide_header_on_first_page: s.hide_header_on_first_page,
            hide_footer_on_first_page: s.hide_footer_on_first_page,
            defaults: DefaultStyle {
                font: s
                    .default_page_root_font
                    .clone()
                    .filter(|f| !f.trim().is_empty()),
                font_size: Pt(s
                    .default_page_root_font_size
                    .filter(|size| *size > 0.0)
                    .unwrap_or(DEFAULT_FONT_SIZE)),
                font_colour: resolve_colour(s.default_page_root_font_color.as_deref())
                    .unwrap_or(colours::BLACK),
                background: resolve_colour(s.default_page_root_background_color.as_deref()),
            },
        }
    }

    pub fn width(&self) -> Pt {
        self.size.0
    }

    pub fn height(&self) -> Pt {
        self.size.1
    }

    /// Width between the left and right page margins
    pub fn content_width(&self) -> Pt {
        (self.width() - self.margins.horizontal()).non_negative()
    }

    /// Width available to header content
    pub fn header_width(&self) -> Pt {
        (self.content_width() - self.header_margins.horizontal()).non_negative()
    }

    /// Width available to footer content
    pub fn footer_width(&self) -> Pt {
        (self.content_width() - self.footer_margins.horizontal()).non_negative()
    }

    /// Width available to body content
    pub fn body_width(&self) -> Pt {
        (self.content_width() - self.body_padding.horizontal()).non_negative()
    }

    /// Vertical space the header reserves, given the height of its content
    pub fn header_block(&self, content: Option<Pt>) -> Pt {
        content
            .map(|h| self.header_margins.vertical() + h)
            .unwrap_or_default()
    }

    /// Vertical space the footer reserves, given the height of its content
    pub fn footer_block(&self, content: Option<Pt>) -> Pt {
        content
            .map(|h| self.footer_margins.vertical() + h)
            .unwrap_or_default()
    }

    /// Top edge of the header region
    pub fn header_top(&self) -> Pt {
        self.height() - self.margins.top
    }

    /// Bottom edge of the footer region
    pub fn footer_bottom(&self) -> Pt {
        self.margins.bottom
    }

    /// The area the body flows through, between header and footer
    pub fn body_frame(&self, header_block: Pt, footer_block: Pt) -> Result<Frame> {
        let top = self.header_top() - header_block - self.body_padding.top;
        let bottom = self.footer_bottom() + footer_block + self.body_padding.bottom;
        let width = self.body_width();
        if top <= bottom || width <= Pt::ZERO {
            return Err(Error::Geometry(format!(
                "the body area is {}pt wide and {}pt tall",
                width.0,
                (top - bottom).0
            )));
        }
        Ok(Frame {
            x: self.margins.left + self.body_padding.left,
            top,
            width,
            bottom,
        })
    }
}

/// Logical page numbering of the physical pages of one output.
///
/// Overrides arrive as `i32`; the arithmetic runs in `i64` and saturates, so
/// extreme overrides print clamped numbers instead of overflowing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageNumbering {
    /// Leading page count handed to the renderer, `-(first logical page - 1)`
    pub leading: i64,
    /// Overridden logical page count
    pub count: Option<i64>,
}

impl PageNumbering {
    pub fn from_overrides(overrides: &PaginationOverrides) -> PageNumbering {
        let leading = match (
            overrides.page_number_leading_enabled,
            overrides.page_number_leading,
        ) {
            (true, Some(first)) => 1 - i64::from(first),
            _ => 0,
        };
        let count = match (
            overrides.page_number_count_enabled,
            overrides.page_number_count,
        ) {
            (true, Some(count)) => Some(i64::from(count)),
            _ => None,
        };
        PageNumbering { leading, count }
    }

    /// Logical number of the physical page at `index`
    pub fn number(&self, index: usize) -> i64 {
        physical(index).saturating_add(1).saturating_sub(self.leading)
    }

    /// Zero-based logical index of the physical page at `index`
    pub fn index(&self, index: usize) -> i64 {
        self.number(index).saturating_sub(1)
    }

    /// Logical page count of an output with `physical` pages
    pub fn count(&self, pages: usize) -> i64 {
        self.count.unwrap_or_else(|| physical(pages).saturating_sub(self.leading))
    }

    /// Substitute the renderer page tokens in text drawn on page `index`
    pub fn apply(&self, text: &str, index: usize, physical: usize) -> String {
        text.replace(PAGE_NUMBER_TOKEN, &self.number(index).to_string())
            .replace(PAGE_INDEX_TOKEN, &self.index(index).to_string())
            .replace(PAGE_COUNT_TOKEN, &self.count(physical).to_string())
    }
}

fn physical(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
