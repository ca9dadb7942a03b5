use crate::units::Pt;

/// Space around the four sides of a box. Used for page margins, body
/// paddings, header and footer insets, cell padding and table margins.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: Pt,
    pub right: Pt,
    pub bottom: Pt,
    pub left: Pt,
}

impl Margins {
    /// Create margins by specifying individual components in a clockwise fashion
    /// starting at the top (in the same order as CSS margins)
    pub fn trbl(top: Pt, right: Pt, bottom: Pt, left: Pt) -> Margins {
        Margins {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Create margins where all values are equal
    pub fn all<D: Into<Pt>>(value: D) -> Margins {
        let value: Pt = value.into();
        Margins::trbl(value, value, value, value)
    }

    /// Create margins where all values are 0.0
    pub fn empty() -> Margins {
        Margins::all(Pt::ZERO)
    }

    /// Build margins from optional per-side values; absent sides are zero
    pub fn from_sides(
        top: Option<f32>,
        right: Option<f32>,
        bottom: Option<f32>,
        left: Option<f32>,
    ) -> Margins {
        let side = |v: Option<f32>| Pt(v.unwrap_or_default());
        Margins::trbl(side(top), side(right), side(bottom), side(left))
    }

    /// left + right
    pub fn horizontal(&self) -> Pt {
        self.left + self.right
    }

    /// top + bottom
    pub fn vertical(&self) -> Pt {
        self.top + self.bottom
    }
}
