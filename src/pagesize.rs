//! Pre-defined page sizes for the paper formats a page specification can name.
//!
//! All sizes are provided in portrait orientation (width, height) where width ≤ height.
//! Use the [`PageOrientation`](crate::pagesize::PageOrientation) trait to convert between
//! portrait and landscape, and [`by_name`](crate::pagesize::by_name) to resolve a
//! `rectangle` value from a specification.

use crate::units::*;

/// Page dimensions as (width, height) in points.
pub type PageSize = (Pt, Pt);

// north american sizes
pub const LETTER: PageSize = (Pt(8.5 * 72.0), Pt(11.0 * 72.0));
pub const LEGAL: PageSize = (Pt(8.5 * 72.0), Pt(14.0 * 72.0));
pub const TABLOID: PageSize = (Pt(11.0 * 72.0), Pt(17.0 * 72.0));

// iso a-series (converted from mm to points)
pub const A0: PageSize = (Pt(841.0 * 72.0 / 25.4), Pt(1189.0 * 72.0 / 25.4));
pub const A1: PageSize = (Pt(594.0 * 72.0 / 25.4), Pt(841.0 * 72.0 / 25.4));
pub const A2: PageSize = (Pt(420.0 * 72.0 / 25.4), Pt(594.0 * 72.0 / 25.4));
pub const A3: PageSize = (Pt(297.0 * 72.0 / 25.4), Pt(420.0 * 72.0 / 25.4));
pub const A4: PageSize = (Pt(210.0 * 72.0 / 25.4), Pt(297.0 * 72.0 / 25.4));
pub const A5: PageSize = (Pt(148.0 * 72.0 / 25.4), Pt(210.0 * 72.0 / 25.4));
pub const A6: PageSize = (Pt(105.0 * 72.0 / 25.4), Pt(148.0 * 72.0 / 25.4));

/// Resolve a named paper size, case-insensitively. Unknown or absent names
/// resolve to [A4].
pub fn by_name(name: Option<&str>) -> PageSize {
    match name.map(|n| n.trim().to_ascii_uppercase()).as_deref() {
        Some("LETTER") => LETTER,
        Some("LEGAL") => LEGAL,
        Some("TABLOID") => TABLOID,
        Some("A0") => A0,
        Some("A1") => A1,
        Some("A2") => A2,
        Some("A3") => A3,
        Some("A5") => A5,
        Some("A6") => A6,
        Some("A4") | None => A4,
        Some(other) => {
            log::warn!("unknown paper size `{other}`, using A4");
            A4
        }
    }
}

/// Convert page sizes between portrait and landscape orientations.
pub trait PageOrientation {
    /// Returns the size in portrait orientation (width ≤ height).
    fn portrait(self) -> Self;
    /// Returns the size in landscape orientation (width ≥ height).
    fn landscape(self) -> Self;
}

impl PageOrientation for PageSize {
    fn portrait(self) -> Self {
        if self.0 <= self.1 {
            self
        } else {
            (self.1, self.0)
        }
    }

    fn landscape(self) -> PageSize {
        if self.0 >= self.1 {
            self
        } else {
            (self.1, self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_names_fall_back_to_a4() {
        assert_eq!(by_name(Some("B5")), A4);
        assert_eq!(by_name(None), A4);
        assert_eq!(by_name(Some("letter")), LETTER);
    }

    #[test]
    fn landscape_swaps_dimensions() {
        let (w, h) = A4.landscape();
        assert!(w > h);
        assert_eq!((w, h), (A4.1, A4.0));
        assert_eq!(A4.landscape().portrait(), A4);
    }
}
