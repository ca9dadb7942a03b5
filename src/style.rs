//! Small, pure helpers that turn loosely specified style attributes into
//! layout values: colours, alignments, gaps, font names, and page-number tokens.

use crate::colour::Colour;
use crate::units::Pt;

/// Token the renderer replaces with the logical page number
pub const PAGE_NUMBER_TOKEN: &str = "${totalpagenumber}";
/// Token the renderer replaces with the zero-based logical page index
pub const PAGE_INDEX_TOKEN: &str = "${totalpageindex}";
/// Token the renderer replaces with the logical page count
pub const PAGE_COUNT_TOKEN: &str = "${totalpagecount}";

/// Suffix appended to a font name to select its bold face
pub const BOLD_SUFFIX: &str = "-bd";

/// Fully transparent black, treated the same as "no colour"
const TRANSPARENT: &str = "#00000000";

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum HorizontalAlignment {
    Left,
    #[default]
    Center,
    Right,
}

impl HorizontalAlignment {
    /// Unspecified or unrecognised values centre the content
    pub fn resolve(value: Option<&str>) -> HorizontalAlignment {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("left") => HorizontalAlignment::Left,
            Some(v) if v.eq_ignore_ascii_case("right") => HorizontalAlignment::Right,
            _ => HorizontalAlignment::Center,
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum VerticalAlignment {
    Top,
    #[default]
    Middle,
    Bottom,
}

impl VerticalAlignment {
    /// Unspecified or unrecognised values place content in the middle
    pub fn resolve(value: Option<&str>) -> VerticalAlignment {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("top") => VerticalAlignment::Top,
            Some(v) if v.eq_ignore_ascii_case("bottom") => VerticalAlignment::Bottom,
            _ => VerticalAlignment::Middle,
        }
    }
}

/// Decode a hex colour. Blank input and fully transparent black yield [None].
pub fn resolve_colour(hex: Option<&str>) -> Option<Colour> {
    let hex = hex.map(str::trim).filter(|h| !h.is_empty())?;
    if hex.eq_ignore_ascii_case(TRANSPARENT) {
        return None;
    }
    let colour = Colour::from_hex(hex);
    if colour.is_none() {
        log::warn!("ignoring unparseable colour `{hex}`");
    }
    colour
}

/// Map a named table gap onto cell padding
pub fn gap_to_padding(gap: Option<&str>) -> Pt {
    match gap.map(str::trim) {
        Some("compact") => Pt(2.0),
        Some("loose") => Pt(10.0),
        _ => Pt(6.0),
    }
}

/// Assemble the cache name of a font: blank names mean "use the default",
/// and `bold` selects the face carrying the bold suffix.
pub fn font_spec(name: Option<&str>, bold: bool) -> Option<String> {
    let name = name.map(str::trim).filter(|n| !n.is_empty())?;
    if bold && !name.ends_with(BOLD_SUFFIX) {
        Some(format!("{name}{BOLD_SUFFIX}"))
    } else {
        Some(name.to_string())
    }
}

/// Swap the author-facing page tokens for the ones the renderer substitutes
pub fn substitute_page_tokens(text: Option<&str>) -> String {
    match text {
        Some(text) if !text.trim().is_empty() => text
            .replace("${PAGE_NUMBER}", PAGE_NUMBER_TOKEN)
            .replace("${PAGE_INDEX}", PAGE_INDEX_TOKEN)
            .replace("${PAGE_COUNT}", PAGE_COUNT_TOKEN),
        _ => String::new(),
    }
}

/// Whether the text carries any renderer page token
pub fn has_page_tokens(text: &str) -> bool {
    text.contains(PAGE_NUMBER_TOKEN)
        || text.contains(PAGE_INDEX_TOKEN)
        || text.contains(PAGE_COUNT_TOKEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparent_and_blank_colours_are_none() {
        assert_eq!(resolve_colour(None), None);
        assert_eq!(resolve_colour(Some("  ")), None);
        assert_eq!(resolve_colour(Some("#00000000")), None);
        assert_eq!(
            resolve_colour(Some("#000000")),
            Some(Colour::new_rgb_bytes(0, 0, 0))
        );
    }

    #[test]
    fn alignments_default_to_centre_and_middle() {
        assert_eq!(HorizontalAlignment::resolve(None), HorizontalAlignment::Center);
        assert_eq!(
            HorizontalAlignment::resolve(Some("justify")),
            HorizontalAlignment::Center
        );
        assert_eq!(
            HorizontalAlignment::resolve(Some("left")),
            HorizontalAlignment::Left
        );
        assert_eq!(VerticalAlignment::resolve(None), VerticalAlignment::Middle);
        assert_eq!(
            VerticalAlignment::resolve(Some("bottom")),
            VerticalAlignment::Bottom
        );
    }

    #[test]
    fn gap_names() {
        assert_eq!(gap_to_padding(Some("compact")), Pt(2.0));
        assert_eq!(gap_to_padding(Some("loose")), Pt(10.0));
        assert_eq!(gap_to_padding(Some("normal")), Pt(6.0));
        assert_eq!(gap_to_padding(None), Pt(6.0));
    }

    #[test]
    fn bold_fonts_get_suffix() {
        assert_eq!(font_spec(Some("roboto"), true).as_deref(), Some("roboto-bd"));
        assert_eq!(font_spec(Some("roboto-bd"), true).as_deref(), Some("roboto-bd"));
        assert_eq!(font_spec(Some("roboto"), false).as_deref(), Some("roboto"));
        assert_eq!(font_spec(Some(""), true), None);
    }

    #[test]
    fn page_tokens() {
        assert_eq!(
            substitute_page_tokens(Some("Page ${PAGE_NUMBER} of ${PAGE_COUNT}")),
            "Page ${totalpagenumber} of ${totalpagecount}"
        );
        assert_eq!(substitute_page_tokens(Some("${PAGE_INDEX}")), PAGE_INDEX_TOKEN);
        assert_eq!(substitute_page_tokens(Some("plain")), "plain");
        assert_eq!(substitute_page_tokens(Some("   ")), "");
        assert_eq!(substitute_page_tokens(None), "");
    }
}
