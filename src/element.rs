//! Builds the render leaves of a page from content nodes.

use crate::binding::BindingResolver;
use crate::colour::colours;
use crate::font::FontCache;
use crate::image::ImageLoader;
use crate::layout::Margins;
use crate::model::{ColumnBinding, ContentNode, ImageNode, NodeStyle, PlaceholderNode, TextNode};
use crate::pagination::DefaultStyle;
use crate::style::{
    font_spec, resolve_colour, substitute_page_tokens, HorizontalAlignment, VerticalAlignment,
};
use crate::tree::{Block, Cell, Element, ImageBox, Link, TextRun};
use crate::units::Pt;

/// Width and height of images and placeholders that do not specify them
pub const DEFAULT_BOX_SIZE: f32 = 100.0;

/// Text attributes of one style tier. Unset attributes fall through to the
/// next tier; the page defaults are always the last one.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RunStyle<'s> {
    pub font: Option<&'s str>,
    pub bold: bool,
    pub size: Option<f32>,
    pub colour: Option<&'s str>,
}

impl<'s> RunStyle<'s> {
    pub fn of(style: &'s NodeStyle) -> Self {
        RunStyle {
            font: style.font.as_deref(),
            bold: style.bold,
            size: style.font_size,
            colour: style.font_color.as_deref(),
        }
    }

    pub fn of_column(binding: &'s ColumnBinding) -> Self {
        RunStyle {
            font: binding.font.as_deref(),
            bold: binding.bold,
            size: binding.font_size,
            colour: binding.font_color.as_deref(),
        }
    }

    /// Fill whatever this tier leaves unset from `lower`. A tier naming a
    /// font decides boldness on its own.
    pub fn or(self, lower: RunStyle<'s>) -> Self {
        let (font, bold) = match self.font.filter(|f| !f.trim().is_empty()) {
            Some(font) => (Some(font), self.bold),
            None => (lower.font, self.bold || lower.bold),
        };
        RunStyle {
            font,
            bold,
            size: self.size.filter(|s| *s > 0.0).or(lower.size),
            colour: self.colour.or(lower.colour),
        }
    }
}

/// Builds one render leaf per content category
#[derive(Debug, Clone, Copy)]
pub struct ElementBuilder<'a> {
    fonts: &'a FontCache,
    images: ImageLoader<'a>,
    bindings: BindingResolver<'a>,
    defaults: &'a DefaultStyle,
}

impl<'a> ElementBuilder<'a> {
    pub fn new(
        fonts: &'a FontCache,
        images: ImageLoader<'a>,
        bindings: BindingResolver<'a>,
        defaults: &'a DefaultStyle,
    ) -> Self {
        Self {
            fonts,
            images,
            bindings,
            defaults,
        }
    }

    pub fn images(&self) -> &ImageLoader<'a> {
        &self.images
    }

    pub fn bindings(&self) -> &BindingResolver<'a> {
        &self.bindings
    }

    pub fn defaults(&self) -> &DefaultStyle {
        self.defaults
    }

    /// Build the leaf for a node. Containers and tables are not leaves; they
    /// and image nodes without a value yield [None].
    pub fn leaf(&self, node: &ContentNode) -> Option<Element> {
        match node {
            ContentNode::Text(text) => Some(self.text(text)),
            ContentNode::PageNumber(text) => Some(self.page_number(text)),
            ContentNode::Image(image) => self.image(image),
            ContentNode::Placeholder(placeholder) => Some(self.placeholder(placeholder)),
            ContentNode::PageBreak => Some(Element::PageBreak),
            ContentNode::Container(_) | ContentNode::Table(_) => None,
        }
    }

    /// A run of text styled by `style`, falling back to the page defaults
    pub fn run(&self, text: String, style: RunStyle<'_>) -> TextRun {
        let page = RunStyle {
            font: self.defaults.font.as_deref(),
            ..RunStyle::default()
        };
        let style = style.or(page);
        TextRun {
            text,
            font: self.fonts.get_font(font_spec(style.font, style.bold).as_deref()),
            size: style.size.map(Pt).unwrap_or(self.defaults.font_size),
            colour: resolve_colour(style.colour).unwrap_or(self.defaults.font_colour),
            underline: false,
        }
    }

    pub fn text(&self, node: &TextNode) -> Element {
        let value = self
            .bindings
            .resolve(node.value.as_deref(), &node.bindings, node.style.indent);
        hyperlinked(self.run(value, RunStyle::of(&node.style)), &node.style)
    }

    /// Text whose page tokens the renderer replaces on every page
    pub fn page_number(&self, node: &TextNode) -> Element {
        let value = substitute_page_tokens(node.value.as_deref());
        hyperlinked(self.run(value, RunStyle::of(&node.style)), &node.style)
    }

    pub fn image(&self, node: &ImageNode) -> Option<Element> {
        let Some(value) = node.value.as_deref().filter(|v| !v.trim().is_empty()) else {
            log::debug!("image node without a value contributes nothing");
            return None;
        };
        Some(Element::Image(ImageBox {
            image: self.images.load(value),
            width: Pt(node.style.width.unwrap_or(DEFAULT_BOX_SIZE)),
            height: Pt(node.style.height.unwrap_or(DEFAULT_BOX_SIZE)),
        }))
    }

    /// A box reserving space; its padding becomes the margin of the cell holding it
    pub fn placeholder(&self, node: &PlaceholderNode) -> Element {
        Element::Block(Block {
            width: Pt(node.style.width.unwrap_or(DEFAULT_BOX_SIZE)),
            height: Pt(node.style.height.unwrap_or(DEFAULT_BOX_SIZE)),
            fill: resolve_colour(node.style.background.as_deref()),
        })
    }

    /// Wrap a leaf in a cell with the node's padding and horizontal alignment
    pub fn cell(&self, content: Element, style: &NodeStyle) -> Cell {
        Cell::new(content)
            .with_padding(padding(style))
            .with_alignment(
                HorizontalAlignment::resolve(style.horizontal.as_deref()),
                VerticalAlignment::Top,
            )
    }
}

/// Per-side padding of a node; unset sides are 0
pub fn padding(style: &NodeStyle) -> Margins {
    Margins::from_sides(style.p_top, style.p_right, style.p_bottom, style.p_left)
}

fn hyperlinked(mut run: TextRun, style: &NodeStyle) -> Element {
    let uri = style
        .hyperlink_uri
        .as_deref()
        .map(str::trim)
        .filter(|uri| style.is_hyperlink && !uri.is_empty());
    match uri {
        Some(uri) => {
            run.colour = colours::BLUE;
            run.underline = true;
            Element::Link(Link {
                uri: uri.to_string(),
                child: Box::new(Element::Text(run)),
            })
        }
        None => Element::Text(run),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FontCacheConfig;
    use crate::fetch::OfflineFetcher;
    use crate::model::Binding;
    use crate::style::PAGE_COUNT_TOKEN;

    fn with_builder<R>(defaults: DefaultStyle, f: impl FnOnce(ElementBuilder<'_>) -> R) -> R {
        let fonts = FontCache::new(FontCacheConfig::default(), None);
        let fetcher = OfflineFetcher;
        let builder = ElementBuilder::new(
            &fonts,
            ImageLoader::new(&fetcher, None),
            BindingResolver::new(&fetcher),
            &defaults,
        );
        f(builder)
    }

    #[test]
    fn text_resolves_bindings_and_indent() {
        let node = TextNode {
            value: Some("Dear ${name}, ${missing}".into()),
            bindings: vec![Binding::object_data(r#"{"name": "Ada"}"#)],
            style: NodeStyle {
                indent: true,
                font_size: Some(14.0),
                ..NodeStyle::default()
            },
        };
        with_builder(DefaultStyle::default(), |builder| {
            let Element::Text(run) = builder.text(&node) else {
                panic!("plain text expected");
            };
            assert_eq!(run.text, "  Dear Ada, ${missing}");
            assert_eq!(run.size, Pt(14.0));
            assert_eq!(run.colour, colours::BLACK);
        });
    }

    #[test]
    fn page_defaults_fill_unset_style() {
        let defaults = DefaultStyle {
            font_size: Pt(8.0),
            font_colour: colours::BLUE,
            ..DefaultStyle::default()
        };
        with_builder(defaults, |builder| {
            let run = builder.run("x".into(), RunStyle::default());
            assert_eq!(run.size, Pt(8.0));
            assert_eq!(run.colour, colours::BLUE);
        });
    }

    #[test]
    fn style_tiers_fall_through() {
        let binding = RunStyle {
            colour: Some("#ff0000"),
            ..RunStyle::default()
        };
        let column = RunStyle {
            font: Some("roboto"),
            bold: true,
            size: Some(12.0),
            colour: Some("#00ff00"),
        };
        let merged = binding.or(column);
        assert_eq!(merged.font, Some("roboto"));
        assert!(merged.bold);
        assert_eq!(merged.size, Some(12.0));
        assert_eq!(merged.colour, Some("#ff0000"));

        let named = RunStyle {
            font: Some("lato2"),
            ..RunStyle::default()
        };
        assert!(!named.or(column).bold);
    }

    #[test]
    fn hyperlinks_are_blue_and_underlined() {
        let node = TextNode {
            value: Some("docs".into()),
            style: NodeStyle {
                is_hyperlink: true,
                hyperlink_uri: Some("https://example.com".into()),
                ..NodeStyle::default()
            },
            ..TextNode::default()
        };
        with_builder(DefaultStyle::default(), |builder| {
            let Element::Link(link) = builder.text(&node) else {
                panic!("link expected");
            };
            assert_eq!(link.uri, "https://example.com");
            let Element::Text(run) = *link.child else {
                panic!("linked text expected");
            };
            assert!(run.underline);
            assert_eq!(run.colour, colours::BLUE);
        });
    }

    #[test]
    fn page_numbers_carry_renderer_tokens() {
        let node = TextNode {
            value: Some("of ${PAGE_COUNT}".into()),
            ..TextNode::default()
        };
        with_builder(DefaultStyle::default(), |builder| {
            let element = builder.page_number(&node);
            assert_eq!(element.texts(), vec![format!("of {PAGE_COUNT_TOKEN}").as_str()]);
        });
    }

    #[test]
    fn unreadable_images_become_blank() {
        let node = ImageNode {
            value: Some("data:image/png;base64,not-an-image".into()),
            style: NodeStyle {
                width: Some(40.0),
                ..NodeStyle::default()
            },
        };
        with_builder(DefaultStyle::default(), |builder| {
            let Some(Element::Image(image)) = builder.image(&node) else {
                panic!("image expected");
            };
            assert_eq!(image.width, Pt(40.0));
            assert_eq!(image.height, Pt(DEFAULT_BOX_SIZE));
            assert_eq!((image.image.width, image.image.height), (10.0, 10.0));

            assert!(builder.image(&ImageNode::default()).is_none());
        });
    }

    #[test]
    fn placeholders_and_cells() {
        let style = NodeStyle {
            height: Some(30.0),
            background: Some("#00000000".into()),
            p_left: Some(4.0),
            horizontal: Some("right".into()),
            ..NodeStyle::default()
        };
        with_builder(DefaultStyle::default(), |builder| {
            let block = builder.placeholder(&PlaceholderNode {
                style: style.clone(),
            });
            let Element::Block(ref b) = block else {
                panic!("block expected");
            };
            assert_eq!((b.width, b.height, b.fill), (Pt(100.0), Pt(30.0), None));

            let cell = builder.cell(block, &style);
            assert_eq!(cell.padding.left, Pt(4.0));
            assert_eq!(cell.padding.top, Pt::ZERO);
            assert_eq!(cell.halign, HorizontalAlignment::Right);
        });
    }
}
