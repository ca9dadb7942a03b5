use super::flow::{draw, rule, BodyFlow, PageLayout, Primitive};
use super::measure::{height, IgnoreWidths};
use crate::error::Result;
use crate::pagination::DIVIDER_WEIGHT;
use crate::rect::Rect;
use crate::style::HorizontalAlignment;
use crate::tree::{ComposedDocument, PageSet};
use crate::units::Pt;

/// Lay out every page set of a document onto physical pages, in order.
/// Page tokens in text are left for the renderer to substitute.
pub fn paginate(document: &ComposedDocument) -> Result<Vec<PageLayout>> {
    let mut pages = Vec::new();
    for set in &document.page_sets {
        pages.extend(paginate_set(set)?);
    }
    Ok(pages)
}

fn paginate_set(set: &PageSet) -> Result<Vec<PageLayout>> {
    let config = &set.config;
    let header_width = config.header_width();
    let footer_width = config.footer_width();
    let header_height = set
        .header
        .as_ref()
        .map(|header| height(header, header_width, &mut IgnoreWidths));
    let footer_height = set
        .footer
        .as_ref()
        .map(|footer| height(footer, footer_width, &mut IgnoreWidths));
    let header_block = config.header_block(header_height);
    let footer_block = config.footer_block(footer_height);
    let frame = config.body_frame(header_block, footer_block)?;

    let mut flow = BodyFlow::new(frame);
    if let Some(body) = &set.body {
        flow.place(body);
    }
    let bodies = flow.finish();
    log::debug!("page set flowed onto {} page(s)", bodies.len());

    let content_x = config.margins.left;
    let content_width = config.content_width();

    let mut pages = Vec::with_capacity(bodies.len());
    for (index, body) in bodies.into_iter().enumerate() {
        let mut primitives = Vec::new();
        if let Some(colour) = config.defaults.background {
            primitives.push(Primitive::Fill {
                rect: Rect::from_top_left(Pt::ZERO, config.height(), config.width(), config.height()),
                colour,
            });
        }

        let first = index == 0;
        if let Some(header) = &set.header {
            if !(first && config.hide_header_on_first_page) {
                let top = config.header_top();
                draw(
                    header,
                    content_x + config.header_margins.left,
                    top - config.header_margins.top,
                    header_width,
                    HorizontalAlignment::Left,
                    &mut primitives,
                );
                primitives.push(rule(content_x, top - header_block, content_width, DIVIDER_WEIGHT));
            }
        }

        primitives.extend(body);

        if let Some(footer) = &set.footer {
            if !(first && config.hide_footer_on_first_page) {
                let rule_y = config.footer_bottom() + footer_block;
                primitives.push(rule(content_x, rule_y, content_width, DIVIDER_WEIGHT));
                draw(
                    footer,
                    content_x + config.footer_margins.left,
                    rule_y - config.footer_margins.top,
                    footer_width,
                    HorizontalAlignment::Left,
                    &mut primitives,
                );
            }
        }

        pages.push(PageLayout {
            width: config.width(),
            height: config.height(),
            primitives,
        });
    }
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colour::colours;
    use crate::pagination::{PageConfig, PageNumbering};
    use crate::tree::{Block, Cell, Element, Row, Table};

    fn block() -> Element {
        Element::Block(Block {
            width: Pt(10.0),
            height: Pt(10.0),
            fill: Some(colours::BLACK),
        })
    }

    fn lines(page: &PageLayout) -> usize {
        page.primitives
            .iter()
            .filter(|p| matches!(p, Primitive::Line { .. }))
            .count()
    }

    #[test]
    fn hidden_first_page_header_keeps_its_space() {
        let mut config = PageConfig::default();
        config.hide_header_on_first_page = true;
        let set = PageSet {
            config,
            header: Some(block()),
            body: Some(Element::Table(Table::stack(vec![
                Row::new(vec![Cell::new(block())]),
                Row::new(vec![Cell::new(Element::PageBreak)]),
                Row::new(vec![Cell::new(block())]),
            ]))),
            footer: None,
        };
        let document = ComposedDocument {
            page_sets: vec![set],
            numbering: PageNumbering::default(),
        };

        let pages = paginate(&document).expect("paginates");
        assert_eq!(pages.len(), 2);
        // header fill and its divider only appear on the second page
        assert_eq!(lines(&pages[0]), 0);
        assert_eq!(lines(&pages[1]), 1);

        let fill_tops = |page: &PageLayout| -> Vec<Pt> {
            page.primitives
                .iter()
                .filter_map(|p| match p {
                    Primitive::Fill { rect, .. } => Some(rect.y2),
                    _ => None,
                })
                .collect()
        };
        let height = pages[0].height;
        assert_eq!(fill_tops(&pages[0]), vec![height - Pt(10.0)]);
        assert_eq!(fill_tops(&pages[1]), vec![height, height - Pt(10.0)]);
    }
}
