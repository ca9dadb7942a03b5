//! Rendering backends turn a composed document into its binary output.

use crate::document::Document;
use crate::error::Result;
use crate::info::Info;
use crate::layout::{paginate, PageLayout, Primitive};
use crate::pagination::PageNumbering;
use crate::tree::ComposedDocument;
use std::io::Write;

/// Paginates a composed document and serialises it
pub trait RenderBackend: Send + Sync {
    fn render(&self, document: &ComposedDocument, out: &mut dyn Write) -> Result<()>;
}

/// Writes PDF through `pdf-writer`
#[derive(Debug, Default, Clone)]
pub struct PdfBackend {
    info: Info,
}

impl PdfBackend {
    pub fn new() -> PdfBackend {
        PdfBackend::default()
    }

    pub fn with_info(info: Info) -> PdfBackend {
        PdfBackend { info }
    }

    /// Lay the document out onto physical pages and number them
    pub fn layout(&self, document: &ComposedDocument) -> Result<Vec<PageLayout>> {
        let mut pages = paginate(document)?;
        let physical = pages.len();
        for (index, page) in pages.iter_mut().enumerate() {
            number_page(page, &document.numbering, index, physical);
        }
        Ok(pages)
    }
}

fn number_page(page: &mut PageLayout, numbering: &PageNumbering, index: usize, physical: usize) {
    for primitive in &mut page.primitives {
        if let Primitive::Text { text, .. } = primitive {
            *text = numbering.apply(text, index, physical);
        }
    }
}

impl RenderBackend for PdfBackend {
    fn render(&self, document: &ComposedDocument, out: &mut dyn Write) -> Result<()> {
        let pages = self.layout(document)?;
        log::info!("rendering {} page(s)", pages.len());

        let mut pdf = Document::new();
        pdf.set_info(self.info.clone());
        for page in pages {
            pdf.add_page(page);
        }
        pdf.write(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colour::colours;
    use crate::font::{Font, StandardFont};
    use crate::model::PaginationOverrides;
    use crate::pagination::PageConfig;
    use crate::style::{PAGE_COUNT_TOKEN, PAGE_NUMBER_TOKEN};
    use crate::tree::{Element, PageSet, TextRun};
    use crate::units::Pt;
    use std::sync::Arc;

    fn document(numbering: PageNumbering) -> ComposedDocument {
        let footer = Element::Text(TextRun {
            text: format!("{PAGE_NUMBER_TOKEN} / {PAGE_COUNT_TOKEN}"),
            font: Arc::new(Font::standard(StandardFont::Helvetica)),
            size: Pt(10.0),
            colour: colours::BLACK,
            underline: false,
        });
        ComposedDocument {
            page_sets: vec![PageSet {
                config: PageConfig::default(),
                header: None,
                body: None,
                footer: Some(footer),
            }],
            numbering,
        }
    }

    fn texts(page: &PageLayout) -> Vec<&str> {
        page.primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn page_tokens_follow_the_numbering() {
        let overrides = PaginationOverrides {
            page_number_leading_enabled: true,
            page_number_leading: Some(3),
            ..PaginationOverrides::default()
        };
        let numbering = PageNumbering::from_overrides(&overrides);
        assert_eq!(numbering.leading, -2);

        let pages = PdfBackend::new().layout(&document(numbering)).expect("lays out");
        assert_eq!(texts(&pages[0]), ["3 / 3"]);
    }

    #[test]
    fn renders_a_pdf() {
        let mut bytes = Vec::new();
        PdfBackend::new()
            .render(&document(PageNumbering::default()), &mut bytes)
            .expect("renders");
        assert!(bytes.starts_with(b"%PDF"));
        assert!(String::from_utf8_lossy(&bytes).contains("<31202f2031> Tj"));
    }
}
