use crate::{
    font::{Font, FontHandle},
    image::{Image, ImageHandle},
    info::Info,
    layout::{PageLayout, Primitive},
    page::Page,
    refs::{ObjectReferences, RefType},
    Error,
};
use id_arena::{Arena, Id};
use pdf_writer::{Finish, Pdf, Ref};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

/// Fonts and images of a document. Each distinct shared handle is written
/// once, however many pages draw with it.
#[derive(Default)]
pub struct Resources {
    pub fonts: Arena<FontHandle>,
    pub images: Arena<ImageHandle>,
    font_ids: HashMap<usize, Id<FontHandle>>,
    image_ids: HashMap<usize, Id<ImageHandle>>,
}

fn identity<T>(handle: &Arc<T>) -> usize {
    Arc::as_ptr(handle) as usize
}

impl Resources {
    pub fn add_font(&mut self, font: &FontHandle) -> Id<FontHandle> {
        let fonts = &mut self.fonts;
        *self
            .font_ids
            .entry(identity(font))
            .or_insert_with(|| fonts.alloc(font.clone()))
    }

    pub fn add_image(&mut self, image: &ImageHandle) -> Id<ImageHandle> {
        let images = &mut self.images;
        *self
            .image_ids
            .entry(identity(image))
            .or_insert_with(|| images.alloc(image.clone()))
    }

    /// Index of the font within the document, naming its `/F` resource
    pub fn font_index(&self, font: &Arc<Font>) -> Option<usize> {
        self.font_ids.get(&identity(font)).map(|id| id.index())
    }

    /// Index of the image within the document, naming its `/I` resource
    pub fn image_index(&self, image: &Arc<Image>) -> Option<usize> {
        self.image_ids.get(&identity(image)).map(|id| id.index())
    }
}

#[derive(Default)]
/// A document stores every page of the output along with the fonts and
/// images they draw with, then renders it all out with a call to
/// [Document::write]
pub struct Document {
    pub info: Option<Info>,
    pub pages: Arena<Page>,
    pub page_order: Vec<Id<Page>>,
    pub resources: Resources,
}

impl Document {
    pub fn new() -> Document {
        Document::default()
    }

    /// Sets information about the document. If not provided, no information
    /// block will be written to the PDF
    pub fn set_info(&mut self, info: Info) {
        self.info = Some(info);
    }

    /// Add a laid out page to the end of the document, registering the fonts
    /// and images it uses
    pub fn add_page(&mut self, layout: PageLayout) -> Id<Page> {
        for primitive in &layout.primitives {
            match primitive {
                Primitive::Text { font, .. } => {
                    self.resources.add_font(font);
                }
                Primitive::Image { image, .. } => {
                    self.resources.add_image(image);
                }
                _ => {}
            }
        }
        let id = self.pages.alloc(Page::new(layout));
        self.page_order.push(id);
        id
    }

    pub fn page_count(&self) -> usize {
        self.page_order.len()
    }

    /// Get the page at the given position in the document
    pub fn page(&self, page_index: usize) -> Option<&Page> {
        self.page_order
            .get(page_index)
            .and_then(|id| self.pages.get(*id))
    }

    /// Write the entire document to the writer. The whole document is
    /// rendered in memory first.
    pub fn write<W: Write>(self, mut w: W) -> Result<(), Error> {
        let Document {
            info,
            pages,
            page_order,
            resources,
        } = self;

        let mut refs = ObjectReferences::new();

        let catalog_id = refs.gen(RefType::Catalog);
        let page_tree_id = refs.gen(RefType::PageTree);

        let mut writer = Pdf::new();
        if let Some(info) = info {
            info.write(&mut refs, &mut writer);
        }

        let page_refs: Vec<Ref> = (0..page_order.len())
            .map(|i| refs.gen(RefType::Page(i)))
            .collect();

        writer
            .pages(page_tree_id)
            .count(page_refs.len() as i32)
            .kids(page_refs);

        for (id, font) in resources.fonts.iter() {
            font.write(&mut refs, id.index(), &mut writer);
        }

        for (id, image) in resources.images.iter() {
            image.write(&mut refs, id.index(), &mut writer);
        }

        let mut annotations = 0;
        for (page_index, id) in page_order.iter().enumerate() {
            let page = pages
                .get(*id)
                .ok_or_else(|| Error::Output(format!("page {page_index} is missing")))?;
            annotations += page.write(&mut refs, page_index, annotations, &resources, &mut writer)?;
        }
        log::debug!(
            "writing {} page(s), {} font(s), {} image(s), {} link(s)",
            page_order.len(),
            resources.fonts.len(),
            resources.images.len(),
            annotations
        );

        let mut catalog = writer.catalog(catalog_id);
        catalog.pages(page_tree_id);
        catalog.finish();

        w.write_all(writer.finish().as_slice()).map_err(Into::into)
    }
}
