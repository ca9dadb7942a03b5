use crate::content::render_contents;
use crate::document::Resources;
use crate::error::Error;
use crate::layout::{PageLayout, Primitive};
use crate::rect::Rect;
use crate::refs::{ObjectReferences, RefType};
use crate::units::Pt;
use pdf_writer::types::{ActionType, AnnotationType};
use pdf_writer::{Finish, Name, Pdf, Ref, Str};

/// One physical page of the output
#[derive(Debug, Clone)]
pub struct Page {
    pub media_box: Rect,
    pub primitives: Vec<Primitive>,
}

impl Page {
    pub fn new(layout: PageLayout) -> Page {
        Page {
            media_box: Rect {
                x1: Pt::ZERO,
                y1: Pt::ZERO,
                x2: layout.width,
                y2: layout.height,
            },
            primitives: layout.primitives,
        }
    }

    /// Areas of the page that open a URI when clicked
    pub fn links(&self) -> impl Iterator<Item = (&Rect, &str)> {
        self.primitives.iter().filter_map(|primitive| match primitive {
            Primitive::Link { rect, uri } => Some((rect, uri.as_str())),
            _ => None,
        })
    }

    /// Write the page, its content stream and its link annotations.
    /// Annotations are numbered from `first_annotation`; returns how many
    /// this page wrote.
    pub(crate) fn write(
        &self,
        refs: &mut ObjectReferences,
        page_index: usize,
        first_annotation: usize,
        resources: &Resources,
        writer: &mut Pdf,
    ) -> Result<usize, Error> {
        let id = refs.gen(RefType::Page(page_index));
        let parent = refs.gen(RefType::PageTree);
        let content_id = refs.gen(RefType::ContentForPage(page_index));
        let links: Vec<(Ref, &Rect, &str)> = self
            .links()
            .enumerate()
            .map(|(i, (rect, uri))| (refs.gen(RefType::Annotation(first_annotation + i)), rect, uri))
            .collect();

        let mut fonts: Vec<usize> = Vec::new();
        let mut images: Vec<usize> = Vec::new();
        for primitive in &self.primitives {
            match primitive {
                Primitive::Text { font, .. } => fonts.extend(resources.font_index(font)),
                Primitive::Image { image, .. } => images.extend(resources.image_index(image)),
                _ => {}
            }
        }
        fonts.sort_unstable();
        fonts.dedup();
        images.sort_unstable();
        images.dedup();

        let mut page = writer.page(id);
        page.media_box(self.media_box.into());
        page.parent(parent);

        let mut page_resources = page.resources();
        let mut resource_fonts = page_resources.fonts();
        for i in fonts {
            resource_fonts.pair(Name(format!("F{i}").as_bytes()), refs.gen(RefType::Font(i)));
        }
        resource_fonts.finish();
        let mut resource_xobjects = page_resources.x_objects();
        for i in images {
            resource_xobjects.pair(Name(format!("I{i}").as_bytes()), refs.gen(RefType::Image(i)));
        }
        resource_xobjects.finish();
        page_resources.finish();

        page.contents(content_id);
        if !links.is_empty() {
            page.annotations(links.iter().map(|(id, _, _)| *id));
        }
        page.finish();

        let rendered = render_contents(&self.primitives, resources)?;
        writer.stream(content_id, rendered.as_slice());

        for (id, rect, uri) in &links {
            let mut annotation = writer.annotation(*id);
            annotation.subtype(AnnotationType::Link);
            annotation.rect((**rect).into());
            annotation.border(0.0, 0.0, 0.0, None);
            annotation
                .action()
                .action_type(ActionType::Uri)
                .uri(Str(uri.as_bytes()));
        }

        Ok(links.len())
    }
}
