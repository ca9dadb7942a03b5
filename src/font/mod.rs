use crate::{
    refs::{ObjectReferences, RefType},
    Error, Pt,
};
use owned_ttf_parser::{AsFaceRef, GlyphId, OwnedFace};
use pdf_writer::{
    types::{FontFlags, SystemInfo},
    Finish, Name, Pdf, Ref, Str,
};
use std::collections::HashMap;

mod cache;
mod provider;
mod standard;

pub use cache::*;
pub use provider::*;
pub use standard::StandardFont;

/// A shared, immutable font handle as handed out by the [FontCache]
pub type FontHandle = std::sync::Arc<Font>;

/// A font usable for both measurement and PDF output. TrueType / OpenType fonts
/// are embedded in their entirety; standard fonts are referenced by name and
/// rely on the viewer to supply glyphs.
pub struct Font {
    name: String,
    kind: FontKind,
}

enum FontKind {
    Embedded(OwnedFace),
    Standard(StandardFont),
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font")
            .field("name", &self.name)
            .field("embedded", &self.is_embedded())
            .finish()
    }
}

impl Font {
    /// Load a font from raw bytes, parsing the font and returning an error if the font
    /// could not be parsed
    pub fn load<S: Into<String>>(name: S, bytes: Vec<u8>) -> Result<Font, Error> {
        let face = OwnedFace::from_vec(bytes, 0)?;

        Ok(Font {
            name: name.into(),
            kind: FontKind::Embedded(face),
        })
    }

    /// A font that is not embedded, drawing on one of the standard PDF fonts
    pub fn standard(font: StandardFont) -> Font {
        Font {
            name: font.base_name().to_ascii_lowercase(),
            kind: FontKind::Standard(font),
        }
    }

    /// The name the font was registered under
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self.kind, FontKind::Embedded(_))
    }

    /// Number of bytes of font program held in memory
    pub fn data_len(&self) -> usize {
        match &self.kind {
            FontKind::Embedded(face) => face.as_slice().len(),
            FontKind::Standard(_) => 0,
        }
    }

    /// Scale factor from font units to points at the given size
    fn scaling(&self, size: Pt) -> Pt {
        match &self.kind {
            FontKind::Embedded(face) => size / face.as_face_ref().units_per_em() as f32,
            FontKind::Standard(_) => size / 1000.0,
        }
    }

    /// Calculate the ascent (distance from the baseline to the top of the font) for the given font size
    pub fn ascent(&self, size: Pt) -> Pt {
        let units = match &self.kind {
            FontKind::Embedded(face) => face.as_face_ref().ascender() as f32,
            FontKind::Standard(font) => font.ascender(),
        };
        self.scaling(size) * units
    }

    /// Calculate the descent (distance from the baseline to the bottom of the font) for the given font size.
    /// Note: this is usually negative
    pub fn descent(&self, size: Pt) -> Pt {
        let units = match &self.kind {
            FontKind::Embedded(face) => face.as_face_ref().descender() as f32,
            FontKind::Standard(font) => font.descender(),
        };
        self.scaling(size) * units
    }

    /// Calculate the leading (extra space between lines) for the given font size
    pub fn leading(&self, size: Pt) -> Pt {
        match &self.kind {
            FontKind::Embedded(face) => self.scaling(size) * face.as_face_ref().line_gap() as f32,
            FontKind::Standard(_) => Pt::ZERO,
        }
    }

    /// Calculate the default line height of the font for the given size. The returned value is
    /// how much to vertically offset a second row of text below a first row of text.
    pub fn line_height(&self, size: Pt) -> Pt {
        self.leading(size) + self.ascent(size) - self.descent(size)
    }

    /// Horizontal advance of a single character
    pub fn char_width(&self, ch: char, size: Pt) -> Pt {
        match &self.kind {
            FontKind::Embedded(face) => {
                let face = face.as_face_ref();
                let advance = face
                    .glyph_index(ch)
                    .or_else(|| face.glyph_index('\u{FFFD}'))
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .unwrap_or_default();
                self.scaling(size) * advance as f32
            }
            FontKind::Standard(font) => self.scaling(size) * font.advance(ch),
        }
    }

    pub fn glyph_id(&self, ch: char) -> Option<u16> {
        match &self.kind {
            FontKind::Embedded(face) => face.as_face_ref().glyph_index(ch).map(|i| i.0),
            FontKind::Standard(_) => None,
        }
    }

    /// Encode text as the hex body of a `Tj` string operand for this font
    pub(crate) fn encode_hex(&self, text: &str) -> String {
        let mut hex = String::with_capacity(text.len() * 4);
        match &self.kind {
            FontKind::Embedded(face) => {
                let face = face.as_face_ref();
                let fallback = face
                    .glyph_index('\u{FFFD}')
                    .or_else(|| face.glyph_index('?'))
                    .map(|g| g.0)
                    .unwrap_or(0);
                for ch in text.chars() {
                    let gid = face.glyph_index(ch).map(|g| g.0).unwrap_or(fallback);
                    hex.push_str(&format!("{gid:04x}"));
                }
            }
            FontKind::Standard(_) => {
                for ch in text.chars() {
                    hex.push_str(&format!("{:02x}", standard::win_ansi(ch)));
                }
            }
        }
        hex
    }

    pub(crate) fn write(&self, refs: &mut ObjectReferences, font_index: usize, writer: &mut Pdf) {
        let font_id = refs.gen(RefType::Font(font_index));
        match &self.kind {
            FontKind::Embedded(face) => {
                let cid_font_id = write_cid(face, &self.name, refs, font_index, writer);
                let to_unicode_id = write_to_unicode(face, refs, font_index, writer);

                let mut font = writer.type0_font(font_id);
                font.base_font(Name(format!("F{font_index}").as_bytes()));
                font.encoding_predefined(Name(b"Identity-H"));
                font.descendant_font(cid_font_id);
                font.to_unicode(to_unicode_id);
            }
            FontKind::Standard(font) => {
                writer
                    .type1_font(font_id)
                    .base_font(Name(font.base_name().as_bytes()))
                    .encoding_predefined(Name(b"WinAnsiEncoding"));
            }
        }
    }
}

fn face_name(face: &OwnedFace, name_id: u16) -> Option<String> {
    face.as_face_ref()
        .names()
        .into_iter()
        .find(|name| name.name_id == name_id && name.is_unicode())
        .and_then(|name| name.to_string())
}

/// glyph id -> (char, (horizontal advance, height)) for every mapped glyph
fn glyph_metrics(face: &OwnedFace) -> HashMap<u16, (char, (u16, i16))> {
    let face = face.as_face_ref();
    let mut ids: HashMap<u16, char> = HashMap::new();
    if let Some(cmap) = face.tables().cmap {
        for subtable in cmap.subtables.into_iter().filter(|table| table.is_unicode()) {
            subtable.codepoints(|codepoint: u32| {
                if let Ok(ch) = char::try_from(codepoint) {
                    if let Some(index) = subtable.glyph_index(codepoint).filter(|index| index.0 > 0)
                    {
                        ids.entry(index.0).or_insert(ch);
                    }
                }
            });
        }
    }

    ids.into_iter()
        .filter_map(|(id, ch)| {
            let advance = face.glyph_hor_advance(GlyphId(id))?;
            let height = face
                .glyph_bounding_box(GlyphId(id))
                .map(|bbox| bbox.y_max - bbox.y_min - face.descender())
                .unwrap_or(1000);
            Some((id, (ch, (advance, height))))
        })
        .collect()
}

fn write_cid(
    face: &OwnedFace,
    name: &str,
    refs: &mut ObjectReferences,
    font_index: usize,
    writer: &mut Pdf,
) -> Ref {
    let metrics = glyph_metrics(face);
    let font_descriptor_id = write_descriptor(face, name, &metrics, refs, font_index, writer);

    let id = refs.gen(RefType::CidFont(font_index));
    let scaling = 1000.0 / face.as_face_ref().units_per_em() as f32;

    let mut cid_font = writer.cid_font(id);
    cid_font.subtype(pdf_writer::types::CidFontType::Type2);
    cid_font.base_font(Name(format!("F{font_index}").as_bytes()));
    cid_font.system_info(SystemInfo {
        registry: Str(b"Adobe"),
        ordering: Str(b"Identity"),
        supplement: 0,
    });
    cid_font.font_descriptor(font_descriptor_id);

    // the most popular advance becomes the default width
    let mut width_counts: HashMap<u16, usize> = HashMap::new();
    for (_, (width, _)) in metrics.values() {
        *width_counts.entry(*width).or_insert(0) += 1;
    }
    let default_width = width_counts
        .iter()
        .max_by_key(|(_, &count)| count)
        .map(|(&width, _)| width as f32 * scaling)
        .unwrap_or(1000.0);

    let mut cid_widths: Vec<(u16, f32)> = metrics
        .iter()
        .map(|(&cid, &(_, (width, _)))| (cid, width as f32 * scaling))
        .collect();
    cid_widths.sort_by_key(|(cid, _)| *cid);

    let mut widths = cid_font.widths();
    widths.consecutive(0, [1000.0]);
    let mut run: Option<(u16, Vec<f32>)> = None;
    for (cid, width) in cid_widths {
        match &mut run {
            Some((start, run_widths)) if *start as usize + run_widths.len() == cid as usize => {
                run_widths.push(width);
            }
            _ => {
                if let Some((start, run_widths)) = run.take() {
                    widths.consecutive(start, run_widths);
                }
                run = Some((cid, vec![width]));
            }
        }
    }
    if let Some((start, run_widths)) = run {
        widths.consecutive(start, run_widths);
    }
    widths.finish();

    cid_font.default_width(default_width);
    cid_font.cid_to_gid_map_predefined(Name(b"Identity"));

    id
}

fn write_descriptor(
    face: &OwnedFace,
    name: &str,
    metrics: &HashMap<u16, (char, (u16, i16))>,
    refs: &mut ObjectReferences,
    font_index: usize,
    writer: &mut Pdf,
) -> Ref {
    let font_data_id = refs.gen(RefType::FontData(font_index));
    writer
        .stream(font_data_id, face.as_slice())
        .pair(Name(b"Length1"), face.as_slice().len() as i32);

    let max_width = metrics.values().map(|&(_, (w, _))| w).max().unwrap_or_default();
    let max_height = metrics.values().map(|&(_, (_, h))| h).max().unwrap_or_default();
    let sum_width: usize = metrics.values().map(|&(_, (w, _))| w as usize).sum();
    let avg_width = if metrics.is_empty() {
        0.0
    } else {
        sum_width as f32 / metrics.len() as f32
    };

    let id = refs.gen(RefType::FontDescriptor(font_index));
    let ttf = face.as_face_ref();
    let scaling = 1000.0 / ttf.units_per_em() as f32;

    let full_name = face_name(face, owned_ttf_parser::name_id::FULL_NAME)
        .unwrap_or_else(|| name.to_string())
        .replace(' ', "-");
    let family = face_name(face, owned_ttf_parser::name_id::FAMILY).unwrap_or_else(|| name.to_string());

    let mut descriptor = writer.font_descriptor(id);
    descriptor.name(Name(full_name.as_bytes()));
    descriptor.family(Str(family.as_bytes()));
    descriptor.weight(ttf.weight().to_number());

    let mut flags: FontFlags = FontFlags::empty();
    if ttf.is_monospaced() {
        flags.set(FontFlags::FIXED_PITCH, true);
    }
    if ttf.is_italic() {
        flags.set(FontFlags::ITALIC, true);
    }
    descriptor.flags(flags);

    descriptor.bbox(pdf_writer::Rect {
        x1: 0.0,
        y1: 0.0,
        x2: max_width as f32 * scaling,
        y2: max_height as f32 * scaling,
    });
    descriptor.italic_angle(if ttf.is_italic() { -12.0 } else { 0.0 });
    descriptor.ascent(ttf.ascender() as f32 * scaling);
    descriptor.descent(ttf.descender() as f32 * scaling);
    descriptor.leading(ttf.line_gap() as f32 * scaling);
    descriptor.cap_height(
        ttf.capital_height()
            .map(|h| h as f32 * scaling)
            .unwrap_or(1000.0),
    );
    descriptor.x_height(
        ttf.x_height()
            .unwrap_or_else(|| ttf.capital_height().unwrap_or_default()) as f32
            * scaling,
    );
    descriptor.stem_v(80.0);
    descriptor.avg_width(avg_width * scaling);
    descriptor.max_width(max_width as f32 * scaling);
    descriptor.missing_width(max_width as f32 * scaling);
    descriptor.font_file2(font_data_id);

    id
}

fn write_to_unicode(
    face: &OwnedFace,
    refs: &mut ObjectReferences,
    font_index: usize,
    writer: &mut Pdf,
) -> Ref {
    let id = refs.gen(RefType::ToUnicode(font_index));

    let mut map = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo\n\
         << /Registry (Adobe)\n\
         /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <FFFF>\n\
         endcodespacerange\n",
    );

    let mut ids: Vec<(u16, char)> = glyph_metrics(face)
        .into_iter()
        .map(|(id, (ch, _))| (id, ch))
        .collect();
    ids.sort_by_key(|&(id, _)| id);

    // bfchar blocks hold at most 100 entries sharing a high byte
    for block in ids.chunk_by(|a, b| a.0 >> 8 == b.0 >> 8) {
        for chunk in block.chunks(100) {
            map.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for &(id, ch) in chunk {
                let ch: u32 = ch.into();
                map.push_str(&format!("<{id:04x}> <{ch:04x}>\n"));
            }
            map.push_str("endbfchar\n");
        }
    }

    map.push_str("endcmap CMapName currentdict /CMap defineresource pop end end\n");

    let compressed = miniz_oxide::deflate::compress_to_vec_zlib(
        map.as_bytes(),
        miniz_oxide::deflate::CompressionLevel::DefaultLevel as u8,
    );
    let mut stream = writer.stream(id, compressed.as_slice());
    stream.filter(pdf_writer::Filter::FlateDecode);

    id
}
