//! Encoding of drawing primitives into PDF content streams.

use crate::colour::Colour;
use crate::document::Resources;
use crate::layout::Primitive;
use crate::units::Pt;
use std::io::Write;

/// Encode the primitives of one page. Link areas are annotations, not
/// content, and are skipped here.
#[allow(clippy::write_with_newline)]
pub(crate) fn render_contents(
    primitives: &[Primitive],
    resources: &Resources,
) -> Result<Vec<u8>, std::io::Error> {
    let mut content: Vec<u8> = Vec::default();

    let mut rest = primitives;
    while let Some(first) = rest.first() {
        if matches!(first, Primitive::Text { .. }) {
            let run = rest
                .iter()
                .take_while(|p| matches!(p, Primitive::Text { .. }))
                .count();
            render_text(&mut content, &rest[..run], resources)?;
            rest = &rest[run..];
            continue;
        }

        match first {
            Primitive::Image { rect, image } => {
                if let Some(index) = resources.image_index(image) {
                    write!(&mut content, "q\n")?;
                    write!(
                        &mut content,
                        "{} 0 0 {} {} {} cm\n",
                        rect.width(),
                        rect.height(),
                        rect.x1,
                        rect.y1
                    )?;
                    write!(&mut content, "/I{index} Do\n")?;
                    write!(&mut content, "Q\n")?;
                }
            }
            Primitive::Fill { rect, colour } => {
                write!(&mut content, "q\n")?;
                write_colour(&mut content, *colour, false)?;
                write!(
                    &mut content,
                    "{} {} {} {} re f\n",
                    rect.x1,
                    rect.y1,
                    rect.width(),
                    rect.height()
                )?;
                write!(&mut content, "Q\n")?;
            }
            Primitive::Line {
                from,
                to,
                width,
                colour,
            } => {
                write!(&mut content, "q\n")?;
                write!(&mut content, "{width} w\n")?;
                write_colour(&mut content, *colour, true)?;
                write!(&mut content, "{} {} m {} {} l S\n", from.0, from.1, to.0, to.1)?;
                write!(&mut content, "Q\n")?;
            }
            Primitive::Text { .. } | Primitive::Link { .. } => {}
        }
        rest = &rest[1..];
    }

    Ok(content)
}

/// Consecutive text spans share one graphics state; font and colour are
/// only re-selected when they change
#[allow(clippy::write_with_newline)]
fn render_text(
    content: &mut Vec<u8>,
    spans: &[Primitive],
    resources: &Resources,
) -> Result<(), std::io::Error> {
    write!(content, "q\n")?;

    let mut current_font: Option<(usize, Pt)> = None;
    let mut current_colour: Option<Colour> = None;
    for span in spans {
        let Primitive::Text {
            x,
            baseline,
            text,
            font,
            size,
            colour,
        } = span
        else {
            continue;
        };
        let Some(index) = resources.font_index(font) else {
            log::warn!("text `{text}` uses a font missing from the document");
            continue;
        };

        if current_font != Some((index, *size)) {
            current_font = Some((index, *size));
            write!(content, "/F{index} {size} Tf\n")?;
        }
        if current_colour != Some(*colour) {
            current_colour = Some(*colour);
            write_colour(content, *colour, false)?;
        }

        write!(content, "BT\n")?;
        write!(content, "{x} {baseline} Td\n")?;
        write!(content, "<{}> Tj\n", font.encode_hex(text))?;
        write!(content, "ET\n")?;
    }

    write!(content, "Q\n")?;
    Ok(())
}

#[allow(clippy::write_with_newline)]
fn write_colour(content: &mut Vec<u8>, colour: Colour, stroke: bool) -> Result<(), std::io::Error> {
    match (colour, stroke) {
        (Colour::RGB { r, g, b }, false) => write!(content, "{r} {g} {b} rg\n"),
        (Colour::RGB { r, g, b }, true) => write!(content, "{r} {g} {b} RG\n"),
        (Colour::CMYK { c, m, y, k }, false) => write!(content, "{c} {m} {y} {k} k\n"),
        (Colour::CMYK { c, m, y, k }, true) => write!(content, "{c} {m} {y} {k} K\n"),
        (Colour::Grey { g }, false) => write!(content, "{g} g\n"),
        (Colour::Grey { g }, true) => write!(content, "{g} G\n"),
    }
}
