use crate::font::Font;
use crate::units::Pt;

const TABSIZE: usize = 4;

/// One wrapped line of text and its advance width
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub width: Pt,
}

/// Replace tabs with spaces and normalize newlines
pub fn normalize(text: &str) -> String {
    text.replace('\t', &" ".repeat(TABSIZE))
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

/// Advance width of a single line of text. Ignores newlines.
pub fn width_of_text(text: &str, font: &Font, size: Pt) -> Pt {
    text.chars()
        .filter(|&ch| ch != '\n')
        .map(|ch| font.char_width(ch, size))
        .sum()
}

/// Widest line of the text without any wrapping
pub fn widest_line(text: &str, font: &Font, size: Pt) -> Pt {
    normalize(text)
        .split('\n')
        .map(|line| width_of_text(line, font, size))
        .fold(Pt::ZERO, Pt::max)
}

/// Wraps text to `max_width`, keeping words intact where possible.
///
/// Break points are recorded after whitespace. When a character would
/// overflow the line, the line is cut at the most recent break point and the
/// rest of the word moves to the next line. A word that is wider than a
/// whole line is broken between characters. Explicit newlines always start
/// a new line, and an empty paragraph still produces an (empty) line.
///
/// A non-positive `max_width` disables wrapping.
pub fn wrap_text(text: &str, font: &Font, size: Pt, max_width: Pt) -> Vec<Line> {
    let text = normalize(text);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        if max_width <= Pt::ZERO {
            lines.push(Line {
                text: paragraph.to_string(),
                width: width_of_text(paragraph, font, size),
            });
            continue;
        }

        let mut current: Vec<(char, Pt)> = Vec::new();
        let mut width = Pt::ZERO;
        // index into `current` just after the most recent whitespace
        let mut last_break: Option<usize> = None;

        for ch in paragraph.chars() {
            let advance = font.char_width(ch, size);

            if width + advance > max_width && !current.is_empty() && !ch.is_whitespace() {
                let cut = match last_break {
                    Some(at) if at > 0 => at,
                    _ => current.len(),
                };
                let rest = current.split_off(cut);
                lines.push(finish_line(&current));
                current = rest;
                width = current.iter().map(|&(_, w)| w).sum();
                last_break = None;
            }

            current.push((ch, advance));
            width += advance;
            if ch.is_whitespace() {
                last_break = Some(current.len());
            }
        }

        lines.push(finish_line(&current));
    }

    lines
}

/// Trailing whitespace is dropped from wrapped lines so alignment sees the ink width
fn finish_line(chars: &[(char, Pt)]) -> Line {
    let end = chars
        .iter()
        .rposition(|&(ch, _)| !ch.is_whitespace())
        .map(|i| i + 1)
        .unwrap_or(0);
    let chars = &chars[..end];
    Line {
        text: chars.iter().map(|&(ch, _)| ch).collect(),
        width: chars.iter().map(|&(_, w)| w).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::StandardFont;

    fn helvetica() -> Font {
        Font::standard(StandardFont::Helvetica)
    }

    #[test]
    fn short_text_stays_on_one_line() {
        let font = helvetica();
        let lines = wrap_text("Hello", &font, Pt(10.0), Pt(200.0));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Hello");
        assert_eq!(lines[0].width, width_of_text("Hello", &font, Pt(10.0)));
    }

    #[test]
    fn wraps_at_word_boundaries() {
        let font = helvetica();
        let word = width_of_text("alpha ", &font, Pt(10.0));
        let lines = wrap_text("alpha beta gamma", &font, Pt(10.0), word * 1.5);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["alpha", "beta", "gamma"]);
    }

    #[test]
    fn breaks_long_words_between_characters() {
        let font = helvetica();
        let limit = width_of_text("abc", &font, Pt(10.0));
        let lines = wrap_text("abcabcabc", &font, Pt(10.0), limit + Pt(0.01));
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.width <= limit + Pt(0.01)));
    }

    #[test]
    fn newlines_and_empty_text() {
        let font = helvetica();
        assert_eq!(wrap_text("a\r\n\nb", &font, Pt(10.0), Pt(100.0)).len(), 3);
        let empty = wrap_text("", &font, Pt(10.0), Pt(100.0));
        assert_eq!(empty, vec![Line { text: String::new(), width: Pt::ZERO }]);
    }

    #[test]
    fn widest_line_of_unwrapped_text() {
        let font = helvetica();
        let wide = width_of_text("wider line", &font, Pt(10.0));
        assert_eq!(widest_line("short\nwider line", &font, Pt(10.0)), wide);
    }
}
