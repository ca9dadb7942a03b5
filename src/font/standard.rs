//! Metrics for the standard PDF fonts that can be referenced without embedding.

/// Widths of the printable ASCII range (32..=126) in 1/1000 em
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Advance used for characters outside the measured range
const DEFAULT_WIDTH: f32 = 556.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
}

impl StandardFont {
    pub fn base_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
        }
    }

    pub fn ascender(&self) -> f32 {
        718.0
    }

    pub fn descender(&self) -> f32 {
        -207.0
    }

    /// Advance of a character in 1/1000 em
    pub fn advance(&self, ch: char) -> f32 {
        match ch as u32 {
            code @ 32..=126 => HELVETICA_WIDTHS[(code - 32) as usize] as f32,
            _ => DEFAULT_WIDTH,
        }
    }
}

/// Map a character onto its WinAnsiEncoding byte; anything the encoding
/// cannot represent becomes `?`
pub(crate) fn win_ansi(ch: char) -> u8 {
    match ch as u32 {
        code @ 32..=126 => code as u8,
        code @ 160..=255 => code as u8,
        _ => b'?',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_advances() {
        let font = StandardFont::Helvetica;
        assert_eq!(font.advance(' '), 278.0);
        assert_eq!(font.advance('W'), 944.0);
        assert_eq!(font.advance('~'), 584.0);
        assert_eq!(font.advance('é'), DEFAULT_WIDTH);
    }
}
