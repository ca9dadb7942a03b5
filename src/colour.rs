/// A colour, expressed in RGB, CMYK, or grey colour spaces
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Colour {
    /// DeviceRGB colour; r, g, b, range from 0.0 to 1.0
    RGB { r: f32, g: f32, b: f32 },
    /// DeviceCMYK colour; c, m, y, and k range from 0.0 to 1.0
    CMYK { c: f32, m: f32, y: f32, k: f32 },
    /// DeviceGray colour; g ranges from 0.0 to 1.0
    Grey { g: f32 },
}

impl Colour {
    /// Create a new colour in the RGB space. r, g, and b range from 0.0 to 1.0
    pub fn new_rgb(r: f32, g: f32, b: f32) -> Colour {
        Colour::RGB { r, g, b }
    }

    /// Create a new colour in the RGB space. r, g, and b range from 0 to 255
    pub fn new_rgb_bytes(r: u8, g: u8, b: u8) -> Colour {
        Colour::RGB {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Create a new colour in the Gray space, g ranges from 0.0 to 1.0
    pub fn new_grey(g: f32) -> Colour {
        Colour::Grey { g }
    }

    /// Parse a CSS-style hex colour: `#rgb`, `#rrggbb` or `#rrggbbaa`, with or
    /// without the leading `#`. Any alpha channel is dropped since page content
    /// is painted opaque. Returns [None] when the text is not a hex colour.
    pub fn from_hex(hex: &str) -> Option<Colour> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        match digits.len() {
            3 => {
                let mut expanded = String::with_capacity(6);
                for c in digits.chars() {
                    expanded.push(c);
                    expanded.push(c);
                }
                Colour::from_hex(&expanded)
            }
            6 | 8 => Some(Colour::new_rgb_bytes(byte(0)?, byte(2)?, byte(4)?)),
            _ => None,
        }
    }
}

impl<T: Into<f32>> From<(T, T, T)> for Colour {
    fn from(c: (T, T, T)) -> Self {
        Colour::RGB {
            r: c.0.into(),
            g: c.1.into(),
            b: c.2.into(),
        }
    }
}

/// A list of pre-defined colour constants
pub mod colours {
    use super::*;

    pub const BLACK: Colour = Colour::Grey { g: 0.0 };
    pub const WHITE: Colour = Colour::Grey { g: 1.0 };
    pub const BLUE: Colour = Colour::RGB {
        r: 0.0,
        g: 0.0,
        b: 1.0,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_six_and_eight_digit_hex() {
        assert_eq!(
            Colour::from_hex("#ff0000"),
            Some(Colour::RGB {
                r: 1.0,
                g: 0.0,
                b: 0.0
            })
        );
        assert_eq!(
            Colour::from_hex("00ff00cc"),
            Some(Colour::RGB {
                r: 0.0,
                g: 1.0,
                b: 0.0
            })
        );
    }

    #[test]
    fn expands_short_hex() {
        assert_eq!(Colour::from_hex("#fff"), Colour::from_hex("#ffffff"));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(Colour::from_hex("#zzzzzz"), None);
        assert_eq!(Colour::from_hex("#12345"), None);
        assert_eq!(Colour::from_hex("rgb(1,2,3)"), None);
    }
}
