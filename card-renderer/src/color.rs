//! Theme color parsing and shading.

use card_core::DEFAULT_THEME_COLOR;

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Rgb {
    /// Parse `#rgb` or `#rrggbb` (the `#` is optional).
    #[must_use]
    pub fn parse(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return None,
        };
        let n = u32::from_str_radix(&expanded, 16).ok()?;
        let [_, r, g, b] = n.to_be_bytes();
        Some(Self { r, g, b })
    }

    /// Parse a theme color, falling back to the default theme.
    #[must_use]
    pub fn theme(hex: &str) -> Self {
        Self::parse(hex)
            .or_else(|| Self::parse(DEFAULT_THEME_COLOR))
            .unwrap_or(Self {
                r: 0x63,
                g: 0x66,
                b: 0xf1,
            })
    }

    /// Add `amount` to every channel, clamped to `0..=255`.
    #[must_use]
    pub fn shade(self, amount: i16) -> Self {
        let channel = |c: u8| {
            let shifted = (i16::from(c) + amount).clamp(0, 255);
            u8::try_from(shifted).unwrap_or(u8::MAX)
        };
        Self {
            r: channel(self.r),
            g: channel(self.g),
            b: channel(self.b),
        }
    }

    /// Lowercase `#rrggbb`.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}
