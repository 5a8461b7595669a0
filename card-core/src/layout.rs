//! Shared layout descriptor for the card texture.
//!
//! Both the texture composer (drawing) and the interactive region map
//! (hit-zones) read positions from [`CardLayout`], so the two can never drift
//! apart.
//!
//! ```text
//! (0,0)                                              (1024,0)
//!   ┌─────────────────────────────────────────────────┐
//!   │  ◯ logo 140x140 @ (60,60)                       │
//!   │                                                 │
//!   │  Name            (bold 48, baseline 260)        │
//!   │  Designation     (32, +45)                      │
//!   │  Company         (bold 36, +40)                 │
//!   │                              📞 phone  ┐        │
//!   │                              ✉️ email  ├ 26px,  │
//!   │                              🔗 site   ┘ 48 pitch│
//!   └─────────────────────────────────────────────────┘
//! (0,585)                                           (1024,585)
//! ```

use serde::{Deserialize, Serialize};

use crate::{CardView, ContactKind};

/// Texture width in pixels.
pub const TEXTURE_WIDTH: u32 = 1024;
/// Texture height in pixels (3.5" x 2" card aspect).
pub const TEXTURE_HEIGHT: u32 = 585;

const MARGIN: f32 = 60.0;

const LOGO_X: f32 = 60.0;
const LOGO_Y: f32 = 60.0;
const LOGO_SIZE: f32 = 140.0;

const HEADER_TOP_BASELINE: f32 = 260.0;
const NAME_FONT: f32 = 48.0;
const NAME_ADVANCE: f32 = 45.0;
const DESIGNATION_FONT: f32 = 32.0;
const DESIGNATION_ADVANCE: f32 = 40.0;
const COMPANY_FONT: f32 = 36.0;

const CONTACT_FONT: f32 = 26.0;
const CONTACT_BOTTOM_OFFSET: f32 = 170.0;
const CONTACT_PITCH: f32 = 48.0;

/// Hit box extends this far above the contact baseline.
const ZONE_ASCENT: f32 = 32.0;
/// Hit box height; shorter than the pitch so neighbouring zones never touch.
const ZONE_HEIGHT: f32 = 44.0;
const ZONE_PADDING: f32 = 30.0;
const ZONE_MIN_WIDTH: f32 = 250.0;
const ZONE_MAX_WIDTH: f32 = 640.0;

/// Average glyph advance as a fraction of the font size.
const AVERAGE_ADVANCE: f32 = 0.55;
/// Leading glyphs are emoji and run wider than text.
const GLYPH_ADVANCE: f32 = 1.2;

/// An axis-aligned rectangle in texture pixels (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl PixelRect {
    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Check whether two rectangles share any area or edge.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.x <= other.right()
            && other.x <= self.right()
            && self.y <= other.bottom()
            && other.y <= self.bottom()
    }
}

/// Horizontal anchor of a text line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    /// `x` is the left edge.
    Start,
    /// `x` is the right edge.
    End,
}

/// What a text line shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "kind", rename_all = "lowercase")]
pub enum TextRole {
    /// Full name.
    Name,
    /// Job title.
    Designation,
    /// Company name.
    Company,
    /// A contact line.
    Contact(ContactKind),
}

/// One positioned line of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    /// What the line shows.
    pub role: TextRole,
    /// Text to draw.
    pub text: String,
    /// Anchor x position.
    pub x: f32,
    /// Baseline y position.
    pub baseline: f32,
    /// Font size in pixels.
    pub font_size: f32,
    /// Whether the line is bold.
    pub bold: bool,
    /// Horizontal anchor.
    pub anchor: TextAnchor,
}

/// A contact line and the rectangle that reacts to input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactLine {
    /// Contact kind.
    pub kind: ContactKind,
    /// Raw contact value.
    pub value: String,
    /// The drawn line.
    pub line: TextLine,
    /// Clickable rectangle around the line.
    pub hit_rect: PixelRect,
}

/// Complete placement of every layer on the card texture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardLayout {
    /// Texture width.
    pub width: u32,
    /// Texture height.
    pub height: u32,
    /// Logo slot, reserved whenever the card names a logo.
    pub logo: Option<PixelRect>,
    /// Name, designation and company lines, top to bottom.
    pub header: Vec<TextLine>,
    /// Contact lines, top to bottom in phone/email/website order.
    pub contacts: Vec<ContactLine>,
}

impl CardLayout {
    /// Lay out a card.
    ///
    /// The result depends only on the card's fields; image load outcomes
    /// never move text.
    #[must_use]
    pub fn for_card(card: &CardView) -> Self {
        Self {
            width: TEXTURE_WIDTH,
            height: TEXTURE_HEIGHT,
            logo: card.logo_url().map(|_| PixelRect {
                x: LOGO_X,
                y: LOGO_Y,
                width: LOGO_SIZE,
                height: LOGO_SIZE,
            }),
            header: Self::header_lines(card),
            contacts: Self::contact_lines(card),
        }
    }

    fn header_lines(card: &CardView) -> Vec<TextLine> {
        let fields = [
            (TextRole::Name, card.full_name(), NAME_FONT, true, NAME_ADVANCE),
            (
                TextRole::Designation,
                card.designation(),
                DESIGNATION_FONT,
                false,
                DESIGNATION_ADVANCE,
            ),
            (TextRole::Company, card.company_name(), COMPANY_FONT, true, 0.0),
        ];

        let mut baseline = HEADER_TOP_BASELINE;
        let mut lines = Vec::with_capacity(fields.len());
        for (role, text, font_size, bold, advance) in fields {
            let Some(text) = text else { continue };
            lines.push(TextLine {
                role,
                text: text.to_string(),
                x: MARGIN,
                baseline,
                font_size,
                bold,
                anchor: TextAnchor::Start,
            });
            baseline += advance;
        }
        lines
    }

    #[allow(clippy::cast_precision_loss)]
    fn contact_lines(card: &CardView) -> Vec<ContactLine> {
        let right = TEXTURE_WIDTH as f32 - MARGIN;
        let mut baseline = TEXTURE_HEIGHT as f32 - CONTACT_BOTTOM_OFFSET;

        card.contacts()
            .map(|(kind, value)| {
                let text = format!("{} {value}", kind.glyph());
                let width = (estimate_text_width(value, CONTACT_FONT) + ZONE_PADDING)
                    .clamp(ZONE_MIN_WIDTH, ZONE_MAX_WIDTH);

                let line = ContactLine {
                    kind,
                    value: value.to_string(),
                    line: TextLine {
                        role: TextRole::Contact(kind),
                        text,
                        x: right,
                        baseline,
                        font_size: CONTACT_FONT,
                        bold: false,
                        anchor: TextAnchor::End,
                    },
                    hit_rect: PixelRect {
                        x: right - width,
                        y: baseline - ZONE_ASCENT,
                        width,
                        height: ZONE_HEIGHT,
                    },
                };
                baseline += CONTACT_PITCH;
                line
            })
            .collect()
    }

    /// All text lines in drawing order.
    pub fn text_lines(&self) -> impl Iterator<Item = &TextLine> {
        self.header
            .iter()
            .chain(self.contacts.iter().map(|c| &c.line))
    }
}

/// Estimate the rendered width of a contact line (glyph, space, value).
#[allow(clippy::cast_precision_loss)]
fn estimate_text_width(value: &str, font_size: f32) -> f32 {
    let chars = value.chars().count() as f32 + 1.0;
    (chars * AVERAGE_ADVANCE + GLYPH_ADVANCE) * font_size
}
