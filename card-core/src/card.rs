//! The read-only card record consumed by the viewer.

use serde::{Deserialize, Serialize};

use crate::{ViewerError, ViewerResult};

/// Theme color used when a card does not carry a usable one.
pub const DEFAULT_THEME_COLOR: &str = "#6366f1";

/// Font family used when a card does not carry a known-safe one.
pub const DEFAULT_FONT: &str = "Arial";

/// Font families every target platform is expected to render.
pub const SAFE_FONTS: &[&str] = &[
    "Arial",
    "Helvetica",
    "Verdana",
    "Tahoma",
    "Trebuchet MS",
    "Georgia",
    "Times New Roman",
    "Courier New",
    "sans-serif",
    "serif",
    "monospace",
];

/// Flattened, read-only projection of a published business card.
///
/// Field names on the wire follow the card service (`fullName`, `themeColor`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardView {
    /// Stable public identifier used in the viewer URL.
    pub card_id: String,
    /// Owner-facing title of the card.
    pub card_title: String,
    /// Full name.
    pub full_name: String,
    /// Job title.
    pub designation: String,
    /// Company name.
    pub company_name: String,
    /// Phone number as entered.
    pub phone: String,
    /// Email address.
    pub email: String,
    /// Website, with or without scheme.
    pub website: String,
    /// Postal address.
    pub address: String,
    /// Theme color as a hex string.
    pub theme_color: String,
    /// Font family name.
    pub font_style: String,
    /// Logo image URL.
    pub logo: Option<String>,
    /// Profile photo URL, used when no logo is set.
    pub profile_image: Option<String>,
    /// Background image URL.
    pub background_image: Option<String>,
    /// Pre-rendered card image URL.
    pub card_image: Option<String>,
    /// QR code image (data-URI PNG).
    pub qr_code: Option<String>,
    /// Public viewer URL.
    pub viewer_url: Option<String>,
    /// Whether AR presentation is enabled for this card.
    #[serde(default = "default_true")]
    pub ar_enabled: bool,
    /// Optional pre-baked 3-D asset URL.
    pub glb_url: Option<String>,
    /// Whether the card is visible to the viewer.
    pub is_published: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CardView {
    fn default() -> Self {
        Self {
            card_id: String::new(),
            card_title: String::new(),
            full_name: String::new(),
            designation: String::new(),
            company_name: String::new(),
            phone: String::new(),
            email: String::new(),
            website: String::new(),
            address: String::new(),
            theme_color: String::new(),
            font_style: String::new(),
            logo: None,
            profile_image: None,
            background_image: None,
            card_image: None,
            qr_code: None,
            viewer_url: None,
            ar_enabled: true,
            glb_url: None,
            is_published: false,
        }
    }
}

/// Contact fields that carry an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactKind {
    /// Phone number (`tel:`).
    Phone,
    /// Email address (`mailto:`).
    Email,
    /// Website (`https:`).
    Website,
}

impl ContactKind {
    /// All contact kinds in drawing order.
    pub const ALL: [ContactKind; 3] = [Self::Phone, Self::Email, Self::Website];

    /// Glyph drawn before the contact value.
    #[must_use]
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Phone => "\u{1F4DE}",
            Self::Email => "\u{2709}\u{FE0F}",
            Self::Website => "\u{1F517}",
        }
    }

    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Website => "website",
        }
    }
}

impl std::fmt::Display for ContactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CardView {
    /// Parse a card from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a card.
    pub fn from_json(json: &str) -> ViewerResult<Self> {
        serde_json::from_str(json).map_err(ViewerError::from)
    }

    /// Serialize the card to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> ViewerResult<String> {
        serde_json::to_string(self).map_err(ViewerError::from)
    }

    /// The value of a contact field, if populated.
    #[must_use]
    pub fn contact(&self, kind: ContactKind) -> Option<&str> {
        let raw = match kind {
            ContactKind::Phone => &self.phone,
            ContactKind::Email => &self.email,
            ContactKind::Website => &self.website,
        };
        non_empty(raw)
    }

    /// Populated contact fields in drawing order.
    pub fn contacts(&self) -> impl Iterator<Item = (ContactKind, &str)> {
        ContactKind::ALL
            .into_iter()
            .filter_map(move |kind| self.contact(kind).map(|value| (kind, value)))
    }

    /// Full name, if populated.
    #[must_use]
    pub fn full_name(&self) -> Option<&str> {
        non_empty(&self.full_name)
    }

    /// Designation, if populated.
    #[must_use]
    pub fn designation(&self) -> Option<&str> {
        non_empty(&self.designation)
    }

    /// Company name, if populated.
    #[must_use]
    pub fn company_name(&self) -> Option<&str> {
        non_empty(&self.company_name)
    }

    /// Address, if populated.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        non_empty(&self.address)
    }

    /// Logo URL, falling back to the profile photo.
    #[must_use]
    pub fn logo_url(&self) -> Option<&str> {
        opt_non_empty(self.logo.as_deref()).or_else(|| opt_non_empty(self.profile_image.as_deref()))
    }

    /// Background image URL, if set.
    #[must_use]
    pub fn background_url(&self) -> Option<&str> {
        opt_non_empty(self.background_image.as_deref())
    }

    /// Pre-rendered card image URL, if set.
    #[must_use]
    pub fn card_image_url(&self) -> Option<&str> {
        opt_non_empty(self.card_image.as_deref())
    }

    /// QR code image, if set.
    #[must_use]
    pub fn qr_code(&self) -> Option<&str> {
        opt_non_empty(self.qr_code.as_deref())
    }

    /// Theme color as given, or the default when absent.
    #[must_use]
    pub fn theme_color_or_default(&self) -> &str {
        non_empty(&self.theme_color).unwrap_or(DEFAULT_THEME_COLOR)
    }

    /// Font family to draw with: the card's font when it is known-safe,
    /// otherwise [`DEFAULT_FONT`].
    #[must_use]
    pub fn safe_font(&self) -> &'static str {
        let requested = self.font_style.trim();
        SAFE_FONTS
            .iter()
            .find(|font| font.eq_ignore_ascii_case(requested))
            .copied()
            .unwrap_or(DEFAULT_FONT)
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn opt_non_empty(value: Option<&str>) -> Option<&str> {
    value.and_then(non_empty)
}

/// A navigation target produced by a contact field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum LinkAction {
    /// Dial a phone number.
    Phone(String),
    /// Compose an email.
    Email(String),
    /// Open a website.
    Website(String),
}

impl LinkAction {
    /// Build the action for a contact value.
    #[must_use]
    pub fn new(kind: ContactKind, value: &str) -> Self {
        match kind {
            ContactKind::Phone => Self::Phone(value.to_string()),
            ContactKind::Email => Self::Email(value.to_string()),
            ContactKind::Website => Self::Website(value.to_string()),
        }
    }

    /// The contact kind this action came from.
    #[must_use]
    pub fn kind(&self) -> ContactKind {
        match self {
            Self::Phone(_) => ContactKind::Phone,
            Self::Email(_) => ContactKind::Email,
            Self::Website(_) => ContactKind::Website,
        }
    }

    /// The URL to navigate to.
    #[must_use]
    pub fn url(&self) -> String {
        match self {
            Self::Phone(number) => {
                let digits: String = number.chars().filter(|c| !c.is_whitespace()).collect();
                format!("tel:{digits}")
            }
            Self::Email(address) => format!("mailto:{}", address.trim()),
            Self::Website(site) => {
                let site = site.trim();
                if site.starts_with("http") {
                    site.to_string()
                } else {
                    format!("https://{site}")
                }
            }
        }
    }

    /// Whether the target should open in a new browsing context.
    #[must_use]
    pub fn opens_new_window(&self) -> bool {
        matches!(self, Self::Website(_))
    }
}
