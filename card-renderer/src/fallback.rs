//! Static 2-D rendering of a card as HTML.
//!
//! Used when the device has no AR capability and after any AR failure.
//! Contact links are built through [`LinkAction`] so they match what the AR
//! session would dispatch.

use std::fmt::Write;

use card_core::{CardView, ContactKind, LinkAction};

use crate::color::Rgb;

/// Heading shown when the card has no name.
pub const UNTITLED_CARD: &str = "Business Card";

const ADDRESS_GLYPH: &str = "\u{1F4CD}";

/// Render a card as an HTML fragment.
#[must_use]
pub fn render_fallback_html(card: &CardView) -> String {
    let mut html = String::with_capacity(2048);
    html.push_str("<article class=\"arbiz-card\">");

    if let Some(src) = card.card_image_url() {
        let _ = write!(
            html,
            "<img class=\"arbiz-card__image\" src=\"{}\" alt=\"Business Card\">",
            escape_xml(src)
        );
    }

    let _ = write!(
        html,
        "<section class=\"arbiz-card__face\" style=\"{}\">",
        face_style(card)
    );
    if let Some(src) = card.logo_url() {
        let _ = write!(
            html,
            "<img class=\"arbiz-card__logo\" src=\"{}\" alt=\"Logo\">",
            escape_xml(src)
        );
    }
    let _ = write!(
        html,
        "<h1 class=\"arbiz-card__name\">{}</h1>",
        escape_xml(card.full_name().unwrap_or(UNTITLED_CARD))
    );
    if let Some(designation) = card.designation() {
        let _ = write!(
            html,
            "<p class=\"arbiz-card__designation\">{}</p>",
            escape_xml(designation)
        );
    }
    if let Some(company) = card.company_name() {
        let _ = write!(
            html,
            "<p class=\"arbiz-card__company\">{}</p>",
            escape_xml(company)
        );
    }
    html.push_str("</section>");

    html.push_str("<ul class=\"arbiz-card__contacts\">");
    for (kind, value) in card.contacts() {
        render_contact(&mut html, kind, value);
    }
    if let Some(address) = card.address() {
        let _ = write!(
            html,
            "<li class=\"arbiz-card__address\">{ADDRESS_GLYPH} {}</li>",
            escape_xml(address)
        );
    }
    html.push_str("</ul>");

    if let Some(src) = card.qr_code() {
        let _ = write!(
            html,
            "<figure class=\"arbiz-card__qr\"><img src=\"{}\" alt=\"QR Code\"><figcaption>Scan to share</figcaption></figure>",
            escape_xml(src)
        );
    }

    html.push_str("</article>");
    html
}

/// Render a complete standalone page for a card.
#[must_use]
pub fn render_fallback_page(card: &CardView) -> String {
    let title = card.full_name().unwrap_or(UNTITLED_CARD);
    page(title, &render_fallback_html(card))
}

/// Render the page shown for unknown or unpublished cards.
#[must_use]
pub fn render_not_found_page() -> String {
    page(
        "Card not found",
        "<article class=\"arbiz-card arbiz-card--missing\"><h1>Card not found</h1><p>This card does not exist or is no longer published.</p></article>",
    )
}

/// Escape text for XML and HTML attribute or element content.
pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\"><meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"><title>{}</title></head><body>{body}</body></html>",
        escape_xml(title)
    )
}

fn render_contact(html: &mut String, kind: ContactKind, value: &str) {
    let action = LinkAction::new(kind, value);
    let target = if action.opens_new_window() {
        " target=\"_blank\" rel=\"noopener noreferrer\""
    } else {
        ""
    };
    let _ = write!(
        html,
        "<li class=\"arbiz-card__contact arbiz-card__contact--{kind}\">{} <a href=\"{}\"{target}>{}</a></li>",
        kind.glyph(),
        escape_xml(&action.url()),
        escape_xml(value),
    );
}

/// Inline style for the card face: sanitized theme color, optional
/// background image and a safe font.
fn face_style(card: &CardView) -> String {
    let mut style = format!(
        "background-color:{};color:#ffffff;font-family:{}, sans-serif;",
        Rgb::theme(card.theme_color_or_default()).to_hex(),
        card.safe_font()
    );
    if let Some(url) = card.background_url().filter(|url| is_css_safe_url(url)) {
        let _ = write!(
            style,
            "background-image:url('{url}');background-size:cover;background-position:center;"
        );
    }
    escape_xml(&style)
}

/// URLs that can sit inside `url('...')` without escaping it.
fn is_css_safe_url(url: &str) -> bool {
    let scheme_ok = url.starts_with("https://")
        || url.starts_with("http://")
        || url.starts_with("data:image/");
    scheme_ok
        && !url
            .chars()
            .any(|c| matches!(c, '\'' | '"' | '(' | ')' | '\\' | '<' | '>') || c.is_whitespace())
}
