//! Integration tests for texture composition and the static fallback.
//!
//! Covers image failures, layout stability across image outcomes, and the
//! flat page shown on desktops without AR.

use async_trait::async_trait;
use card_core::{zone, CardView};
use card_renderer::{
    render_fallback_html, ComposerConfig, ImageLayer, ImageLoader, LoadAttempt, LoadPolicy,
    RenderError, RenderResult, TextureComposer,
};

/// Every fetch fails like a dropped connection.
struct UnreachableNetwork;

#[async_trait]
impl ImageLoader for UnreachableNetwork {
    async fn fetch(&self, url: &str, _attempt: LoadAttempt) -> RenderResult<Vec<u8>> {
        Err(RenderError::Resource(format!("connection reset: {url}")))
    }
}

/// Serves the same PNG for every URL.
struct StaticImages(Vec<u8>);

#[async_trait]
impl ImageLoader for StaticImages {
    async fn fetch(&self, _url: &str, _attempt: LoadAttempt) -> RenderResult<Vec<u8>> {
        Ok(self.0.clone())
    }
}

fn blue_png() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(8, 8, image::Rgba([0, 0, 255, 255]));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode png");
    buf.into_inner()
}

fn composer() -> TextureComposer {
    TextureComposer::new(ComposerConfig {
        policy: LoadPolicy::default(),
        load_system_fonts: false,
    })
}

fn card_with_images() -> CardView {
    CardView {
        card_id: "jane".into(),
        full_name: "Jane Doe".into(),
        designation: "CTO".into(),
        company_name: "Acme".into(),
        phone: "+1 555 0100".into(),
        website: "https://x.co".into(),
        theme_color: "#336699".into(),
        background_image: Some("https://cdn.example/bg.jpg".into()),
        logo: Some("https://cdn.example/logo.png".into()),
        ..CardView::default()
    }
}

#[tokio::test]
async fn test_failed_images_keep_background_and_text() {
    let texture = composer()
        .compose(&card_with_images(), &UnreachableNetwork)
        .await
        .expect("composition survives image failures");

    let layers: Vec<_> = texture.omitted.iter().map(|o| o.layer).collect();
    assert_eq!(layers, vec![ImageLayer::Background, ImageLayer::Logo]);

    let texts: Vec<_> = texture.layout.text_lines().map(|l| l.text.as_str()).collect();
    assert_eq!(texts.len(), 5);
    assert_eq!(&texts[..3], &["Jane Doe", "CTO", "Acme"]);

    let rgba = image::load_from_memory(&texture.png)
        .expect("decode")
        .to_rgba8();
    assert_eq!(rgba.dimensions(), (1024, 585));
    let corner = rgba.get_pixel(1, 1);
    assert!(corner[0].abs_diff(0x33) <= 2);
    assert!(corner[1].abs_diff(0x66) <= 2);
    assert!(corner[2].abs_diff(0x99) <= 2);
}

#[tokio::test]
async fn test_layout_does_not_depend_on_image_outcome() {
    let card = card_with_images();
    let failed = composer()
        .compose(&card, &UnreachableNetwork)
        .await
        .expect("compose");
    let loaded = composer()
        .compose(&card, &StaticImages(blue_png()))
        .await
        .expect("compose");

    assert!(loaded.omitted.is_empty());
    assert_eq!(failed.layout, loaded.layout);
    assert_ne!(failed.png, loaded.png);
}

#[tokio::test]
async fn test_zones_match_drawn_indicators() {
    let card = card_with_images();
    let texture = composer()
        .compose(&card, &UnreachableNetwork)
        .await
        .expect("compose");

    let from_texture = zone::zones_from_layout(&texture.layout);
    assert_eq!(from_texture, zone::zones_for(&card));
}

#[test]
fn test_desktop_fallback_links() {
    let card = CardView {
        full_name: "Jane Doe".into(),
        phone: "+1 555 0100".into(),
        email: String::new(),
        website: "https://x.co".into(),
        ..CardView::default()
    };
    let html = render_fallback_html(&card);

    assert!(html.contains("tel:+15550100"));
    assert!(html.contains("href=\"https://x.co\""));
    assert!(!html.contains("mailto:"));
}
