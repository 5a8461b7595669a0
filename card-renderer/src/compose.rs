//! Card texture composition.
//!
//! Builds the card as an SVG document from the shared [`CardLayout`], embeds
//! loaded images as data URIs, and rasterizes it with resvg/tiny-skia into a
//! 1024x585 PNG.

use std::fmt::Write;
use std::sync::Arc;

use card_core::layout::{CardLayout, PixelRect, TextAnchor, TextLine};
use card_core::CardView;
use serde::Serialize;

use crate::color::Rgb;
use crate::error::{RenderError, RenderResult};
use crate::fallback::escape_xml;
use crate::image::LoadedImage;
use crate::loader::{ImageLoader, LoadPolicy};

const BACKGROUND_IMAGE_OPACITY: f32 = 0.75;
const THEME_SHADE: i16 = -30;
const TEXT_STROKE_WIDTH: f32 = 3.0;
const TEXT_STROKE_OPACITY: f32 = 0.65;

/// Image layers that may be dropped without failing composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageLayer {
    /// Full-bleed background image.
    Background,
    /// Circular logo.
    Logo,
}

impl ImageLayer {
    /// Lowercase name, matching the serialized form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Logo => "logo",
        }
    }
}

/// A layer that was named by the card but could not be drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OmittedLayer {
    /// Which layer.
    pub layer: ImageLayer,
    /// Why it was dropped.
    pub reason: String,
}

/// Composer settings.
#[derive(Debug, Clone)]
pub struct ComposerConfig {
    /// Image load policy.
    pub policy: LoadPolicy,
    /// Load the host's fonts for text rendering.
    pub load_system_fonts: bool,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            policy: LoadPolicy::default(),
            load_system_fonts: true,
        }
    }
}

/// A rendered card texture.
#[derive(Debug, Clone)]
pub struct ComposedTexture {
    /// PNG bytes.
    pub png: Vec<u8>,
    /// Layout the texture was drawn from.
    pub layout: CardLayout,
    /// Image layers that were skipped.
    pub omitted: Vec<OmittedLayer>,
}

/// Renders [`CardView`]s into textures.
pub struct TextureComposer {
    config: ComposerConfig,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for TextureComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureComposer")
            .field("config", &self.config)
            .field("faces", &self.fontdb.len())
            .finish()
    }
}

impl TextureComposer {
    /// Create a composer.
    #[must_use]
    pub fn new(config: ComposerConfig) -> Self {
        let mut fontdb = usvg::fontdb::Database::new();
        if config.load_system_fonts {
            fontdb.load_system_fonts();
            tracing::debug!("Loaded {} font faces", fontdb.len());
        }
        Self {
            config,
            fontdb: Arc::new(fontdb),
        }
    }

    /// Create a composer with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ComposerConfig::default())
    }

    /// Composer settings.
    #[must_use]
    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Number of font faces available for text.
    #[must_use]
    pub fn font_faces(&self) -> usize {
        self.fontdb.len()
    }

    /// Load the card's images concurrently and render the texture.
    ///
    /// Failed image loads are reported in [`ComposedTexture::omitted`] and
    /// never fail the composition.
    ///
    /// # Errors
    ///
    /// Returns an error only if rasterization or PNG encoding fails.
    pub async fn compose<L>(&self, card: &CardView, loader: &L) -> RenderResult<ComposedTexture>
    where
        L: ImageLoader + ?Sized,
    {
        let policy = self.config.policy;
        let (background, logo) = futures::join!(
            load_layer(&policy, loader, card.background_url()),
            load_layer(&policy, loader, card.logo_url()),
        );

        let mut omitted = Vec::new();
        let background = keep_or_omit(background, ImageLayer::Background, &mut omitted);
        let logo = keep_or_omit(logo, ImageLayer::Logo, &mut omitted);

        let mut texture = self.compose_with_images(card, background.as_ref(), logo.as_ref())?;
        texture.omitted = omitted;
        Ok(texture)
    }

    /// Render the texture from already loaded images.
    ///
    /// # Errors
    ///
    /// Returns an error if rasterization or PNG encoding fails.
    pub fn compose_with_images(
        &self,
        card: &CardView,
        background: Option<&LoadedImage>,
        logo: Option<&LoadedImage>,
    ) -> RenderResult<ComposedTexture> {
        let layout = CardLayout::for_card(card);
        let svg = render_svg(card, &layout, background, logo);
        let pixmap = self.rasterize(&svg)?;
        let png = pixmap
            .encode_png()
            .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))?;

        tracing::debug!(
            "Composed texture for card {} ({} bytes)",
            card.card_id,
            png.len()
        );
        Ok(ComposedTexture {
            png,
            layout,
            omitted: Vec::new(),
        })
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn rasterize(&self, svg: &str) -> RenderResult<tiny_skia::Pixmap> {
        let mut opt = usvg::Options::default();
        opt.fontdb = Arc::clone(&self.fontdb);
        let tree = usvg::Tree::from_str(svg, &opt)
            .map_err(|e| RenderError::Compose(format!("SVG parsing failed: {e}")))?;

        let px_w = tree.size().width() as u32;
        let px_h = tree.size().height() as u32;

        let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
            .ok_or_else(|| RenderError::Compose("Failed to create pixmap".to_string()))?;

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        Ok(pixmap)
    }
}

async fn load_layer<L>(
    policy: &LoadPolicy,
    loader: &L,
    src: Option<&str>,
) -> Option<RenderResult<LoadedImage>>
where
    L: ImageLoader + ?Sized,
{
    match src {
        Some(src) => Some(policy.load(loader, src).await),
        None => None,
    }
}

fn keep_or_omit(
    result: Option<RenderResult<LoadedImage>>,
    layer: ImageLayer,
    omitted: &mut Vec<OmittedLayer>,
) -> Option<LoadedImage> {
    match result? {
        Ok(image) => Some(image),
        Err(e) => {
            tracing::warn!("Omitting {layer:?} layer: {e}");
            omitted.push(OmittedLayer {
                layer,
                reason: e.to_string(),
            });
            None
        }
    }
}

/// Build the SVG document for a card.
///
/// Layers, bottom to top: theme gradient, background image, circular logo,
/// text, dashed contact indicators.
#[must_use]
pub fn render_svg(
    card: &CardView,
    layout: &CardLayout,
    background: Option<&LoadedImage>,
    logo: Option<&LoadedImage>,
) -> String {
    let (w, h) = (layout.width, layout.height);
    let base = Rgb::theme(card.theme_color_or_default());
    let shaded = base.shade(THEME_SHADE);

    let mut svg = String::with_capacity(4096);
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
    );

    svg.push_str("<defs>");
    let _ = write!(
        svg,
        "<linearGradient id=\"theme\" gradientUnits=\"userSpaceOnUse\" x1=\"0\" y1=\"0\" x2=\"{w}\" y2=\"{h}\"><stop offset=\"0\" stop-color=\"{}\"/><stop offset=\"1\" stop-color=\"{}\"/></linearGradient>",
        base.to_hex(),
        shaded.to_hex(),
    );
    if let Some(slot) = &layout.logo {
        let r = slot.width / 2.0;
        let _ = write!(
            svg,
            "<clipPath id=\"logo-clip\"><circle cx=\"{}\" cy=\"{}\" r=\"{r}\"/></clipPath>",
            slot.x + r,
            slot.y + r,
        );
    }
    svg.push_str("</defs>");

    let _ = write!(
        svg,
        "<rect width=\"{w}\" height=\"{h}\" fill=\"url(#theme)\"/>"
    );

    if let Some(image) = background {
        let _ = write!(
            svg,
            "<image x=\"0\" y=\"0\" width=\"{w}\" height=\"{h}\" opacity=\"{BACKGROUND_IMAGE_OPACITY}\" preserveAspectRatio=\"none\" xlink:href=\"{}\"/>",
            image.to_data_uri(),
        );
    }

    if let (Some(slot), Some(image)) = (&layout.logo, logo) {
        let _ = write!(
            svg,
            "<image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"xMidYMid slice\" clip-path=\"url(#logo-clip)\" xlink:href=\"{}\"/>",
            slot.x,
            slot.y,
            slot.width,
            slot.height,
            image.to_data_uri(),
        );
    }

    let font = escape_xml(card.safe_font());
    for line in layout.text_lines() {
        render_text(&mut svg, line, &font);
    }

    for contact in &layout.contacts {
        render_indicator(&mut svg, &contact.hit_rect);
    }

    svg.push_str("</svg>");
    svg
}

fn render_text(svg: &mut String, line: &TextLine, font: &str) {
    let anchor = match line.anchor {
        TextAnchor::Start => "start",
        TextAnchor::End => "end",
    };
    let weight = if line.bold { "bold" } else { "normal" };
    let _ = write!(
        svg,
        "<text x=\"{}\" y=\"{}\" font-family=\"{font}, sans-serif\" font-size=\"{}\" font-weight=\"{weight}\" text-anchor=\"{anchor}\" fill=\"#ffffff\" stroke=\"#000000\" stroke-opacity=\"{TEXT_STROKE_OPACITY}\" stroke-width=\"{TEXT_STROKE_WIDTH}\" paint-order=\"stroke\">{}</text>",
        line.x,
        line.baseline,
        line.font_size,
        escape_xml(&line.text),
    );
}

fn render_indicator(svg: &mut String, rect: &PixelRect) {
    let _ = write!(
        svg,
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#ffffff\" fill-opacity=\"0.2\" stroke=\"#ffffff\" stroke-opacity=\"0.8\" stroke-width=\"3\" stroke-dasharray=\"8 4\"/>",
        rect.x, rect.y, rect.width, rect.height,
    );
}
