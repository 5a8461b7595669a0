//! Image bytes: format sniffing, data URIs and decode validation.

use base64::Engine;

use crate::error::{RenderError, RenderResult};

/// Image formats the composer can embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// WebP (alpha support).
    WebP,
    /// GIF (first frame).
    Gif,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from MIME type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        match mime.trim().to_lowercase().as_str() {
            "image/png" => Self::Png,
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            "image/webp" => Self::WebP,
            "image/gif" => Self::Gif,
            _ => Self::Unknown,
        }
    }

    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }

        // GIF87a / GIF89a
        if data.starts_with(b"GIF8") {
            return Self::Gif;
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }

        Self::Unknown
    }

    /// MIME type for a data URI.
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
            Self::Unknown => "application/octet-stream",
        }
    }
}

/// A fetched image that decoded successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    /// Encoded bytes as fetched.
    pub bytes: Vec<u8>,
    /// Detected format.
    pub format: ImageFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl LoadedImage {
    /// Decode `bytes` to confirm they are a usable image.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a decodable image.
    pub fn from_bytes(bytes: Vec<u8>) -> RenderResult<Self> {
        let format = ImageFormat::from_magic_bytes(&bytes);
        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?;

        // The rasterizer only embeds formats it can read itself.
        let (bytes, format) = if format == ImageFormat::Unknown {
            let mut png = std::io::Cursor::new(Vec::new());
            decoded
                .write_to(&mut png, image::ImageFormat::Png)
                .map_err(|e| RenderError::Encode(format!("PNG re-encoding failed: {e}")))?;
            (png.into_inner(), ImageFormat::Png)
        } else {
            (bytes, format)
        };

        Ok(Self {
            bytes,
            format,
            width: decoded.width(),
            height: decoded.height(),
        })
    }

    /// The image as a base64 data URI.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        to_data_uri(&self.bytes, self.format)
    }
}

/// Encode bytes as a base64 data URI.
#[must_use]
pub fn to_data_uri(bytes: &[u8], format: ImageFormat) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{encoded}", format.mime())
}

/// Whether a source string is an inline data URI.
#[must_use]
pub fn is_data_uri(src: &str) -> bool {
    src.trim_start().starts_with("data:")
}

/// Decode the payload of a data URI.
///
/// Supports forms like `data:image/png;base64,iVBORw0KGgo...` and
/// percent-encoded payloads.
///
/// # Errors
///
/// Returns an error if the data URI is malformed.
pub fn decode_data_uri(uri: &str) -> RenderResult<Vec<u8>> {
    let uri_data = uri
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;

    let (metadata, encoded) = uri_data
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    if metadata.contains(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))
    } else {
        percent_decode(encoded)
    }
}

fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = input
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }

    Ok(result)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A 2x2 red PNG.
    pub(crate) fn tiny_png() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png)
            .expect("encode png");
        buf.into_inner()
    }

    #[test]
    fn test_magic_bytes() {
        assert_eq!(ImageFormat::from_magic_bytes(&tiny_png()), ImageFormat::Png);
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]),
            ImageFormat::Jpeg
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a"), ImageFormat::Gif);
        assert_eq!(ImageFormat::from_magic_bytes(&[1, 2]), ImageFormat::Unknown);
    }

    #[test]
    fn test_data_uri_round_trip() {
        let png = tiny_png();
        let uri = to_data_uri(&png, ImageFormat::Png);
        assert!(uri.starts_with("data:image/png;base64,"));
        assert_eq!(decode_data_uri(&uri).expect("decode"), png);
    }

    #[test]
    fn test_percent_encoded_data_uri() {
        let bytes = decode_data_uri("data:text/plain,a%20b").expect("decode");
        assert_eq!(bytes, b"a b");
        assert!(decode_data_uri("data:text/plain,%zz").is_err());
    }

    #[test]
    fn test_malformed_data_uri() {
        assert!(decode_data_uri("https://x.co/a.png").is_err());
        assert!(decode_data_uri("data:image/png;base64").is_err());
    }

    #[test]
    fn test_loaded_image_validates() {
        let loaded = LoadedImage::from_bytes(tiny_png()).expect("valid png");
        assert_eq!((loaded.width, loaded.height), (2, 2));
        assert_eq!(loaded.format, ImageFormat::Png);

        let err = LoadedImage::from_bytes(b"<html>404</html>".to_vec()).expect_err("not an image");
        assert!(matches!(err, RenderError::Resource(_)));
    }
}
