//! Raster encoding for export and save.

use std::io::Cursor;

use image::{DynamicImage, RgbaImage};

use crate::error::ExportError;

/// JPEG quality used for lossy export, matching the 0.95 canvas default.
pub const JPEG_QUALITY: u8 = 95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ExportFormat {
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }
}

/// Encodes the raster in the requested format. WebP is lossless; JPEG
/// flattens alpha since the format has none.
pub fn encode(img: &RgbaImage, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    match format {
        ExportFormat::Png => {
            img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
                .map_err(|e| ExportError::Encode(e.to_string()))?;
        }
        ExportFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
            let mut cursor = Cursor::new(&mut bytes);
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
            rgb.write_with_encoder(encoder)
                .map_err(|e| ExportError::Encode(e.to_string()))?;
        }
        ExportFormat::Webp => {
            let mut cursor = Cursor::new(&mut bytes);
            let encoder = image::codecs::webp::WebPEncoder::new_lossless(&mut cursor);
            img.write_with_encoder(encoder)
                .map_err(|e| ExportError::Encode(e.to_string()))?;
        }
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample() -> RgbaImage {
        RgbaImage::from_pixel(20, 10, Rgba([120, 40, 200, 255]))
    }

    #[test]
    fn unknown_format_ids_are_rejected() {
        assert_eq!(ExportFormat::from_id("jpg"), Some(ExportFormat::Jpeg));
        assert_eq!(ExportFormat::from_id("tiff"), None);
    }

    #[test]
    fn png_round_trips_dimensions() {
        let bytes = encode(&sample(), ExportFormat::Png).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 20);
        assert_eq!(decoded.height(), 10);
    }

    #[test]
    fn every_format_produces_output() {
        for format in [ExportFormat::Png, ExportFormat::Jpeg, ExportFormat::Webp] {
            let bytes = encode(&sample(), format).unwrap();
            assert!(!bytes.is_empty(), "{:?} produced no bytes", format);
        }
    }
}
