//! Opaque serialization of the whole surface for history checkpoints.
//!
//! The blob is JSON with rasters embedded as PNG bytes. Consumers only ever
//! round-trip it through `capture_snapshot`/`restore_snapshot`; nothing
//! outside this module depends on its layout.

use std::io::Cursor;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::composition::{BlendMode, Sticker, TextObject};

use super::SurfaceError;
use super::object::StrokeNode;

/// An opaque serialized surface state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceSnapshot(pub(crate) String);

#[derive(Serialize, Deserialize)]
pub(crate) struct SnapshotData {
    pub width: u32,
    pub height: u32,
    pub base: Option<BaseSnapshot>,
    pub overlay: Option<OverlaySnapshot>,
    pub strokes: Vec<StrokeNode>,
    pub stickers: Vec<StickerSnapshot>,
    pub texts: Vec<TextObject>,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct BaseSnapshot {
    pub baseline_png: Vec<u8>,
    pub rotation_degrees: f32,
    pub flipped_horizontal: bool,
    pub flipped_vertical: bool,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct OverlaySnapshot {
    pub image_ref: String,
    pub opacity: f32,
    pub blend: BlendMode,
    pub raster_png: Option<Vec<u8>>,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct StickerSnapshot {
    pub sticker: Sticker,
    pub raster_png: Option<Vec<u8>>,
}

pub(crate) fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, SurfaceError> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| SurfaceError::Snapshot(e.to_string()))?;
    Ok(bytes)
}

pub(crate) fn decode_png(bytes: &[u8]) -> Result<RgbaImage, SurfaceError> {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .map_err(|e| SurfaceError::Snapshot(e.to_string()))?;
    Ok(img.to_rgba8())
}

pub(crate) fn serialize(data: &SnapshotData) -> Result<SurfaceSnapshot, SurfaceError> {
    serde_json::to_string(data)
        .map(SurfaceSnapshot)
        .map_err(|e| SurfaceError::Snapshot(e.to_string()))
}

pub(crate) fn deserialize(snapshot: &SurfaceSnapshot) -> Result<SnapshotData, SurfaceError> {
    serde_json::from_str(&snapshot.0).map_err(|e| SurfaceError::Snapshot(e.to_string()))
}
