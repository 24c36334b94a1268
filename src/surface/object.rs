use egui::Pos2;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::composition::{BlendMode, BrushSettings, Sticker};

/// Transient snap guide visibility while an object is being dragged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuideLines {
    /// The horizontal centerline is showing
    pub horizontal: bool,
    /// The vertical centerline is showing
    pub vertical: bool,
}

impl GuideLines {
    pub fn any(&self) -> bool {
        self.horizontal || self.vertical
    }
}

/// A committed freehand stroke. Strokes capture the brush settings at the
/// moment they were drawn; later brush changes do not repaint them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeNode {
    pub points: Vec<Pos2>,
    pub brush: BrushSettings,
}

/// A sticker on the surface, pairing the model object with its decoded
/// raster once the asset has loaded.
#[derive(Clone)]
pub struct StickerNode {
    pub sticker: Sticker,
    pub raster: Option<RgbaImage>,
}

impl std::fmt::Debug for StickerNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StickerNode")
            .field("id", &self.sticker.id)
            .field("image_ref", &self.sticker.image_ref)
            .field(
                "raster",
                &self
                    .raster
                    .as_ref()
                    .map(|r| format!("{}x{}", r.width(), r.height())),
            )
            .finish()
    }
}

/// The decorative overlay texture, composited above the base image and
/// matched to its placement. Kept as its own object so opacity and blend
/// mode updates never touch the pixel pipeline.
#[derive(Clone)]
pub struct OverlayNode {
    pub image_ref: String,
    /// Percent, 0..=100
    pub opacity: f32,
    pub blend: BlendMode,
    pub raster: Option<RgbaImage>,
}

impl std::fmt::Debug for OverlayNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayNode")
            .field("image_ref", &self.image_ref)
            .field("opacity", &self.opacity)
            .field("blend", &self.blend)
            .field(
                "raster",
                &self
                    .raster
                    .as_ref()
                    .map(|r| format!("{}x{}", r.width(), r.height())),
            )
            .finish()
    }
}

/// Result of a hit test on the interactive surface, topmost object first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickedObject {
    Text(usize),
    Sticker(String),
}
