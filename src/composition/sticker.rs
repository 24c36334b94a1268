use egui::Pos2;
use serde::{Deserialize, Serialize};

/// Default edge length of a freshly placed sticker, in canvas units.
pub const STICKER_BASE_SIZE: f32 = 100.0;

/// A decorative image object on the canvas.
///
/// `position` is the sticker's center. Scaling is uniform (corner handles
/// only), so the rendered size is `base width/height × scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sticker {
    pub id: String,
    pub image_ref: String,
    pub position: Pos2,
    /// Degrees, about the center
    pub rotation: f32,
    pub scale: f32,
    pub base_width: f32,
    pub base_height: f32,
}

impl Sticker {
    pub fn new(image_ref: &str, position: Pos2) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            image_ref: image_ref.to_owned(),
            position,
            rotation: 0.0,
            scale: 1.0,
            base_width: STICKER_BASE_SIZE,
            base_height: STICKER_BASE_SIZE,
        }
    }
}
