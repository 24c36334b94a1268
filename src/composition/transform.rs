use serde::{Deserialize, Serialize};

/// A rectangular region in canvas coordinates, used for destructive crops.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Geometric state of the base image.
///
/// Rotation and flips are non-destructive (surface-level placement); crop is
/// destructive and handled by the surface when committed. `target_width` and
/// `target_height` are the display dimensions of the image on the canvas,
/// set when the image loads and replaced when a crop commits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub target_width: u32,
    pub target_height: u32,
    /// Degrees, always normalized into [0, 360)
    pub rotation_degrees: f32,
    pub flipped_horizontal: bool,
    pub flipped_vertical: bool,
    pub crop_region: Option<CropRegion>,
    /// Aspect lock for the crop tool, e.g. (1, 1) or (4, 3)
    pub locked_aspect: Option<(u32, u32)>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            target_width: 0,
            target_height: 0,
            rotation_degrees: 0.0,
            flipped_horizontal: false,
            flipped_vertical: false,
            crop_region: None,
            locked_aspect: None,
        }
    }
}

impl Transform {
    /// Normalizes an angle in degrees into [0, 360)
    pub fn normalize_degrees(degrees: f32) -> f32 {
        degrees.rem_euclid(360.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_wraps_both_directions() {
        assert_eq!(Transform::normalize_degrees(450.0), 90.0);
        assert_eq!(Transform::normalize_degrees(-90.0), 270.0);
        assert_eq!(Transform::normalize_degrees(360.0), 0.0);
    }
}
