use egui::{Color32, Pos2};
use serde::{Deserialize, Serialize};

/// Horizontal alignment of wrapped text lines inside the text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "left" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

/// A text box on the canvas.
///
/// `position` is the top-left corner of the box. The box has an explicit
/// wrap width; height follows from the wrapped content. `background` of
/// `None` means transparent, which is distinct from any opaque color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextObject {
    pub id: usize,
    pub content: String,
    pub position: Pos2,
    /// Degrees, about the box center
    pub rotation: f32,
    pub width: f32,
    pub font_family: String,
    pub font_size: f32,
    pub fill: Color32,
    /// Percent, 0..=100
    pub fill_opacity: f32,
    pub background: Option<Color32>,
    /// Percent, 0..=100
    pub background_opacity: f32,
    /// Multiple of the font size, always >= 1
    pub line_spacing: f32,
    pub align: TextAlign,
}

impl TextObject {
    pub fn new(id: usize, position: Pos2) -> Self {
        Self {
            id,
            content: "New Text".to_owned(),
            position,
            rotation: 0.0,
            width: 70.0,
            font_family: "Arial".to_owned(),
            font_size: 16.0,
            fill: Color32::BLACK,
            fill_opacity: 100.0,
            background: Some(Color32::WHITE),
            background_opacity: 100.0,
            line_spacing: 1.5,
            align: TextAlign::Left,
        }
    }
}
