//! The normalized, serializable description of what the edited image
//! currently looks like.
//!
//! This is pure data plus validated mutators: every numeric setter clamps to
//! its declared range and unknown enumerated ids are ignored, so the model
//! is always renderable. Nothing here touches the surface or the history;
//! the session controller is responsible for triggering those.

pub mod sticker;
pub mod text;
pub mod transform;

pub use sticker::{STICKER_BASE_SIZE, Sticker};
pub use text::{TextAlign, TextObject};
pub use transform::{CropRegion, Transform};

use egui::{Color32, Pos2, pos2};
use serde::{Deserialize, Serialize};

/// Positional offset applied to a duplicated text object.
pub const DUPLICATE_OFFSET: f32 = 20.0;

/// Parses a `#rrggbb` or `#rgb` hex color. Returns `None` for anything else.
pub fn parse_hex_color(s: &str) -> Option<Color32> {
    let hex = s.strip_prefix('#')?;
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Color32::from_rgb(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
            Some(Color32::from_rgb(r * 17, g * 17, b * 17))
        }
        _ => None,
    }
}

fn clamp_signed(v: f32) -> f32 {
    v.clamp(-100.0, 100.0)
}

fn clamp_percent(v: f32) -> f32 {
    v.clamp(0.0, 100.0)
}

/// Slider-driven tonal values, each in [-100, 100] with 0 as identity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TonalAdjustments {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub gamma: f32,
    /// Negative blurs, positive sharpens
    pub sharpen_blur: f32,
}

impl TonalAdjustments {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

/// The fixed table of filter presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterKind {
    #[default]
    None,
    Grayscale,
    Sepia,
    Vintage,
    Vibrant,
    Cool,
    Warm,
    Dramatic,
    Dreamy,
    Summer,
    Winter,
    Polaroid,
    NeoNoir,
    Cyberpunk,
    Pastel,
    Hdr,
    TiltShift,
}

impl FilterKind {
    pub fn from_id(id: &str) -> Option<Self> {
        Some(match id {
            "none" => Self::None,
            "grayscale" => Self::Grayscale,
            "sepia" => Self::Sepia,
            "vintage" => Self::Vintage,
            "vibrant" => Self::Vibrant,
            "cool" => Self::Cool,
            "warm" => Self::Warm,
            "dramatic" => Self::Dramatic,
            "dreamy" => Self::Dreamy,
            "summer" => Self::Summer,
            "winter" => Self::Winter,
            "polaroid" => Self::Polaroid,
            "neo_noir" => Self::NeoNoir,
            "cyberpunk" => Self::Cyberpunk,
            "pastel" => Self::Pastel,
            "hdr" => Self::Hdr,
            "tilt_shift" => Self::TiltShift,
            _ => return None,
        })
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Grayscale => "grayscale",
            Self::Sepia => "sepia",
            Self::Vintage => "vintage",
            Self::Vibrant => "vibrant",
            Self::Cool => "cool",
            Self::Warm => "warm",
            Self::Dramatic => "dramatic",
            Self::Dreamy => "dreamy",
            Self::Summer => "summer",
            Self::Winter => "winter",
            Self::Polaroid => "polaroid",
            Self::NeoNoir => "neo_noir",
            Self::Cyberpunk => "cyberpunk",
            Self::Pastel => "pastel",
            Self::Hdr => "hdr",
            Self::TiltShift => "tilt_shift",
        }
    }

    pub const ALL: [FilterKind; 17] = [
        Self::None,
        Self::Grayscale,
        Self::Sepia,
        Self::Vintage,
        Self::Vibrant,
        Self::Cool,
        Self::Warm,
        Self::Dramatic,
        Self::Dreamy,
        Self::Summer,
        Self::Winter,
        Self::Polaroid,
        Self::NeoNoir,
        Self::Cyberpunk,
        Self::Pastel,
        Self::Hdr,
        Self::TiltShift,
    ];
}

/// Selected filter preset plus its strength.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSettings {
    pub kind: FilterKind,
    /// Percent, 0..=100
    pub intensity: f32,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            kind: FilterKind::None,
            intensity: 30.0,
        }
    }
}

/// Single-choice pixel effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    Glitch,
    Noise,
    RgbShift,
}

impl EffectKind {
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "glitch" => Some(Self::Glitch),
            "noise" => Some(Self::Noise),
            "rgbShift" => Some(Self::RgbShift),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Glitch => "glitch",
            Self::Noise => "noise",
            Self::RgbShift => "rgbShift",
        }
    }

    pub const ALL: [EffectKind; 3] = [Self::Glitch, Self::Noise, Self::RgbShift];
}

/// At most one effect is active; each kind remembers its own intensity so
/// switching back restores the previous strength.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectSettings {
    pub active: Option<EffectKind>,
    pub glitch_intensity: f32,
    pub noise_intensity: f32,
    pub rgb_shift_intensity: f32,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            active: None,
            glitch_intensity: 50.0,
            noise_intensity: 30.0,
            rgb_shift_intensity: 20.0,
        }
    }
}

impl EffectSettings {
    pub fn intensity_of(&self, kind: EffectKind) -> f32 {
        match kind {
            EffectKind::Glitch => self.glitch_intensity,
            EffectKind::Noise => self.noise_intensity,
            EffectKind::RgbShift => self.rgb_shift_intensity,
        }
    }

    pub fn set_intensity(&mut self, kind: EffectKind, value: f32) {
        let value = clamp_percent(value);
        match kind {
            EffectKind::Glitch => self.glitch_intensity = value,
            EffectKind::Noise => self.noise_intensity = value,
            EffectKind::RgbShift => self.rgb_shift_intensity = value,
        }
    }
}

/// Compositing modes for the overlay texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
}

impl BlendMode {
    pub fn from_id(id: &str) -> Option<Self> {
        Some(match id {
            "normal" => Self::Normal,
            "multiply" => Self::Multiply,
            "screen" => Self::Screen,
            "overlay" => Self::Overlay,
            "darken" => Self::Darken,
            "lighten" => Self::Lighten,
            "color-dodge" => Self::ColorDodge,
            "color-burn" => Self::ColorBurn,
            "hard-light" => Self::HardLight,
            "soft-light" => Self::SoftLight,
            _ => return None,
        })
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Multiply => "multiply",
            Self::Screen => "screen",
            Self::Overlay => "overlay",
            Self::Darken => "darken",
            Self::Lighten => "lighten",
            Self::ColorDodge => "color-dodge",
            Self::ColorBurn => "color-burn",
            Self::HardLight => "hard-light",
            Self::SoftLight => "soft-light",
        }
    }

    pub const ALL: [BlendMode; 10] = [
        Self::Normal,
        Self::Multiply,
        Self::Screen,
        Self::Overlay,
        Self::Darken,
        Self::Lighten,
        Self::ColorDodge,
        Self::ColorBurn,
        Self::HardLight,
        Self::SoftLight,
    ];
}

/// Decorative texture composited above the base image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlaySettings {
    /// Image reference of the selected texture, `None` when off
    pub selected: Option<String>,
    /// Percent, 0..=100
    pub opacity: f32,
    pub blend: BlendMode,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            selected: None,
            opacity: 50.0,
            blend: BlendMode::Normal,
        }
    }
}

/// Freehand brush parameters. These apply to strokes as they are committed;
/// committed strokes live on the render surface, not here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrushSettings {
    pub size: f32,
    /// Percent, 0..=100; 100 is a hard-edged stamp
    pub hardness: f32,
    pub color: Color32,
    /// Percent, 0..=100
    pub opacity: f32,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            size: 15.0,
            hardness: 100.0,
            color: Color32::WHITE,
            opacity: 50.0,
        }
    }
}

/// Everything that must survive undo/redo, captured per history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionSnapshot {
    pub transform: Transform,
    pub tonal: TonalAdjustments,
    pub filter: FilterSettings,
    pub overlay: OverlaySettings,
    pub effect: EffectSettings,
    pub texts: Vec<TextObject>,
    pub selected_text: Option<usize>,
    pub brush: BrushSettings,
    pub stickers: Vec<Sticker>,
}

/// The composition model for one editing session.
#[derive(Debug, Clone, Default)]
pub struct CompositionModel {
    base_image_ref: Option<String>,
    transform: Transform,
    tonal: TonalAdjustments,
    filter: FilterSettings,
    overlay: OverlaySettings,
    effect: EffectSettings,
    texts: Vec<TextObject>,
    selected_text: Option<usize>,
    stickers: Vec<Sticker>,
    selected_sticker: Option<String>,
    brush: BrushSettings,
}

impl CompositionModel {
    pub fn new() -> Self {
        Self::default()
    }

    // --- accessors ---

    pub fn base_image_ref(&self) -> Option<&str> {
        self.base_image_ref.as_deref()
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn tonal(&self) -> &TonalAdjustments {
        &self.tonal
    }

    pub fn filter(&self) -> &FilterSettings {
        &self.filter
    }

    pub fn overlay(&self) -> &OverlaySettings {
        &self.overlay
    }

    pub fn effect(&self) -> &EffectSettings {
        &self.effect
    }

    pub fn texts(&self) -> &[TextObject] {
        &self.texts
    }

    pub fn text(&self, id: usize) -> Option<&TextObject> {
        self.texts.iter().find(|t| t.id == id)
    }

    pub fn selected_text(&self) -> Option<usize> {
        self.selected_text
    }

    pub fn stickers(&self) -> &[Sticker] {
        &self.stickers
    }

    pub fn sticker(&self, id: &str) -> Option<&Sticker> {
        self.stickers.iter().find(|s| s.id == id)
    }

    pub fn selected_sticker(&self) -> Option<&str> {
        self.selected_sticker.as_deref()
    }

    pub fn brush(&self) -> &BrushSettings {
        &self.brush
    }

    // --- base image / transform ---

    pub fn set_base_image(&mut self, reference: &str, width: u32, height: u32) {
        self.base_image_ref = Some(reference.to_owned());
        self.transform.target_width = width;
        self.transform.target_height = height;
        self.transform.crop_region = None;
    }

    pub fn set_rotation(&mut self, degrees: f32) {
        self.transform.rotation_degrees = Transform::normalize_degrees(degrees);
    }

    pub fn rotate_clockwise(&mut self) {
        self.set_rotation(self.transform.rotation_degrees + 90.0);
    }

    pub fn rotate_counterclockwise(&mut self) {
        self.set_rotation(self.transform.rotation_degrees - 90.0);
    }

    pub fn toggle_flip_horizontal(&mut self) {
        self.transform.flipped_horizontal = !self.transform.flipped_horizontal;
    }

    pub fn toggle_flip_vertical(&mut self) {
        self.transform.flipped_vertical = !self.transform.flipped_vertical;
    }

    pub fn set_crop_region(&mut self, region: Option<CropRegion>) {
        self.transform.crop_region = region;
    }

    pub fn set_locked_aspect(&mut self, aspect: Option<(u32, u32)>) {
        self.transform.locked_aspect = match aspect {
            Some((w, h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        };
    }

    /// Replaces the display dimensions after a committed crop and resets the
    /// orientation the crop baked into the new baseline.
    pub fn apply_crop_commit(&mut self, width: u32, height: u32) {
        self.transform.target_width = width;
        self.transform.target_height = height;
        self.transform.crop_region = None;
        self.transform.rotation_degrees = 0.0;
        self.transform.flipped_horizontal = false;
        self.transform.flipped_vertical = false;
    }

    // --- tonal ---

    pub fn set_brightness(&mut self, v: f32) {
        self.tonal.brightness = clamp_signed(v);
    }

    pub fn set_contrast(&mut self, v: f32) {
        self.tonal.contrast = clamp_signed(v);
    }

    pub fn set_saturation(&mut self, v: f32) {
        self.tonal.saturation = clamp_signed(v);
    }

    pub fn set_gamma(&mut self, v: f32) {
        self.tonal.gamma = clamp_signed(v);
    }

    pub fn set_sharpen_blur(&mut self, v: f32) {
        self.tonal.sharpen_blur = clamp_signed(v);
    }

    // --- filter / effect / overlay ---

    /// Unknown ids are ignored.
    pub fn select_filter(&mut self, id: &str) {
        if let Some(kind) = FilterKind::from_id(id) {
            self.filter.kind = kind;
        }
    }

    pub fn set_filter_intensity(&mut self, v: f32) {
        self.filter.intensity = clamp_percent(v);
    }

    /// `"none"` deactivates; unknown ids are ignored.
    pub fn select_effect(&mut self, id: &str) {
        if id == "none" {
            self.effect.active = None;
        } else if let Some(kind) = EffectKind::from_id(id) {
            self.effect.active = Some(kind);
        }
    }

    pub fn set_effect_intensity(&mut self, kind: EffectKind, v: f32) {
        self.effect.set_intensity(kind, v);
    }

    pub fn select_overlay(&mut self, reference: Option<&str>) {
        self.overlay.selected = reference.map(str::to_owned);
    }

    pub fn set_overlay_opacity(&mut self, v: f32) {
        self.overlay.opacity = clamp_percent(v);
    }

    /// Unknown ids are ignored.
    pub fn set_overlay_blend(&mut self, id: &str) {
        if let Some(mode) = BlendMode::from_id(id) {
            self.overlay.blend = mode;
        }
    }

    /// Restores tonal, filter, effect and overlay state to defaults without
    /// touching text objects or stickers.
    pub fn reset_edits(&mut self) {
        self.tonal = TonalAdjustments::default();
        self.filter = FilterSettings::default();
        self.effect = EffectSettings::default();
        self.overlay = OverlaySettings::default();
    }

    /// Like [`Self::reset_edits`] but keeps the overlay texture. Used when
    /// a crop bakes the current appearance into a new baseline.
    pub fn reset_adjustments(&mut self) {
        self.tonal = TonalAdjustments::default();
        self.filter = FilterSettings::default();
        self.effect = EffectSettings::default();
    }

    // --- brush ---

    pub fn set_brush_size(&mut self, v: f32) {
        self.brush.size = v.clamp(1.0, 100.0);
    }

    pub fn set_brush_hardness(&mut self, v: f32) {
        self.brush.hardness = clamp_percent(v);
    }

    pub fn set_brush_color(&mut self, hex: &str) {
        if let Some(color) = parse_hex_color(hex) {
            self.brush.color = color;
        }
    }

    pub fn set_brush_opacity(&mut self, v: f32) {
        self.brush.opacity = clamp_percent(v);
    }

    // --- text objects ---

    /// Adds a new text object near the image center and selects it.
    /// Returns the allocated id.
    pub fn add_text(&mut self) -> usize {
        let id = self.texts.iter().map(|t| t.id + 1).max().unwrap_or(0);
        let position = pos2(
            self.transform.target_width as f32 / 2.0 - 50.0,
            self.transform.target_height as f32 / 2.0 - 15.0,
        );
        self.texts.push(TextObject::new(id, position));
        self.selected_text = Some(id);
        id
    }

    /// Removes a text object. If it was selected, selection falls back to
    /// the first remaining text, or to none.
    pub fn delete_text(&mut self, id: usize) {
        self.texts.retain(|t| t.id != id);
        if self.selected_text == Some(id) {
            self.selected_text = self.texts.first().map(|t| t.id);
        }
    }

    /// Clones a text object with a fixed positional offset and a fresh id;
    /// the clone becomes selected. Returns the new id.
    pub fn duplicate_text(&mut self, id: usize) -> Option<usize> {
        let source = self.text(id)?.clone();
        let new_id = self.texts.iter().map(|t| t.id + 1).max().unwrap_or(0);
        let mut clone = source;
        clone.id = new_id;
        clone.position += egui::vec2(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
        self.texts.push(clone);
        self.selected_text = Some(new_id);
        Some(new_id)
    }

    /// Selecting an id that does not exist is ignored.
    pub fn select_text(&mut self, id: Option<usize>) {
        match id {
            Some(id) if self.text(id).is_some() => self.selected_text = Some(id),
            None => self.selected_text = None,
            _ => {}
        }
    }

    fn text_mut(&mut self, id: usize) -> Option<&mut TextObject> {
        self.texts.iter_mut().find(|t| t.id == id)
    }

    pub fn set_text_content(&mut self, id: usize, content: &str) {
        if let Some(t) = self.text_mut(id) {
            t.content = content.to_owned();
        }
    }

    pub fn set_text_position(&mut self, id: usize, position: Pos2) {
        if let Some(t) = self.text_mut(id) {
            t.position = position;
        }
    }

    pub fn set_text_rotation(&mut self, id: usize, degrees: f32) {
        if let Some(t) = self.text_mut(id) {
            t.rotation = Transform::normalize_degrees(degrees);
        }
    }

    /// Midpoint handles resize width only; the box reflows vertically.
    pub fn set_text_width(&mut self, id: usize, width: f32) {
        if let Some(t) = self.text_mut(id) {
            t.width = width.max(1.0);
        }
    }

    pub fn set_text_font_family(&mut self, id: usize, family: &str) {
        if let Some(t) = self.text_mut(id) {
            t.font_family = family.to_owned();
        }
    }

    pub fn set_text_font_size(&mut self, id: usize, size: f32) {
        if let Some(t) = self.text_mut(id) {
            t.font_size = size.clamp(1.0, 400.0);
        }
    }

    pub fn set_text_fill(&mut self, id: usize, hex: &str) {
        if let Some(color) = parse_hex_color(hex) {
            if let Some(t) = self.text_mut(id) {
                t.fill = color;
            }
        }
    }

    pub fn set_text_fill_opacity(&mut self, id: usize, v: f32) {
        if let Some(t) = self.text_mut(id) {
            t.fill_opacity = clamp_percent(v);
        }
    }

    /// `"transparent"` clears the background; otherwise a hex color is
    /// expected, anything else is ignored.
    pub fn set_text_background(&mut self, id: usize, value: &str) {
        if value == "transparent" {
            if let Some(t) = self.text_mut(id) {
                t.background = None;
            }
        } else if let Some(color) = parse_hex_color(value) {
            if let Some(t) = self.text_mut(id) {
                t.background = Some(color);
            }
        }
    }

    pub fn set_text_background_opacity(&mut self, id: usize, v: f32) {
        if let Some(t) = self.text_mut(id) {
            t.background_opacity = clamp_percent(v);
        }
    }

    pub fn set_text_line_spacing(&mut self, id: usize, spacing: f32) {
        if let Some(t) = self.text_mut(id) {
            t.line_spacing = spacing.max(1.0);
        }
    }

    /// Unknown ids are ignored.
    pub fn set_text_align(&mut self, id: usize, align_id: &str) {
        if let Some(align) = TextAlign::from_id(align_id) {
            if let Some(t) = self.text_mut(id) {
                t.align = align;
            }
        }
    }

    // --- stickers ---

    /// Places a new sticker centered on the image and selects it.
    /// Returns the allocated id.
    pub fn add_sticker(&mut self, image_ref: &str) -> String {
        let position = pos2(
            self.transform.target_width as f32 / 2.0,
            self.transform.target_height as f32 / 2.0,
        );
        let sticker = Sticker::new(image_ref, position);
        let id = sticker.id.clone();
        self.stickers.push(sticker);
        self.selected_sticker = Some(id.clone());
        id
    }

    pub fn delete_sticker(&mut self, id: &str) {
        self.stickers.retain(|s| s.id != id);
        if self.selected_sticker.as_deref() == Some(id) {
            self.selected_sticker = None;
        }
    }

    /// Selecting an id that does not exist is ignored.
    pub fn select_sticker(&mut self, id: Option<&str>) {
        match id {
            Some(id) if self.sticker(id).is_some() => self.selected_sticker = Some(id.to_owned()),
            None => self.selected_sticker = None,
            _ => {}
        }
    }

    fn sticker_mut(&mut self, id: &str) -> Option<&mut Sticker> {
        self.stickers.iter_mut().find(|s| s.id == id)
    }

    pub fn set_sticker_position(&mut self, id: &str, position: Pos2) {
        if let Some(s) = self.sticker_mut(id) {
            s.position = position;
        }
    }

    pub fn set_sticker_rotation(&mut self, id: &str, degrees: f32) {
        if let Some(s) = self.sticker_mut(id) {
            s.rotation = Transform::normalize_degrees(degrees);
        }
    }

    pub fn set_sticker_scale(&mut self, id: &str, scale: f32) {
        if let Some(s) = self.sticker_mut(id) {
            s.scale = scale.clamp(0.05, 20.0);
        }
    }

    // --- history snapshots ---

    pub fn snapshot(&self) -> CompositionSnapshot {
        CompositionSnapshot {
            transform: self.transform,
            tonal: self.tonal,
            filter: self.filter,
            overlay: self.overlay.clone(),
            effect: self.effect,
            texts: self.texts.clone(),
            selected_text: self.selected_text,
            brush: self.brush,
            stickers: self.stickers.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: &CompositionSnapshot) {
        self.transform = snapshot.transform;
        self.tonal = snapshot.tonal;
        self.filter = snapshot.filter;
        self.overlay = snapshot.overlay.clone();
        self.effect = snapshot.effect;
        self.texts = snapshot.texts.clone();
        self.selected_text = snapshot.selected_text;
        self.brush = snapshot.brush;
        self.stickers = snapshot.stickers.clone();
        // The selected sticker may have been restored away
        if let Some(id) = self.selected_sticker.clone() {
            if self.sticker(&id).is_none() {
                self.selected_sticker = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tonal_setters_clamp() {
        let mut model = CompositionModel::new();
        model.set_brightness(150.0);
        assert_eq!(model.tonal().brightness, 100.0);
        model.set_brightness(-150.0);
        assert_eq!(model.tonal().brightness, -100.0);
        model.set_gamma(42.0);
        assert_eq!(model.tonal().gamma, 42.0);
    }

    #[test]
    fn unknown_enumerated_ids_are_ignored() {
        let mut model = CompositionModel::new();
        model.select_filter("sepia");
        model.select_filter("does-not-exist");
        assert_eq!(model.filter().kind, FilterKind::Sepia);

        model.select_effect("noise");
        model.select_effect("vortex");
        assert_eq!(model.effect().active, Some(EffectKind::Noise));
        model.select_effect("none");
        assert_eq!(model.effect().active, None);

        model.set_overlay_blend("screen");
        model.set_overlay_blend("bogus");
        assert_eq!(model.overlay().blend, BlendMode::Screen);
    }

    #[test]
    fn text_ids_and_selection_follow_the_lifecycle() {
        let mut model = CompositionModel::new();
        assert_eq!(model.add_text(), 0);
        assert_eq!(model.selected_text(), Some(0));
        assert_eq!(model.add_text(), 1);
        assert_eq!(model.selected_text(), Some(1));

        model.delete_text(1);
        assert_eq!(model.selected_text(), Some(0));
        model.delete_text(0);
        assert_eq!(model.selected_text(), None);
    }

    #[test]
    fn duplicate_offsets_and_selects_the_clone() {
        let mut model = CompositionModel::new();
        let id = model.add_text();
        model.set_text_position(id, pos2(10.0, 10.0));
        let clone = model.duplicate_text(id).unwrap();
        assert_ne!(clone, id);
        assert_eq!(model.selected_text(), Some(clone));
        assert_eq!(model.text(clone).unwrap().position, pos2(30.0, 30.0));
    }

    #[test]
    fn line_spacing_clamps_to_at_least_one() {
        let mut model = CompositionModel::new();
        let id = model.add_text();
        model.set_text_line_spacing(id, 0.2);
        assert_eq!(model.text(id).unwrap().line_spacing, 1.0);
    }

    #[test]
    fn rotation_normalizes() {
        let mut model = CompositionModel::new();
        model.set_rotation(270.0);
        model.rotate_clockwise();
        assert_eq!(model.transform().rotation_degrees, 0.0);
        model.rotate_counterclockwise();
        assert_eq!(model.transform().rotation_degrees, 270.0);
    }

    #[test]
    fn transparent_background_is_distinct_from_colors() {
        let mut model = CompositionModel::new();
        let id = model.add_text();
        model.set_text_background(id, "transparent");
        assert_eq!(model.text(id).unwrap().background, None);
        model.set_text_background(id, "#ff0000");
        assert_eq!(
            model.text(id).unwrap().background,
            Some(Color32::from_rgb(255, 0, 0))
        );
    }

    #[test]
    fn snapshot_round_trip_is_identical() {
        let mut model = CompositionModel::new();
        model.set_base_image("url", 400, 300);
        model.add_text();
        model.add_sticker("stickers/star.png");
        model.set_brightness(25.0);
        model.select_filter("vibrant");

        let snapshot = model.snapshot();
        let mut other = CompositionModel::new();
        other.restore(&snapshot);
        assert_eq!(other.snapshot(), snapshot);
    }
}
