//! CPU compositing of the surface into a single raster, used for export
//! and for presenting the canvas through the app shell.

use std::collections::BTreeMap;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};
use egui::{Color32, Pos2, Vec2, vec2};
use image::{Rgba, RgbaImage};

use crate::composition::{BlendMode, TextAlign, TextObject};

use super::object::StrokeNode;

/// Registered font faces for text rasterization, keyed by family name.
/// Lookup falls back to the first registered face so text still renders
/// when a family is unavailable.
#[derive(Default)]
pub struct FontStore {
    fonts: BTreeMap<String, FontArc>,
}

impl std::fmt::Debug for FontStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontStore")
            .field("families", &self.fonts.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FontStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a font face. Returns false (and logs) when the bytes are
    /// not a parseable font.
    pub fn register(&mut self, family: &str, bytes: Vec<u8>) -> bool {
        match FontArc::try_from_vec(bytes) {
            Ok(font) => {
                self.fonts.insert(family.to_owned(), font);
                true
            }
            Err(e) => {
                log::warn!("ignoring unparseable font '{}': {}", family, e);
                false
            }
        }
    }

    pub fn get(&self, family: &str) -> Option<&FontArc> {
        self.fonts
            .get(family)
            .or_else(|| self.fonts.values().next())
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

fn color_parts(c: Color32) -> [f32; 3] {
    [
        c.r() as f32 / 255.0,
        c.g() as f32 / 255.0,
        c.b() as f32 / 255.0,
    ]
}

/// Straight-alpha "source over" compositing into one pixel.
fn alpha_over(dst: &mut Rgba<u8>, src_rgb: [f32; 3], src_a: f32) {
    let src_a = src_a.clamp(0.0, 1.0);
    if src_a <= 0.0 {
        return;
    }
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    for i in 0..3 {
        let d = dst[i] as f32 / 255.0;
        let c = (src_rgb[i] * src_a + d * dst_a * (1.0 - src_a)) / out_a;
        dst[i] = (c * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Separable blend-mode channel function, backdrop `b` and source `s`
/// both in [0, 1].
fn blend_channel(mode: BlendMode, b: f32, s: f32) -> f32 {
    match mode {
        BlendMode::Normal => s,
        BlendMode::Multiply => b * s,
        BlendMode::Screen => b + s - b * s,
        BlendMode::Overlay => blend_channel(BlendMode::HardLight, s, b),
        BlendMode::Darken => b.min(s),
        BlendMode::Lighten => b.max(s),
        BlendMode::ColorDodge => {
            if s >= 1.0 {
                1.0
            } else {
                (b / (1.0 - s)).min(1.0)
            }
        }
        BlendMode::ColorBurn => {
            if s <= 0.0 {
                0.0
            } else {
                1.0 - ((1.0 - b) / s).min(1.0)
            }
        }
        BlendMode::HardLight => {
            if s <= 0.5 {
                2.0 * b * s
            } else {
                1.0 - 2.0 * (1.0 - b) * (1.0 - s)
            }
        }
        BlendMode::SoftLight => {
            if s <= 0.5 {
                b - (1.0 - 2.0 * s) * b * (1.0 - b)
            } else {
                let d = if b <= 0.25 {
                    ((16.0 * b - 12.0) * b + 4.0) * b
                } else {
                    b.sqrt()
                };
                b + (2.0 * s - 1.0) * (d - b)
            }
        }
    }
}

/// Draws `src` into `dst`, scaled to `dest_size`, rotated about `center`,
/// optionally flipped, with a global opacity and an optional blend mode.
/// Nearest sampling via inverse mapping.
pub(crate) fn draw_transformed(
    dst: &mut RgbaImage,
    src: &RgbaImage,
    center: Pos2,
    dest_size: Vec2,
    rotation_degrees: f32,
    flip_h: bool,
    flip_v: bool,
    opacity: f32,
    blend: Option<BlendMode>,
) {
    let (sw, sh) = src.dimensions();
    if sw == 0 || sh == 0 || dest_size.x <= 0.0 || dest_size.y <= 0.0 {
        return;
    }
    let (dw, dh) = dst.dimensions();
    let theta = rotation_degrees.to_radians();
    let (sin, cos) = theta.sin_cos();
    let (hw, hh) = (dest_size.x / 2.0, dest_size.y / 2.0);

    // Axis-aligned bounds of the rotated rect
    let ax = hw * cos.abs() + hh * sin.abs();
    let ay = hw * sin.abs() + hh * cos.abs();
    let x0 = ((center.x - ax).floor().max(0.0)) as u32;
    let y0 = ((center.y - ay).floor().max(0.0)) as u32;
    let x1 = ((center.x + ax).ceil().min(dw as f32 - 1.0)).max(0.0) as u32;
    let y1 = ((center.y + ay).ceil().min(dh as f32 - 1.0)).max(0.0) as u32;

    for y in y0..=y1.min(dh.saturating_sub(1)) {
        for x in x0..=x1.min(dw.saturating_sub(1)) {
            let rel_x = x as f32 + 0.5 - center.x;
            let rel_y = y as f32 + 0.5 - center.y;
            // Rotate back into the object's local frame
            let local_x = rel_x * cos + rel_y * sin;
            let local_y = -rel_x * sin + rel_y * cos;
            if local_x.abs() > hw || local_y.abs() > hh {
                continue;
            }
            let mut u = local_x / dest_size.x + 0.5;
            let mut v = local_y / dest_size.y + 0.5;
            if flip_h {
                u = 1.0 - u;
            }
            if flip_v {
                v = 1.0 - v;
            }
            let sx = ((u * sw as f32) as u32).min(sw - 1);
            let sy = ((v * sh as f32) as u32).min(sh - 1);
            let sp = src.get_pixel(sx, sy);
            let src_a = sp[3] as f32 / 255.0 * opacity;
            if src_a <= 0.0 {
                continue;
            }
            let src_rgb = [
                sp[0] as f32 / 255.0,
                sp[1] as f32 / 255.0,
                sp[2] as f32 / 255.0,
            ];
            let px = dst.get_pixel_mut(x, y);
            match blend {
                None | Some(BlendMode::Normal) => alpha_over(px, src_rgb, src_a),
                Some(mode) => {
                    let backdrop = [
                        px[0] as f32 / 255.0,
                        px[1] as f32 / 255.0,
                        px[2] as f32 / 255.0,
                    ];
                    let mixed = [
                        blend_channel(mode, backdrop[0], src_rgb[0]),
                        blend_channel(mode, backdrop[1], src_rgb[1]),
                        blend_channel(mode, backdrop[2], src_rgb[2]),
                    ];
                    alpha_over(px, mixed, src_a);
                }
            }
        }
    }
}

/// Stamps a stroke as overlapping discs along its polyline. Hardness keeps
/// full coverage out to `hardness%` of the radius, then falls off linearly.
pub(crate) fn stamp_stroke(dst: &mut RgbaImage, stroke: &StrokeNode) {
    if stroke.points.is_empty() {
        return;
    }
    let radius = (stroke.brush.size / 2.0).max(0.5);
    let alpha = stroke.brush.opacity / 100.0;
    let hard = (stroke.brush.hardness / 100.0).clamp(0.0, 1.0);
    let rgb = color_parts(stroke.brush.color);
    let (w, h) = dst.dimensions();

    let mut stamp = |c: Pos2| {
        let x0 = (c.x - radius).floor().max(0.0) as u32;
        let y0 = (c.y - radius).floor().max(0.0) as u32;
        let x1 = ((c.x + radius).ceil() as u32).min(w.saturating_sub(1));
        let y1 = ((c.y + radius).ceil() as u32).min(h.saturating_sub(1));
        for y in y0..=y1 {
            for x in x0..=x1 {
                let d = vec2(x as f32 + 0.5 - c.x, y as f32 + 0.5 - c.y).length();
                if d > radius {
                    continue;
                }
                let solid = radius * hard;
                let falloff = if d <= solid {
                    1.0
                } else {
                    1.0 - (d - solid) / (radius - solid).max(f32::EPSILON)
                };
                alpha_over(dst.get_pixel_mut(x, y), rgb, alpha * falloff);
            }
        }
    };

    let spacing = (radius * 0.5).max(1.0);
    stamp(stroke.points[0]);
    for pair in stroke.points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let dist = (b - a).length();
        let steps = (dist / spacing).ceil() as u32;
        for step in 1..=steps.max(1) {
            let t = step as f32 / steps.max(1) as f32;
            stamp(a + (b - a) * t);
        }
    }
}

/// Wraps the text content to the box width with a greedy word-wrap,
/// hard-breaking words that do not fit on their own.
fn wrap_lines<F: Font>(sf: &impl ScaleFont<F>, text: &TextObject) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.content.split('\n') {
        let mut current = String::new();
        for word in paragraph.split(' ') {
            let candidate = if current.is_empty() {
                word.to_owned()
            } else {
                format!("{} {}", current, word)
            };
            if measure_line(sf, &candidate) <= text.width || current.is_empty() {
                current = candidate;
                // A single word may still overflow; hard-break it
                while measure_line(sf, &current) > text.width && current.chars().count() > 1 {
                    let mut head = current.clone();
                    while measure_line(sf, &head) > text.width && head.chars().count() > 1 {
                        head.pop();
                    }
                    lines.push(head.clone());
                    current = current[head.len()..].to_owned();
                }
            } else {
                lines.push(std::mem::take(&mut current));
                current = word.to_owned();
            }
        }
        lines.push(current);
    }
    lines
}

fn measure_line<F: Font>(sf: &impl ScaleFont<F>, line: &str) -> f32 {
    let mut width = 0.0;
    let mut prev = None;
    for ch in line.chars() {
        let id = sf.font().glyph_id(ch);
        if let Some(p) = prev {
            width += sf.kern(p, id);
        }
        width += sf.h_advance(id);
        prev = Some(id);
    }
    width
}

/// Fallback box size when no font is registered; explicit newlines only,
/// since wrapping needs a face to measure against.
pub(crate) fn estimate_text_size(text: &TextObject) -> Vec2 {
    let line_count = text.content.split('\n').count().max(1);
    vec2(
        text.width,
        text.font_size * text.line_spacing * line_count as f32,
    )
}

/// Box size of a text object as it renders: word-wrapped line count when a
/// face is available, so hit testing and snap centers agree with
/// `render_text_block`.
pub(crate) fn measure_text_size(text: &TextObject, fonts: &FontStore) -> Vec2 {
    match fonts.get(&text.font_family) {
        Some(font) => {
            let lines = wrap_lines(&font.as_scaled(PxScale::from(text.font_size)), text);
            vec2(
                text.width,
                text.font_size * text.line_spacing * lines.len().max(1) as f32,
            )
        }
        None => estimate_text_size(text),
    }
}

/// Rasterizes one text object into its own tight buffer: background box
/// first, then glyph runs per line with the configured alignment.
fn render_text_block(text: &TextObject, font: Option<&FontArc>) -> RgbaImage {
    let scale = PxScale::from(text.font_size);
    let lines: Vec<String> = match font {
        Some(f) => wrap_lines(&f.as_scaled(scale), text),
        None => text.content.split('\n').map(str::to_owned).collect(),
    };
    let line_height = text.font_size * text.line_spacing;
    let width = text.width.ceil().max(1.0) as u32;
    let height = (line_height * lines.len().max(1) as f32).ceil().max(1.0) as u32;
    let mut block = RgbaImage::new(width, height);

    if let Some(bg) = text.background {
        let rgb = color_parts(bg);
        let a = text.background_opacity / 100.0;
        for px in block.pixels_mut() {
            alpha_over(px, rgb, a);
        }
    }

    let Some(font) = font else {
        return block;
    };
    let sf = font.as_scaled(scale);
    let fill = color_parts(text.fill);
    let fill_a = text.fill_opacity / 100.0;

    for (index, line) in lines.iter().enumerate() {
        let line_width = measure_line(&sf, line);
        let mut caret_x = match text.align {
            TextAlign::Left => 0.0,
            TextAlign::Center => (text.width - line_width) / 2.0,
            TextAlign::Right => text.width - line_width,
        };
        let baseline = index as f32 * line_height + sf.ascent();
        let mut prev = None;
        for ch in line.chars() {
            let id = font.glyph_id(ch);
            if let Some(p) = prev {
                caret_x += sf.kern(p, id);
            }
            let glyph = id.with_scale_and_position(scale, point(caret_x, baseline));
            caret_x += sf.h_advance(id);
            prev = Some(id);
            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    let x = bounds.min.x as i32 + gx as i32;
                    let y = bounds.min.y as i32 + gy as i32;
                    if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                        alpha_over(
                            block.get_pixel_mut(x as u32, y as u32),
                            fill,
                            fill_a * coverage,
                        );
                    }
                });
            }
        }
    }
    block
}

/// Draws a text object onto the canvas, rotated about its box center.
pub(crate) fn draw_text_object(dst: &mut RgbaImage, text: &TextObject, fonts: &FontStore) {
    let block = render_text_block(text, fonts.get(&text.font_family));
    let size = vec2(block.width() as f32, block.height() as f32);
    let center = text.position + size / 2.0;
    draw_transformed(dst, &block, center, size, text.rotation, false, false, 1.0, None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::BrushSettings;
    use egui::pos2;

    #[test]
    fn alpha_over_opaque_source_replaces() {
        let mut px = Rgba([10, 20, 30, 255]);
        alpha_over(&mut px, [1.0, 0.0, 0.0], 1.0);
        assert_eq!(px, Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn multiply_darkens_and_screen_lightens() {
        assert!(blend_channel(BlendMode::Multiply, 0.5, 0.5) < 0.5);
        assert!(blend_channel(BlendMode::Screen, 0.5, 0.5) > 0.5);
        assert_eq!(blend_channel(BlendMode::Normal, 0.2, 0.9), 0.9);
    }

    #[test]
    fn stroke_stamps_pixels_with_brush_color() {
        let mut canvas = RgbaImage::new(40, 40);
        let stroke = StrokeNode {
            points: vec![pos2(10.0, 20.0), pos2(30.0, 20.0)],
            brush: BrushSettings {
                opacity: 100.0,
                ..BrushSettings::default()
            },
        };
        stamp_stroke(&mut canvas, &stroke);
        assert!(canvas.get_pixel(20, 20)[3] > 0);
        assert_eq!(canvas.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn text_block_without_fonts_still_paints_background() {
        let text = crate::composition::TextObject::new(0, pos2(0.0, 0.0));
        let mut canvas = RgbaImage::new(200, 200);
        draw_text_object(&mut canvas, &text, &FontStore::new());
        // Background box center is inside the default 70-wide box
        assert!(canvas.get_pixel(30, 10)[3] > 0);
    }
}
