//! The render surface adapter: one live, interactive canvas kept visually
//! consistent with the composition model.
//!
//! The surface owns pixel state (the effect-free baseline and the derived
//! pipeline output) and the interactive objects layered above it. It can
//! serialize the whole thing to an opaque snapshot and restore from one;
//! restoring never raises change notifications, so history replay cannot
//! feed back into checkpointing.

pub mod flatten;
pub mod object;
pub mod snapshot;

pub use flatten::FontStore;
pub use object::{GuideLines, OverlayNode, PickedObject, StickerNode, StrokeNode};
pub use snapshot::SurfaceSnapshot;

use egui::{Pos2, Rect, Vec2, pos2, vec2};
use image::{Rgba, RgbaImage};
use thiserror::Error;

use crate::composition::{BrushSettings, Sticker, TextObject, Transform};

/// Logical canvas size in presentation units.
pub const CANVAS_WIDTH: u32 = 650;
pub const CANVAS_HEIGHT: u32 = 650;

/// Pixel distance at which a dragged object snaps to a canvas centerline.
pub const SNAP_THRESHOLD: f32 = 10.0;

/// Canvas background behind transparent regions.
pub const BACKGROUND_COLOR: Rgba<u8> = Rgba([0xe0, 0xe0, 0xe0, 0xff]);

#[derive(Error, Debug)]
pub enum SurfaceError {
    /// The host drawing context has no area; fatal to the session
    #[error("drawing context has zero area")]
    ZeroArea,
    #[error("no base image loaded")]
    NoBaseImage,
    #[error("snapshot serialization failed: {0}")]
    Snapshot(String),
}

/// The base image layer: effect-free baseline pixels, the derived pipeline
/// output, and the non-destructive orientation placement.
#[derive(Clone)]
struct BaseLayer {
    baseline: RgbaImage,
    derived: RgbaImage,
    rotation_degrees: f32,
    flipped_horizontal: bool,
    flipped_vertical: bool,
}

/// The interactive drawing surface for one editing session.
pub struct Surface {
    width: u32,
    height: u32,
    base: Option<BaseLayer>,
    overlay: Option<OverlayNode>,
    strokes: Vec<StrokeNode>,
    stickers: Vec<StickerNode>,
    texts: Vec<TextObject>,
    guides: GuideLines,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("size", &format!("{}x{}", self.width, self.height))
            .field("has_base", &self.base.is_some())
            .field("texts", &self.texts.len())
            .field("stickers", &self.stickers.len())
            .field("strokes", &self.strokes.len())
            .finish()
    }
}

impl Surface {
    /// Creates an empty surface. A zero-area context cannot be drawn to and
    /// is reported as a fatal initialization failure.
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::ZeroArea);
        }
        log::info!("🎨 surface initialized at {}x{}", width, height);
        Ok(Self {
            width,
            height,
            base: None,
            overlay: None,
            strokes: Vec::new(),
            stickers: Vec::new(),
            texts: Vec::new(),
            guides: GuideLines::default(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn has_base(&self) -> bool {
        self.base.is_some()
    }

    pub fn baseline(&self) -> Option<&RgbaImage> {
        self.base.as_ref().map(|b| &b.baseline)
    }

    pub fn derived(&self) -> Option<&RgbaImage> {
        self.base.as_ref().map(|b| &b.derived)
    }

    pub fn guides(&self) -> GuideLines {
        self.guides
    }

    // --- base image ---

    /// Installs the decoded source raster, scaled to fit the canvas while
    /// preserving aspect ratio; neither axis ever exceeds the canvas.
    /// Returns the display dimensions.
    pub fn set_base_image(&mut self, source: RgbaImage) -> (u32, u32) {
        let (sw, sh) = source.dimensions();
        let scale = (self.width as f32 / sw as f32).min(self.height as f32 / sh as f32);
        let display_w = ((sw as f32 * scale).round() as u32).max(1);
        let display_h = ((sh as f32 * scale).round() as u32).max(1);
        let baseline = if (display_w, display_h) == (sw, sh) {
            source
        } else {
            image::imageops::resize(
                &source,
                display_w,
                display_h,
                image::imageops::FilterType::Triangle,
            )
        };
        log::info!(
            "🖼️ base image installed: {}x{} displayed at {}x{}",
            sw,
            sh,
            display_w,
            display_h
        );
        self.base = Some(BaseLayer {
            derived: baseline.clone(),
            baseline,
            rotation_degrees: 0.0,
            flipped_horizontal: false,
            flipped_vertical: false,
        });
        (display_w, display_h)
    }

    /// Replaces the derived raster with a fresh pipeline output.
    pub fn set_derived(&mut self, derived: RgbaImage) {
        if let Some(base) = &mut self.base {
            base.derived = derived;
        }
    }

    /// Applies rotation/flip placement without resampling any pixels.
    pub fn apply_transform(&mut self, transform: &Transform) {
        if let Some(base) = &mut self.base {
            base.rotation_degrees = transform.rotation_degrees;
            base.flipped_horizontal = transform.flipped_horizontal;
            base.flipped_vertical = transform.flipped_vertical;
        }
    }

    /// Destructively rasterizes the visible base layer and crops it to
    /// `region` (canvas coordinates). The result becomes the new baseline;
    /// the orientation it baked in resets to identity. Returns the new
    /// baseline dimensions.
    pub fn commit_crop(
        &mut self,
        region: &crate::composition::CropRegion,
    ) -> Result<(u32, u32), SurfaceError> {
        let base = self.base.as_ref().ok_or(SurfaceError::NoBaseImage)?;

        let mut canvas = RgbaImage::new(self.width, self.height);
        flatten::draw_transformed(
            &mut canvas,
            &base.derived,
            self.center(),
            vec2(base.derived.width() as f32, base.derived.height() as f32),
            base.rotation_degrees,
            base.flipped_horizontal,
            base.flipped_vertical,
            1.0,
            None,
        );

        let x = region.x.min(self.width.saturating_sub(1));
        let y = region.y.min(self.height.saturating_sub(1));
        let w = region.width.clamp(1, self.width - x);
        let h = region.height.clamp(1, self.height - y);
        let cropped = image::imageops::crop_imm(&canvas, x, y, w, h).to_image();

        self.base = Some(BaseLayer {
            derived: cropped.clone(),
            baseline: cropped,
            rotation_degrees: 0.0,
            flipped_horizontal: false,
            flipped_vertical: false,
        });
        log::info!("✂️ crop committed: new baseline {}x{}", w, h);
        Ok((w, h))
    }

    pub fn center(&self) -> Pos2 {
        pos2(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    // --- overlay texture ---

    pub fn set_overlay(&mut self, overlay: Option<OverlayNode>) {
        self.overlay = overlay;
    }

    pub fn overlay(&self) -> Option<&OverlayNode> {
        self.overlay.as_ref()
    }

    /// Cheap parameter update that never touches the pixel pipeline.
    pub fn update_overlay_params(&mut self, opacity: f32, blend: crate::composition::BlendMode) {
        if let Some(overlay) = &mut self.overlay {
            overlay.opacity = opacity;
            overlay.blend = blend;
        }
    }

    // --- interactive objects ---

    /// Reconciles surface texts with the model collection by id: absent
    /// ones are removed, new ones added, mutated ones updated in place.
    /// Unchanged objects are left alone.
    pub fn sync_texts(&mut self, model_texts: &[TextObject]) {
        let mut next = Vec::with_capacity(model_texts.len());
        for wanted in model_texts {
            match self.texts.iter().find(|t| t.id == wanted.id) {
                Some(existing) if existing == wanted => next.push(existing.clone()),
                _ => next.push(wanted.clone()),
            }
        }
        self.texts = next;
    }

    /// Reconciles sticker nodes by id, preserving already-decoded rasters
    /// across parameter updates.
    pub fn sync_stickers(&mut self, model_stickers: &[Sticker]) {
        let mut next = Vec::with_capacity(model_stickers.len());
        for wanted in model_stickers {
            let raster = self
                .stickers
                .iter()
                .find(|n| n.sticker.id == wanted.id)
                .and_then(|n| n.raster.clone());
            next.push(StickerNode {
                sticker: wanted.clone(),
                raster,
            });
        }
        self.stickers = next;
    }

    /// Attaches decoded pixels to a sticker once its asset has loaded.
    pub fn set_sticker_raster(&mut self, sticker_id: &str, raster: RgbaImage) {
        if let Some(node) = self.stickers.iter_mut().find(|n| n.sticker.id == sticker_id) {
            node.raster = Some(raster);
        }
    }

    pub fn texts(&self) -> &[TextObject] {
        &self.texts
    }

    pub fn stickers(&self) -> &[StickerNode] {
        &self.stickers
    }

    pub fn strokes(&self) -> &[StrokeNode] {
        &self.strokes
    }

    /// Commits a freehand stroke with the brush settings in effect.
    pub fn add_stroke(&mut self, points: Vec<Pos2>, brush: BrushSettings) {
        if points.is_empty() {
            return;
        }
        self.strokes.push(StrokeNode { points, brush });
    }

    // --- dragging and snapping ---

    /// Snaps a dragged object's center to the canvas centerlines within
    /// the snap threshold, raising the matching guide lines.
    pub fn snap_center(&mut self, desired: Pos2) -> Pos2 {
        let center = self.center();
        let mut snapped = desired;
        self.guides = GuideLines::default();
        if (desired.x - center.x).abs() <= SNAP_THRESHOLD {
            snapped.x = center.x;
            self.guides.vertical = true;
        }
        if (desired.y - center.y).abs() <= SNAP_THRESHOLD {
            snapped.y = center.y;
            self.guides.horizontal = true;
        }
        snapped
    }

    /// Clears transient guide lines when a drag ends.
    pub fn clear_guides(&mut self) {
        self.guides = GuideLines::default();
    }

    /// Returns the topmost interactive object under `pos`, texts above
    /// stickers. Bounding boxes ignore rotation, like the drag handles.
    /// Text boxes are measured with the registered fonts so the hit area
    /// matches the rendered, word-wrapped block.
    pub fn hit_test(&self, pos: Pos2, fonts: &FontStore) -> Option<PickedObject> {
        for text in self.texts.iter().rev() {
            let size = flatten::measure_text_size(text, fonts);
            if Rect::from_min_size(text.position, size).contains(pos) {
                return Some(PickedObject::Text(text.id));
            }
        }
        for node in self.stickers.iter().rev() {
            let size = vec2(
                node.sticker.base_width * node.sticker.scale,
                node.sticker.base_height * node.sticker.scale,
            );
            if Rect::from_center_size(node.sticker.position, size).contains(pos) {
                return Some(PickedObject::Sticker(node.sticker.id.clone()));
            }
        }
        None
    }

    /// Rendered box size of a text object, used for snap centers.
    pub fn text_box_size(&self, text: &TextObject, fonts: &FontStore) -> Vec2 {
        flatten::measure_text_size(text, fonts)
    }

    // --- snapshots ---

    /// Serializes the entire surface to an opaque blob.
    pub fn capture_snapshot(&self) -> Result<SurfaceSnapshot, SurfaceError> {
        let base = match &self.base {
            Some(b) => Some(snapshot::BaseSnapshot {
                baseline_png: snapshot::encode_png(&b.baseline)?,
                rotation_degrees: b.rotation_degrees,
                flipped_horizontal: b.flipped_horizontal,
                flipped_vertical: b.flipped_vertical,
            }),
            None => None,
        };
        let overlay = match &self.overlay {
            Some(o) => Some(snapshot::OverlaySnapshot {
                image_ref: o.image_ref.clone(),
                opacity: o.opacity,
                blend: o.blend,
                raster_png: o.raster.as_ref().map(snapshot::encode_png).transpose()?,
            }),
            None => None,
        };
        let stickers = self
            .stickers
            .iter()
            .map(|n| {
                Ok(snapshot::StickerSnapshot {
                    sticker: n.sticker.clone(),
                    raster_png: n.raster.as_ref().map(snapshot::encode_png).transpose()?,
                })
            })
            .collect::<Result<Vec<_>, SurfaceError>>()?;
        snapshot::serialize(&snapshot::SnapshotData {
            width: self.width,
            height: self.height,
            base,
            overlay,
            strokes: self.strokes.clone(),
            stickers,
            texts: self.texts.clone(),
        })
    }

    /// Restores the surface from a captured blob. The derived raster is
    /// reset to the baseline; the caller re-runs the pipeline afterwards.
    /// No change notifications are raised.
    pub fn restore_snapshot(&mut self, snapshot: &SurfaceSnapshot) -> Result<(), SurfaceError> {
        let data = snapshot::deserialize(snapshot)?;
        self.width = data.width;
        self.height = data.height;
        self.base = match data.base {
            Some(b) => {
                let baseline = snapshot::decode_png(&b.baseline_png)?;
                Some(BaseLayer {
                    derived: baseline.clone(),
                    baseline,
                    rotation_degrees: b.rotation_degrees,
                    flipped_horizontal: b.flipped_horizontal,
                    flipped_vertical: b.flipped_vertical,
                })
            }
            None => None,
        };
        self.overlay = match data.overlay {
            Some(o) => Some(OverlayNode {
                image_ref: o.image_ref,
                opacity: o.opacity,
                blend: o.blend,
                raster: o.raster_png.as_deref().map(snapshot::decode_png).transpose()?,
            }),
            None => None,
        };
        self.strokes = data.strokes;
        self.stickers = data
            .stickers
            .into_iter()
            .map(|s| {
                Ok(StickerNode {
                    raster: s.raster_png.as_deref().map(snapshot::decode_png).transpose()?,
                    sticker: s.sticker,
                })
            })
            .collect::<Result<Vec<_>, SurfaceError>>()?;
        self.texts = data.texts;
        self.guides = GuideLines::default();
        Ok(())
    }

    // --- compositing ---

    /// Flattens the full surface into a raster: background, derived base
    /// layer with placement, overlay texture, strokes, stickers, texts.
    pub fn flatten(&self, fonts: &FontStore) -> RgbaImage {
        let mut canvas = RgbaImage::from_pixel(self.width, self.height, BACKGROUND_COLOR);

        if let Some(base) = &self.base {
            let size = vec2(base.derived.width() as f32, base.derived.height() as f32);
            flatten::draw_transformed(
                &mut canvas,
                &base.derived,
                self.center(),
                size,
                base.rotation_degrees,
                base.flipped_horizontal,
                base.flipped_vertical,
                1.0,
                None,
            );

            // Overlay is matched to the base image's placement
            if let Some(overlay) = &self.overlay {
                if let Some(raster) = &overlay.raster {
                    flatten::draw_transformed(
                        &mut canvas,
                        raster,
                        self.center(),
                        size,
                        base.rotation_degrees,
                        base.flipped_horizontal,
                        base.flipped_vertical,
                        overlay.opacity / 100.0,
                        Some(overlay.blend),
                    );
                }
            }
        }

        for stroke in &self.strokes {
            flatten::stamp_stroke(&mut canvas, stroke);
        }

        for node in &self.stickers {
            if let Some(raster) = &node.raster {
                let size = vec2(
                    node.sticker.base_width * node.sticker.scale,
                    node.sticker.base_height * node.sticker.scale,
                );
                flatten::draw_transformed(
                    &mut canvas,
                    raster,
                    node.sticker.position,
                    size,
                    node.sticker.rotation,
                    false,
                    false,
                    1.0,
                    None,
                );
            }
        }

        for text in &self.texts {
            flatten::draw_text_object(&mut canvas, text, fonts);
        }

        canvas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn checker(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        })
    }

    #[test]
    fn zero_area_context_is_fatal() {
        assert!(matches!(Surface::new(0, 100), Err(SurfaceError::ZeroArea)));
    }

    #[test]
    fn fit_scale_preserves_aspect_and_fills_one_axis() {
        let mut surface = Surface::new(CANVAS_WIDTH, CANVAS_HEIGHT).unwrap();
        let dims = surface.set_base_image(checker(200, 300));
        assert_eq!(dims, (433, 650));
    }

    #[test]
    fn oversized_sources_scale_down() {
        let mut surface = Surface::new(CANVAS_WIDTH, CANVAS_HEIGHT).unwrap();
        let dims = surface.set_base_image(checker(1300, 650));
        assert_eq!(dims, (650, 325));
    }

    #[test]
    fn snap_pulls_to_centerlines_within_threshold() {
        let mut surface = Surface::new(CANVAS_WIDTH, CANVAS_HEIGHT).unwrap();
        let snapped = surface.snap_center(pos2(320.0, 100.0));
        assert_eq!(snapped, pos2(325.0, 100.0));
        assert!(surface.guides().vertical);
        assert!(!surface.guides().horizontal);

        let free = surface.snap_center(pos2(200.0, 200.0));
        assert_eq!(free, pos2(200.0, 200.0));
        assert!(!surface.guides().any());

        surface.clear_guides();
        assert!(!surface.guides().any());
    }

    #[test]
    fn sticker_sync_preserves_decoded_rasters() {
        let mut surface = Surface::new(100, 100).unwrap();
        let mut sticker = Sticker::new("stickers/star.png", pos2(50.0, 50.0));
        surface.sync_stickers(std::slice::from_ref(&sticker));
        surface.set_sticker_raster(&sticker.id, checker(4, 4));

        sticker.rotation = 45.0;
        surface.sync_stickers(std::slice::from_ref(&sticker));
        assert!(surface.stickers()[0].raster.is_some());
        assert_eq!(surface.stickers()[0].sticker.rotation, 45.0);

        surface.sync_stickers(&[]);
        assert!(surface.stickers().is_empty());
    }

    #[test]
    fn snapshot_round_trip_restores_structure_and_pixels() {
        let mut surface = Surface::new(64, 64).unwrap();
        surface.set_base_image(checker(32, 32));
        surface.sync_texts(&[TextObject::new(0, pos2(5.0, 5.0))]);
        surface.add_stroke(
            vec![pos2(1.0, 1.0), pos2(10.0, 10.0)],
            BrushSettings::default(),
        );

        let blob = surface.capture_snapshot().unwrap();
        let mut restored = Surface::new(64, 64).unwrap();
        restored.restore_snapshot(&blob).unwrap();

        assert_eq!(restored.texts().len(), 1);
        assert_eq!(restored.strokes().len(), 1);
        assert_eq!(restored.baseline().unwrap(), surface.baseline().unwrap());
        // A second capture of the restored surface is equivalent
        assert_eq!(restored.capture_snapshot().unwrap(), blob);
    }

    #[test]
    fn commit_crop_replaces_the_baseline() {
        let mut surface = Surface::new(CANVAS_WIDTH, CANVAS_HEIGHT).unwrap();
        surface.set_base_image(checker(650, 650));
        let dims = surface
            .commit_crop(&crate::composition::CropRegion {
                x: 100,
                y: 100,
                width: 200,
                height: 150,
            })
            .unwrap();
        assert_eq!(dims, (200, 150));
        assert_eq!(surface.baseline().unwrap().dimensions(), (200, 150));
    }

    #[test]
    fn hit_test_prefers_texts_over_stickers() {
        let mut surface = Surface::new(200, 200).unwrap();
        let sticker = Sticker::new("s.png", pos2(50.0, 50.0));
        let sticker_id = sticker.id.clone();
        surface.sync_stickers(&[sticker]);
        surface.sync_texts(&[TextObject::new(3, pos2(30.0, 40.0))]);

        let fonts = FontStore::new();
        assert_eq!(
            surface.hit_test(pos2(50.0, 50.0), &fonts),
            Some(PickedObject::Text(3))
        );
        assert_eq!(
            surface.hit_test(pos2(50.0, 95.0), &fonts),
            Some(PickedObject::Sticker(sticker_id))
        );
        assert_eq!(surface.hit_test(pos2(190.0, 190.0), &fonts), None);
    }

    #[test]
    fn hit_test_covers_wrapped_text_lines() {
        let mut fonts = FontStore::new();
        for (name, data) in &egui::FontDefinitions::default().font_data {
            fonts.register(name, data.font.to_vec());
        }
        assert!(!fonts.is_empty());

        let mut text = TextObject::new(0, pos2(10.0, 10.0));
        text.content = "wrapping across several lines of copy".to_owned();
        text.width = 60.0;
        let single_line = text.font_size * text.line_spacing;

        let mut surface = Surface::new(200, 200).unwrap();
        surface.sync_texts(std::slice::from_ref(&text));
        assert!(surface.text_box_size(&text, &fonts).y > single_line * 1.5);

        // A point below the first line is still inside the box
        let below_first = pos2(20.0, 10.0 + single_line + 4.0);
        assert_eq!(
            surface.hit_test(below_first, &fonts),
            Some(PickedObject::Text(0))
        );
        // With no fonts registered the same point misses
        assert_eq!(surface.hit_test(below_first, &FontStore::new()), None);
    }
}
