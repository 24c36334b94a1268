//! The session controller: wires user intents to composition mutations,
//! surface updates and history checkpoints.
//!
//! One session edits one image version. The session owns every collaborator
//! (model, surface, history, scheduler, event bus); nothing here is process
//! global. All methods run to completion on the host's event loop, and the
//! host drives time explicitly through [`StudioSession::tick`].

pub mod checkpoint;
pub mod export;

pub use checkpoint::{CheckpointClass, CheckpointScheduler};
pub use export::ExportFormat;

use egui::Pos2;
use image::RgbaImage;

use crate::composition::{CompositionModel, EffectKind};
use crate::error::{ExportError, LoadError, SessionError};
use crate::event::{EventBus, SessionEvent};
use crate::history::{HistoryEngine, HistoryEntry};
use crate::persistence::PersistenceService;
use crate::pipeline;
use crate::surface::{
    CANVAS_HEIGHT, CANVAS_WIDTH, FontStore, OverlayNode, PickedObject, Surface,
};

/// Fixed default seed for the effect hash stream; the host may reseed.
const DEFAULT_EFFECT_SEED: u32 = 0x7A56_1B4D;

/// Lifecycle of a base-image load attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Success,
    /// Terminal for the attempt; a new load re-enters `Loading`
    Error,
}

/// Identity of one load request. Completions carrying a stale generation
/// are ignored, so callbacks from an abandoned load can never clobber a
/// newer one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub url: String,
}

/// Keyboard intents the host maps onto the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Undo,
    Redo,
    /// Delete/Backspace: removes the selected text, else the selected sticker
    DeleteSelection,
    /// Ctrl+D: duplicates the selected text object
    Duplicate,
}

/// Synchronous asset fetch for stickers and overlay textures, which are
/// bundled resources rather than network media.
pub trait AssetStore {
    fn fetch(&mut self, reference: &str) -> Result<RgbaImage, LoadError>;
}

/// One interactive editing session over a single image version.
pub struct StudioSession {
    image_id: String,
    version_id: String,
    model: CompositionModel,
    surface: Surface,
    history: HistoryEngine,
    scheduler: CheckpointScheduler,
    events: EventBus,
    assets: Box<dyn AssetStore>,
    fonts: FontStore,
    status: LoadStatus,
    error_message: Option<String>,
    load_generation: u64,
    export_format: ExportFormat,
    effect_seed: u32,
    pending_stroke: Option<Vec<Pos2>>,
    clock: f64,
}

impl std::fmt::Debug for StudioSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudioSession")
            .field("image_id", &self.image_id)
            .field("version_id", &self.version_id)
            .field("status", &self.status)
            .field("history_len", &self.history.len())
            .finish()
    }
}

impl StudioSession {
    pub fn new(
        image_id: &str,
        version_id: &str,
        assets: Box<dyn AssetStore>,
    ) -> Result<Self, SessionError> {
        let surface = Surface::new(CANVAS_WIDTH, CANVAS_HEIGHT)?;
        Ok(Self {
            image_id: image_id.to_owned(),
            version_id: version_id.to_owned(),
            model: CompositionModel::new(),
            surface,
            history: HistoryEngine::new(),
            scheduler: CheckpointScheduler::new(),
            events: EventBus::new(),
            assets,
            fonts: FontStore::new(),
            status: LoadStatus::Idle,
            error_message: None,
            load_generation: 0,
            export_format: ExportFormat::default(),
            effect_seed: DEFAULT_EFFECT_SEED,
            pending_stroke: None,
            clock: 0.0,
        })
    }

    // --- accessors ---

    pub fn image_id(&self) -> &str {
        &self.image_id
    }

    pub fn version_id(&self) -> &str {
        &self.version_id
    }

    pub fn model(&self) -> &CompositionModel {
        &self.model
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn history(&self) -> &HistoryEngine {
        &self.history
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn fonts(&self) -> &FontStore {
        &self.fonts
    }

    /// Registers a font face for text measurement and rasterization.
    pub fn register_font(&mut self, family: &str, bytes: Vec<u8>) -> bool {
        self.fonts.register(family, bytes)
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn export_format(&self) -> ExportFormat {
        self.export_format
    }

    pub fn set_effect_seed(&mut self, seed: u32) {
        self.effect_seed = seed;
    }

    /// True while a debounced checkpoint is waiting for its deadline; hosts
    /// use this to keep ticking instead of going idle.
    pub fn has_pending_checkpoint(&self) -> bool {
        self.scheduler.is_pending()
    }

    // --- host loop ---

    /// Advances the session clock and fires a due checkpoint, if any.
    pub fn tick(&mut self, now: f64) {
        self.clock = now;
        if self.scheduler.take_due(now) {
            self.take_checkpoint();
        }
    }

    // --- base image loading ---

    /// Resolves the editable URL for this session's image version and
    /// starts a load.
    pub fn bootstrap(&mut self, service: &dyn PersistenceService) -> Result<LoadTicket, SessionError> {
        let url = service.get_editable_image_url(&self.image_id, &self.version_id)?;
        Ok(self.begin_load(&url))
    }

    /// Enters `Loading` and hands out the ticket the completion must
    /// present. Starting a new load invalidates all prior tickets.
    pub fn begin_load(&mut self, url: &str) -> LoadTicket {
        self.load_generation += 1;
        self.error_message = None;
        self.set_status(LoadStatus::Loading);
        log::info!("loading base image from {}", url);
        LoadTicket {
            generation: self.load_generation,
            url: url.to_owned(),
        }
    }

    /// Re-entry point for a finished load. Stale tickets are dropped.
    pub fn complete_load(&mut self, ticket: &LoadTicket, result: Result<RgbaImage, LoadError>) {
        if ticket.generation != self.load_generation {
            log::debug!(
                "dropping stale load completion (generation {} != {})",
                ticket.generation,
                self.load_generation
            );
            return;
        }
        match result {
            Ok(raster) => {
                let (width, height) = self.surface.set_base_image(raster);
                self.model.set_base_image(&ticket.url, width, height);
                self.surface.apply_transform(self.model.transform());
                self.refresh_pipeline();
                self.set_status(LoadStatus::Success);
                log::info!("✅ base image ready at {}x{}", width, height);
                self.schedule(CheckpointClass::Discrete);
            }
            Err(e) => {
                log::warn!("❌ base image load failed: {}", e);
                self.error_message = Some(e.to_string());
                self.set_status(LoadStatus::Error);
                self.events.emit(SessionEvent::Notice {
                    message: format!("Failed to load image: {}", e),
                });
            }
        }
    }

    fn set_status(&mut self, new: LoadStatus) {
        if self.status != new {
            let old = std::mem::replace(&mut self.status, new);
            self.events.emit(SessionEvent::StatusChanged { old, new });
        }
    }

    // --- tonal sliders ---

    pub fn set_brightness(&mut self, v: f32) {
        self.model.set_brightness(v);
        self.refresh_pipeline();
        self.schedule(CheckpointClass::Continuous);
    }

    pub fn set_contrast(&mut self, v: f32) {
        self.model.set_contrast(v);
        self.refresh_pipeline();
        self.schedule(CheckpointClass::Continuous);
    }

    pub fn set_saturation(&mut self, v: f32) {
        self.model.set_saturation(v);
        self.refresh_pipeline();
        self.schedule(CheckpointClass::Continuous);
    }

    pub fn set_gamma(&mut self, v: f32) {
        self.model.set_gamma(v);
        self.refresh_pipeline();
        self.schedule(CheckpointClass::Continuous);
    }

    pub fn set_sharpen_blur(&mut self, v: f32) {
        self.model.set_sharpen_blur(v);
        self.refresh_pipeline();
        self.schedule(CheckpointClass::Continuous);
    }

    /// Restores tonal/filter/effect/overlay to defaults in one step.
    pub fn reset_edits(&mut self) {
        self.model.reset_edits();
        self.surface.set_overlay(None);
        self.refresh_pipeline();
        self.schedule(CheckpointClass::Discrete);
    }

    // --- filter / effect ---

    pub fn select_filter(&mut self, id: &str) {
        self.model.select_filter(id);
        self.refresh_pipeline();
        self.schedule(CheckpointClass::Continuous);
    }

    pub fn set_filter_intensity(&mut self, v: f32) {
        self.model.set_filter_intensity(v);
        self.refresh_pipeline();
        self.schedule(CheckpointClass::Continuous);
    }

    pub fn select_effect(&mut self, id: &str) {
        self.model.select_effect(id);
        self.refresh_pipeline();
        self.schedule(CheckpointClass::Continuous);
    }

    pub fn set_effect_intensity(&mut self, kind: EffectKind, v: f32) {
        self.model.set_effect_intensity(kind, v);
        self.refresh_pipeline();
        self.schedule(CheckpointClass::Continuous);
    }

    // --- overlay texture ---

    pub fn select_overlay(&mut self, reference: Option<&str>) {
        self.model.select_overlay(reference);
        match reference {
            Some(reference) => {
                let overlay = self.model.overlay().clone();
                match self.assets.fetch(reference) {
                    Ok(raster) => self.surface.set_overlay(Some(OverlayNode {
                        image_ref: reference.to_owned(),
                        opacity: overlay.opacity,
                        blend: overlay.blend,
                        raster: Some(raster),
                    })),
                    Err(e) => {
                        log::warn!("❌ overlay texture load failed: {}", e);
                        self.surface.set_overlay(None);
                        self.events.emit(SessionEvent::Notice {
                            message: format!("Failed to load overlay: {}", e),
                        });
                    }
                }
            }
            None => self.surface.set_overlay(None),
        }
        self.schedule(CheckpointClass::Continuous);
    }

    pub fn set_overlay_opacity(&mut self, v: f32) {
        self.model.set_overlay_opacity(v);
        self.push_overlay_params();
        self.schedule(CheckpointClass::Continuous);
    }

    pub fn set_overlay_blend(&mut self, id: &str) {
        self.model.set_overlay_blend(id);
        self.push_overlay_params();
        self.schedule(CheckpointClass::Continuous);
    }

    fn push_overlay_params(&mut self) {
        let overlay = self.model.overlay();
        self.surface
            .update_overlay_params(overlay.opacity, overlay.blend);
    }

    // --- transform ---

    pub fn set_rotation(&mut self, degrees: f32) {
        self.model.set_rotation(degrees);
        self.surface.apply_transform(self.model.transform());
        self.schedule(CheckpointClass::Continuous);
    }

    pub fn rotate_clockwise(&mut self) {
        self.model.rotate_clockwise();
        self.surface.apply_transform(self.model.transform());
        self.schedule(CheckpointClass::Discrete);
    }

    pub fn rotate_counterclockwise(&mut self) {
        self.model.rotate_counterclockwise();
        self.surface.apply_transform(self.model.transform());
        self.schedule(CheckpointClass::Discrete);
    }

    pub fn toggle_flip_horizontal(&mut self) {
        self.model.toggle_flip_horizontal();
        self.surface.apply_transform(self.model.transform());
        self.schedule(CheckpointClass::Discrete);
    }

    pub fn toggle_flip_vertical(&mut self) {
        self.model.toggle_flip_vertical();
        self.surface.apply_transform(self.model.transform());
        self.schedule(CheckpointClass::Discrete);
    }

    pub fn set_crop_region(&mut self, region: Option<crate::composition::CropRegion>) {
        self.model.set_crop_region(region);
    }

    pub fn set_locked_aspect(&mut self, aspect: Option<(u32, u32)>) {
        self.model.set_locked_aspect(aspect);
    }

    /// Destructively applies the pending crop region. The visible pixels
    /// become the new baseline, so the adjustment anchors reset with it.
    pub fn commit_crop(&mut self) {
        let Some(region) = self.model.transform().crop_region else {
            return;
        };
        match self.surface.commit_crop(&region) {
            Ok((width, height)) => {
                self.model.apply_crop_commit(width, height);
                self.model.reset_adjustments();
                self.surface.apply_transform(self.model.transform());
                self.refresh_pipeline();
                self.schedule(CheckpointClass::Discrete);
            }
            Err(e) => log::warn!("crop failed: {}", e),
        }
    }

    // --- text objects ---

    pub fn add_text(&mut self) -> usize {
        let id = self.model.add_text();
        self.sync_texts();
        self.schedule(CheckpointClass::Discrete);
        id
    }

    pub fn delete_text(&mut self, id: usize) {
        self.model.delete_text(id);
        self.sync_texts();
        self.schedule(CheckpointClass::Discrete);
    }

    pub fn duplicate_selected_text(&mut self) -> Option<usize> {
        let id = self.model.selected_text()?;
        let new_id = self.model.duplicate_text(id)?;
        self.sync_texts();
        self.schedule(CheckpointClass::Discrete);
        Some(new_id)
    }

    pub fn select_text(&mut self, id: Option<usize>) {
        self.model.select_text(id);
    }

    pub fn set_text_content(&mut self, id: usize, content: &str) {
        self.model.set_text_content(id, content);
        self.sync_texts();
        self.schedule(CheckpointClass::Continuous);
    }

    pub fn set_text_width(&mut self, id: usize, width: f32) {
        self.model.set_text_width(id, width);
        self.sync_texts();
        self.schedule(CheckpointClass::Continuous);
    }

    pub fn set_text_rotation(&mut self, id: usize, degrees: f32) {
        self.model.set_text_rotation(id, degrees);
        self.sync_texts();
        self.schedule(CheckpointClass::Continuous);
    }

    pub fn set_text_font_family(&mut self, id: usize, family: &str) {
        self.model.set_text_font_family(id, family);
        self.sync_texts();
        self.schedule(CheckpointClass::Continuous);
    }

    pub fn set_text_font_size(&mut self, id: usize, size: f32) {
        self.model.set_text_font_size(id, size);
        self.sync_texts();
        self.schedule(CheckpointClass::Continuous);
    }

    pub fn set_text_fill(&mut self, id: usize, hex: &str) {
        self.model.set_text_fill(id, hex);
        self.sync_texts();
        self.schedule(CheckpointClass::Continuous);
    }

    pub fn set_text_fill_opacity(&mut self, id: usize, v: f32) {
        self.model.set_text_fill_opacity(id, v);
        self.sync_texts();
        self.schedule(CheckpointClass::Continuous);
    }

    pub fn set_text_background(&mut self, id: usize, value: &str) {
        self.model.set_text_background(id, value);
        self.sync_texts();
        self.schedule(CheckpointClass::Continuous);
    }

    pub fn set_text_background_opacity(&mut self, id: usize, v: f32) {
        self.model.set_text_background_opacity(id, v);
        self.sync_texts();
        self.schedule(CheckpointClass::Continuous);
    }

    pub fn set_text_line_spacing(&mut self, id: usize, spacing: f32) {
        self.model.set_text_line_spacing(id, spacing);
        self.sync_texts();
        self.schedule(CheckpointClass::Continuous);
    }

    pub fn set_text_align(&mut self, id: usize, align_id: &str) {
        self.model.set_text_align(id, align_id);
        self.sync_texts();
        self.schedule(CheckpointClass::Continuous);
    }

    fn sync_texts(&mut self) {
        self.surface.sync_texts(self.model.texts());
    }

    // --- stickers ---

    pub fn add_sticker(&mut self, image_ref: &str) -> String {
        let id = self.model.add_sticker(image_ref);
        self.sync_stickers();
        match self.assets.fetch(image_ref) {
            Ok(raster) => self.surface.set_sticker_raster(&id, raster),
            Err(e) => {
                log::warn!("❌ sticker asset load failed: {}", e);
                self.events.emit(SessionEvent::Notice {
                    message: format!("Failed to load sticker: {}", e),
                });
            }
        }
        self.schedule(CheckpointClass::Discrete);
        id
    }

    pub fn delete_sticker(&mut self, id: &str) {
        self.model.delete_sticker(id);
        self.sync_stickers();
        self.schedule(CheckpointClass::Discrete);
    }

    pub fn select_sticker(&mut self, id: Option<&str>) {
        self.model.select_sticker(id);
    }

    pub fn set_sticker_rotation(&mut self, id: &str, degrees: f32) {
        self.model.set_sticker_rotation(id, degrees);
        self.sync_stickers();
        self.schedule(CheckpointClass::Continuous);
    }

    pub fn set_sticker_scale(&mut self, id: &str, scale: f32) {
        self.model.set_sticker_scale(id, scale);
        self.sync_stickers();
        self.schedule(CheckpointClass::Continuous);
    }

    fn sync_stickers(&mut self) {
        self.surface.sync_stickers(self.model.stickers());
    }

    // --- picking and dragging ---

    /// Selects whatever is under the pointer, clearing selection on a miss.
    pub fn pick_at(&mut self, pos: Pos2) -> Option<PickedObject> {
        let picked = self.surface.hit_test(pos, &self.fonts);
        match &picked {
            Some(PickedObject::Text(id)) => {
                self.model.select_text(Some(*id));
                self.model.select_sticker(None);
            }
            Some(PickedObject::Sticker(id)) => {
                self.model.select_sticker(Some(id));
                self.model.select_text(None);
            }
            None => {
                self.model.select_text(None);
                self.model.select_sticker(None);
            }
        }
        picked
    }

    /// Moves the selected object so its center lands at `center`, snapping
    /// to the canvas centerlines. No checkpoint until the drag ends.
    pub fn drag_selected_to(&mut self, center: Pos2) {
        if let Some(id) = self.model.selected_text() {
            let Some(text) = self.model.text(id) else {
                return;
            };
            let size = self.surface.text_box_size(text, &self.fonts);
            let snapped = self.surface.snap_center(center);
            self.model.set_text_position(id, snapped - size / 2.0);
            self.sync_texts();
        } else if let Some(id) = self.model.selected_sticker().map(str::to_owned) {
            let snapped = self.surface.snap_center(center);
            self.model.set_sticker_position(&id, snapped);
            self.sync_stickers();
        }
    }

    /// Releasing a drag clears the guide lines and is a checkpoint event.
    pub fn end_drag(&mut self) {
        self.surface.clear_guides();
        self.schedule(CheckpointClass::Discrete);
    }

    // --- brush strokes ---

    pub fn set_brush_size(&mut self, v: f32) {
        self.model.set_brush_size(v);
        self.schedule(CheckpointClass::Continuous);
    }

    pub fn set_brush_hardness(&mut self, v: f32) {
        self.model.set_brush_hardness(v);
        self.schedule(CheckpointClass::Continuous);
    }

    pub fn set_brush_color(&mut self, hex: &str) {
        self.model.set_brush_color(hex);
        self.schedule(CheckpointClass::Continuous);
    }

    pub fn set_brush_opacity(&mut self, v: f32) {
        self.model.set_brush_opacity(v);
        self.schedule(CheckpointClass::Continuous);
    }

    pub fn begin_stroke(&mut self, pos: Pos2) {
        self.pending_stroke = Some(vec![pos]);
    }

    pub fn extend_stroke(&mut self, pos: Pos2) {
        if let Some(points) = &mut self.pending_stroke {
            points.push(pos);
        }
    }

    /// Commits the in-progress stroke with the brush settings in effect.
    pub fn end_stroke(&mut self) {
        if let Some(points) = self.pending_stroke.take() {
            self.surface.add_stroke(points, *self.model.brush());
            self.schedule(CheckpointClass::Discrete);
        }
    }

    // --- keyboard shortcuts ---

    pub fn handle_shortcut(&mut self, shortcut: Shortcut) {
        match shortcut {
            Shortcut::Undo => {
                self.undo();
            }
            Shortcut::Redo => {
                self.redo();
            }
            Shortcut::DeleteSelection => {
                if let Some(id) = self.model.selected_text() {
                    self.delete_text(id);
                } else if let Some(id) = self.model.selected_sticker().map(str::to_owned) {
                    self.delete_sticker(&id);
                }
            }
            Shortcut::Duplicate => {
                self.duplicate_selected_text();
            }
        }
    }

    // --- history ---

    /// Flushes any pending debounced checkpoint, then steps back. Returns
    /// false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        self.flush_pending_checkpoint();
        let Some(entry) = self.history.undo().cloned() else {
            return false;
        };
        self.apply_history_entry(&entry);
        true
    }

    /// Symmetric with [`Self::undo`].
    pub fn redo(&mut self) -> bool {
        self.flush_pending_checkpoint();
        let Some(entry) = self.history.redo().cloned() else {
            return false;
        };
        self.apply_history_entry(&entry);
        true
    }

    fn apply_history_entry(&mut self, entry: &HistoryEntry) {
        if let Err(e) = self.surface.restore_snapshot(&entry.surface) {
            log::warn!("surface restore failed: {}", e);
        }
        self.model.restore(&entry.metadata);
        self.surface.apply_transform(self.model.transform());
        // Re-render while still in the restoring state so none of this
        // re-enters the checkpoint path
        self.refresh_pipeline();
        self.history.finish_restore();
        self.events.emit(SessionEvent::HistoryApplied {
            cursor: self.history.cursor().unwrap_or(0),
            length: self.history.len(),
        });
    }

    /// A pending debounced checkpoint is captured before the cursor moves,
    /// so the state being left is never lost to the race.
    fn flush_pending_checkpoint(&mut self) {
        if self.scheduler.is_pending() {
            self.scheduler.clear();
            self.take_checkpoint();
        }
    }

    fn schedule(&mut self, class: CheckpointClass) {
        if self.history.is_restoring() {
            return;
        }
        self.scheduler.request(class, self.clock);
    }

    fn take_checkpoint(&mut self) {
        if self.history.is_restoring() {
            return;
        }
        match self.surface.capture_snapshot() {
            Ok(surface) => {
                self.history.push(HistoryEntry {
                    surface,
                    metadata: self.model.snapshot(),
                });
                self.events.emit(SessionEvent::CheckpointRecorded {
                    length: self.history.len(),
                });
            }
            Err(e) => log::warn!("checkpoint capture failed: {}", e),
        }
    }

    // --- pipeline ---

    fn refresh_pipeline(&mut self) {
        let Some(baseline) = self.surface.baseline() else {
            return;
        };
        let derived = pipeline::render(
            baseline,
            self.model.tonal(),
            self.model.filter(),
            self.model.effect(),
            self.effect_seed,
        );
        self.surface.set_derived(derived);
    }

    // --- export / save ---

    /// Unknown ids are ignored.
    pub fn set_export_format(&mut self, id: &str) {
        if let Some(format) = ExportFormat::from_id(id) {
            self.export_format = format;
        }
    }

    /// Flattens the surface, crops to the committed transform dimensions
    /// about the canvas center, and encodes in the selected format.
    pub fn export(&self) -> Result<Vec<u8>, ExportError> {
        if !self.surface.has_base() {
            return Err(ExportError::EmptySurface);
        }
        let full = self.surface.flatten(&self.fonts);
        let transform = self.model.transform();
        let width = transform.target_width.clamp(1, self.surface.width());
        let height = transform.target_height.clamp(1, self.surface.height());
        let x = (self.surface.width() - width) / 2;
        let y = (self.surface.height() - height) / 2;
        let cropped = image::imageops::crop_imm(&full, x, y, width, height).to_image();
        export::encode(&cropped, self.export_format)
    }

    /// Exports and uploads the bytes as this version's upscaled image.
    /// Returns the stored URL.
    pub fn save(&mut self, service: &mut dyn PersistenceService) -> Result<String, SessionError> {
        let bytes = self.export()?;
        match service.set_upscaled_image(&self.image_id, &self.version_id, &bytes) {
            Ok(url) => {
                log::info!("💾 saved edited image to {}", url);
                Ok(url)
            }
            Err(e) => {
                self.events.emit(SessionEvent::Notice {
                    message: format!("Save failed: {}", e),
                });
                Err(e.into())
            }
        }
    }
}
