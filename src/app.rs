//! The eframe shell: a control panel on the left and the live canvas in the
//! center. All editing goes through [`StudioSession`]; this layer only maps
//! widgets and pointer gestures onto session calls.

use egui::{Color32, ColorImage, Pos2, Rect, Sense, TextureHandle, TextureOptions, pos2, vec2};

use crate::composition::{BlendMode, EffectKind, FilterKind, TextAlign};
use crate::session::{ExportFormat, LoadStatus, Shortcut, StudioSession};
use crate::util::time::current_time_secs;

/// What the active pointer drag is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PointerMode {
    Idle,
    MovingObject,
    Painting,
}

pub struct StudioApp {
    session: StudioSession,
    canvas_texture: Option<TextureHandle>,
    pointer_mode: PointerMode,
    overlay_ref: String,
    sticker_ref: String,
    last_export: Option<Vec<u8>>,
}

impl StudioApp {
    /// Called once before the first frame.
    pub fn new(_cc: &eframe::CreationContext<'_>, mut session: StudioSession) -> Self {
        // Seed the rasterizer with the fonts egui ships, so text objects
        // render with the same faces the UI uses
        for (name, data) in &egui::FontDefinitions::default().font_data {
            session.register_font(name, data.font.to_vec());
        }
        Self {
            session,
            canvas_texture: None,
            pointer_mode: PointerMode::Idle,
            overlay_ref: String::new(),
            sticker_ref: String::new(),
            last_export: None,
        }
    }

    pub fn session(&self) -> &StudioSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut StudioSession {
        &mut self.session
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        // Text widgets own the keyboard while focused
        if ctx.memory(|m| m.focused().is_some()) {
            return;
        }
        let shortcuts = ctx.input(|i| {
            let mut out = Vec::new();
            if i.modifiers.command && i.modifiers.shift && i.key_pressed(egui::Key::Z) {
                out.push(Shortcut::Redo);
            } else if i.modifiers.command && i.key_pressed(egui::Key::Z) {
                out.push(Shortcut::Undo);
            }
            if i.modifiers.command && i.key_pressed(egui::Key::Y) {
                out.push(Shortcut::Redo);
            }
            if i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace) {
                out.push(Shortcut::DeleteSelection);
            }
            if i.modifiers.command && i.key_pressed(egui::Key::D) {
                out.push(Shortcut::Duplicate);
            }
            out
        });
        for shortcut in shortcuts {
            self.session.handle_shortcut(shortcut);
        }
    }

    fn adjust_controls(&mut self, ui: &mut egui::Ui) {
        let tonal = *self.session.model().tonal();
        let mut v = tonal.brightness;
        if ui
            .add(egui::Slider::new(&mut v, -100.0..=100.0).text("Brightness"))
            .changed()
        {
            self.session.set_brightness(v);
        }
        let mut v = tonal.contrast;
        if ui
            .add(egui::Slider::new(&mut v, -100.0..=100.0).text("Contrast"))
            .changed()
        {
            self.session.set_contrast(v);
        }
        let mut v = tonal.saturation;
        if ui
            .add(egui::Slider::new(&mut v, -100.0..=100.0).text("Saturation"))
            .changed()
        {
            self.session.set_saturation(v);
        }
        let mut v = tonal.gamma;
        if ui
            .add(egui::Slider::new(&mut v, -100.0..=100.0).text("Gamma"))
            .changed()
        {
            self.session.set_gamma(v);
        }
        let mut v = tonal.sharpen_blur;
        if ui
            .add(egui::Slider::new(&mut v, -100.0..=100.0).text("Sharpen / Blur"))
            .changed()
        {
            self.session.set_sharpen_blur(v);
        }
        if ui.button("Reset edits").clicked() {
            self.session.reset_edits();
        }
    }

    fn filter_controls(&mut self, ui: &mut egui::Ui) {
        let filter = *self.session.model().filter();
        let mut selected = filter.kind;
        egui::ComboBox::from_label("Filter")
            .selected_text(selected.id())
            .show_ui(ui, |ui| {
                for kind in FilterKind::ALL {
                    ui.selectable_value(&mut selected, kind, kind.id());
                }
            });
        if selected != filter.kind {
            self.session.select_filter(selected.id());
        }
        let mut intensity = filter.intensity;
        if ui
            .add(egui::Slider::new(&mut intensity, 0.0..=100.0).text("Intensity"))
            .changed()
        {
            self.session.set_filter_intensity(intensity);
        }
    }

    fn effect_controls(&mut self, ui: &mut egui::Ui) {
        let effect = *self.session.model().effect();
        let mut selected = effect.active;
        egui::ComboBox::from_label("Effect")
            .selected_text(selected.map_or("none", |k| k.id()))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut selected, None, "none");
                for kind in EffectKind::ALL {
                    ui.selectable_value(&mut selected, Some(kind), kind.id());
                }
            });
        if selected != effect.active {
            self.session
                .select_effect(selected.map_or("none", |k| k.id()));
        }
        if let Some(kind) = selected {
            let mut intensity = effect.intensity_of(kind);
            if ui
                .add(egui::Slider::new(&mut intensity, 0.0..=100.0).text("Intensity"))
                .changed()
            {
                self.session.set_effect_intensity(kind, intensity);
            }
        }
    }

    fn overlay_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.text_edit_singleline(&mut self.overlay_ref);
            if ui.button("Apply").clicked() && !self.overlay_ref.is_empty() {
                let reference = self.overlay_ref.clone();
                self.session.select_overlay(Some(&reference));
            }
            if ui.button("Clear").clicked() {
                self.session.select_overlay(None);
            }
        });
        let overlay = self.session.model().overlay().clone();
        if overlay.selected.is_none() {
            return;
        }
        let mut opacity = overlay.opacity;
        if ui
            .add(egui::Slider::new(&mut opacity, 0.0..=100.0).text("Opacity"))
            .changed()
        {
            self.session.set_overlay_opacity(opacity);
        }
        let mut blend = overlay.blend;
        egui::ComboBox::from_label("Blend")
            .selected_text(blend.id())
            .show_ui(ui, |ui| {
                for mode in BlendMode::ALL {
                    ui.selectable_value(&mut blend, mode, mode.id());
                }
            });
        if blend != overlay.blend {
            self.session.set_overlay_blend(blend.id());
        }
    }

    fn transform_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("⟲ 90°").clicked() {
                self.session.rotate_counterclockwise();
            }
            if ui.button("⟳ 90°").clicked() {
                self.session.rotate_clockwise();
            }
            if ui.button("Flip H").clicked() {
                self.session.toggle_flip_horizontal();
            }
            if ui.button("Flip V").clicked() {
                self.session.toggle_flip_vertical();
            }
        });
        let mut rotation = self.session.model().transform().rotation_degrees;
        if ui
            .add(egui::Slider::new(&mut rotation, 0.0..=360.0).text("Rotation"))
            .changed()
        {
            self.session.set_rotation(rotation);
        }
        if self.session.model().transform().crop_region.is_some()
            && ui.button("Apply crop").clicked()
        {
            self.session.commit_crop();
        }
    }

    fn text_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Add text").clicked() {
                self.session.add_text();
            }
            if ui.button("Duplicate").clicked() {
                self.session.duplicate_selected_text();
            }
            if ui.button("Delete").clicked() {
                if let Some(id) = self.session.model().selected_text() {
                    self.session.delete_text(id);
                }
            }
        });
        let Some(id) = self.session.model().selected_text() else {
            return;
        };
        let Some(text) = self.session.model().text(id).cloned() else {
            return;
        };
        let mut content = text.content.clone();
        if ui.text_edit_multiline(&mut content).changed() {
            self.session.set_text_content(id, &content);
        }
        let mut size = text.font_size;
        if ui
            .add(egui::Slider::new(&mut size, 1.0..=400.0).text("Font size"))
            .changed()
        {
            self.session.set_text_font_size(id, size);
        }
        let mut width = text.width;
        if ui
            .add(egui::Slider::new(&mut width, 1.0..=650.0).text("Box width"))
            .changed()
        {
            self.session.set_text_width(id, width);
        }
        let mut spacing = text.line_spacing;
        if ui
            .add(egui::Slider::new(&mut spacing, 1.0..=4.0).text("Line spacing"))
            .changed()
        {
            self.session.set_text_line_spacing(id, spacing);
        }
        let mut align = text.align;
        egui::ComboBox::from_label("Align")
            .selected_text(align.id())
            .show_ui(ui, |ui| {
                for a in [TextAlign::Left, TextAlign::Center, TextAlign::Right] {
                    ui.selectable_value(&mut align, a, a.id());
                }
            });
        if align != text.align {
            self.session.set_text_align(id, align.id());
        }
        let mut fill = text.fill;
        if ui.color_edit_button_srgba(&mut fill).changed() {
            self.session.set_text_fill(id, &hex_of(fill));
        }
    }

    fn sticker_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.text_edit_singleline(&mut self.sticker_ref);
            if ui.button("Add sticker").clicked() && !self.sticker_ref.is_empty() {
                let reference = self.sticker_ref.clone();
                self.session.add_sticker(&reference);
            }
        });
        let Some(id) = self.session.model().selected_sticker().map(str::to_owned) else {
            return;
        };
        let Some(sticker) = self.session.model().sticker(&id).cloned() else {
            return;
        };
        let mut scale = sticker.scale;
        if ui
            .add(egui::Slider::new(&mut scale, 0.05..=20.0).text("Scale"))
            .changed()
        {
            self.session.set_sticker_scale(&id, scale);
        }
        let mut rotation = sticker.rotation;
        if ui
            .add(egui::Slider::new(&mut rotation, 0.0..=360.0).text("Rotation"))
            .changed()
        {
            self.session.set_sticker_rotation(&id, rotation);
        }
    }

    fn brush_controls(&mut self, ui: &mut egui::Ui) {
        let brush = *self.session.model().brush();
        let mut size = brush.size;
        if ui
            .add(egui::Slider::new(&mut size, 1.0..=100.0).text("Size"))
            .changed()
        {
            self.session.set_brush_size(size);
        }
        let mut hardness = brush.hardness;
        if ui
            .add(egui::Slider::new(&mut hardness, 0.0..=100.0).text("Hardness"))
            .changed()
        {
            self.session.set_brush_hardness(hardness);
        }
        let mut opacity = brush.opacity;
        if ui
            .add(egui::Slider::new(&mut opacity, 0.0..=100.0).text("Opacity"))
            .changed()
        {
            self.session.set_brush_opacity(opacity);
        }
        let mut color = brush.color;
        if ui.color_edit_button_srgba(&mut color).changed() {
            self.session.set_brush_color(&hex_of(color));
        }
    }

    fn history_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let can_undo = self.session.history().can_undo() || self.session.has_pending_checkpoint();
            if ui.add_enabled(can_undo, egui::Button::new("⟲ Undo")).clicked() {
                self.session.undo();
            }
            let can_redo = self.session.history().can_redo();
            if ui.add_enabled(can_redo, egui::Button::new("⟳ Redo")).clicked() {
                self.session.redo();
            }
        });
    }

    fn export_controls(&mut self, ui: &mut egui::Ui) {
        let mut format = self.session.export_format();
        egui::ComboBox::from_label("Format")
            .selected_text(format.extension())
            .show_ui(ui, |ui| {
                for f in [ExportFormat::Png, ExportFormat::Jpeg, ExportFormat::Webp] {
                    ui.selectable_value(&mut format, f, f.extension());
                }
            });
        if format != self.session.export_format() {
            self.session.set_export_format(format.extension());
        }
        if ui.button("Export").clicked() {
            match self.session.export() {
                Ok(bytes) => self.last_export = Some(bytes),
                Err(e) => log::warn!("export failed: {}", e),
            }
        }
        if let Some(bytes) = &self.last_export {
            ui.label(format!("Exported {} bytes", bytes.len()));
        }
    }

    fn canvas(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let size = vec2(
            self.session.surface().width() as f32,
            self.session.surface().height() as f32,
        );
        let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());

        let flat = self.session.surface().flatten(self.session.fonts());
        let color_image = ColorImage::from_rgba_unmultiplied(
            [flat.width() as usize, flat.height() as usize],
            flat.as_raw(),
        );
        match &mut self.canvas_texture {
            Some(handle) => handle.set(color_image, TextureOptions::LINEAR),
            None => {
                self.canvas_texture =
                    Some(ctx.load_texture("canvas", color_image, TextureOptions::LINEAR));
            }
        }
        if let Some(handle) = &self.canvas_texture {
            ui.painter().image(
                handle.id(),
                rect,
                Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        let to_canvas = |pos: Pos2| pos2(pos.x - rect.min.x, pos.y - rect.min.y);
        if let Some(pointer) = response.interact_pointer_pos() {
            let pos = to_canvas(pointer);
            if response.drag_started() {
                self.pointer_mode = if self.session.pick_at(pos).is_some() {
                    PointerMode::MovingObject
                } else {
                    self.session.begin_stroke(pos);
                    PointerMode::Painting
                };
            } else if response.dragged() {
                match self.pointer_mode {
                    PointerMode::MovingObject => self.session.drag_selected_to(pos),
                    PointerMode::Painting => self.session.extend_stroke(pos),
                    PointerMode::Idle => {}
                }
            }
            if response.clicked() {
                self.session.pick_at(pos);
            }
        }
        if response.drag_stopped() {
            match self.pointer_mode {
                PointerMode::MovingObject => self.session.end_drag(),
                PointerMode::Painting => self.session.end_stroke(),
                PointerMode::Idle => {}
            }
            self.pointer_mode = PointerMode::Idle;
        }

        let guides = self.session.surface().guides();
        let stroke = egui::Stroke::new(1.0, Color32::from_rgb(0x4f, 0xc3, 0xf7));
        if guides.vertical {
            let x = rect.min.x + size.x / 2.0;
            ui.painter()
                .line_segment([pos2(x, rect.min.y), pos2(x, rect.max.y)], stroke);
        }
        if guides.horizontal {
            let y = rect.min.y + size.y / 2.0;
            ui.painter()
                .line_segment([pos2(rect.min.x, y), pos2(rect.max.x, y)], stroke);
        }
    }
}

fn hex_of(color: Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
}

impl eframe::App for StudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.session.tick(current_time_secs());
        self.handle_keyboard(ctx);

        egui::SidePanel::left("studio_controls")
            .min_width(260.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.session.status() {
                        LoadStatus::Loading => {
                            ui.label("Loading image…");
                        }
                        LoadStatus::Error => {
                            let message = self
                                .session
                                .error_message()
                                .unwrap_or("image failed to load")
                                .to_owned();
                            ui.colored_label(Color32::RED, message);
                        }
                        LoadStatus::Idle | LoadStatus::Success => {}
                    }
                    ui.collapsing("Adjust", |ui| self.adjust_controls(ui));
                    ui.collapsing("Filters", |ui| self.filter_controls(ui));
                    ui.collapsing("Effects", |ui| self.effect_controls(ui));
                    ui.collapsing("Overlay", |ui| self.overlay_controls(ui));
                    ui.collapsing("Transform", |ui| self.transform_controls(ui));
                    ui.collapsing("Text", |ui| self.text_controls(ui));
                    ui.collapsing("Stickers", |ui| self.sticker_controls(ui));
                    ui.collapsing("Brush", |ui| self.brush_controls(ui));
                    ui.separator();
                    self.history_controls(ui);
                    ui.separator();
                    self.export_controls(ui);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.canvas(ui, ctx);
        });

        // Wake up again so a debounced checkpoint fires without input
        if self.session.has_pending_checkpoint() || self.session.status() == LoadStatus::Loading {
            ctx.request_repaint_after(std::time::Duration::from_millis(50));
        }
    }
}
