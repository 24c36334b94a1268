use std::cell::RefCell;
use std::rc::Rc;

use egui::pos2;
use image::{Rgba, RgbaImage};
use photo_studio::error::LoadError;
use photo_studio::event::{EventHandler, SessionEvent};
use photo_studio::persistence::{
    Client, ClientDetail, ImageRecord, PersistenceError, PersistenceService, VersionRecord,
};
use photo_studio::session::{AssetStore, LoadStatus, Shortcut, StudioSession};

struct MockAssets;

impl AssetStore for MockAssets {
    fn fetch(&mut self, reference: &str) -> Result<RgbaImage, LoadError> {
        if reference.starts_with("missing") {
            Err(LoadError::Fetch(format!("no such asset: {reference}")))
        } else {
            Ok(RgbaImage::from_pixel(32, 32, Rgba([200, 40, 40, 255])))
        }
    }
}

struct MockPersistence {
    upscaled_url: Option<String>,
    saved_bytes: Vec<u8>,
}

impl MockPersistence {
    fn new() -> Self {
        Self {
            upscaled_url: None,
            saved_bytes: Vec::new(),
        }
    }
}

impl PersistenceService for MockPersistence {
    fn create_client(
        &mut self,
        name: &str,
        email: &str,
        phone: &str,
        country_code: &str,
    ) -> Result<Client, PersistenceError> {
        Ok(Client {
            id: "client-1".into(),
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            country_code: country_code.into(),
        })
    }

    fn list_clients(&self) -> Result<Vec<Client>, PersistenceError> {
        Ok(Vec::new())
    }

    fn get_client_detail(&self, client_id: &str) -> Result<ClientDetail, PersistenceError> {
        Err(PersistenceError::NotFound(client_id.into()))
    }

    fn delete_client(&mut self, _email: &str) -> Result<(), PersistenceError> {
        Ok(())
    }

    fn add_image(
        &mut self,
        _client_id: &str,
        _image: &[u8],
    ) -> Result<ImageRecord, PersistenceError> {
        Err(PersistenceError::Storage("unused".into()))
    }

    fn add_version(
        &mut self,
        _image_id: &str,
        _model_used: &str,
        _prompt_used: &str,
        _generated_image: &[u8],
    ) -> Result<VersionRecord, PersistenceError> {
        Err(PersistenceError::Storage("unused".into()))
    }

    fn replace_generated_image(
        &mut self,
        _image_id: &str,
        _version_id: &str,
        _model_used: &str,
        _prompt_used: &str,
        _new_file: &[u8],
    ) -> Result<(), PersistenceError> {
        Ok(())
    }

    fn set_upscaled_image(
        &mut self,
        image_id: &str,
        version_id: &str,
        file: &[u8],
    ) -> Result<String, PersistenceError> {
        let url = format!("mem://{image_id}/{version_id}/upscaled.png");
        self.upscaled_url = Some(url.clone());
        self.saved_bytes = file.to_vec();
        Ok(url)
    }

    fn get_editable_image_url(
        &self,
        image_id: &str,
        _version_id: &str,
    ) -> Result<String, PersistenceError> {
        Ok(self
            .upscaled_url
            .clone()
            .unwrap_or_else(|| format!("mem://{image_id}/generated.png")))
    }
}

#[derive(Default)]
struct EventLog(Vec<String>);

struct SharedLog(Rc<RefCell<EventLog>>);

impl EventHandler for SharedLog {
    fn handle_event(&mut self, event: &SessionEvent) {
        let line = match event {
            SessionEvent::StatusChanged { new, .. } => format!("status:{new:?}"),
            SessionEvent::CheckpointRecorded { length } => format!("checkpoint:{length}"),
            SessionEvent::HistoryApplied { cursor, .. } => format!("applied:{cursor}"),
            SessionEvent::Notice { message } => format!("notice:{message}"),
        };
        self.0.borrow_mut().0.push(line);
    }
}

fn new_session() -> StudioSession {
    StudioSession::new("img-1", "v-1", Box::new(MockAssets)).unwrap()
}

fn base_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([90, 120, 150, 255]))
}

fn load_base(session: &mut StudioSession, width: u32, height: u32) {
    let ticket = session.begin_load("mem://base.png");
    session.complete_load(&ticket, Ok(base_image(width, height)));
    // Let the post-load checkpoint fire
    session.tick(0.2);
}

#[test]
fn portrait_image_is_fit_to_the_canvas() {
    let mut session = new_session();
    load_base(&mut session, 200, 300);

    assert_eq!(session.status(), LoadStatus::Success);
    let transform = session.model().transform();
    assert_eq!(transform.target_width, 433);
    assert_eq!(transform.target_height, 650);
    assert_eq!(session.history().len(), 1);
}

#[test]
fn failed_load_reports_an_error() {
    let mut session = new_session();
    let ticket = session.begin_load("mem://broken.png");
    session.complete_load(&ticket, Err(LoadError::Decode("bad header".into())));

    assert_eq!(session.status(), LoadStatus::Error);
    assert!(session.error_message().unwrap().contains("bad header"));
    assert!(session.history().is_empty());
}

#[test]
fn stale_load_completion_is_ignored() {
    let mut session = new_session();
    let first = session.begin_load("mem://a.png");
    let second = session.begin_load("mem://b.png");

    session.complete_load(&first, Ok(base_image(100, 100)));
    assert_eq!(session.status(), LoadStatus::Loading);
    assert!(!session.surface().has_base());

    session.complete_load(&second, Ok(base_image(200, 300)));
    assert_eq!(session.status(), LoadStatus::Success);
    assert_eq!(session.model().base_image_ref(), Some("mem://b.png"));
}

#[test]
fn bootstrap_prefers_the_upscaled_url() {
    let mut service = MockPersistence::new();
    service.upscaled_url = Some("mem://img-1/v-1/upscaled.png".into());

    let mut session = new_session();
    let ticket = session.bootstrap(&service).unwrap();
    assert_eq!(ticket.url, "mem://img-1/v-1/upscaled.png");
    assert_eq!(session.status(), LoadStatus::Loading);
}

#[test]
fn adding_a_sticker_fetches_its_raster() {
    let mut session = new_session();
    load_base(&mut session, 400, 400);

    let id = session.add_sticker("stickers/star.png");
    assert_eq!(session.model().selected_sticker(), Some(id.as_str()));

    let node = &session.surface().stickers()[0];
    assert_eq!(node.sticker.id, id);
    assert!(node.raster.is_some());
}

#[test]
fn missing_assets_surface_a_notice() {
    let log = Rc::new(RefCell::new(EventLog::default()));
    let mut session = new_session();
    session.events().subscribe(Box::new(SharedLog(Rc::clone(&log))));
    load_base(&mut session, 400, 400);

    session.add_sticker("missing/ghost.png");
    let lines = log.borrow().0.clone();
    assert!(lines.iter().any(|l| l.starts_with("notice:")));
    // The sticker object still exists, just without pixels
    assert!(session.surface().stickers()[0].raster.is_none());
}

#[test]
fn delete_shortcut_removes_the_selected_text() {
    let mut session = new_session();
    load_base(&mut session, 400, 400);

    let id = session.add_text();
    assert_eq!(session.model().selected_text(), Some(id));

    session.handle_shortcut(Shortcut::DeleteSelection);
    assert!(session.model().texts().is_empty());
    assert!(session.model().selected_text().is_none());
}

#[test]
fn dragging_snaps_to_the_canvas_center() {
    let mut session = new_session();
    load_base(&mut session, 400, 400);

    let id = session.add_text();
    session.tick(0.5);
    // 4 px off-center is inside the snap threshold
    session.drag_selected_to(pos2(329.0, 321.0));
    let text = session.model().text(id).unwrap();
    let size = session.surface().text_box_size(text, session.fonts());
    assert!((text.position.x + size.x / 2.0 - 325.0).abs() < 0.01);
    assert!((text.position.y + size.y / 2.0 - 325.0).abs() < 0.01);

    let guides = session.surface().guides();
    assert!(guides.horizontal && guides.vertical);
    session.end_drag();
    assert!(!session.surface().guides().any());
}

#[test]
fn reset_edits_checkpoints_after_the_short_delay() {
    let mut session = new_session();
    load_base(&mut session, 400, 400);
    session.set_brightness(30.0);
    session.tick(1.0);
    assert_eq!(session.history().len(), 2);

    session.reset_edits();
    // 0.2 s later: past the discrete delay, inside the slider debounce
    session.tick(1.2);
    assert_eq!(session.history().len(), 3);
    assert_eq!(
        session.history().current().unwrap().metadata.tonal.brightness,
        0.0
    );
}

#[test]
fn quarter_turns_and_flips_checkpoint_after_the_short_delay() {
    let mut session = new_session();
    load_base(&mut session, 400, 400);

    session.rotate_clockwise();
    session.tick(0.4);
    assert_eq!(session.history().len(), 2);
    assert_eq!(
        session
            .history()
            .current()
            .unwrap()
            .metadata
            .transform
            .rotation_degrees,
        90.0
    );

    session.toggle_flip_horizontal();
    session.tick(0.6);
    assert_eq!(session.history().len(), 3);
    assert!(
        session
            .history()
            .current()
            .unwrap()
            .metadata
            .transform
            .flipped_horizontal
    );
}

#[test]
fn duplicate_shortcut_clones_and_checkpoints() {
    let mut session = new_session();
    load_base(&mut session, 400, 400);

    let original = session.add_text();
    session.tick(0.4);
    assert_eq!(session.history().len(), 2);

    session.handle_shortcut(Shortcut::Duplicate);
    assert_eq!(session.model().texts().len(), 2);
    let clone = session.model().selected_text().unwrap();
    assert_ne!(clone, original);

    session.tick(0.6);
    assert_eq!(session.history().len(), 3);
    assert_eq!(session.history().current().unwrap().metadata.texts.len(), 2);
}

#[test]
fn crop_commit_bakes_and_resets() {
    let mut session = new_session();
    load_base(&mut session, 400, 400);
    session.set_brightness(40.0);
    session.tick(1.0);

    session.set_crop_region(Some(photo_studio::composition::CropRegion {
        x: 100,
        y: 100,
        width: 200,
        height: 150,
    }));
    session.commit_crop();

    let transform = session.model().transform();
    assert_eq!((transform.target_width, transform.target_height), (200, 150));
    assert_eq!(transform.rotation_degrees, 0.0);
    assert!(transform.crop_region.is_none());
    // The baked appearance must not be re-derived from the sliders
    assert_eq!(session.model().tonal().brightness, 0.0);
}
