use image::{Rgba, RgbaImage};
use photo_studio::history::MAX_HISTORY_LEN;
use photo_studio::session::{AssetStore, StudioSession};
use photo_studio::error::LoadError;

struct NoAssets;

impl AssetStore for NoAssets {
    fn fetch(&mut self, reference: &str) -> Result<RgbaImage, LoadError> {
        Err(LoadError::Fetch(format!("unexpected fetch: {reference}")))
    }
}

fn loaded_session() -> (StudioSession, f64) {
    let mut session = StudioSession::new("img-1", "v-1", Box::new(NoAssets)).unwrap();
    let ticket = session.begin_load("mem://base.png");
    session.complete_load(
        &ticket,
        Ok(RgbaImage::from_pixel(300, 300, Rgba([10, 20, 30, 255]))),
    );
    session.tick(0.2);
    assert_eq!(session.history().len(), 1);
    (session, 0.2)
}

/// Advances far enough past the last input for any debounce to expire.
fn settle(session: &mut StudioSession, clock: &mut f64) {
    *clock += 1.0;
    session.tick(*clock);
}

#[test]
fn slider_drag_collapses_into_one_checkpoint() {
    let (mut session, mut clock) = loaded_session();

    for v in [5.0, 12.0, 20.0, 33.0] {
        clock += 0.1;
        session.tick(clock);
        session.set_brightness(v);
    }
    assert_eq!(session.history().len(), 1, "nothing fired mid-drag");

    settle(&mut session, &mut clock);
    assert_eq!(session.history().len(), 2);
    assert_eq!(
        session.history().current().unwrap().metadata.tonal.brightness,
        33.0
    );
}

#[test]
fn undo_flushes_the_pending_checkpoint_first() {
    let (mut session, _clock) = loaded_session();

    session.set_brightness(25.0);
    assert!(session.has_pending_checkpoint());

    assert!(session.undo());
    // The edited state was captured before stepping back, so redo can
    // reach it again
    assert_eq!(session.history().len(), 2);
    assert_eq!(session.model().tonal().brightness, 0.0);

    assert!(session.redo());
    assert_eq!(session.model().tonal().brightness, 25.0);
}

#[test]
fn undo_and_redo_round_trip_the_whole_composition() {
    let (mut session, mut clock) = loaded_session();

    session.set_saturation(-40.0);
    session.select_filter("sepia");
    settle(&mut session, &mut clock);
    let text_id = session.add_text();
    settle(&mut session, &mut clock);
    session.set_text_content(text_id, "Summer shoot");
    settle(&mut session, &mut clock);
    assert_eq!(session.history().len(), 4);

    let edited = session.history().current().unwrap().metadata.clone();

    assert!(session.undo());
    assert_eq!(session.model().text(text_id).unwrap().content, "New Text");
    assert!(session.undo());
    assert!(session.model().texts().is_empty());
    assert!(session.surface().texts().is_empty());

    assert!(session.redo());
    assert!(session.redo());
    assert_eq!(session.model().snapshot(), edited);
    assert_eq!(session.model().text(text_id).unwrap().content, "Summer shoot");
}

#[test]
fn new_edit_after_undo_discards_the_redo_branch() {
    let (mut session, mut clock) = loaded_session();

    for v in [10.0, 20.0, 30.0] {
        session.set_brightness(v);
        settle(&mut session, &mut clock);
    }
    assert_eq!(session.history().len(), 4);

    assert!(session.undo());
    assert!(session.undo());
    assert_eq!(session.model().tonal().brightness, 10.0);
    assert!(session.history().can_redo());

    session.set_contrast(15.0);
    settle(&mut session, &mut clock);
    assert!(!session.history().can_redo());
    assert_eq!(session.history().len(), 3);
    assert!(!session.redo());
}

#[test]
fn history_stays_bounded_under_many_edits() {
    let (mut session, mut clock) = loaded_session();

    for i in 0..20 {
        session.set_brightness(i as f32);
        settle(&mut session, &mut clock);
    }
    assert_eq!(session.history().len(), MAX_HISTORY_LEN);

    // Walk all the way back; the oldest reachable state is no longer the
    // initial load
    let mut steps = 0;
    while session.undo() {
        steps += 1;
    }
    assert_eq!(steps, MAX_HISTORY_LEN - 1);
    assert!(session.model().tonal().brightness > 0.0);
}

#[test]
fn undo_at_the_start_of_history_is_a_no_op() {
    let (mut session, _clock) = loaded_session();
    assert!(!session.undo());
    assert!(!session.redo());
    assert_eq!(session.history().len(), 1);
}
