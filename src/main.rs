#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use photo_studio::{AssetStore, LoadError, StudioApp, StudioSession};

/// Loads sticker and overlay assets from the local filesystem.
#[cfg(not(target_arch = "wasm32"))]
struct DiskAssets;

#[cfg(not(target_arch = "wasm32"))]
impl AssetStore for DiskAssets {
    fn fetch(&mut self, reference: &str) -> Result<image::RgbaImage, LoadError> {
        let bytes = std::fs::read(reference).map_err(|e| LoadError::Fetch(e.to_string()))?;
        let decoded =
            image::load_from_memory(&bytes).map_err(|e| LoadError::Decode(e.to_string()))?;
        Ok(decoded.to_rgba8())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let mut session = StudioSession::new("local", "draft", Box::new(DiskAssets))
        .expect("failed to initialize the editing session");
    if let Some(path) = std::env::args().nth(1) {
        let ticket = session.begin_load(&path);
        let result = DiskAssets.fetch(&path);
        session.complete_load(&ticket, result);
    }

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 720.0])
            .with_min_inner_size([700.0, 520.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Photo Studio",
        native_options,
        Box::new(|cc| Ok(Box::new(StudioApp::new(cc, session)))),
    )
}

/// Stickers and overlays need a host-provided loader on the web; without
/// one, asset fetches report a load error through the session notices.
#[cfg(target_arch = "wasm32")]
struct NoFetchAssets;

#[cfg(target_arch = "wasm32")]
impl AssetStore for NoFetchAssets {
    fn fetch(&mut self, reference: &str) -> Result<image::RgbaImage, LoadError> {
        Err(LoadError::Fetch(format!("no asset loader for {reference}")))
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    use eframe::wasm_bindgen::JsCast as _;

    // Redirect `log` messages to `console.log` and friends:
    eframe::WebLogger::init(log::LevelFilter::Debug).ok();

    let web_options = eframe::WebOptions::default();

    wasm_bindgen_futures::spawn_local(async {
        let document = web_sys::window()
            .expect("no window")
            .document()
            .expect("no document");

        let canvas = document
            .get_element_by_id("the_canvas_id")
            .expect("failed to find the_canvas_id")
            .dyn_into::<web_sys::HtmlCanvasElement>()
            .expect("the_canvas_id was not a HtmlCanvasElement");

        let session = StudioSession::new("local", "draft", Box::new(NoFetchAssets))
            .expect("failed to initialize the editing session");

        let start_result = eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(|cc| Ok(Box::new(StudioApp::new(cc, session)))),
            )
            .await;

        // Remove the loading text and spinner:
        if let Some(loading_text) = document.get_element_by_id("loading_text") {
            match start_result {
                Ok(_) => loading_text.remove(),
                Err(e) => {
                    loading_text.set_inner_html(
                        "<p> The app has crashed. See the developer console for details. </p>",
                    );
                    panic!("Failed to start eframe: {e:?}");
                }
            }
        }
    });
}
