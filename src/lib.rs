#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod composition;
pub mod error;
pub mod event;
pub mod history;
pub mod persistence;
pub mod pipeline;
pub mod session;
pub mod surface;
pub mod util;

pub use app::StudioApp;
pub use composition::CompositionModel;
pub use error::{ExportError, LoadError, SessionError};
pub use event::{EventBus, EventHandler, SessionEvent};
pub use history::{HistoryEngine, HistoryEntry, MAX_HISTORY_LEN};
pub use persistence::{PersistenceError, PersistenceService};
pub use session::{AssetStore, LoadStatus, LoadTicket, StudioSession};
pub use surface::{FontStore, Surface, SurfaceSnapshot};
