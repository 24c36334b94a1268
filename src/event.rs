use std::cell::RefCell;

use crate::session::LoadStatus;

/// Events broadcast by the session so a host UI can observe state changes
/// without polling.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StatusChanged {
        old: LoadStatus,
        new: LoadStatus,
    },
    /// A checkpoint was recorded into history
    CheckpointRecorded {
        length: usize,
    },
    /// An undo/redo completed and the composition was restored
    HistoryApplied {
        cursor: usize,
        length: usize,
    },
    /// A dismissible user-facing message (load/persistence failures)
    Notice {
        message: String,
    },
}

/// Trait for handling session events
pub trait EventHandler {
    fn handle_event(&mut self, event: &SessionEvent);
}

/// A simple event bus for broadcasting session events to registered handlers
pub struct EventBus {
    handlers: RefCell<Vec<Box<dyn EventHandler>>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &format!("<{} handlers>", self.handlers.borrow().len()))
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Creates a new event bus
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
        }
    }

    /// Subscribe a handler to receive events
    pub fn subscribe(&self, handler: Box<dyn EventHandler>) {
        self.handlers.borrow_mut().push(handler);
    }

    /// Emit an event to all registered handlers
    pub fn emit(&self, event: SessionEvent) {
        for handler in &mut *self.handlers.borrow_mut() {
            handler.handle_event(&event);
        }
    }
}
