//! Debounced checkpoint scheduling.
//!
//! Discrete actions (adding objects, finishing a drag, committing a crop)
//! checkpoint after a short fixed delay that lets the surface finish its
//! re-render. Continuous slider input debounces, so dragging a slider
//! yields one checkpoint, not one per intermediate value. A newer request
//! always supersedes a pending one.

/// Delay before a discrete action's checkpoint fires.
pub const DISCRETE_DELAY_SECS: f64 = 0.1;

/// Quiet period required after the last continuous input.
pub const CONTINUOUS_DEBOUNCE_SECS: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointClass {
    /// Menu clicks, completed gestures: fires soon
    Discrete,
    /// Slider-driven values: fires after input pauses
    Continuous,
}

impl CheckpointClass {
    fn delay(self) -> f64 {
        match self {
            Self::Discrete => DISCRETE_DELAY_SECS,
            Self::Continuous => CONTINUOUS_DEBOUNCE_SECS,
        }
    }
}

/// Tracks at most one pending checkpoint deadline.
#[derive(Debug, Default)]
pub struct CheckpointScheduler {
    deadline: Option<f64>,
}

impl CheckpointScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules (or reschedules) the pending checkpoint.
    pub fn request(&mut self, class: CheckpointClass, now: f64) {
        self.deadline = Some(now + class.delay());
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consumes the deadline if it has passed.
    pub fn take_due(&mut self, now: f64) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continuous_requests_debounce_into_one() {
        let mut scheduler = CheckpointScheduler::new();
        scheduler.request(CheckpointClass::Continuous, 0.0);
        scheduler.request(CheckpointClass::Continuous, 0.2);
        scheduler.request(CheckpointClass::Continuous, 0.4);

        // The first two deadlines were superseded
        assert!(!scheduler.take_due(0.6));
        assert!(scheduler.take_due(0.9));
        assert!(!scheduler.is_pending());
    }

    #[test]
    fn discrete_fires_after_the_short_delay() {
        let mut scheduler = CheckpointScheduler::new();
        scheduler.request(CheckpointClass::Discrete, 1.0);
        assert!(!scheduler.take_due(1.05));
        assert!(scheduler.take_due(1.11));
    }

    #[test]
    fn newer_request_supersedes_pending() {
        let mut scheduler = CheckpointScheduler::new();
        scheduler.request(CheckpointClass::Discrete, 0.0);
        scheduler.request(CheckpointClass::Continuous, 0.05);
        // The discrete deadline at 0.1 no longer exists
        assert!(!scheduler.take_due(0.2));
        assert!(scheduler.take_due(0.55));
    }
}
