//! Pointer velocity tracking.
//!
//! Raw pointer-move samples arrive at whatever rate the browser dispatches them;
//! the tracker turns consecutive samples into a displacement-per-millisecond
//! vector and flags whether anything arrived since the last frame consumed it.

/// Smallest time step used when dividing a displacement. Duplicate events fired
/// in the same tick would otherwise divide by (almost) zero.
pub const MIN_DELTA_MS: f64 = 10.4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
    pub timestamp_ms: f64,
}

/// Latest velocity in pixels per millisecond.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VelocityState {
    pub vx: f64,
    pub vy: f64,
    /// A sample arrived since the previous [`VelocityTracker::consume`].
    pub dirty: bool,
}

#[derive(Clone, Debug)]
pub struct VelocityTracker {
    min_delta_ms: f64,
    last: Option<PointerSample>,
    state: VelocityState,
}

impl Default for VelocityTracker {
    fn default() -> Self {
        Self::new(MIN_DELTA_MS)
    }
}

impl VelocityTracker {
    pub fn new(min_delta_ms: f64) -> Self {
        Self {
            min_delta_ms,
            last: None,
            state: VelocityState::default(),
        }
    }

    /// Record a container-relative pointer position observed at `now_ms`.
    pub fn on_pointer_move(&mut self, x: f64, y: f64, now_ms: f64) {
        if !(x.is_finite() && y.is_finite() && now_ms.is_finite()) {
            return;
        }
        let sample = PointerSample {
            x,
            y,
            timestamp_ms: now_ms,
        };
        // First sample seeds against itself so it never produces a spike.
        let last = self.last.replace(sample).unwrap_or(sample);

        let delta = self.min_delta_ms.max(now_ms - last.timestamp_ms);
        self.state = VelocityState {
            vx: (x - last.x) / delta,
            vy: (y - last.y) / delta,
            dirty: true,
        };
    }

    /// Hand the current state to the frame loop and clear the dirty flag.
    ///
    /// The velocity itself is left untouched; deciding what an idle frame means
    /// belongs to the caller.
    pub fn consume(&mut self) -> VelocityState {
        let state = self.state;
        self.state.dirty = false;
        state
    }

    pub fn peek(&self) -> VelocityState {
        self.state
    }

    pub fn reset(&mut self) {
        self.last = None;
        self.state = VelocityState::default();
    }
}
