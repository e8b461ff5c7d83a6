//! Non-blocking per-line debouncer.
//!
//! Converts a noisy raw sample stream into clean logical edges.  One
//! instance per monitored line; each holds its own state (last raw level,
//! timestamp of the last raw change, last emitted stable level) so several
//! lines can be debounced within a single polling pass without any
//! sleeping.
//!
//! An edge is emitted only once the raw level has held constant for the
//! configured window since the last raw transition.  Any flicker inside
//! the window restarts the timer without emitting.

/// A stable logical transition on a monitored line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Line went low → high.
    Rising,
    /// Line went high → low.
    Falling,
}

/// Debounce state for a single digital input line.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window_ms: u64,
    /// Last raw sample observed.
    last_raw: Option<bool>,
    /// Timestamp of the last raw transition.
    last_change_ms: u64,
    /// Last level reported as stable.
    stable: bool,
}

impl Debouncer {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            last_raw: None,
            last_change_ms: 0,
            stable: false,
        }
    }

    /// Feed one raw sample at monotonic time `now_ms`.
    ///
    /// The very first sample seeds the stable level without emitting —
    /// a line already asserted at process start (e.g. mains already
    /// absent at boot) must not produce a spurious edge.
    pub fn observe(&mut self, raw: bool, now_ms: u64) -> Option<Edge> {
        let Some(prev_raw) = self.last_raw else {
            self.last_raw = Some(raw);
            self.last_change_ms = now_ms;
            self.stable = raw;
            return None;
        };

        if raw != prev_raw {
            // Raw transition (could be bounce) — restart the window.
            self.last_raw = Some(raw);
            self.last_change_ms = now_ms;
            return None;
        }

        if raw != self.stable && now_ms.saturating_sub(self.last_change_ms) >= self.window_ms {
            self.stable = raw;
            return Some(if raw { Edge::Rising } else { Edge::Falling });
        }

        None
    }

    /// Current debounced level (the seed level until the first edge).
    pub fn stable_level(&self) -> bool {
        self.stable
    }
}
