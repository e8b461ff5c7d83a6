//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events
//! through the log facade (journald picks them up from stdout when the
//! daemon runs under systemd).  A future status-socket adapter would
//! implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("EVENT | started, initial_state={state:?}");
            }
            AppEvent::StateChanged { from, to } => {
                info!("EVENT | state {from:?} -> {to:?}");
            }
            AppEvent::ButtonPressed(id) => {
                info!("EVENT | button {id:?} pressed");
            }
            AppEvent::PowerLossDetected => {
                warn!("EVENT | UPS power loss detected");
            }
            AppEvent::MismatchCorrected { declared, corrected } => {
                warn!("EVENT | watchdog corrected {declared:?} -> {corrected:?}");
            }
            AppEvent::EffectFailed(e) => {
                warn!("EVENT | effect failed: {e}");
            }
        }
    }
}
