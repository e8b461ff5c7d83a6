//! Outbound application events.
//!
//! The [`Supervisor`](super::service::Supervisor) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them — log to journald, feed a status
//! socket, record in tests.

use crate::error::Error;
use crate::fsm::{ButtonId, PowerState};

/// Structured events emitted by the supervisor core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Boot sequence complete (carries the forced initial state).
    Started(PowerState),

    /// The state machine moved.
    StateChanged { from: PowerState, to: PowerState },

    /// A debounced button press was accepted (possibly as a guarded
    /// no-op; the state change, if any, arrives separately).
    ButtonPressed(ButtonId),

    /// The mains-lost line fired its configured edge.
    PowerLossDetected,

    /// The watchdog found declared state and reality disagreeing and
    /// issued corrections.
    MismatchCorrected { declared: PowerState, corrected: PowerState },

    /// An effect failed while being applied.  During an emergency
    /// sequence the remaining effects still run.
    EffectFailed(Error),
}
