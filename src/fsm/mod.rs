//! Power state machine.
//!
//! The single source of truth for what the rest of the system should be
//! doing.  Three states, closed enum, exhaustive transition table:
//!
//! ```text
//! ┌──────┐  StartPressed   ┌─────────┐
//! │ Idle │ ───────────────▶│ Running │
//! │      │ ◀───────────────│         │
//! └──────┘   StopPressed   └─────────┘
//!     │                         │
//!     │ PowerLoss               │ PowerLoss
//!     ▼                         ▼
//! ┌───────────────────────────────────┐
//! │        EmergencyShutdown          │  (terminal)
//! └───────────────────────────────────┘
//! ```
//!
//! [`transition`] is a pure mapping `(state, event) -> (state, effects)`.
//! It performs no I/O; the supervisor applies the returned [`Effect`]s in
//! the exact order given.  Ordering is the safety contract: the rendering
//! service is always stopped **before** the relay is de-energised, and the
//! relay is de-energised **before** any OS halt is invoked.  Cutting PSU
//! power under a live renderer risks corruption; stopping software first
//! is always safe.

use heapless::Vec;

// ---------------------------------------------------------------------------
// States and events
// ---------------------------------------------------------------------------

/// Authoritative controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    /// Relay off, rendering service stopped.  Initial state, forced on boot.
    Idle,
    /// Relay on, rendering service running.
    Running,
    /// Mains power lost; the process is halting.  Terminal — no event
    /// leaves this state for the remainder of the process lifetime.
    EmergencyShutdown,
}

/// Which physical button produced a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonId {
    Start,
    Stop,
}

/// A logical, already-debounced input event.  Consumed exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    ButtonPressed(ButtonId),
    /// Debounced edge on the UPS mains-lost line.
    PowerLoss,
}

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// Side-effect command emitted by a transition.  Never an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Drive the relay line (logical on/off; polarity is the adapter's job).
    SetRelay(bool),
    StartService,
    StopService,
    /// Irreversible OS halt.  Issued only after the relay is off in
    /// program order, and at most once per process.
    InvokeShutdown,
}

/// Ordered effect list.  The longest sequence (power loss) is three
/// effects; capacity 4 keeps the type `Copy`-friendly and heap-free.
pub type EffectList = Vec<Effect, 4>;

fn effects(list: &[Effect]) -> EffectList {
    // Infallible: every call site passes at most 4 effects.
    EffectList::from_slice(list).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Transition function
// ---------------------------------------------------------------------------

/// Pure transition function.
///
/// Guards make repeated or irrelevant events no-ops: pressing Start while
/// already `Running`, or Stop while `Idle`, returns the same state with an
/// empty effect list.  `EmergencyShutdown` swallows everything.
pub fn transition(state: PowerState, event: Event) -> (PowerState, EffectList) {
    use ButtonId::{Start, Stop};

    match (state, event) {
        // Operator start: energise the PSU, then bring up the renderer.
        (PowerState::Idle, Event::ButtonPressed(Start)) => (
            PowerState::Running,
            effects(&[Effect::SetRelay(true), Effect::StartService]),
        ),

        // Operator stop: renderer down first, then cut PSU power.
        (PowerState::Running, Event::ButtonPressed(Stop)) => (
            PowerState::Idle,
            effects(&[Effect::StopService, Effect::SetRelay(false)]),
        ),

        // Mains lost: full ordered teardown ending in an OS halt.
        // Fires from Idle too — the Pi itself must still halt cleanly.
        (PowerState::Idle | PowerState::Running, Event::PowerLoss) => (
            PowerState::EmergencyShutdown,
            effects(&[
                Effect::StopService,
                Effect::SetRelay(false),
                Effect::InvokeShutdown,
            ]),
        ),

        // Everything else is a guarded no-op, including every event in
        // EmergencyShutdown.
        (s, _) => (s, EffectList::new()),
    }
}

/// Unconditional boot sequence.
///
/// Not a transition — there is no prior in-memory state.  Forces the
/// hardware into the Idle invariant (relay off, service stopped)
/// regardless of what was energised before the daemon started.  Stopping
/// an already-stopped service is safe, so no reality check is needed.
pub fn boot_effects() -> EffectList {
    effects(&[Effect::SetRelay(false), Effect::StopService])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_from_idle_orders_relay_before_service() {
        let (next, fx) = transition(PowerState::Idle, Event::ButtonPressed(ButtonId::Start));
        assert_eq!(next, PowerState::Running);
        assert_eq!(&fx[..], &[Effect::SetRelay(true), Effect::StartService]);
    }

    #[test]
    fn stop_from_running_orders_service_before_relay() {
        let (next, fx) = transition(PowerState::Running, Event::ButtonPressed(ButtonId::Stop));
        assert_eq!(next, PowerState::Idle);
        assert_eq!(&fx[..], &[Effect::StopService, Effect::SetRelay(false)]);
    }

    #[test]
    fn power_loss_from_running_is_full_teardown() {
        let (next, fx) = transition(PowerState::Running, Event::PowerLoss);
        assert_eq!(next, PowerState::EmergencyShutdown);
        assert_eq!(
            &fx[..],
            &[
                Effect::StopService,
                Effect::SetRelay(false),
                Effect::InvokeShutdown,
            ]
        );
    }

    #[test]
    fn power_loss_from_idle_gives_same_sequence() {
        let (next, fx) = transition(PowerState::Idle, Event::PowerLoss);
        assert_eq!(next, PowerState::EmergencyShutdown);
        assert_eq!(
            &fx[..],
            &[
                Effect::StopService,
                Effect::SetRelay(false),
                Effect::InvokeShutdown,
            ]
        );
    }

    #[test]
    fn start_while_running_is_a_no_op() {
        let (next, fx) = transition(PowerState::Running, Event::ButtonPressed(ButtonId::Start));
        assert_eq!(next, PowerState::Running);
        assert!(fx.is_empty());
    }

    #[test]
    fn stop_while_idle_is_a_no_op() {
        let (next, fx) = transition(PowerState::Idle, Event::ButtonPressed(ButtonId::Stop));
        assert_eq!(next, PowerState::Idle);
        assert!(fx.is_empty());
    }

    #[test]
    fn emergency_shutdown_is_terminal() {
        for event in [
            Event::ButtonPressed(ButtonId::Start),
            Event::ButtonPressed(ButtonId::Stop),
            Event::PowerLoss,
        ] {
            let (next, fx) = transition(PowerState::EmergencyShutdown, event);
            assert_eq!(next, PowerState::EmergencyShutdown);
            assert!(fx.is_empty(), "terminal state emitted effects for {event:?}");
        }
    }

    #[test]
    fn boot_sequence_forces_relay_off_then_service_stop() {
        let fx = boot_effects();
        assert_eq!(&fx[..], &[Effect::SetRelay(false), Effect::StopService]);
    }

    #[test]
    fn relay_off_never_precedes_service_stop() {
        // In every emitted list that contains both, StopService comes first.
        for state in [PowerState::Idle, PowerState::Running] {
            for event in [
                Event::ButtonPressed(ButtonId::Start),
                Event::ButtonPressed(ButtonId::Stop),
                Event::PowerLoss,
            ] {
                let (_, fx) = transition(state, event);
                let stop = fx.iter().position(|e| *e == Effect::StopService);
                let relay_off = fx.iter().position(|e| *e == Effect::SetRelay(false));
                if let (Some(s), Some(r)) = (stop, relay_off) {
                    assert!(s < r, "{state:?}/{event:?}: relay dropped before service stop");
                }
            }
        }
    }

    #[test]
    fn shutdown_is_always_last_and_follows_relay_off() {
        for state in [PowerState::Idle, PowerState::Running] {
            let (_, fx) = transition(state, Event::PowerLoss);
            assert_eq!(fx.last(), Some(&Effect::InvokeShutdown));
            let relay_off = fx.iter().position(|e| *e == Effect::SetRelay(false));
            assert!(relay_off.is_some_and(|r| r < fx.len() - 1));
        }
    }
}
