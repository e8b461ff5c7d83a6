//! Property tests for the pure supervision core.
//!
//! The transition function, the reconciliation watchdog, and the
//! debouncer are all data-in/data-out; proptest drives them with
//! arbitrary inputs to pin down the invariants the hand-written cases
//! cannot enumerate.

use proptest::prelude::*;

use matrix_controller::drivers::debounce::{Debouncer, Edge};
use matrix_controller::fsm::{transition, ButtonId, Effect, Event, PowerState};
use matrix_controller::watchdog::{reconcile, HardwareReality};

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::ButtonPressed(ButtonId::Start)),
        Just(Event::ButtonPressed(ButtonId::Stop)),
        Just(Event::PowerLoss),
    ]
}

fn arb_state() -> impl Strategy<Value = PowerState> {
    prop_oneof![
        Just(PowerState::Idle),
        Just(PowerState::Running),
        Just(PowerState::EmergencyShutdown),
    ]
}

// ── Transition function ───────────────────────────────────────

proptest! {
    /// Once EmergencyShutdown is reached, no event sequence ever leaves
    /// it or produces further effects.
    #[test]
    fn emergency_shutdown_is_absorbing(
        events in proptest::collection::vec(arb_event(), 1..50),
    ) {
        let mut state = PowerState::EmergencyShutdown;
        for event in events {
            let (next, fx) = transition(state, event);
            prop_assert_eq!(next, PowerState::EmergencyShutdown);
            prop_assert!(fx.is_empty());
            state = next;
        }
    }

    /// In every effect list that contains both, StopService precedes
    /// SetRelay(off) — software goes down before power does.
    #[test]
    fn service_stop_always_precedes_relay_off(
        state in arb_state(),
        event in arb_event(),
    ) {
        let (_, fx) = transition(state, event);
        let stop = fx.iter().position(|e| *e == Effect::StopService);
        let relay_off = fx.iter().position(|e| *e == Effect::SetRelay(false));
        if let (Some(s), Some(r)) = (stop, relay_off) {
            prop_assert!(s < r);
        }
    }

    /// InvokeShutdown appears only as the final effect, only when the
    /// transition lands in EmergencyShutdown, and only after a relay-off.
    #[test]
    fn shutdown_effect_is_last_and_guarded(
        state in arb_state(),
        event in arb_event(),
    ) {
        let (next, fx) = transition(state, event);
        if let Some(pos) = fx.iter().position(|e| *e == Effect::InvokeShutdown) {
            prop_assert_eq!(next, PowerState::EmergencyShutdown);
            prop_assert_eq!(pos, fx.len() - 1);
            let relay_off = fx.iter().position(|e| *e == Effect::SetRelay(false));
            prop_assert!(relay_off.is_some_and(|r| r < pos));
        }
    }

    /// The function is a pure mapping: identical inputs give identical
    /// outputs (and a no-move transition emits nothing).
    #[test]
    fn transition_is_deterministic_and_quiet_when_static(
        state in arb_state(),
        event in arb_event(),
    ) {
        let a = transition(state, event);
        let b = transition(state, event);
        prop_assert_eq!(a.clone(), b);
        if a.0 == state {
            prop_assert!(a.1.is_empty(), "no state change must mean no effects");
        }
    }

    /// Any event sequence from Idle keeps the state within the closed
    /// three-state set and applies at most one InvokeShutdown.
    #[test]
    fn event_sequences_stay_closed_with_single_halt(
        events in proptest::collection::vec(arb_event(), 1..100),
    ) {
        let mut state = PowerState::Idle;
        let mut halts = 0usize;
        for event in events {
            let (next, fx) = transition(state, event);
            halts += fx.iter().filter(|e| **e == Effect::InvokeShutdown).count();
            state = next;
        }
        prop_assert!(halts <= 1);
    }
}

// ── Reconciliation watchdog ───────────────────────────────────

fn arb_reality() -> impl Strategy<Value = HardwareReality> {
    (any::<bool>(), any::<bool>()).prop_map(|(relay_on, service_running)| HardwareReality {
        relay_on,
        service_running,
    })
}

proptest! {
    /// The watchdog never escalates to EmergencyShutdown and never
    /// starts the service or halts the OS.
    #[test]
    fn watchdog_corrections_are_conservative(
        state in arb_state(),
        reality in arb_reality(),
    ) {
        if let Some((next, fx)) = reconcile(state, reality) {
            prop_assert_ne!(next, PowerState::EmergencyShutdown);
            prop_assert!(!fx.contains(&Effect::InvokeShutdown));
            prop_assert!(!fx.contains(&Effect::StartService));
        }
    }

    /// One correction converges: applying the emitted effects to the
    /// observed reality yields a snapshot the watchdog is silent about.
    #[test]
    fn watchdog_converges_in_one_step(
        state in arb_state(),
        reality in arb_reality(),
    ) {
        if let Some((next, fx)) = reconcile(state, reality) {
            let mut healed = reality;
            for effect in &fx {
                match effect {
                    Effect::SetRelay(on) => healed.relay_on = *on,
                    Effect::StopService => healed.service_running = false,
                    Effect::StartService => healed.service_running = true,
                    Effect::InvokeShutdown => {}
                }
            }
            prop_assert_eq!(reconcile(next, healed), None);
        }
    }
}

// ── Debouncer ─────────────────────────────────────────────────

proptest! {
    /// Arbitrary flicker confined to a span shorter than the window
    /// emits no edge.
    #[test]
    fn flicker_within_window_never_emits(
        samples in proptest::collection::vec(any::<bool>(), 1..30),
    ) {
        let window = 80u64;
        let mut d = Debouncer::new(window);
        d.observe(false, 0);
        // All samples land inside (0, window): shorter than one window
        // regardless of pattern, so nothing can qualify as stable yet
        // except the seeded level itself.
        let mut edges = 0;
        for (i, raw) in samples.iter().enumerate() {
            let t = 1 + (i as u64 * (window - 2)) / samples.len() as u64;
            if d.observe(*raw, t).is_some() {
                edges += 1;
            }
        }
        prop_assert_eq!(edges, 0);
    }

    /// After any noise, holding a level for a full window yields at most
    /// one edge, and the debounced level equals the held level.
    #[test]
    fn settling_emits_at_most_one_edge(
        noise in proptest::collection::vec(any::<bool>(), 0..20),
        held in any::<bool>(),
    ) {
        let window = 80u64;
        let mut d = Debouncer::new(window);
        d.observe(false, 0);

        let mut t = 0u64;
        for raw in noise {
            t += 10;
            let _ = d.observe(raw, t);
        }

        // Hold `held` for two full windows of samples.
        let mut edges = 0;
        for _ in 0..20 {
            t += 10;
            if d.observe(held, t).is_some() {
                edges += 1;
            }
        }
        prop_assert!(edges <= 1);
        prop_assert_eq!(d.stable_level(), held);
    }
}
