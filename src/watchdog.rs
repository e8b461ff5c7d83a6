//! Reconciliation watchdog.
//!
//! Runs on a slow cadence inside the supervisor loop and compares the
//! declared [`PowerState`] against observed hardware reality.  Declared
//! state is the source of truth; reality is sampled fresh every tick and
//! never cached.  The check itself is a pure mapping — effects are applied
//! by the caller — which keeps every mismatch case table-testable.
//!
//! The watchdog also doubles as the recovery path for a failed relay
//! write: a Stop transition whose `SetRelay(off)` errored leaves the relay
//! reading ON in `Idle`, which the next tick corrects.
//!
//! It never escalates to `EmergencyShutdown`; that path belongs to the
//! power-loss signal alone.

use log::warn;

use crate::fsm::{Effect, EffectList, PowerState};

/// Observed hardware/service snapshot for one watchdog tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareReality {
    /// Actual logical level of the relay output line.
    pub relay_on: bool,
    /// Whether the rendering service is actually active.
    pub service_running: bool,
}

/// Compare declared state against reality.
///
/// Returns `None` when everything is consistent (or the state is
/// terminal); otherwise the corrected state and the ordered effects that
/// re-establish it.
pub fn reconcile(
    state: PowerState,
    reality: HardwareReality,
) -> Option<(PowerState, EffectList)> {
    match state {
        // Terminal: the process is already halting, leave hardware alone.
        PowerState::EmergencyShutdown => None,

        PowerState::Running => {
            if !reality.service_running {
                // Renderer died underneath us.  Demote rather than
                // restart: a crash-looping renderer under an energised
                // PSU is the failure mode this supervisor exists to stop.
                warn!("watchdog: declared Running but service is dead — demoting to Idle");
                let mut fx = EffectList::new();
                let _ = fx.push(Effect::SetRelay(false));
                Some((PowerState::Idle, fx))
            } else if !reality.relay_on {
                // Service alive but relay reads OFF (failed or glitched
                // write).  Re-assert the declared state.
                warn!("watchdog: declared Running but relay reads OFF — re-asserting");
                let mut fx = EffectList::new();
                let _ = fx.push(Effect::SetRelay(true));
                Some((PowerState::Running, fx))
            } else {
                None
            }
        }

        PowerState::Idle => {
            let mut fx = EffectList::new();
            if reality.service_running {
                warn!("watchdog: declared Idle but service is active — stopping it");
                let _ = fx.push(Effect::StopService);
            }
            if reality.relay_on {
                warn!("watchdog: declared Idle but relay reads ON — turning it OFF");
                let _ = fx.push(Effect::SetRelay(false));
            }
            if fx.is_empty() {
                None
            } else {
                Some((PowerState::Idle, fx))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn reality(relay_on: bool, service_running: bool) -> HardwareReality {
        HardwareReality {
            relay_on,
            service_running,
        }
    }

    #[test]
    fn running_with_dead_service_demotes_to_idle() {
        let out = reconcile(PowerState::Running, reality(true, false));
        let (state, fx) = out.expect("mismatch must be reported");
        assert_eq!(state, PowerState::Idle);
        assert_eq!(&fx[..], &[Effect::SetRelay(false)]);
    }

    #[test]
    fn running_with_relay_off_reasserts_relay() {
        let out = reconcile(PowerState::Running, reality(false, true));
        let (state, fx) = out.expect("mismatch must be reported");
        assert_eq!(state, PowerState::Running);
        assert_eq!(&fx[..], &[Effect::SetRelay(true)]);
    }

    #[test]
    fn running_consistent_is_silent() {
        assert_eq!(reconcile(PowerState::Running, reality(true, true)), None);
    }

    #[test]
    fn idle_with_relay_on_drops_relay() {
        let out = reconcile(PowerState::Idle, reality(true, false));
        let (state, fx) = out.expect("mismatch must be reported");
        assert_eq!(state, PowerState::Idle);
        assert_eq!(&fx[..], &[Effect::SetRelay(false)]);
    }

    #[test]
    fn idle_with_service_running_stops_it() {
        let out = reconcile(PowerState::Idle, reality(false, true));
        let (state, fx) = out.expect("mismatch must be reported");
        assert_eq!(state, PowerState::Idle);
        assert_eq!(&fx[..], &[Effect::StopService]);
    }

    #[test]
    fn idle_with_both_wrong_stops_service_before_relay() {
        let out = reconcile(PowerState::Idle, reality(true, true));
        let (_, fx) = out.expect("mismatch must be reported");
        assert_eq!(&fx[..], &[Effect::StopService, Effect::SetRelay(false)]);
    }

    #[test]
    fn idle_consistent_is_silent() {
        assert_eq!(reconcile(PowerState::Idle, reality(false, false)), None);
    }

    #[test]
    fn emergency_shutdown_is_never_touched() {
        for relay in [false, true] {
            for svc in [false, true] {
                assert_eq!(
                    reconcile(PowerState::EmergencyShutdown, reality(relay, svc)),
                    None
                );
            }
        }
    }

    #[test]
    fn watchdog_never_emits_shutdown_or_service_start() {
        for state in [PowerState::Idle, PowerState::Running] {
            for relay in [false, true] {
                for svc in [false, true] {
                    if let Some((next, fx)) = reconcile(state, reality(relay, svc)) {
                        assert_ne!(next, PowerState::EmergencyShutdown);
                        assert!(!fx.contains(&Effect::InvokeShutdown));
                        assert!(!fx.contains(&Effect::StartService));
                    }
                }
            }
        }
    }
}
