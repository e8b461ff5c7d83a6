//! Supervisor — the hexagonal core.
//!
//! [`Supervisor`] owns the authoritative [`PowerState`], the per-line
//! debouncers, and the watchdog cadence.  One instance, one thread: no
//! other writer of the state exists by design, so no locking is needed.
//!
//! ```text
//!  DigitalInput ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                   │        Supervisor        │
//! DigitalOutput ◀── │  Debounce · FSM · Recon  │ ──▶ ServiceControl
//!                   └──────────────────────────┘ ──▶ SystemControl
//! ```
//!
//! Each [`poll`](Supervisor::poll) samples the raw lines, debounces them,
//! feeds the resulting logical events to the pure transition function in
//! arrival order, and on a slower cadence samples hardware reality for
//! the reconciliation watchdog.  Effects come back as ordered lists and
//! are applied here, in exactly the order emitted.

use log::{error, info, warn};

use crate::config::{ControllerConfig, UpsMode};
use crate::drivers::debounce::{Debouncer, Edge};
use crate::error::Error;
use crate::fsm::{self, ButtonId, Effect, EffectList, Event, PowerState};
use crate::watchdog::{self, HardwareReality};

use super::events::AppEvent;
use super::ports::{DigitalInput, DigitalOutput, EventSink, InputLine, ServiceControl, SystemControl};

// ───────────────────────────────────────────────────────────────
// Supervisor
// ───────────────────────────────────────────────────────────────

/// The supervisor orchestrates all domain logic.
pub struct Supervisor {
    state: PowerState,
    start_button: Debouncer,
    stop_button: Debouncer,
    /// Present only when UPS monitoring is configured.
    mains: Option<Debouncer>,
    watchdog_period_ms: u64,
    last_watchdog_ms: u64,
    /// The OS halt is issued at most once per process.
    shutdown_invoked: bool,
    poll_count: u64,
}

impl Supervisor {
    /// Construct from configuration.  Does **not** touch hardware —
    /// call [`boot`](Self::boot) next.
    pub fn new(config: &ControllerConfig) -> Self {
        let mains = (config.ups.mode == UpsMode::Gpio)
            .then(|| Debouncer::new(config.ups.debounce_ms));

        Self {
            state: PowerState::Idle,
            start_button: Debouncer::new(config.buttons.debounce_ms),
            stop_button: Debouncer::new(config.buttons.debounce_ms),
            mains,
            watchdog_period_ms: config.watchdog.period_secs * 1000,
            last_watchdog_ms: 0,
            shutdown_invoked: false,
            poll_count: 0,
        }
    }

    /// Authoritative current state.
    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Total polls executed since boot.
    pub fn poll_count(&self) -> u64 {
        self.poll_count
    }

    // ── Boot ──────────────────────────────────────────────────

    /// Run the unconditional boot sequence: relay off, service stopped,
    /// state forced to `Idle` — regardless of the hardware's prior
    /// condition.  Failures are logged, not fatal: the reconciliation
    /// watchdog retries whatever did not stick.
    pub fn boot(
        &mut self,
        hw: &mut impl DigitalOutput,
        svc: &mut impl ServiceControl,
        sink: &mut impl EventSink,
    ) {
        info!("boot: forcing relay OFF and stopping service");
        for effect in fsm::boot_effects() {
            match effect {
                Effect::SetRelay(on) => {
                    if let Err(e) = hw.set_relay(on) {
                        warn!("boot: relay write failed ({e}) — watchdog will retry");
                        sink.emit(&AppEvent::EffectFailed(e.into()));
                    }
                }
                Effect::StopService => {
                    if let Err(e) = svc.stop() {
                        warn!("boot: service stop failed ({e}) — watchdog will retry");
                        sink.emit(&AppEvent::EffectFailed(e.into()));
                    }
                }
                // boot_effects never emits these.
                Effect::StartService | Effect::InvokeShutdown => {}
            }
        }
        self.state = PowerState::Idle;
        sink.emit(&AppEvent::Started(self.state));
        info!("boot complete — controller in Idle");
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one supervision cycle at monotonic time `now_ms`.
    ///
    /// The `hw` parameter satisfies both digital-line ports — this avoids
    /// a double mutable borrow while keeping the boundary explicit.
    pub fn poll(
        &mut self,
        now_ms: u64,
        hw: &mut (impl DigitalInput + DigitalOutput),
        svc: &mut impl ServiceControl,
        sys: &mut impl SystemControl,
        sink: &mut impl EventSink,
    ) {
        self.poll_count += 1;

        // Terminal: the OS is halting underneath us; stop driving I/O.
        if self.state == PowerState::EmergencyShutdown {
            return;
        }

        // 1. Sample and debounce the input lines, feeding logical events
        //    to the state machine in arrival order.  A failed read means
        //    that line's sample is unavailable this tick — skip, retry
        //    next tick.
        for event in self.sample_events(now_ms, hw) {
            self.handle_event(event, hw, svc, sys, sink);
            if self.state == PowerState::EmergencyShutdown {
                return;
            }
        }

        // 2. Reconciliation watchdog on its own slower cadence.
        if now_ms.saturating_sub(self.last_watchdog_ms) >= self.watchdog_period_ms {
            self.last_watchdog_ms = now_ms;
            self.watchdog_tick(hw, svc, sink);
        }
    }

    // ── Internal: input sampling ──────────────────────────────

    /// Debounced logical events observed this tick, in arrival order.
    fn sample_events(
        &mut self,
        now_ms: u64,
        hw: &mut impl DigitalInput,
    ) -> EventBatch {
        let mut batch = EventBatch::new();

        match hw.read(InputLine::StartButton) {
            Ok(raw) => {
                if self.start_button.observe(raw, now_ms) == Some(Edge::Rising) {
                    let _ = batch.push(Event::ButtonPressed(ButtonId::Start));
                }
            }
            Err(e) => warn!("start button read failed ({e}), retrying next tick"),
        }

        match hw.read(InputLine::StopButton) {
            Ok(raw) => {
                if self.stop_button.observe(raw, now_ms) == Some(Edge::Rising) {
                    let _ = batch.push(Event::ButtonPressed(ButtonId::Stop));
                }
            }
            Err(e) => warn!("stop button read failed ({e}), retrying next tick"),
        }

        if let Some(mains) = self.mains.as_mut() {
            match hw.read(InputLine::MainsLost) {
                Ok(raw) => {
                    // The adapter maps edge polarity: true = mains lost.
                    if mains.observe(raw, now_ms) == Some(Edge::Rising) {
                        let _ = batch.push(Event::PowerLoss);
                    }
                }
                Err(e) => warn!("UPS line read failed ({e}), retrying next tick"),
            }
        }

        batch
    }

    // ── Internal: event handling ──────────────────────────────

    fn handle_event(
        &mut self,
        event: Event,
        hw: &mut impl DigitalOutput,
        svc: &mut impl ServiceControl,
        sys: &mut impl SystemControl,
        sink: &mut impl EventSink,
    ) {
        match event {
            Event::ButtonPressed(id) => {
                info!("{id:?} button pressed");
                sink.emit(&AppEvent::ButtonPressed(id));
            }
            Event::PowerLoss => {
                error!("UPS power-loss detected!");
                sink.emit(&AppEvent::PowerLossDetected);
            }
        }

        let from = self.state;
        let (to, effects) = fsm::transition(from, event);

        if effects.is_empty() && to == from {
            // Guarded no-op: repeated or irrelevant input.
            info!("{event:?} ignored in {from:?} (no-op)");
            return;
        }

        self.state = to;

        if to == PowerState::EmergencyShutdown {
            self.apply_emergency(&effects, hw, svc, sys, sink);
        } else {
            self.apply_normal(&effects, hw, svc, sink);
        }

        if self.state != from {
            sink.emit(&AppEvent::StateChanged {
                from,
                to: self.state,
            });
            info!("state: {from:?} -> {:?}", self.state);
        }
    }

    /// Apply a normal (non-emergency) effect list in order.
    ///
    /// A failed relay write is logged and healed by the next watchdog
    /// tick.  A failed service start after the relay energised reverts
    /// the whole transition — stop best-effort, relay off, back to Idle —
    /// so an energised PSU with no renderer never outlives one tick.
    fn apply_normal(
        &mut self,
        effects: &EffectList,
        hw: &mut impl DigitalOutput,
        svc: &mut impl ServiceControl,
        sink: &mut impl EventSink,
    ) {
        for effect in effects {
            match effect {
                Effect::SetRelay(on) => {
                    if let Err(e) = hw.set_relay(*on) {
                        error!("relay write failed ({e}) — watchdog will correct");
                        sink.emit(&AppEvent::EffectFailed(e.into()));
                    }
                }
                Effect::StartService => {
                    if let Err(e) = svc.start() {
                        error!("service start failed ({e}) — reverting to Idle");
                        sink.emit(&AppEvent::EffectFailed(e.into()));
                        let _ = svc.stop();
                        if let Err(e) = hw.set_relay(false) {
                            error!("revert relay write failed ({e}) — watchdog will correct");
                        }
                        self.state = PowerState::Idle;
                        return;
                    }
                }
                Effect::StopService => {
                    if let Err(e) = svc.stop() {
                        error!("service stop failed ({e})");
                        sink.emit(&AppEvent::EffectFailed(e.into()));
                    }
                }
                Effect::InvokeShutdown => {
                    // Only the emergency path carries this effect.
                    debug_assert!(false, "InvokeShutdown outside emergency sequence");
                }
            }
        }
    }

    /// Apply the emergency teardown.  Safety over cleanliness: every
    /// error is logged and execution continues to the next step — the
    /// relay must drop and the halt must be issued regardless.
    fn apply_emergency(
        &mut self,
        effects: &EffectList,
        hw: &mut impl DigitalOutput,
        svc: &mut impl ServiceControl,
        sys: &mut impl SystemControl,
        sink: &mut impl EventSink,
    ) {
        for effect in effects {
            let result: Result<(), Error> = match effect {
                Effect::StopService => svc.stop().map_err(Into::into),
                Effect::SetRelay(on) => hw.set_relay(*on).map_err(Into::into),
                Effect::InvokeShutdown => {
                    if self.shutdown_invoked {
                        Ok(())
                    } else {
                        self.shutdown_invoked = true;
                        error!("executing system halt for safe power-down");
                        sys.halt_now().map_err(Into::into)
                    }
                }
                Effect::StartService => Ok(()),
            };
            if let Err(e) = result {
                error!("emergency step {effect:?} failed ({e}) — continuing");
                sink.emit(&AppEvent::EffectFailed(e));
            }
        }
    }

    // ── Internal: reconciliation ──────────────────────────────

    fn watchdog_tick(
        &mut self,
        hw: &mut impl DigitalOutput,
        svc: &mut impl ServiceControl,
        sink: &mut impl EventSink,
    ) {
        // Fresh reality sample, never cached.  If either probe fails the
        // sample is unavailable this tick; retry on the next cadence.
        let relay_on = match hw.relay_is_on() {
            Ok(level) => level,
            Err(e) => {
                warn!("watchdog: relay readback failed ({e}), skipping tick");
                return;
            }
        };
        let service_running = match svc.is_running() {
            Ok(active) => active,
            Err(e) => {
                warn!("watchdog: service status failed ({e}), skipping tick");
                return;
            }
        };

        let reality = HardwareReality {
            relay_on,
            service_running,
        };

        let Some((corrected, effects)) = watchdog::reconcile(self.state, reality) else {
            return;
        };

        let declared = self.state;
        self.state = corrected;
        self.apply_normal(&effects, hw, svc, sink);
        sink.emit(&AppEvent::MismatchCorrected {
            declared,
            corrected: self.state,
        });
        if declared != self.state {
            sink.emit(&AppEvent::StateChanged {
                from: declared,
                to: self.state,
            });
        }
    }
}

/// Up to one edge per monitored line per tick.
type EventBatch = heapless::Vec<Event, 3>;
