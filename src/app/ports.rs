//! Port traits — the hexagonal boundary between the supervisor core and
//! the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Supervisor (domain)
//! ```
//!
//! Adapters (real GPIO, systemd, dry-run stand-ins) implement these
//! traits; the [`Supervisor`](super::service::Supervisor) consumes them
//! via generics, so the core never touches hardware directly and cannot
//! tell a dry-run collaborator from a real one.

use crate::app::events::AppEvent;
use crate::error::{GpioError, ServiceError};

// ───────────────────────────────────────────────────────────────
// Digital input (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// The monitored input lines.  The core speaks in roles, never pin
/// numbers — pin assignment and pull/polarity live in the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputLine {
    StartButton,
    StopButton,
    /// UPS sense line; the adapter maps the configured edge polarity so
    /// `true` always means "mains lost".
    MainsLost,
}

/// Read-side port for raw digital levels.
pub trait DigitalInput {
    /// Instantaneous raw logical level of a line.  `true` = asserted
    /// (button pressed / mains lost).
    fn read(&mut self, line: InputLine) -> Result<bool, GpioError>;
}

// ───────────────────────────────────────────────────────────────
// Digital output (domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the relay line.  Logical on/off only;
/// active-high/active-low is resolved by the adapter from configuration.
pub trait DigitalOutput {
    /// Drive the relay.  Must be synchronous: when this returns `Ok`,
    /// the line is at the requested level.
    fn set_relay(&mut self, on: bool) -> Result<(), GpioError>;

    /// Actual logical level the relay line currently reads.
    fn relay_is_on(&mut self) -> Result<bool, GpioError>;
}

// ───────────────────────────────────────────────────────────────
// Service control (domain → OS service manager)
// ───────────────────────────────────────────────────────────────

/// Rendering-service lifecycle.  Calls are bounded by the adapter's
/// configured timeouts; an exceeded ceiling surfaces as
/// [`ServiceError::Timeout`], never an indefinite block.
pub trait ServiceControl {
    fn start(&mut self) -> Result<(), ServiceError>;

    /// Stopping an already-stopped (or not-loaded) service is success.
    fn stop(&mut self) -> Result<(), ServiceError>;

    fn is_running(&mut self) -> Result<bool, ServiceError>;
}

// ───────────────────────────────────────────────────────────────
// System control (domain → OS)
// ───────────────────────────────────────────────────────────────

/// Irreversible OS halt.  The core calls this exactly once per
/// EmergencyShutdown entry.
pub trait SystemControl {
    fn halt_now(&mut self) -> Result<(), ServiceError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`AppEvent`]s through this port; adapters
/// decide where they go (journald via the log facade, a future socket,
/// a test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}
