//! Unified error types for the matrix controller.
//!
//! A single `Error` enum every subsystem converts into, keeping the
//! supervisor loop's handling uniform.  Variants are `Copy`: adapters log
//! the underlying OS detail at the failure site and surface only the
//! typed category, which is all the recovery logic keys on.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A digital line read or write failed.  Never fatal after startup:
    /// the sample is treated as unavailable for that tick and retried.
    Gpio(GpioError),
    /// A service start/stop/status call failed or timed out.
    Service(ServiceError),
    /// Configuration is invalid.  Fatal — the daemon refuses to start
    /// rather than run with undefined wiring assumptions.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpio(e) => write!(f, "gpio: {e}"),
            Self::Service(e) => write!(f, "service: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// GPIO errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioError {
    /// Reading a digital input line failed.
    ReadFailed,
    /// Driving the relay output line failed.
    WriteFailed,
    /// Claiming or configuring a line at startup failed.
    Init,
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed => write!(f, "line read failed"),
            Self::WriteFailed => write!(f, "line write failed"),
            Self::Init => write!(f, "line init failed"),
        }
    }
}

impl From<GpioError> for Error {
    fn from(e: GpioError) -> Self {
        Self::Gpio(e)
    }
}

// ---------------------------------------------------------------------------
// Service control errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceError {
    /// `start` returned a non-success status.
    StartFailed,
    /// `stop` returned a non-success status (other than "not loaded",
    /// which counts as already stopped).
    StopFailed,
    /// Status query failed.
    StatusFailed,
    /// The call did not complete within its bounded timeout.
    Timeout,
    /// The control process could not be spawned at all.
    Spawn,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartFailed => write!(f, "start failed"),
            Self::StopFailed => write!(f, "stop failed"),
            Self::StatusFailed => write!(f, "status query failed"),
            Self::Timeout => write!(f, "timed out"),
            Self::Spawn => write!(f, "could not spawn control process"),
        }
    }
}

impl From<ServiceError> for Error {
    fn from(e: ServiceError) -> Self {
        Self::Service(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
