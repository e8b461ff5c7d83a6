//! Adapters — concrete implementations of the port traits.
//!
//! The only modules in the system that touch real GPIO, systemd, or the
//! OS.  `dry_run` provides logging stand-ins for every port so the whole
//! daemon can run on a development machine; the core cannot tell the
//! difference.

pub mod dry_run;
pub mod log_sink;

#[cfg(feature = "rpi")]
pub mod gpio;

#[cfg(unix)]
pub mod systemd;
