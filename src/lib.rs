//! Matrix controller library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection.  Hardware-specific code lives in `adapters` behind the
//! `rpi` feature and `cfg(unix)` guards.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod watchdog;

pub mod adapters;
