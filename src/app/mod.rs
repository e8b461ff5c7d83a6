//! Application core — pure supervision logic, zero I/O.
//!
//! The business rules of the controller: the power state machine, input
//! debouncing, and reality reconciliation, orchestrated by
//! [`service::Supervisor`].  All interaction with hardware and the OS
//! happens through the **port traits** in [`ports`], keeping this layer
//! fully testable without a Raspberry Pi.

pub mod events;
pub mod ports;
pub mod service;
