//! Input-conditioning drivers.

pub mod debounce;
