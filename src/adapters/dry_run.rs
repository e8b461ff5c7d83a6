//! Dry-run collaborator stand-ins.
//!
//! Log-only implementations of every port, with just enough simulated
//! state (relay level, service activity) that the reconciliation
//! watchdog sees a consistent world.  Dry-run is a property of the
//! collaborators, not of the core: the supervisor runs the exact same
//! code paths it runs against real hardware.

use log::info;

use crate::app::ports::{DigitalInput, DigitalOutput, InputLine, ServiceControl, SystemControl};
use crate::error::{GpioError, ServiceError};

/// Simulated digital lines: buttons never pressed, mains never lost,
/// relay level tracked in memory.
pub struct DryRunGpio {
    relay_on: bool,
}

impl DryRunGpio {
    pub fn new() -> Self {
        Self { relay_on: false }
    }
}

impl DigitalInput for DryRunGpio {
    fn read(&mut self, _line: InputLine) -> Result<bool, GpioError> {
        Ok(false)
    }
}

impl DigitalOutput for DryRunGpio {
    fn set_relay(&mut self, on: bool) -> Result<(), GpioError> {
        info!("[dry-run] relay -> {}", if on { "ON" } else { "OFF" });
        self.relay_on = on;
        Ok(())
    }

    fn relay_is_on(&mut self) -> Result<bool, GpioError> {
        Ok(self.relay_on)
    }
}

/// Simulated rendering service that tracks start/stop in memory.
pub struct DryRunService {
    name: String,
    running: bool,
}

impl DryRunService {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            running: false,
        }
    }
}

impl ServiceControl for DryRunService {
    fn start(&mut self) -> Result<(), ServiceError> {
        info!("[dry-run] would start {}", self.name);
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ServiceError> {
        info!("[dry-run] would stop {}", self.name);
        self.running = false;
        Ok(())
    }

    fn is_running(&mut self) -> Result<bool, ServiceError> {
        Ok(self.running)
    }
}

/// Simulated OS halt.
pub struct DryRunSystem;

impl SystemControl for DryRunSystem {
    fn halt_now(&mut self) -> Result<(), ServiceError> {
        info!("[dry-run] would execute: shutdown -h now");
        Ok(())
    }
}
