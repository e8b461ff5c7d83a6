//! Daemon configuration.
//!
//! Loaded from a YAML file (default `/etc/matrix-controller/controller.yaml`);
//! every section falls back to a safe default so a partial file is valid.
//! The core never reads this directly — pins, polarities and windows are
//! resolved by the adapters, cadences by the supervisor.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub buttons: ButtonConfig,
    pub relay: RelayConfig,
    pub ups: UpsConfig,
    pub led_service: ServiceConfig,
    pub watchdog: WatchdogConfig,
    pub supervisor: SupervisorConfig,
    pub logging: LoggingConfig,
}

/// Start/stop button wiring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonConfig {
    /// BCM pin of the start button (pull-up, pressed = low).
    pub start_pin: u8,
    /// BCM pin of the stop button.
    pub stop_pin: u8,
    /// Debounce window in milliseconds.
    pub debounce_ms: u64,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            start_pin: 18,
            stop_pin: 19,
            debounce_ms: 80,
        }
    }
}

/// Relay output wiring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub pin: u8,
    /// true: driving the line HIGH energises the relay.
    pub active_high: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            pin: 20,
            active_high: true,
        }
    }
}

/// UPS mains-lost monitoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpsConfig {
    pub mode: UpsMode,
    pub mains_lost_pin: u8,
    /// Which edge on the sense line means "mains lost".
    pub edge: UpsEdge,
    /// Debounce window for the sense line.  Wider than the buttons so a
    /// momentary sag does not trigger a false shutdown.
    pub debounce_ms: u64,
}

impl Default for UpsConfig {
    fn default() -> Self {
        Self {
            mode: UpsMode::Disabled,
            mains_lost_pin: 21,
            edge: UpsEdge::Rising,
            debounce_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsMode {
    #[default]
    Disabled,
    Gpio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsEdge {
    #[default]
    Rising,
    Falling,
}

/// Rendering-service identity and call ceilings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// systemd unit name.
    pub name: String,
    /// Ceiling for start/stop calls, seconds.
    pub control_timeout_secs: u64,
    /// Ceiling for status queries, seconds.
    pub status_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "matrix-led.service".to_owned(),
            control_timeout_secs: 10,
            status_timeout_secs: 5,
        }
    }
}

/// Reconciliation cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    pub period_secs: u64,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self { period_secs: 5 }
    }
}

/// Main polling-loop cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Poll interval in milliseconds — fast enough for button response,
    /// far slower than anything electrical.
    pub tick_interval_ms: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `error` | `warn` | `info` | `debug` | `trace`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
        }
    }
}

impl ControllerConfig {
    /// Load and validate a YAML config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", path.display()))?;
        let config: Self = serde_yaml::from_str(&text)
            .map_err(|e| anyhow::anyhow!("cannot parse {}: {e}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject wiring that cannot mean anything sensible.
    pub fn validate(&self) -> Result<(), Error> {
        if self.buttons.start_pin == self.buttons.stop_pin {
            return Err(Error::Config("start and stop buttons share a pin"));
        }
        if self.relay.pin == self.buttons.start_pin || self.relay.pin == self.buttons.stop_pin {
            return Err(Error::Config("relay pin collides with a button pin"));
        }
        if self.ups.mode == UpsMode::Gpio {
            let p = self.ups.mains_lost_pin;
            if p == self.buttons.start_pin || p == self.buttons.stop_pin || p == self.relay.pin {
                return Err(Error::Config("UPS pin collides with another line"));
            }
        }
        if self.buttons.debounce_ms == 0 {
            return Err(Error::Config("button debounce window must be non-zero"));
        }
        if self.ups.mode == UpsMode::Gpio && self.ups.debounce_ms == 0 {
            return Err(Error::Config("UPS debounce window must be non-zero"));
        }
        if self.supervisor.tick_interval_ms == 0 {
            return Err(Error::Config("supervisor tick interval must be non-zero"));
        }
        if self.watchdog.period_secs == 0 {
            return Err(Error::Config("watchdog period must be non-zero"));
        }
        if self.led_service.name.is_empty() {
            return Err(Error::Config("led_service.name must not be empty"));
        }
        Ok(())
    }
}
