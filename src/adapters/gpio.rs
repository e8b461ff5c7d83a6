//! Raspberry Pi GPIO adapter (rppal).
//!
//! The only module that touches real pins.  Buttons are wired active-low
//! with internal pull-ups (pressed = line low); the adapter inverts so
//! the core sees `true` = pressed.  The UPS sense line's configured edge
//! polarity is mapped here so the core sees `true` = mains lost.  Relay
//! polarity (active-high/active-low) is likewise resolved here; the core
//! speaks only logical on/off.

use log::{error, info};
use rppal::gpio::{Gpio, InputPin, OutputPin};

use crate::app::ports::{DigitalInput, DigitalOutput, InputLine};
use crate::config::{ControllerConfig, UpsEdge, UpsMode};
use crate::error::GpioError;

/// All controller lines behind the digital-I/O ports.
pub struct RpiGpio {
    start_button: InputPin,
    stop_button: InputPin,
    mains_lost: Option<InputPin>,
    relay: OutputPin,
    relay_active_high: bool,
    ups_edge: UpsEdge,
}

impl RpiGpio {
    /// Claim and configure every line.  Any failure here is a
    /// [`GpioError::Init`], which the daemon treats as fatal at startup.
    pub fn new(config: &ControllerConfig) -> Result<Self, GpioError> {
        let gpio = Gpio::new().map_err(|e| {
            error!("cannot open gpiochip: {e}");
            GpioError::Init
        })?;

        let claim_input = |pin: u8, pullup: bool| -> Result<InputPin, GpioError> {
            let p = gpio.get(pin).map_err(|e| {
                error!("cannot claim GPIO {pin}: {e}");
                GpioError::Init
            })?;
            Ok(if pullup {
                p.into_input_pullup()
            } else {
                p.into_input_pulldown()
            })
        };

        let start_button = claim_input(config.buttons.start_pin, true)?;
        let stop_button = claim_input(config.buttons.stop_pin, true)?;

        let mains_lost = if config.ups.mode == UpsMode::Gpio {
            // Pull toward the inactive level for the configured edge.
            let pullup = config.ups.edge == UpsEdge::Falling;
            Some(claim_input(config.ups.mains_lost_pin, pullup)?)
        } else {
            None
        };

        let mut relay = gpio
            .get(config.relay.pin)
            .map_err(|e| {
                error!("cannot claim relay GPIO {}: {e}", config.relay.pin);
                GpioError::Init
            })?
            .into_output();
        // De-energised from the first moment the line is ours.
        if config.relay.active_high {
            relay.set_low();
        } else {
            relay.set_high();
        }

        info!(
            "GPIO ready: start={}, stop={}, relay={} (active_high={}), ups={:?}",
            config.buttons.start_pin,
            config.buttons.stop_pin,
            config.relay.pin,
            config.relay.active_high,
            config.ups.mode,
        );

        Ok(Self {
            start_button,
            stop_button,
            mains_lost,
            relay,
            relay_active_high: config.relay.active_high,
            ups_edge: config.ups.edge,
        })
    }
}

impl DigitalInput for RpiGpio {
    fn read(&mut self, line: InputLine) -> Result<bool, GpioError> {
        match line {
            // Active-low buttons: pressed pulls the line to ground.
            InputLine::StartButton => Ok(self.start_button.is_low()),
            InputLine::StopButton => Ok(self.stop_button.is_low()),
            InputLine::MainsLost => {
                let pin = self.mains_lost.as_ref().ok_or(GpioError::ReadFailed)?;
                Ok(match self.ups_edge {
                    UpsEdge::Rising => pin.is_high(),
                    UpsEdge::Falling => pin.is_low(),
                })
            }
        }
    }
}

impl DigitalOutput for RpiGpio {
    fn set_relay(&mut self, on: bool) -> Result<(), GpioError> {
        let level_high = on == self.relay_active_high;
        if level_high {
            self.relay.set_high();
        } else {
            self.relay.set_low();
        }
        info!("relay -> {}", if on { "ON" } else { "OFF" });
        Ok(())
    }

    fn relay_is_on(&mut self) -> Result<bool, GpioError> {
        Ok(self.relay.is_set_high() == self.relay_active_high)
    }
}
