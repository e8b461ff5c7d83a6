//! Matrix Controller Daemon — main entry point.
//!
//! Controls the LED matrix PSU via a relay and manages the rendering
//! service.  Hexagonal architecture: the pure supervisor core drives
//! everything through port traits; this binary only wires adapters
//! together and runs the polling loop.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                   │
//! │   RpiGpio / DryRunGpio     SystemdService / DryRunSvc    │
//! │   SystemdHalt / DryRunSystem         LogEventSink        │
//! │   ────────────── Port Trait Boundary ──────────────      │
//! │   ┌──────────────────────────────────────────────────┐   │
//! │   │     Supervisor  (Debounce · FSM · Watchdog)      │   │
//! │   └──────────────────────────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────┘
//! ```

#![deny(unused_must_use)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use log::info;

use matrix_controller::adapters::dry_run::{DryRunGpio, DryRunService, DryRunSystem};
use matrix_controller::adapters::log_sink::LogEventSink;
use matrix_controller::app::ports::{
    DigitalInput, DigitalOutput, EventSink, ServiceControl, SystemControl,
};
use matrix_controller::app::service::Supervisor;
use matrix_controller::config::ControllerConfig;

// ── CLI ───────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "matrix-controller", about = "LED matrix power supervisor")]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "/etc/matrix-controller/controller.yaml")]
    config: PathBuf,

    /// Log actions instead of touching GPIO, systemd, or the OS.
    #[arg(long)]
    dry_run: bool,
}

// ── Termination signals ───────────────────────────────────────
//
// The handler does nothing but set a flag (the same single-writer
// pattern the debounced inputs use); the supervisor loop notices on its
// next tick and performs the ordered teardown itself, preserving the
// service-then-relay contract.

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
extern "C" fn on_terminate(_signum: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::Release);
}

#[cfg(unix)]
fn install_signal_handlers() {
    // SAFETY: the handler only performs an atomic store, which is
    // async-signal-safe.
    unsafe {
        libc::signal(libc::SIGTERM, on_terminate as libc::sighandler_t);
        libc::signal(libc::SIGINT, on_terminate as libc::sighandler_t);
    }
}

#[cfg(not(unix))]
fn install_signal_handlers() {}

// ── Supervisor loop ───────────────────────────────────────────

fn run_loop(
    config: &ControllerConfig,
    hw: &mut (impl DigitalInput + DigitalOutput),
    svc: &mut impl ServiceControl,
    sys: &mut impl SystemControl,
    sink: &mut impl EventSink,
) {
    let mut supervisor = Supervisor::new(config);
    supervisor.boot(hw, svc, sink);

    let tick = Duration::from_millis(config.supervisor.tick_interval_ms);
    let epoch = Instant::now();

    while !SHUTDOWN_REQUESTED.load(Ordering::Acquire) {
        let now_ms = epoch.elapsed().as_millis() as u64;
        supervisor.poll(now_ms, hw, svc, sys, sink);
        std::thread::sleep(tick);
    }

    // Clean exit (SIGTERM/SIGINT): same ordered teardown as a Stop
    // press, without the OS halt.
    info!("termination signal received, shutting down");
    if let Err(e) = svc.stop() {
        log::error!("shutdown: service stop failed ({e})");
    }
    if let Err(e) = hw.set_relay(false) {
        log::error!("shutdown: relay off failed ({e})");
    }
    info!("matrix controller stopped");
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();

    let config = ControllerConfig::load(&args.config)?;

    // RUST_LOG wins over the config level when set.
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.logging.level),
    )
    .init();

    info!("matrix-controller v{} starting", env!("CARGO_PKG_VERSION"));
    info!("config loaded from {}", args.config.display());

    install_signal_handlers();

    let mut sink = LogEventSink::new();

    if args.dry_run {
        info!("dry-run mode: collaborators are logging stand-ins");
        let mut hw = DryRunGpio::new();
        let mut svc = DryRunService::new(config.led_service.name.clone());
        let mut sys = DryRunSystem;
        run_loop(&config, &mut hw, &mut svc, &mut sys, &mut sink);
        return Ok(());
    }

    #[cfg(all(unix, feature = "rpi"))]
    {
        let mut hw = matrix_controller::adapters::gpio::RpiGpio::new(&config)
            .map_err(|e| anyhow::anyhow!("GPIO init failed: {e}"))?;
        let mut svc = matrix_controller::adapters::systemd::SystemdService::new(&config.led_service);
        let mut sys = matrix_controller::adapters::systemd::SystemdHalt;
        run_loop(&config, &mut hw, &mut svc, &mut sys, &mut sink);
        Ok(())
    }

    #[cfg(not(all(unix, feature = "rpi")))]
    {
        anyhow::bail!(
            "built without the `rpi` feature — only --dry-run is available on this build"
        )
    }
}
