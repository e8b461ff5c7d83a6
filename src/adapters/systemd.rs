//! systemd service-control and OS-halt adapter.
//!
//! Shells out to `systemctl` / `shutdown` with bounded waits.  The
//! child is polled with `try_wait` and killed once the ceiling passes,
//! so no call in the supervisor loop can block indefinitely.

use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use log::{debug, error, warn};

use crate::app::ports::{ServiceControl, SystemControl};
use crate::config::ServiceConfig;
use crate::error::ServiceError;

/// Wait for a child with a ceiling.  On timeout the child is killed and
/// `Err(Timeout)` returned.
fn wait_bounded(mut child: Child, timeout: Duration) -> Result<std::process::Output, ServiceError> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(_)) => {
                return child.wait_with_output().map_err(|e| {
                    error!("collecting child output failed: {e}");
                    ServiceError::Spawn
                });
            }
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ServiceError::Timeout);
                }
                std::thread::sleep(Duration::from_millis(20));
            }
            Err(e) => {
                error!("waiting on child failed: {e}");
                return Err(ServiceError::Spawn);
            }
        }
    }
}

fn run_systemctl(args: &[&str], timeout: Duration) -> Result<std::process::Output, ServiceError> {
    let child = Command::new("systemctl")
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            error!("cannot spawn systemctl {args:?}: {e}");
            ServiceError::Spawn
        })?;
    wait_bounded(child, timeout)
}

// ───────────────────────────────────────────────────────────────
// Service control
// ───────────────────────────────────────────────────────────────

/// Controls the rendering service through `systemctl`.
pub struct SystemdService {
    unit: String,
    control_timeout: Duration,
    status_timeout: Duration,
}

impl SystemdService {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            unit: config.name.clone(),
            control_timeout: Duration::from_secs(config.control_timeout_secs),
            status_timeout: Duration::from_secs(config.status_timeout_secs),
        }
    }
}

impl ServiceControl for SystemdService {
    fn start(&mut self) -> Result<(), ServiceError> {
        let out = run_systemctl(&["start", &self.unit], self.control_timeout)?;
        if out.status.success() {
            debug!("systemctl start {} ok", self.unit);
            Ok(())
        } else {
            error!(
                "systemctl start {} failed: {}",
                self.unit,
                String::from_utf8_lossy(&out.stderr).trim()
            );
            Err(ServiceError::StartFailed)
        }
    }

    fn stop(&mut self) -> Result<(), ServiceError> {
        let out = run_systemctl(&["stop", &self.unit], self.control_timeout)?;
        if out.status.success() {
            debug!("systemctl stop {} ok", self.unit);
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&out.stderr).to_lowercase();
        // Not loaded / not found means already stopped — success for us.
        if stderr.contains("not loaded") || stderr.contains("not found") {
            warn!("service {} not loaded — treating stop as success", self.unit);
            return Ok(());
        }
        error!("systemctl stop {} failed: {}", self.unit, stderr.trim());
        Err(ServiceError::StopFailed)
    }

    fn is_running(&mut self) -> Result<bool, ServiceError> {
        let out = run_systemctl(&["is-active", &self.unit], self.status_timeout)?;
        let stdout = String::from_utf8_lossy(&out.stdout);
        // `is-active` exits non-zero for every inactive flavor, so the
        // exit status alone distinguishes active from everything else.
        Ok(out.status.success() && stdout.trim() == "active")
    }
}

// ───────────────────────────────────────────────────────────────
// System halt
// ───────────────────────────────────────────────────────────────

/// Invokes the irreversible OS halt.
pub struct SystemdHalt;

impl SystemControl for SystemdHalt {
    fn halt_now(&mut self) -> Result<(), ServiceError> {
        let child = Command::new("shutdown")
            .args(["-h", "now"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                error!("cannot spawn shutdown: {e}");
                ServiceError::Spawn
            })?;
        let out = wait_bounded(child, Duration::from_secs(5))?;
        if out.status.success() {
            Ok(())
        } else {
            error!(
                "shutdown -h now failed: {}",
                String::from_utf8_lossy(&out.stderr).trim()
            );
            Err(ServiceError::StartFailed)
        }
    }
}
