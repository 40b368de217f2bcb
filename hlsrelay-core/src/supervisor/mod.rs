//! Relay process supervision
//!
//! [`RelaySupervisor`] owns at most one external relay process group. Every
//! transition (start, stop, status reaping) happens under one async mutex, so
//! two overlapping starts can never leave two groups writing into the same
//! output directory.

pub mod artifacts;
pub mod command;
pub mod process;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::RelayProcessConfig;
use crate::models::RelayProfile;

use self::artifacts::OutputHousekeeper;
use self::command::build_command;
use self::process::{CommandLauncher, RelayLauncher, RelayProcess, RelaySignal};

/// Timing and binary settings for the supervisor
#[derive(Debug, Clone)]
pub struct SupervisorOptions {
    pub ffmpeg_path: String,
    /// How long to wait for a graceful exit after SIGTERM
    pub stop_timeout: Duration,
    pub poll_interval: Duration,
    /// How long to wait for the exit status after SIGKILL
    pub kill_wait: Duration,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            stop_timeout: Duration::from_secs(4),
            poll_interval: Duration::from_millis(100),
            kill_wait: Duration::from_secs(1),
        }
    }
}

impl From<&RelayProcessConfig> for SupervisorOptions {
    fn from(config: &RelayProcessConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            stop_timeout: config.stop_timeout(),
            poll_interval: config.poll_interval(),
            kill_wait: config.kill_wait(),
        }
    }
}

/// Snapshot returned by [`RelaySupervisor::status`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayStatus {
    pub running: bool,
    pub pid: Option<u32>,
    pub uptime_seconds: f64,
    pub started_at: Option<DateTime<Utc>>,
    pub source_url: String,
    pub playlist_exists: bool,
    pub playlist_age_seconds: Option<f64>,
    pub segment_count: usize,
    pub effective_hls_list_size: u32,
    pub effective_buffer_seconds: u32,
    pub last_exit_code: Option<i32>,
    pub last_error: String,
}

#[derive(Default)]
struct RelayState {
    process: Option<Box<dyn RelayProcess>>,
    started: Option<(Instant, DateTime<Utc>)>,
    current_source_url: String,
    last_exit_code: Option<i32>,
    last_error: String,
    effective_list_size: u32,
    effective_hls_time: u32,
}

impl RelayState {
    /// Drop the handle if the process has exited, recording its exit code.
    fn reap(&mut self) {
        let outcome = match self.process.as_mut() {
            Some(process) => process.try_wait(),
            None => return,
        };

        match outcome {
            Ok(None) => {}
            Ok(Some(code)) => {
                info!(exit_code = code, "Relay process exited");
                self.last_exit_code = Some(code);
                self.process = None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to poll relay process, dropping handle");
                self.process = None;
            }
        }
    }
}

/// Supervises the single relay process group
pub struct RelaySupervisor {
    state: Mutex<RelayState>,
    launcher: Arc<dyn RelayLauncher>,
    housekeeper: OutputHousekeeper,
    options: SupervisorOptions,
}

impl RelaySupervisor {
    /// Supervisor that launches real OS processes.
    pub fn new(housekeeper: OutputHousekeeper, options: SupervisorOptions) -> Self {
        Self::with_launcher(Arc::new(CommandLauncher), housekeeper, options)
    }

    pub fn with_launcher(
        launcher: Arc<dyn RelayLauncher>,
        housekeeper: OutputHousekeeper,
        options: SupervisorOptions,
    ) -> Self {
        Self {
            state: Mutex::new(RelayState::default()),
            launcher,
            housekeeper,
            options,
        }
    }

    #[must_use]
    pub fn housekeeper(&self) -> &OutputHousekeeper {
        &self.housekeeper
    }

    /// (Re)start the relay for `profile`.
    ///
    /// Any running group is stopped and the output directory purged first.
    /// The profile is fully validated before launch. Failures are recorded in `last_error` and leave the relay stopped; they
    /// are never returned.
    pub async fn start(&self, profile: &(dyn RelayProfile + Sync)) {
        let mut state = self.state.lock().await;

        self.stop_locked(&mut state).await;

        // Never launch on top of output left by an earlier run
        if let Err(e) = self.housekeeper.purge().await {
            error!(
                dir = %self.housekeeper.dir().display(),
                error = %e,
                "Failed to purge relay output"
            );
            state.last_error = format!("failed to clear relay output: {e}");
            return;
        }

        let source = match profile.validate().and_then(|()| profile.resolve_source()) {
            Ok(source) => source,
            Err(e) => {
                warn!(error = %e, "Refusing to start relay");
                state.last_error = format!("invalid relay configuration: {e}");
                return;
            }
        };

        let params = profile.encoding();
        let list_size = params.effective_list_size();
        state.effective_list_size = list_size;
        state.effective_hls_time = params.hls_time;

        let command = build_command(
            &self.options.ffmpeg_path,
            &source,
            &params,
            list_size,
            &self.housekeeper,
        );

        match self.launcher.launch(&command) {
            Ok(process) => {
                info!(
                    pid = ?process.id(),
                    source = %source,
                    list_size,
                    mode = ?params.mode,
                    "Relay started"
                );
                state.process = Some(process);
                state.started = Some((Instant::now(), Utc::now()));
                state.current_source_url = source;
                state.last_error.clear();
                state.last_exit_code = None;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                error!(ffmpeg = %self.options.ffmpeg_path, "ffmpeg binary not found");
                state.last_error = format!(
                    "ffmpeg not installed (looked for `{}`)",
                    self.options.ffmpeg_path
                );
            }
            Err(e) => {
                error!(error = %e, "Failed to launch relay");
                state.last_error = format!("failed to launch ffmpeg: {e}");
            }
        }
    }

    /// Stop the relay. Calling this while stopped is a no-op.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        self.stop_locked(&mut state).await;
    }

    async fn stop_locked(&self, state: &mut RelayState) {
        state.reap();
        let Some(mut process) = state.process.take() else {
            return;
        };
        let pid = process.id();

        if let Err(e) = process.signal(RelaySignal::Terminate) {
            warn!(pid = ?pid, error = %e, "Failed to send SIGTERM to relay group");
        }
        let mut exit = self
            .wait_for_exit(process.as_mut(), self.options.stop_timeout)
            .await;

        if exit.is_none() {
            warn!(pid = ?pid, "Relay ignored SIGTERM, killing process group");
            if let Err(e) = process.signal(RelaySignal::Kill) {
                error!(pid = ?pid, error = %e, "Failed to send SIGKILL to relay group");
            }
            exit = self
                .wait_for_exit(process.as_mut(), self.options.kill_wait)
                .await;
        }

        info!(pid = ?pid, exit_code = ?exit, "Relay stopped");
        state.last_exit_code = exit;
    }

    /// Poll until the process exits or `budget` runs out.
    async fn wait_for_exit(&self, process: &mut dyn RelayProcess, budget: Duration) -> Option<i32> {
        let deadline = tokio::time::Instant::now() + budget;
        loop {
            match process.try_wait() {
                Ok(Some(code)) => return Some(code),
                Ok(None) => {}
                Err(e) => {
                    debug!(error = %e, "Relay exit poll failed");
                    return None;
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(self.options.poll_interval).await;
        }
    }

    /// Current relay state plus a fresh look at the output directory.
    pub async fn status(&self) -> RelayStatus {
        let mut state = self.state.lock().await;
        state.reap();

        let report = self.housekeeper.inspect().await;
        let running = state.process.is_some();
        let uptime_seconds = match state.started {
            Some((since, _)) if running => (since.elapsed().as_secs_f64() * 10.0).round() / 10.0,
            _ => 0.0,
        };

        RelayStatus {
            running,
            pid: state.process.as_ref().and_then(|p| p.id()),
            uptime_seconds,
            started_at: state.started.filter(|_| running).map(|(_, at)| at),
            source_url: state.current_source_url.clone(),
            playlist_exists: report.playlist_exists,
            playlist_age_seconds: report.playlist_age_seconds,
            segment_count: report.segment_count,
            effective_hls_list_size: state.effective_list_size,
            effective_buffer_seconds: state
                .effective_list_size
                .saturating_mul(state.effective_hls_time),
            last_exit_code: state.last_exit_code,
            last_error: state.last_error.clone(),
        }
    }

    pub async fn is_running(&self) -> bool {
        let mut state = self.state.lock().await;
        state.reap();
        state.process.is_some()
    }
}

impl Drop for RelaySupervisor {
    fn drop(&mut self) {
        if let Some(process) = self.state.get_mut().process.as_mut() {
            warn!(pid = ?process.id(), "Supervisor dropped with a live relay, killing group");
            let _ = process.signal(RelaySignal::Kill);
        }
    }
}
