//! Test doubles and fixtures shared by the unit tests in this crate.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::{Channel, RelayConfig, SourceMode};
use crate::supervisor::process::{RelayCommand, RelayLauncher, RelayProcess, RelaySignal};

/// Catalog-mode configuration with a `news` and a `sports` channel.
pub fn catalog_config(active: &str) -> RelayConfig {
    RelayConfig {
        source_mode: SourceMode::Catalog,
        channels: vec![
            Channel {
                id: "news".to_string(),
                name: "News".to_string(),
                url: "http://example.com/news.m3u8".to_string(),
            },
            Channel {
                id: "sports".to_string(),
                name: "Sports".to_string(),
                url: "https://example.com/sports.m3u8".to_string(),
            },
        ],
        active_channel_id: active.to_string(),
        ..Default::default()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// How a [`FakeProcess`] reacts to signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeBehavior {
    /// Exits on SIGTERM
    Cooperative,
    /// Ignores SIGTERM, only dies on SIGKILL
    IgnoresTerminate,
}

#[derive(Debug)]
pub struct FakeProcessState {
    pub pid: u32,
    pub behavior: FakeBehavior,
    pub exit_code: Option<i32>,
    pub signals: Vec<RelaySignal>,
}

/// In-memory stand-in for an external process group.
#[derive(Clone)]
pub struct FakeProcess {
    state: Arc<Mutex<FakeProcessState>>,
}

impl FakeProcess {
    pub fn new(pid: u32, behavior: FakeBehavior) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeProcessState {
                pid,
                behavior,
                exit_code: None,
                signals: Vec::new(),
            })),
        }
    }

    /// Simulate the process exiting on its own.
    pub fn exit(&self, code: i32) {
        lock(&self.state).exit_code = Some(code);
    }

    pub fn is_alive(&self) -> bool {
        lock(&self.state).exit_code.is_none()
    }

    pub fn signals(&self) -> Vec<RelaySignal> {
        lock(&self.state).signals.clone()
    }
}

impl RelayProcess for FakeProcess {
    fn id(&self) -> Option<u32> {
        Some(lock(&self.state).pid)
    }

    fn signal(&mut self, signal: RelaySignal) -> io::Result<()> {
        let mut state = lock(&self.state);
        state.signals.push(signal);
        if state.exit_code.is_some() {
            return Ok(());
        }
        match (signal, state.behavior) {
            (RelaySignal::Terminate, FakeBehavior::Cooperative) => state.exit_code = Some(-15),
            (RelaySignal::Terminate, FakeBehavior::IgnoresTerminate) => {}
            (RelaySignal::Kill, _) => state.exit_code = Some(-9),
        }
        Ok(())
    }

    fn try_wait(&mut self) -> io::Result<Option<i32>> {
        Ok(lock(&self.state).exit_code)
    }
}

#[derive(Default)]
struct FakeLauncherState {
    fail_with: Option<io::ErrorKind>,
    behavior: Option<FakeBehavior>,
    launched: Vec<(RelayCommand, FakeProcess)>,
}

/// Launcher that hands out [`FakeProcess`]es and, like ffmpeg, drops a
/// playlist plus one segment tagged with the launch generation into the
/// output directory.
#[derive(Clone, Default)]
pub struct FakeLauncher {
    state: Arc<Mutex<FakeLauncherState>>,
    output_dir: Option<PathBuf>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writing_to(output_dir: &Path) -> Self {
        Self {
            state: Arc::default(),
            output_dir: Some(output_dir.to_path_buf()),
        }
    }

    pub fn fail_with(&self, kind: io::ErrorKind) {
        lock(&self.state).fail_with = Some(kind);
    }

    /// Let subsequent launches succeed again.
    pub fn recover(&self) {
        lock(&self.state).fail_with = None;
    }

    pub fn with_behavior(&self, behavior: FakeBehavior) {
        lock(&self.state).behavior = Some(behavior);
    }

    pub fn launch_count(&self) -> usize {
        lock(&self.state).launched.len()
    }

    pub fn processes(&self) -> Vec<FakeProcess> {
        lock(&self.state)
            .launched
            .iter()
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn last_command(&self) -> Option<RelayCommand> {
        lock(&self.state).launched.last().map(|(c, _)| c.clone())
    }
}

impl RelayLauncher for FakeLauncher {
    fn launch(&self, command: &RelayCommand) -> io::Result<Box<dyn RelayProcess>> {
        let mut state = lock(&self.state);
        if let Some(kind) = state.fail_with {
            return Err(io::Error::new(kind, "simulated launch failure"));
        }

        let generation = state.launched.len() + 1;
        if let Some(dir) = &self.output_dir {
            std::fs::write(dir.join("live.m3u8"), format!("#EXTM3U\n# gen {generation}\n"))?;
            std::fs::write(
                dir.join(format!("live_{generation:05}.ts")),
                format!("gen {generation}"),
            )?;
        }

        let behavior = state.behavior.unwrap_or(FakeBehavior::Cooperative);
        let process = FakeProcess::new(1000 + generation as u32, behavior);
        state.launched.push((command.clone(), process.clone()));
        Ok(Box::new(process))
    }
}
