//! Opaque handle over the external relay process group
//!
//! The supervisor only ever needs two things from a running relay: deliver a
//! signal to the whole group, and poll whether it has exited. Everything
//! platform specific lives behind [`RelayProcess`] and [`RelayLauncher`].

use std::io;
use std::process::{ExitStatus, Stdio};

/// Signals the supervisor sends to a relay process group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelaySignal {
    /// Ask the group to shut down (SIGTERM)
    Terminate,
    /// Tear the group down unconditionally (SIGKILL)
    Kill,
}

/// Program and arguments for one relay launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl RelayCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// A launched relay and the process group it leads
pub trait RelayProcess: Send {
    /// OS process id of the group leader, when known.
    fn id(&self) -> Option<u32>;

    /// Deliver `signal` to every member of the group.
    fn signal(&mut self, signal: RelaySignal) -> io::Result<()>;

    /// Non-blocking exit check. Signal deaths are reported as the negated
    /// signal number.
    fn try_wait(&mut self) -> io::Result<Option<i32>>;
}

/// Starts relay processes
pub trait RelayLauncher: Send + Sync {
    fn launch(&self, command: &RelayCommand) -> io::Result<Box<dyn RelayProcess>>;
}

/// Launches real OS processes, each as the leader of a fresh process group
/// with all standard streams detached from the server.
///
/// Must be called from within a tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandLauncher;

impl RelayLauncher for CommandLauncher {
    fn launch(&self, command: &RelayCommand) -> io::Result<Box<dyn RelayProcess>> {
        let mut std_cmd = std::process::Command::new(&command.program);
        std_cmd
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            std_cmd.process_group(0);
        }

        let child = tokio::process::Command::from(std_cmd).spawn()?;
        let pid = child.id();
        tracing::debug!(pid = ?pid, program = %command.program, "Spawned relay process group");

        Ok(Box::new(GroupChild { child, pid }))
    }
}

/// A child process that leads its own process group
pub struct GroupChild {
    child: tokio::process::Child,
    pid: Option<u32>,
}

impl RelayProcess for GroupChild {
    fn id(&self) -> Option<u32> {
        self.pid
    }

    #[cfg(unix)]
    fn signal(&mut self, signal: RelaySignal) -> io::Result<()> {
        use nix::errno::Errno;
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let Some(pid) = self.pid else {
            return Ok(());
        };
        let pgid = i32::try_from(pid)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
        let sig = match signal {
            RelaySignal::Terminate => Signal::SIGTERM,
            RelaySignal::Kill => Signal::SIGKILL,
        };

        match killpg(Pid::from_raw(pgid), sig) {
            // Group already gone
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(errno) => Err(io::Error::from(errno)),
        }
    }

    #[cfg(not(unix))]
    fn signal(&mut self, _signal: RelaySignal) -> io::Result<()> {
        // No process groups or graceful signals; both map to a hard kill.
        match self.child.start_kill() {
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => Ok(()),
            other => other,
        }
    }

    fn try_wait(&mut self) -> io::Result<Option<i32>> {
        Ok(self.child.try_wait()?.map(exit_code))
    }
}

/// Numeric exit status, with signal deaths mapped to `-signo`.
#[must_use]
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return -sig;
        }
    }

    -1
}
