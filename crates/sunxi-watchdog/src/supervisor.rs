//! Child-process liveness for the process-supervision mode.
//!
//! The supervisor launches one command and polls it without blocking once per
//! kick cycle. A clean exit ends supervision; any other outcome (nonzero exit,
//! death by signal, failure to start) expires the watchdog.

use crate::scheduler::{ExpiryReason, LivenessSource, Verdict};
use std::ffi::OsStr;
use std::io;
use std::process::{Child, Command, ExitStatus};

/// Observed state of the supervised command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildStatus {
    /// Still running.
    Running,
    /// Exited with this code.
    Exited(i32),
    /// Terminated abnormally, by the given signal when known.
    Crashed(Option<i32>),
    /// Could not be started at all.
    LaunchFailed,
}

impl ChildStatus {
    /// Classify a reaped exit status.
    #[must_use]
    pub fn from_exit_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self::Exited(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            Self::Crashed(status.signal())
        }
        #[cfg(not(unix))]
        {
            Self::Crashed(None)
        }
    }

    /// Whether the command has stopped running.
    #[must_use]
    pub fn is_final(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// A running process that can be polled for exit.
pub trait ChildProcess: Send {
    /// OS process id.
    fn id(&self) -> u32;

    /// Reap the process if it has exited, without blocking.
    ///
    /// # Errors
    ///
    /// Returns an error if the status cannot be queried.
    fn poll_exit(&mut self) -> io::Result<Option<ChildStatus>>;
}

impl ChildProcess for Child {
    fn id(&self) -> u32 {
        Child::id(self)
    }

    fn poll_exit(&mut self) -> io::Result<Option<ChildStatus>> {
        Ok(self.try_wait()?.map(ChildStatus::from_exit_status))
    }
}

#[derive(Debug)]
enum Supervised<P> {
    Running(P),
    Reaped(ChildStatus),
    LaunchFailed,
}

/// Supervises a single command.
#[derive(Debug)]
pub struct ProcessSupervisor<P: ChildProcess = Child> {
    program: String,
    process: Supervised<P>,
}

impl ProcessSupervisor<Child> {
    /// Start `program` with `args`.
    ///
    /// A launch failure is not returned as an error: it is remembered and
    /// reported as [`ChildStatus::LaunchFailed`] by the next poll.
    pub fn launch<S, I, A>(program: S, args: I) -> Self
    where
        S: AsRef<OsStr>,
        I: IntoIterator<Item = A>,
        A: AsRef<OsStr>,
    {
        let name = program.as_ref().to_string_lossy().into_owned();
        match Command::new(program).args(args).spawn() {
            Ok(child) => {
                tracing::info!(program = %name, pid = child.id(), "Launched supervised command");
                Self::from_child(name, child)
            }
            Err(err) => {
                tracing::error!(program = %name, error = %err, "Failed to launch supervised command");
                Self {
                    program: name,
                    process: Supervised::LaunchFailed,
                }
            }
        }
    }
}

impl<P: ChildProcess> ProcessSupervisor<P> {
    /// Supervise an already running process.
    pub fn from_child(program: impl Into<String>, child: P) -> Self {
        Self {
            program: program.into(),
            process: Supervised::Running(child),
        }
    }

    /// Name of the supervised program.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Process id while the command is still running.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        match &self.process {
            Supervised::Running(child) => Some(child.id()),
            Supervised::Reaped(_) | Supervised::LaunchFailed => None,
        }
    }

    /// Check the command's status without blocking.
    ///
    /// Once the command has been reaped the final status is returned on every
    /// later call. A failed status query counts as a crash.
    pub fn poll_nonblocking(&mut self) -> ChildStatus {
        let child = match &mut self.process {
            Supervised::Running(child) => child,
            Supervised::Reaped(status) => return *status,
            Supervised::LaunchFailed => return ChildStatus::LaunchFailed,
        };

        let pid = child.id();
        let status = match child.poll_exit() {
            Ok(None) => return ChildStatus::Running,
            Ok(Some(status)) => status,
            Err(err) => {
                tracing::warn!(pid, error = %err, "Failed to query supervised command");
                ChildStatus::Crashed(None)
            }
        };

        tracing::info!(program = %self.program, pid, status = ?status, "Supervised command stopped");
        self.process = Supervised::Reaped(status);
        status
    }
}

impl<P: ChildProcess> LivenessSource for ProcessSupervisor<P> {
    fn check(&mut self) -> Verdict {
        match self.poll_nonblocking() {
            ChildStatus::Running => Verdict::Healthy,
            ChildStatus::Exited(0) => Verdict::Finished,
            ChildStatus::Exited(code) => Verdict::Expired(ExpiryReason::ChildFailed { code }),
            ChildStatus::Crashed(signal) => Verdict::Expired(ExpiryReason::ChildCrashed { signal }),
            ChildStatus::LaunchFailed => Verdict::Expired(ExpiryReason::LaunchFailed),
        }
    }
}
