//! External process execution.
//!
//! Every provisioning step that touches the system goes through a
//! [`CommandRunner`]. The runner normalizes one process invocation into a
//! [`CommandResult`]; a non-zero exit code is an ordinary result for the caller
//! to interpret, never an error. The only error is a program that cannot be
//! located or spawned at all.

use crate::error::{ProvisionError, Result};
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Interval between liveness checks while a timeout is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Exit code reported when the OS gives none (killed, timed out).
pub const NO_EXIT_CODE: i32 = -1;

/// What to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// A PowerShell script passed to `powershell.exe -Command`.
    PowerShell(String),

    /// An executable path plus its arguments, executed directly.
    Program { program: PathBuf, args: Vec<String> },
}

impl Invocation {
    /// Build a PowerShell invocation.
    pub fn powershell(script: impl Into<String>) -> Self {
        Self::PowerShell(script.into())
    }

    /// Build a direct program invocation.
    pub fn program<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Program {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Name of the program that will be spawned.
    pub fn program_name(&self) -> String {
        match self {
            Self::PowerShell(_) => "powershell.exe".to_string(),
            Self::Program { program, .. } => program.display().to_string(),
        }
    }

    /// One-line rendering for logs and error messages.
    pub fn display(&self) -> String {
        match self {
            Self::PowerShell(script) => {
                let first = script.lines().map(str::trim).find(|l| !l.is_empty());
                format!("powershell: {}", first.unwrap_or(""))
            }
            Self::Program { program, args } if args.is_empty() => program.display().to_string(),
            Self::Program { program, args } => {
                format!("\"{}\" {}", program.display(), args.join(" "))
            }
        }
    }

    fn to_command(&self) -> Command {
        match self {
            Self::PowerShell(script) => {
                let mut cmd = Command::new("powershell.exe");
                cmd.args([
                    "-NoProfile",
                    "-ExecutionPolicy",
                    "Bypass",
                    "-Command",
                    script.as_str(),
                ]);
                cmd
            }
            Self::Program { program, args } => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                cmd
            }
        }
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Capture stdout/stderr. When false the child shares the terminal
    /// (needed for interactive credential prompts) and both strings are empty.
    pub capture: bool,

    /// Kill the child once this much time has passed (None = wait forever).
    pub timeout: Option<Duration>,
}

impl CommandOptions {
    /// Captured output, no timeout.
    pub fn captured() -> Self {
        Self {
            capture: true,
            timeout: None,
        }
    }

    /// Inherited stdio, no timeout.
    pub fn interactive() -> Self {
        Self::default()
    }

    /// Set a timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Result of running one external process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// The child's exit code, unmodified ([`NO_EXIT_CODE`] if none).
    pub exit_code: i32,

    /// Standard output (empty unless captured).
    pub stdout: String,

    /// Standard error (empty unless captured).
    pub stderr: String,

    /// Wall-clock duration.
    pub duration: Duration,

    /// Whether the child was killed by the timeout.
    pub timed_out: bool,
}

impl CommandResult {
    /// Exit code zero and not timed out.
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }

    /// Stdout and stderr joined, for text heuristics and error detail.
    pub fn combined_output(&self) -> String {
        match (self.stdout.trim(), self.stderr.trim()) {
            ("", err) => err.to_string(),
            (out, "") => out.to_string(),
            (out, err) => format!("{}\n{}", out, err),
        }
    }
}

/// Executes external processes.
///
/// Implementations must not retry and must not log; both are the caller's job.
pub trait CommandRunner {
    /// Run to completion (or timeout) and normalize the result.
    fn run(&self, invocation: &Invocation, options: &CommandOptions) -> Result<CommandResult>;

    /// Launch without waiting for the process to exit.
    fn spawn_detached(&self, invocation: &Invocation) -> Result<()>;
}

/// [`CommandRunner`] backed by `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    /// Create a new system runner.
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation, options: &CommandOptions) -> Result<CommandResult> {
        let start = Instant::now();
        let mut cmd = invocation.to_command();

        if options.capture {
            cmd.stdin(Stdio::null());
            cmd.stdout(Stdio::piped());
            cmd.stderr(Stdio::piped());
        } else {
            cmd.stdin(Stdio::inherit());
            cmd.stdout(Stdio::inherit());
            cmd.stderr(Stdio::inherit());
        }

        let mut child = cmd.spawn().map_err(|e| spawn_error(invocation, e))?;

        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        let (status, timed_out) = wait_with_deadline(&mut child, options.timeout)?;
        let duration = start.elapsed();

        // A killed child may leave grandchildren holding the pipes open, so the
        // readers are only joined when the child exited on its own.
        let (stdout, stderr) = if timed_out {
            (String::new(), String::new())
        } else {
            (join_reader(stdout_reader), join_reader(stderr_reader))
        };

        let exit_code = if timed_out {
            NO_EXIT_CODE
        } else {
            status.code().unwrap_or(NO_EXIT_CODE)
        };

        Ok(CommandResult {
            exit_code,
            stdout,
            stderr,
            duration,
            timed_out,
        })
    }

    fn spawn_detached(&self, invocation: &Invocation) -> Result<()> {
        let mut cmd = invocation.to_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;
            cmd.creation_flags(CREATE_NEW_CONSOLE);
        }

        cmd.spawn().map_err(|e| spawn_error(invocation, e))?;
        Ok(())
    }
}

fn spawn_error(invocation: &Invocation, err: std::io::Error) -> ProvisionError {
    let message = if err.kind() == std::io::ErrorKind::NotFound {
        "program not found".to_string()
    } else {
        err.to_string()
    };
    ProvisionError::RunnerError {
        program: invocation.program_name(),
        message,
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_reader(handle: Option<JoinHandle<String>>) -> String {
    handle
        .map(|h| h.join().unwrap_or_default())
        .unwrap_or_default()
}

fn wait_with_deadline(child: &mut Child, timeout: Option<Duration>) -> Result<(ExitStatus, bool)> {
    let Some(timeout) = timeout else {
        return Ok((child.wait()?, false));
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok((status, false));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let status = child.wait()?;
            return Ok((status, true));
        }
        thread::sleep(POLL_INTERVAL);
    }
}
