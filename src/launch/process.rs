//! Host process handle: spawn, capture, classify, terminate.

use serde::Serialize;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// Diagnostic printed by the host when its startup races with the scripting
/// bridge. The launch is retried when this shows up in captured output.
pub const STARTUP_BUG_MARKER: &str = "The handler some object is not defined.";

/// Lifecycle of one host invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    Starting,
    Running,
    Exited(i32),
    Killed,
}

/// Exit code plus merged stdout/stderr of a finished invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub output: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// How a failed invocation should be treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitClass {
    KnownStartupBug,
    OtherFailure(String),
}

/// Inspect captured output for the known startup race.
pub fn classify_exit(output: &str) -> ExitClass {
    if output.contains(STARTUP_BUG_MARKER) {
        ExitClass::KnownStartupBug
    } else {
        ExitClass::OtherFailure(output.trim().to_string())
    }
}

/// One invocation of the host binary.
#[derive(Debug, Clone, Serialize)]
pub struct HostProcess {
    pub pid: Option<u32>,
    pub status: ProcessStatus,
    pub command_line: Vec<String>,
}

impl HostProcess {
    fn new(program: &Path, args: &[String]) -> Self {
        let mut command_line = Vec::with_capacity(args.len() + 1);
        command_line.push(program.display().to_string());
        command_line.extend(args.iter().cloned());
        Self {
            pid: None,
            status: ProcessStatus::Starting,
            command_line,
        }
    }

    /// Spawn `program` and wait for it to exit, capturing stdout then stderr.
    pub async fn run(program: &Path, args: &[String]) -> io::Result<(Self, ProcessOutput)> {
        let mut process = Self::new(program, args);
        debug!(command = ?process.command_line, "Spawning host");

        let child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;
        process.pid = child.id();
        process.status = ProcessStatus::Running;

        let out = child.wait_with_output().await?;
        let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(&out.stderr));

        let code = out.status.code();
        process.status = match code {
            Some(code) => ProcessStatus::Exited(code),
            None => ProcessStatus::Killed,
        };
        debug!(pid = ?process.pid, status = ?process.status, "Host invocation finished");
        Ok((process, ProcessOutput { code, output }))
    }
}

/// Send SIGTERM to `pid`. Returns false if no such process existed.
pub fn terminate_pid(pid: u32) -> io::Result<bool> {
    let status = Command::new("kill")
        .arg(pid.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;
    Ok(status.success())
}

/// Kill every process whose command line contains `pattern`, other than this
/// one. Used for hosts that were started outside our control (the host may
/// relaunch itself while working around its startup bug, so pids from spawn
/// are not reliable). Returns the number of processes signalled.
pub fn terminate_by_name(pattern: &str) -> io::Result<usize> {
    let listing = Command::new("ps").args(["-A", "-o", "pid=,command="]).output()?;
    let listing = String::from_utf8_lossy(&listing.stdout);

    let mut killed = 0;
    for pid in matching_pids(&listing, pattern, std::process::id()) {
        match terminate_pid(pid) {
            Ok(true) => {
                info!(pid, pattern, "Terminated host process");
                killed += 1;
            }
            // Already gone
            Ok(false) => debug!(pid, "Host process exited before kill"),
            Err(e) => warn!(pid, error = %e, "Failed to terminate host process"),
        }
    }
    Ok(killed)
}

/// Parse `pid command...` lines and return pids whose command contains `pattern`.
pub(crate) fn matching_pids(listing: &str, pattern: &str, own_pid: u32) -> Vec<u32> {
    listing
        .lines()
        .filter_map(|line| {
            let (pid, command) = line.trim_start().split_once(char::is_whitespace)?;
            let pid = pid.parse::<u32>().ok()?;
            (pid != own_pid && command.contains(pattern)).then_some(pid)
        })
        .collect()
}
