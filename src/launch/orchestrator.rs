//! Launch orchestration: bring up the host, find its control port, open the
//! target binary and wait until its document is analyzed.

use crate::launch::client::ProxyClient;
use crate::launch::poller::{DocumentSource, PollConfig, PollError, Poller};
use crate::launch::port::{discover_port, ControlPort};
use crate::launch::process::{
    classify_exit, terminate_by_name, ExitClass, HostProcess, ProcessOutput,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Total launch attempts when the host hits its startup bug.
pub const MAX_SPAWN_ATTEMPTS: usize = 2;
/// Pause after relaunching the bare host before trying again.
const SETTLE_DELAY_MS: u64 = 1000;
/// Loader used for every open.
const LOADER_FORMAT: &str = "Mach-O";
/// Additional loader for multi-architecture binaries.
const FAT_LOADER: &str = "FAT";
/// Substring of `lipo -info` output for multi-architecture binaries.
const FAT_MARKER: &str = "the fat file";
/// Architecture flag for the bootstrap binary.
const BOOTSTRAP_ARCH_FLAG: &str = "--intel-64";

pub const DEFAULT_LAUNCHER_PATH: &str =
    "/Applications/Hopper Disassembler v4.app/Contents/MacOS/hopper";
pub const DEFAULT_APP_PATH: &str =
    "/Applications/Hopper Disassembler v4.app/Contents/MacOS/Hopper Disassembler v4";
pub const DEFAULT_BOOTSTRAP_BINARY: &str = "lzssdec";
/// Command-line substring identifying host processes.
pub const DEFAULT_PROCESS_PATTERN: &str = "Hopper Disassembler";

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("Failed to spawn host: {0}")]
    Spawn(String),
    #[error("Host exited with an error: {output}")]
    HostFailed { output: String },
    #[error("Host startup bug persisted after {attempts} attempts: {output}")]
    RetriesExhausted { attempts: usize, output: String },
    #[error("Failed to find the host control port")]
    PortNotFound,
    #[error(transparent)]
    Poll(#[from] PollError),
    #[error("Invalid target: {0}")]
    InvalidTarget(String),
    #[error("HTTP client error: {0}")]
    Client(String),
    #[error("Failed to terminate host processes: {0}")]
    Terminate(String),
}

impl From<reqwest::Error> for LaunchError {
    fn from(e: reqwest::Error) -> Self {
        LaunchError::Client(e.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct LaunchConfig {
    /// Command-line launcher that opens files in the running host.
    pub launcher: PathBuf,
    /// The host application binary; a bare run prints the control port.
    pub app: PathBuf,
    /// Small binary opened first so the control listener comes up.
    pub bootstrap_binary: PathBuf,
    pub settle_delay: Duration,
    pub poll: PollConfig,
    pub process_pattern: String,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            launcher: PathBuf::from(DEFAULT_LAUNCHER_PATH),
            app: PathBuf::from(DEFAULT_APP_PATH),
            bootstrap_binary: PathBuf::from(DEFAULT_BOOTSTRAP_BINARY),
            settle_delay: Duration::from_millis(SETTLE_DELAY_MS),
            poll: PollConfig::default(),
            process_pattern: DEFAULT_PROCESS_PATTERN.to_string(),
        }
    }
}

impl LaunchConfig {
    /// The host names a document after its file plus `.hop`.
    pub fn bootstrap_document_name(&self) -> String {
        let stem = self
            .bootstrap_binary
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{stem}.hop")
    }
}

/// Process-level operations the orchestrator needs from the host.
pub trait HostRunner {
    type Source: DocumentSource;

    /// Run the launcher with `args` and wait for it to exit.
    fn run_launcher(
        &self,
        args: &[String],
    ) -> impl Future<Output = Result<ProcessOutput, LaunchError>> + Send;

    /// Run the bare application (no arguments) and capture what it prints.
    fn run_app(&self) -> impl Future<Output = Result<ProcessOutput, LaunchError>> + Send;

    fn is_fat(&self, binary: &Path) -> impl Future<Output = Result<bool, LaunchError>> + Send;

    fn connect(&self, port: ControlPort) -> Result<Self::Source, LaunchError>;

    fn terminate_all(&self) -> Result<usize, LaunchError>;
}

/// Runs the real host binaries.
pub struct SystemRunner {
    launcher: PathBuf,
    app: PathBuf,
    process_pattern: String,
}

impl SystemRunner {
    pub fn new(config: &LaunchConfig) -> Self {
        Self {
            launcher: config.launcher.clone(),
            app: config.app.clone(),
            process_pattern: config.process_pattern.clone(),
        }
    }
}

impl HostRunner for SystemRunner {
    type Source = ProxyClient;

    async fn run_launcher(&self, args: &[String]) -> Result<ProcessOutput, LaunchError> {
        let (_process, output) = HostProcess::run(&self.launcher, args)
            .await
            .map_err(|e| LaunchError::Spawn(format!("{}: {e}", self.launcher.display())))?;
        Ok(output)
    }

    async fn run_app(&self) -> Result<ProcessOutput, LaunchError> {
        let (_process, output) = HostProcess::run(&self.app, &[])
            .await
            .map_err(|e| LaunchError::Spawn(format!("{}: {e}", self.app.display())))?;
        Ok(output)
    }

    async fn is_fat(&self, binary: &Path) -> Result<bool, LaunchError> {
        let args = ["-info".to_string(), binary.display().to_string()];
        let (_process, output) = HostProcess::run(Path::new("/usr/bin/lipo"), &args)
            .await
            .map_err(|e| LaunchError::Spawn(format!("lipo: {e}")))?;
        if !output.success() {
            return Err(LaunchError::InvalidTarget(output.output.trim().to_string()));
        }
        Ok(output.output.contains(FAT_MARKER))
    }

    fn connect(&self, port: ControlPort) -> Result<ProxyClient, LaunchError> {
        Ok(ProxyClient::new(port)?)
    }

    fn terminate_all(&self) -> Result<usize, LaunchError> {
        terminate_by_name(&self.process_pattern).map_err(terminate_failed)
    }
}

fn terminate_failed(e: std::io::Error) -> LaunchError {
    LaunchError::Terminate(e.to_string())
}

/// A target document that is open, analyzed and addressable through the proxy.
#[derive(Debug, Clone, Serialize)]
pub struct LaunchedSession {
    pub id: String,
    pub port: ControlPort,
    pub document: String,
    pub binary_path: String,
    pub created_at: DateTime<Utc>,
}

/// Drives one host lifetime. Only one orchestrator may target a host.
pub struct Orchestrator<R> {
    runner: R,
    config: LaunchConfig,
    /// Set once the bootstrap document is serving requests.
    control_port: Option<ControlPort>,
}

impl<R: HostRunner> Orchestrator<R> {
    pub fn new(runner: R, config: LaunchConfig) -> Self {
        Self {
            runner,
            config,
            control_port: None,
        }
    }

    pub fn control_port(&self) -> Option<ControlPort> {
        self.control_port
    }

    /// Open `target` in the host and wait until its document is ready.
    ///
    /// `PollConfig::timeout` bounds the whole sequence, launcher runs
    /// included; when it passes, the launch fails with a poll timeout.
    pub async fn launch_and_wait_ready(
        &mut self,
        target: &Path,
        arch_flag: &str,
    ) -> Result<LaunchedSession, LaunchError> {
        let target = resolve_target(target)?;
        let Some(limit) = self.config.poll.timeout else {
            return self.open_and_wait(&target, arch_flag, None).await;
        };
        let started = Instant::now();
        let deadline = started + limit;
        match timeout_at(deadline, self.open_and_wait(&target, arch_flag, Some(deadline))).await {
            Ok(result) => result,
            Err(_) => Err(LaunchError::Poll(PollError::Timeout {
                what: "launch sequence",
                waited: started.elapsed(),
            })),
        }
    }

    async fn open_and_wait(
        &mut self,
        target: &Path,
        arch_flag: &str,
        deadline: Option<Instant>,
    ) -> Result<LaunchedSession, LaunchError> {
        let target_str = target.display().to_string();

        let port = match self.control_port {
            Some(port) => port,
            None => self.bring_up(deadline).await?,
        };
        let poller = Poller::new(self.runner.connect(port)?, self.config.poll.clone())
            .with_deadline(deadline);

        let before = poller.snapshot().await?;
        debug!(documents = ?before, "Documents before open");

        info!(target = %target_str, arch = %arch_flag, "Opening target binary");
        let args = self.target_args(target, arch_flag).await?;
        self.spawn_with_workaround(&args).await?;

        let doc = poller.wait_until_ready(&before, Some(&target_str)).await?;

        Ok(LaunchedSession {
            id: Uuid::new_v4().to_string(),
            port,
            document: doc.name,
            binary_path: target_str,
            created_at: Utc::now(),
        })
    }

    /// Launcher arguments for `target`, with the FAT loader added for
    /// multi-architecture binaries.
    async fn target_args(&self, target: &Path, arch_flag: &str) -> Result<Vec<String>, LaunchError> {
        let mut args = open_args(target, arch_flag);
        if self.runner.is_fat(target).await? {
            debug!(target = %target.display(), "Multi-architecture binary");
            args.extend([String::from("-l"), FAT_LOADER.to_string()]);
        }
        Ok(args)
    }

    /// Open the bootstrap document, find the control port and wait until the
    /// proxy answers with the bootstrap document listed.
    async fn bring_up(&mut self, deadline: Option<Instant>) -> Result<ControlPort, LaunchError> {
        let bootstrap = resolve_target(&self.config.bootstrap_binary)?;
        info!(bootstrap = %bootstrap.display(), "Launching host with bootstrap document");
        self.spawn_with_workaround(&open_args(&bootstrap, BOOTSTRAP_ARCH_FLAG))
            .await?;

        let port = self.discover_port().await?;
        info!(port = port.get(), "Found host control port");

        let poller = Poller::new(self.runner.connect(port)?, self.config.poll.clone())
            .with_deadline(deadline);
        poller
            .wait_for_document(&self.config.bootstrap_document_name())
            .await?;
        info!(port = port.get(), "Host control listener is serving");

        self.control_port = Some(port);
        Ok(port)
    }

    async fn discover_port(&self) -> Result<ControlPort, LaunchError> {
        let output = self.runner.run_app().await?;
        discover_port(&output.output).ok_or(LaunchError::PortNotFound)
    }

    /// Run the launcher, retrying once per attempt if the host hits its
    /// known startup bug. Any other failure is fatal immediately.
    async fn spawn_with_workaround(&self, args: &[String]) -> Result<(), LaunchError> {
        let mut last_output = String::new();
        for attempt in 1..=MAX_SPAWN_ATTEMPTS {
            let output = self.runner.run_launcher(args).await?;
            if output.success() {
                debug!(attempt, "Launcher finished");
                return Ok(());
            }
            match classify_exit(&output.output) {
                ExitClass::KnownStartupBug => {
                    warn!(attempt, "Host hit its startup bug, relaunching");
                    last_output = output.output;
                    if attempt < MAX_SPAWN_ATTEMPTS {
                        // Relaunching the bare host clears the bad state
                        if let Err(e) = self.runner.run_launcher(&[]).await {
                            debug!(error = %e, "Bare relaunch failed");
                        }
                        sleep(self.config.settle_delay).await;
                    }
                }
                ExitClass::OtherFailure(output) => {
                    return Err(LaunchError::HostFailed { output });
                }
            }
        }
        Err(LaunchError::RetriesExhausted {
            attempts: MAX_SPAWN_ATTEMPTS,
            output: last_output,
        })
    }

    /// Kill every host process. The control port is forgotten with it.
    pub fn terminate(&mut self) -> Result<usize, LaunchError> {
        self.control_port = None;
        self.runner.terminate_all()
    }
}

fn open_args(binary: &Path, arch_flag: &str) -> Vec<String> {
    vec![
        "-A".to_string(),
        "-e".to_string(),
        binary.display().to_string(),
        "-l".to_string(),
        LOADER_FORMAT.to_string(),
        arch_flag.to_string(),
    ]
}

fn resolve_target(path: &Path) -> Result<PathBuf, LaunchError> {
    if !path.is_file() {
        return Err(LaunchError::InvalidTarget(format!(
            "Not a file: {}",
            path.display()
        )));
    }
    std::fs::canonicalize(path).map_err(|e| LaunchError::InvalidTarget(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch::poller::scripted::ScriptedSource;
    use crate::launch::process::STARTUP_BUG_MARKER;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Replays launcher outcomes and records every invocation.
    struct ScriptedRunner {
        launcher_results: Mutex<Vec<ProcessOutput>>,
        launcher_calls: Mutex<Vec<Vec<String>>>,
        app_output: String,
        fat: bool,
        source: Arc<ScriptedSource>,
        terminated: AtomicUsize,
    }

    impl ScriptedRunner {
        fn new(results: Vec<ProcessOutput>, app_output: &str, source: ScriptedSource) -> Self {
            Self {
                launcher_results: Mutex::new(results),
                launcher_calls: Mutex::new(Vec::new()),
                app_output: app_output.to_string(),
                fat: false,
                source: Arc::new(source),
                terminated: AtomicUsize::new(0),
            }
        }

        /// Launcher invocations that carried a file to open.
        fn open_calls(&self) -> Vec<Vec<String>> {
            self.launcher_calls
                .lock()
                .unwrap()
                .iter()
                .filter(|args| !args.is_empty())
                .cloned()
                .collect()
        }

        fn bare_calls(&self) -> usize {
            self.launcher_calls
                .lock()
                .unwrap()
                .iter()
                .filter(|args| args.is_empty())
                .count()
        }
    }

    fn ok() -> ProcessOutput {
        ProcessOutput {
            code: Some(0),
            output: String::new(),
        }
    }

    fn bug() -> ProcessOutput {
        ProcessOutput {
            code: Some(1),
            output: format!("execution error: {STARTUP_BUG_MARKER} (-1700)"),
        }
    }

    impl HostRunner for ScriptedRunner {
        type Source = Arc<ScriptedSource>;

        async fn run_launcher(&self, args: &[String]) -> Result<ProcessOutput, LaunchError> {
            self.launcher_calls.lock().unwrap().push(args.to_vec());
            if args.is_empty() {
                return Ok(ok());
            }
            let mut results = self.launcher_results.lock().unwrap();
            Ok(if results.is_empty() {
                ok()
            } else {
                results.remove(0)
            })
        }

        async fn run_app(&self) -> Result<ProcessOutput, LaunchError> {
            Ok(ProcessOutput {
                code: Some(0),
                output: self.app_output.clone(),
            })
        }

        async fn is_fat(&self, _binary: &Path) -> Result<bool, LaunchError> {
            Ok(self.fat)
        }

        fn connect(&self, _port: ControlPort) -> Result<Self::Source, LaunchError> {
            // every connection shares one document timeline
            Ok(Arc::clone(&self.source))
        }

        fn terminate_all(&self) -> Result<usize, LaunchError> {
            self.terminated.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        }
    }

    impl DocumentSource for Arc<ScriptedSource> {
        async fn list_documents(&self) -> Result<Vec<String>, PollError> {
            self.as_ref().list_documents().await
        }

        async fn document_path(&self, name: &str) -> Result<Option<String>, PollError> {
            self.as_ref().document_path(name).await
        }
    }

    fn config(bootstrap: &Path) -> LaunchConfig {
        LaunchConfig {
            bootstrap_binary: bootstrap.to_path_buf(),
            settle_delay: Duration::from_millis(1),
            poll: PollConfig {
                interval: Duration::from_millis(1),
                timeout: Some(Duration::from_secs(5)),
                ..PollConfig::default()
            },
            ..LaunchConfig::default()
        }
    }

    #[test]
    fn bootstrap_document_name_uses_file_name() {
        let cfg = LaunchConfig {
            bootstrap_binary: PathBuf::from("/opt/tools/lzssdec"),
            ..LaunchConfig::default()
        };
        assert_eq!(cfg.bootstrap_document_name(), "lzssdec.hop");
    }

    #[tokio::test]
    async fn startup_bug_is_retried_at_most_twice() {
        let bootstrap = tempfile::NamedTempFile::new().unwrap();
        let runner = ScriptedRunner::new(
            vec![bug(), bug(), bug()],
            "",
            ScriptedSource::new(vec![]),
        );
        let orchestrator = Orchestrator::new(runner, config(bootstrap.path()));

        let err = orchestrator
            .spawn_with_workaround(&open_args(bootstrap.path(), "--aarch64"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LaunchError::RetriesExhausted {
                attempts: MAX_SPAWN_ATTEMPTS,
                ..
            }
        ));
        assert!(err.to_string().contains(STARTUP_BUG_MARKER));
        assert_eq!(orchestrator.runner.open_calls().len(), MAX_SPAWN_ATTEMPTS);
        assert_eq!(orchestrator.runner.bare_calls(), 1);
    }

    #[tokio::test]
    async fn startup_bug_recovers_on_second_attempt() {
        let bootstrap = tempfile::NamedTempFile::new().unwrap();
        let runner = ScriptedRunner::new(vec![bug(), ok()], "", ScriptedSource::new(vec![]));
        let orchestrator = Orchestrator::new(runner, config(bootstrap.path()));
        orchestrator
            .spawn_with_workaround(&open_args(bootstrap.path(), "--aarch64"))
            .await
            .unwrap();
        assert_eq!(orchestrator.runner.open_calls().len(), 2);
    }

    #[tokio::test]
    async fn other_failures_are_fatal_without_retry() {
        let bootstrap = tempfile::NamedTempFile::new().unwrap();
        let failure = ProcessOutput {
            code: Some(2),
            output: "unknown loader".to_string(),
        };
        let runner = ScriptedRunner::new(vec![failure], "", ScriptedSource::new(vec![]));
        let orchestrator = Orchestrator::new(runner, config(bootstrap.path()));
        let err = orchestrator
            .spawn_with_workaround(&open_args(bootstrap.path(), "--aarch64"))
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchError::HostFailed { ref output } if output == "unknown loader"));
        assert_eq!(orchestrator.runner.open_calls().len(), 1);
    }

    #[tokio::test]
    async fn missing_port_is_fatal() {
        let bootstrap = tempfile::NamedTempFile::new().unwrap();
        let target = tempfile::NamedTempFile::new().unwrap();
        let runner = ScriptedRunner::new(vec![], "crashed", ScriptedSource::new(vec![]));
        let mut orchestrator = Orchestrator::new(runner, config(bootstrap.path()));
        let err = orchestrator
            .launch_and_wait_ready(target.path(), "--aarch64")
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchError::PortNotFound));
        assert!(orchestrator.control_port().is_none());
    }

    #[tokio::test]
    async fn launches_and_waits_for_target_document() {
        let dir = tempfile::tempdir().unwrap();
        let bootstrap = dir.path().join("lzssdec");
        let target = dir.path().join("target.bin");
        std::fs::write(&bootstrap, b"boot").unwrap();
        std::fs::write(&target, b"target").unwrap();
        let target_path = std::fs::canonicalize(&target).unwrap();

        let source = ScriptedSource::new(vec![
            Err("connection refused"),
            Ok(vec!["lzssdec.hop"]),
            // snapshot before opening the target
            Ok(vec!["lzssdec.hop"]),
            Ok(vec!["lzssdec.hop", "Untitled 2"]),
            Ok(vec!["lzssdec.hop", "target.bin.hop"]),
        ])
        .with_path("target.bin.hop", &target_path.display().to_string());
        let runner = ScriptedRunner::new(
            vec![bug(), ok(), ok()],
            "Hopper already running on port: 49812\n",
            source,
        );
        let mut orchestrator = Orchestrator::new(runner, config(&bootstrap));

        let session = orchestrator
            .launch_and_wait_ready(&target, "--aarch64")
            .await
            .unwrap();
        assert_eq!(session.port.get(), 49812);
        assert_eq!(session.document, "target.bin.hop");
        assert_eq!(session.binary_path, target_path.display().to_string());
        assert_eq!(orchestrator.control_port(), ControlPort::new(49812));

        let opens = orchestrator.runner.open_calls();
        assert_eq!(opens.len(), 3);
        assert!(opens[0].contains(&BOOTSTRAP_ARCH_FLAG.to_string()));
        assert!(opens[2].contains(&"--aarch64".to_string()));
        assert!(!opens[2].contains(&FAT_LOADER.to_string()));

        assert_eq!(orchestrator.terminate().unwrap(), 1);
        assert!(orchestrator.control_port().is_none());
    }

    #[tokio::test]
    async fn fat_binaries_get_the_fat_loader() {
        let dir = tempfile::tempdir().unwrap();
        let bootstrap = dir.path().join("lzssdec");
        let target = dir.path().join("universal.bin");
        std::fs::write(&bootstrap, b"boot").unwrap();
        std::fs::write(&target, b"fat").unwrap();
        let target_path = std::fs::canonicalize(&target).unwrap();

        let source = ScriptedSource::new(vec![
            Ok(vec!["lzssdec.hop"]),
            Ok(vec!["lzssdec.hop"]),
            Ok(vec!["lzssdec.hop", "universal.bin.hop"]),
        ])
        .with_path("universal.bin.hop", &target_path.display().to_string());
        let mut runner = ScriptedRunner::new(vec![], "Hopper already running on port: 49812\n", source);
        runner.fat = true;
        let mut orchestrator = Orchestrator::new(runner, config(&bootstrap));

        let session = orchestrator
            .launch_and_wait_ready(&target, "--aarch64")
            .await
            .unwrap();
        assert_eq!(session.document, "universal.bin.hop");

        let opens = orchestrator.runner.open_calls();
        assert_eq!(opens.len(), 2);
        assert!(!opens[0].contains(&FAT_LOADER.to_string()));
        let last = &opens[1];
        assert!(last.contains(&"--aarch64".to_string()));
        assert_eq!(
            &last[last.len() - 2..],
            &["-l".to_string(), FAT_LOADER.to_string()]
        );
    }

    #[tokio::test]
    async fn deadline_covers_the_whole_launch() {
        let dir = tempfile::tempdir().unwrap();
        let bootstrap = dir.path().join("lzssdec");
        let target = dir.path().join("target.bin");
        std::fs::write(&bootstrap, b"boot").unwrap();
        std::fs::write(&target, b"target").unwrap();
        let target_path = std::fs::canonicalize(&target).unwrap();

        // Bring-up and readiness each take about three intervals; either
        // alone fits the timeout, both together do not.
        let source = ScriptedSource::new(vec![
            Err("connection refused"),
            Err("connection refused"),
            Err("connection refused"),
            Ok(vec!["lzssdec.hop"]),
            Ok(vec!["lzssdec.hop"]),
            Ok(vec!["lzssdec.hop"]),
            Ok(vec!["lzssdec.hop"]),
            Ok(vec!["lzssdec.hop"]),
            Ok(vec!["lzssdec.hop", "target.bin.hop"]),
        ])
        .with_path("target.bin.hop", &target_path.display().to_string());
        let runner = ScriptedRunner::new(vec![], "Hopper already running on port: 49812\n", source);
        let mut cfg = config(&bootstrap);
        cfg.poll.interval = Duration::from_millis(60);
        cfg.poll.timeout = Some(Duration::from_millis(250));
        let mut orchestrator = Orchestrator::new(runner, cfg);

        let started = Instant::now();
        let err = orchestrator
            .launch_and_wait_ready(&target, "--aarch64")
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchError::Poll(PollError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[test]
    fn terminate_failures_are_not_spawn_errors() {
        let err = terminate_failed(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "ps: not found",
        ));
        assert!(matches!(err, LaunchError::Terminate(_)));
        assert_eq!(
            err.to_string(),
            "Failed to terminate host processes: ps: not found"
        );
    }

    #[test]
    fn rejects_missing_target() {
        let err = resolve_target(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, LaunchError::InvalidTarget(_)));
    }
}
