//! Hopper remote-control CLI.
//!
//! Architecture (serve):
//! - Main thread: runs the host loop that owns the document model
//! - Background thread: runs the tokio runtime with the HTTP request proxy

use clap::{Args, Parser, Subcommand};
use hopper_bridge::host::worker::{DEFAULT_QUEUE_CAPACITY, DEFAULT_REQUEST_TIMEOUT_SECS};
use hopper_bridge::host::{self, HostWorker, SnapshotHost};
use hopper_bridge::launch::orchestrator::{
    DEFAULT_APP_PATH, DEFAULT_BOOTSTRAP_BINARY, DEFAULT_LAUNCHER_PATH, DEFAULT_PROCESS_PATTERN,
};
use hopper_bridge::launch::{
    discover_port, terminate_by_name, ControlPort, HostRunner, LaunchConfig, Orchestrator,
    PollConfig, ProxyClient, SystemRunner, DEFAULT_PROXY_PORT,
};
use hopper_bridge::server::{default_registry, Dispatcher, ProxyServer};
use hopper_bridge::expand_path;
use serde_json::{Map, Value};
use std::net::SocketAddr;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "hopper-bridge", version, about = "Drive Hopper Disassembler remotely")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the request proxy over a snapshot-backed document model
    Serve(ServeArgs),
    /// Open a binary in the host and wait until its document is ready
    Launch(LaunchArgs),
    /// Print the host's control port
    Port(HostArgs),
    /// Send one request to a running proxy
    Call(CallArgs),
    /// Kill every running host process
    Terminate(TerminateArgs),
    /// List the proxy's routes
    Routes,
}

#[derive(Args)]
struct ServeArgs {
    /// JSON analysis export to serve
    #[arg(long)]
    snapshot: String,
    /// Bind address
    #[arg(long, default_value_t = format!("127.0.0.1:{DEFAULT_PROXY_PORT}"))]
    bind: String,
    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    request_timeout: u64,
    /// Command-line substring used by /terminate to find host processes
    #[arg(long, default_value = DEFAULT_PROCESS_PATTERN)]
    process_pattern: String,
    /// Make /terminate only close the snapshot's documents
    #[arg(long)]
    keep_host: bool,
}

#[derive(Args, Clone)]
struct HostArgs {
    /// Command-line launcher used to open files
    #[arg(long, env = "HOPPER_LAUNCHER", default_value = DEFAULT_LAUNCHER_PATH)]
    launcher: String,
    /// Host application binary
    #[arg(long, env = "HOPPER_APP", default_value = DEFAULT_APP_PATH)]
    app: String,
}

#[derive(Args)]
struct LaunchArgs {
    /// Binary to open
    binary: String,
    /// Architecture to load (aarch64, intel-64, ...)
    #[arg(long, default_value = "aarch64")]
    arch: String,
    /// Readiness timeout in seconds (0 waits forever)
    #[arg(long, default_value_t = 600)]
    timeout: u64,
    /// Terminate running host processes first
    #[arg(long)]
    fresh: bool,
    /// Small binary opened first to bring up the control listener
    #[arg(long, env = "HOPPER_BOOTSTRAP", default_value = DEFAULT_BOOTSTRAP_BINARY)]
    bootstrap: String,
    #[command(flatten)]
    host: HostArgs,
}

#[derive(Args)]
struct CallArgs {
    /// Route path, e.g. /segments
    path: String,
    /// Proxy port
    #[arg(long)]
    port: u16,
    /// Argument as key=value; repeatable
    #[arg(long = "arg", value_parser = parse_key_value)]
    args: Vec<(String, String)>,
}

#[derive(Args)]
struct TerminateArgs {
    #[arg(long, default_value = DEFAULT_PROCESS_PATTERN)]
    pattern: String,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{s}'"))
}

/// Numbers stay numbers so addresses can be given in decimal.
fn argument_value(raw: &str) -> Value {
    raw.parse::<u64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn main() -> anyhow::Result<()> {
    // Initialize logging to stderr (stdout carries command output)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hopper_bridge=info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => run_serve(args),
        Command::Launch(args) => run_async(run_launch(args)),
        Command::Port(args) => run_async(run_port(args)),
        Command::Call(args) => run_async(run_call(args)),
        Command::Terminate(args) => run_terminate(args),
        Command::Routes => run_routes(),
    }
}

fn run_async<F>(fut: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = anyhow::Result<()>>,
{
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(fut)
}

async fn wait_for_shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv() => {},
            _ = tokio::signal::ctrl_c() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }

    Ok(())
}

fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    info!("Starting request proxy (snapshot mode)");

    let bind_addr: SocketAddr = args
        .bind
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid bind address: {e}"))?;
    let mut model = SnapshotHost::load(&expand_path(&args.snapshot))?;
    if !args.keep_host {
        model = model.with_process_pattern(args.process_pattern);
    }
    let dispatcher = Dispatcher::new(default_registry()?);

    let (tx, rx) = mpsc::sync_channel(DEFAULT_QUEUE_CAPACITY);
    let worker =
        HostWorker::new(tx).with_request_timeout(Duration::from_secs(args.request_timeout));

    let server_handle = thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                error!("Failed to create tokio runtime: {e}");
                return;
            }
        };

        let result = rt.block_on(async move {
            let cancel = CancellationToken::new();
            let listener = tokio::net::TcpListener::bind(bind_addr)
                .await
                .map_err(|e| anyhow::anyhow!("bind failed: {e}"));

            let shutdown_worker = worker.clone();
            let listener = match listener {
                Ok(listener) => listener,
                Err(e) => {
                    let _ = shutdown_worker.shutdown().await;
                    return Err(e);
                }
            };

            let cancel_for_shutdown = cancel.clone();
            tokio::spawn(async move {
                if wait_for_shutdown_signal().await.is_ok() {
                    info!("Shutdown signal received");
                    cancel_for_shutdown.cancel();
                }
            });

            let served = ProxyServer::new(worker, cancel).serve(listener).await;
            let _ = shutdown_worker.shutdown().await;
            served
        });
        if let Err(err) = result {
            error!("HTTP server error: {err}");
        }
    });

    info!("Starting host loop");
    host::run_host_loop(rx, &mut model, &dispatcher);
    info!("Host loop finished");

    if let Err(e) = server_handle.join() {
        error!("Server thread panicked: {:?}", e);
    }

    info!("Server stopped");
    Ok(())
}

fn launch_config(host: &HostArgs) -> LaunchConfig {
    LaunchConfig {
        launcher: expand_path(&host.launcher),
        app: expand_path(&host.app),
        ..LaunchConfig::default()
    }
}

async fn run_launch(args: LaunchArgs) -> anyhow::Result<()> {
    let mut config = launch_config(&args.host);
    config.bootstrap_binary = expand_path(&args.bootstrap);
    config.poll = PollConfig {
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        ..PollConfig::default()
    };

    let runner = SystemRunner::new(&config);
    if args.fresh {
        let killed = runner.terminate_all()?;
        info!(killed, "Terminated running host processes");
    }

    let arch_flag = if args.arch.starts_with("--") {
        args.arch.clone()
    } else {
        format!("--{}", args.arch)
    };

    let mut orchestrator = Orchestrator::new(runner, config);
    let session = orchestrator
        .launch_and_wait_ready(&expand_path(&args.binary), &arch_flag)
        .await?;
    info!(
        document = %session.document,
        port = session.port.get(),
        "Document ready"
    );
    println!("{}", serde_json::to_string_pretty(&session)?);
    Ok(())
}

async fn run_port(args: HostArgs) -> anyhow::Result<()> {
    let runner = SystemRunner::new(&launch_config(&args));
    let output = runner.run_app().await?;
    let port = discover_port(&output.output)
        .ok_or_else(|| anyhow::anyhow!("failed to find host control port"))?;
    println!("{port}");
    Ok(())
}

async fn run_call(args: CallArgs) -> anyhow::Result<()> {
    let port = ControlPort::new(args.port).ok_or_else(|| anyhow::anyhow!("port must be non-zero"))?;
    let client = ProxyClient::new(port)?;
    let body: Map<String, Value> = args
        .args
        .iter()
        .map(|(k, v)| (k.clone(), argument_value(v)))
        .collect();
    let envelope = client.call(&args.path, Value::Object(body)).await?;
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    if let Some(e) = envelope.error {
        anyhow::bail!("{} failed: {e}", args.path);
    }
    Ok(())
}

fn run_terminate(args: TerminateArgs) -> anyhow::Result<()> {
    let killed = terminate_by_name(&args.pattern)?;
    info!(killed, pattern = %args.pattern, "Terminated host processes");
    println!("{killed}");
    Ok(())
}

fn run_routes() -> anyhow::Result<()> {
    let registry = default_registry()?;
    let infos: Vec<_> = registry.infos().collect();
    println!("{}", serde_json::to_string_pretty(&infos)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_terminates_host_processes_by_default() {
        let cli = Cli::try_parse_from(["hopper-bridge", "serve", "--snapshot", "a.json"]).unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.process_pattern, DEFAULT_PROCESS_PATTERN);
        assert!(!args.keep_host);

        let cli = Cli::try_parse_from([
            "hopper-bridge",
            "serve",
            "--snapshot",
            "a.json",
            "--keep-host",
        ])
        .unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert!(args.keep_host);
    }
}
