use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tether::ConnectionState;
use tether::relay::{ConnectionWrapper, PeerController, LineChannel, RelayConfig, RelayLoop, TransportConfig};
use tokio::process::Command;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tether")]
#[command(
    about = "Establish a WebRTC peer connection using a remote shell as the signaling channel"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer an offer read from stdin. The answer and local candidates go to stdout.
    Accept {
        #[command(flatten)]
        relay: RelayArgs,
    },

    /// Start a remote command, e.g. `ssh host tether accept`, and negotiate through it.
    Connect {
        #[command(flatten)]
        relay: RelayArgs,

        #[arg(
            required = true,
            num_args = 1..,
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        command: Vec<String>,
    },
}

#[derive(clap::Args)]
struct RelayArgs {
    /// STUN server URL, repeatable. Defaults to a public server.
    #[arg(long = "stun", env = "TETHER_STUN", value_delimiter = ',')]
    stun: Vec<String>,

    /// Milliseconds between candidate drains.
    #[arg(long, env = "TETHER_TICK_MS", default_value_t = 500)]
    tick_ms: u64,

    /// Seconds a failed or disconnected peer may take to recover.
    #[arg(long, env = "TETHER_GRACE_SECS", default_value_t = 5)]
    grace_secs: u64,

    /// Seconds to reach a connection before giving up.
    #[arg(long, env = "TETHER_DEADLINE_SECS", default_value_t = 30)]
    deadline_secs: u64,
}

impl RelayArgs {
    fn relay_config(&self) -> RelayConfig {
        RelayConfig::default()
            .with_tick_interval(Duration::from_millis(self.tick_ms.max(1)))
            .with_failure_grace(Duration::from_secs(self.grace_secs))
            .with_deadline(Duration::from_secs(self.deadline_secs))
    }

    fn transport_config(&self) -> TransportConfig {
        TransportConfig::with_stun_urls(self.stun.iter().cloned())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    match Cli::parse().command {
        Commands::Accept { relay } => {
            accept(relay).await?;
            // tokio's stdin reader blocks a thread until EOF, which would
            // hold runtime shutdown open after Ctrl-C.
            std::process::exit(0)
        }
        Commands::Connect { relay, command } => connect(relay, command).await,
    }
}

/// Logs go to stderr: stdout may be the signaling channel.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn accept(args: RelayArgs) -> Result<()> {
    let peer = Arc::new(
        ConnectionWrapper::new(args.transport_config())
            .await
            .context("Failed to create peer connection")?,
    );
    let channel = LineChannel::spawn(tokio::io::stdin(), tokio::io::stdout());

    let established = RelayLoop::answerer(Box::new(channel), peer.clone(), args.relay_config())
        .run()
        .await
        .context("Negotiation failed")?;
    eprintln!(
        "{}",
        format!("✔ Connected (session {})", established.report.session)
            .green()
            .bold()
    );

    hold(&peer).await;

    let mut channel = established.channel;
    channel.close().await;
    peer.close().await.context("Failed to close peer connection")?;
    Ok(())
}

async fn connect(args: RelayArgs, command: Vec<String>) -> Result<()> {
    let (program, rest) = command.split_first().context("No remote command given")?;
    let mut child = Command::new(program)
        .args(rest)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("Failed to start `{}`", command.join(" ")))?;

    let stdin = child.stdin.take().context("Remote command has no stdin")?;
    let stdout = child.stdout.take().context("Remote command has no stdout")?;
    let stderr = child.stderr.take().context("Remote command has no stderr")?;
    let channel = LineChannel::spawn(stdout, stdin).with_stderr(stderr);

    let peer = Arc::new(
        ConnectionWrapper::new(args.transport_config())
            .await
            .context("Failed to create peer connection")?,
    );

    println!("{}", "📡 Negotiating over the remote shell...".cyan());
    let established =
        match RelayLoop::offerer(Box::new(channel), peer.clone(), args.relay_config())
            .run()
            .await
        {
            Ok(established) => established,
            Err(e) => {
                let _ = child.kill().await;
                return Err(e).context("Negotiation failed");
            }
        };

    let report = &established.report;
    println!(
        "{}",
        format!("✨ Connected (session {})", report.session)
            .green()
            .bold()
    );
    println!(
        "   {} candidates sent, {} applied, {} lines ignored",
        report.sent_candidates, report.applied_candidates, report.ignored_lines
    );

    hold(&peer).await;

    let mut channel = established.channel;
    channel.close().await;
    peer.close().await.context("Failed to close peer connection")?;
    let _ = child.kill().await;
    Ok(())
}

/// Keep the connection up until it ends or the user interrupts.
async fn hold(peer: &ConnectionWrapper) {
    let mut state = peer.watch_state();
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Interrupted, closing"),
        _ = state.wait_for(|s| matches!(s, ConnectionState::Failed | ConnectionState::Closed)) => {
            info!("Peer connection ended");
        }
    }
}
