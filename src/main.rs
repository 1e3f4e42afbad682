//! Pad Remote
//!
//! Drive MPC-HC/MPC-BE or VLC from a game controller, or from a phone on the
//! LAN through the built-in remote page.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pad_remote::cli::{self, HostCommand};
use pad_remote::config::{AppConfig, ConfigWatcher, RemoteConfig};
use pad_remote::dispatch::{native_player, ActionDispatcher};
use pad_remote::input::gamepad::{print_gamepad_diagnostics, NativeProbe};
use pad_remote::paths::AppPaths;
use pad_remote::poller::{spawn_poller, EngineCommand, PollerHandle, PollerSettings};
use pad_remote::remote::{RemoteListener, MIN_REMOTE_PORT};

/// Pad Remote - control your media player with a gamepad or a phone
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: app data directory)
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List detected controllers and exit
    #[arg(long)]
    list_devices: bool,

    /// Enable the remote listener on this port, overriding the config
    #[arg(long)]
    remote_port: Option<u16>,

    /// Run without the interactive prompt
    #[arg(long)]
    no_repl: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let paths = AppPaths::detect();
    paths.ensure_directories()?;

    let _log_guard = init_logging(&args.log_level, &paths.logs_dir)?;

    info!("Starting Pad Remote v{}...", env!("CARGO_PKG_VERSION"));

    if args.list_devices {
        print_gamepad_diagnostics();
        return Ok(());
    }

    if let Some(port) = args.remote_port {
        if port < MIN_REMOTE_PORT {
            anyhow::bail!("--remote-port {} is invalid (must be {}-65535)", port, MIN_REMOTE_PORT);
        }
    }

    let config_path = match args.config {
        Some(path) => path,
        None => {
            paths.ensure_config().await?;
            paths.config.to_string_lossy().into_owned()
        },
    };
    info!("Configuration file: {}", config_path);

    let (config_watcher, initial_config) = ConfigWatcher::new(config_path.clone()).await?;
    info!("Configuration loaded successfully with hot-reload enabled");

    let mut config = (*initial_config).clone();
    apply_overrides(&mut config, args.remote_port);

    run_app(
        Host {
            config,
            config_path,
            remote_override: args.remote_port,
        },
        config_watcher,
        !args.no_repl,
        shutdown_signal(),
    )
    .await?;

    info!("Pad Remote shutdown complete");
    Ok(())
}

/// Host-owned state that outlives config reloads
struct Host {
    config: AppConfig,
    config_path: String,
    remote_override: Option<u16>,
}

fn apply_overrides(config: &mut AppConfig, remote_port: Option<u16>) {
    if let Some(port) = remote_port {
        config.remote.enabled = true;
        config.remote.port = port;
    }
}

async fn run_app(
    mut host: Host,
    mut config_watcher: ConfigWatcher,
    repl: bool,
    shutdown: impl std::future::Future<Output = ()>,
) -> Result<()> {
    info!("Starting main application loop...");

    let (action_tx, action_rx) = mpsc::unbounded_channel();
    let dispatcher = ActionDispatcher::new(native_player()).spawn(action_rx);

    let rules = host.config.to_ruleset().context("Invalid bindings")?;
    let deadzone = host.config.gamepad.deadzone;
    let poller = spawn_poller(
        move || NativeProbe::new(deadzone),
        rules,
        PollerSettings {
            poll_interval: host.config.poll_interval(),
            reconnect_interval: host.config.reconnect_interval(),
        },
        action_tx.clone(),
    )
    .context("Failed to start poll thread")?;

    let remote = RemoteListener::new(action_tx);
    if host.config.remote.enabled {
        enable_remote(&remote, &mut host.config.remote).await;
    }

    let (host_tx, mut host_rx) = mpsc::unbounded_channel();
    if repl {
        cli::spawn_repl(host_tx.clone()).context("Failed to start REPL")?;
        cli::print_bindings(&poller.snapshot());
        cli::print_help();
    }

    let mut status_rx = poller.status();
    let mut last_message = String::new();

    info!("✅ Ready");

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(command) = host_rx.recv() => {
                if command == HostCommand::Quit {
                    info!("Quit requested");
                    break;
                }
                handle_command(command, &mut host, &poller, &remote).await;
            }

            Ok(()) = status_rx.changed() => {
                let message = status_rx.borrow_and_update().message.clone();
                if message != last_message {
                    info!("{}", message);
                    last_message = message;
                }
            }

            Some(new_config) = config_watcher.next_config() => {
                info!("📝 Configuration file changed, reloading...");
                apply_config(new_config, &mut host, &poller, &remote).await;
            }

            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping event loop");
                break;
            }
        }
    }

    // Cleanup
    info!("Shutting down...");
    drop(host_tx);
    if let Err(e) = tokio::task::spawn_blocking(move || poller.shutdown()).await {
        warn!("Poll thread shutdown failed: {}", e);
    }
    remote.stop().await;
    drop(remote);
    if let Err(e) = dispatcher.await {
        warn!("Dispatcher task failed: {}", e);
    }

    Ok(())
}

async fn handle_command(
    command: HostCommand,
    host: &mut Host,
    poller: &PollerHandle,
    remote: &RemoteListener,
) {
    use colored::*;

    let status = poller.snapshot();
    match command {
        HostCommand::List => cli::print_bindings(&status),
        HostCommand::Learn(key) => match status.rules.lookup(&key) {
            Ok(index) => poller.send(EngineCommand::Learn(index)),
            Err(e) => println!("{}", e.to_string().red()),
        },
        HostCommand::Cancel => poller.send(EngineCommand::Cancel),
        HostCommand::Clear(key) => match status.rules.lookup(&key) {
            Ok(index) => poller.send(EngineCommand::Clear(index)),
            Err(e) => println!("{}", e.to_string().red()),
        },
        HostCommand::Status => cli::print_status(&status, &remote.status_line()),
        HostCommand::Save => {
            host.config.store_bindings(&status.rules);
            match host.config.save(&host.config_path).await {
                Ok(()) => println!("{}", format!("Saved to {}", host.config_path).green()),
                Err(e) => println!("{}", format!("Save failed: {:#}", e).red()),
            }
        },
        HostCommand::Remote(true) => {
            enable_remote(remote, &mut host.config.remote).await;
            println!("{}", remote.status_line());
        },
        HostCommand::Remote(false) => {
            host.config.remote.enabled = false;
            remote.stop().await;
            println!("{}", remote.status_line());
        },
        HostCommand::Help => cli::print_help(),
        HostCommand::Quit => {},
    }
}

/// Apply a reloaded config to the running services
async fn apply_config(
    mut new_config: AppConfig,
    host: &mut Host,
    poller: &PollerHandle,
    remote: &RemoteListener,
) {
    apply_overrides(&mut new_config, host.remote_override);
    let old = &host.config;

    if new_config.bindings != old.bindings {
        match new_config.to_ruleset() {
            Ok(rules) => poller.send(EngineCommand::ReplaceRules(rules)),
            Err(e) => {
                warn!("⚠️  Invalid bindings (keeping old config): {}", e);
                return;
            },
        }
    }

    if new_config.gamepad.reconnect_interval_ms != old.gamepad.reconnect_interval_ms {
        poller.send(EngineCommand::SetReconnectInterval(new_config.reconnect_interval()));
    }

    if new_config.poll_interval_ms != old.poll_interval_ms
        || new_config.gamepad.deadzone != old.gamepad.deadzone
    {
        warn!("poll_interval_ms and gamepad.deadzone take effect after a restart");
    }

    if new_config.remote != old.remote {
        if remote.is_running() {
            remote.stop().await;
        }
        if new_config.remote.enabled {
            enable_remote(remote, &mut new_config.remote).await;
        }
    }

    host.config = new_config;
    debug!("Configuration applied");
}

async fn start_remote(remote: &RemoteListener, port: u16) -> bool {
    match remote.start(port).await {
        Ok(_) => {
            info!("{}", remote.status_line());
            true
        },
        Err(e) => {
            warn!("⚠️  {} (remote disabled)", e);
            false
        },
    }
}

/// Start the listener and record the setting only if it is serving
async fn enable_remote(remote: &RemoteListener, settings: &mut RemoteConfig) {
    settings.enabled = start_remote(remote, settings.port).await;
}

fn init_logging(level: &str, logs_dir: &Path) -> Result<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::daily(logs_dir, "pad-remote.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failed_bind_leaves_remote_disabled() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let holder = RemoteListener::new(tx.clone());
        let addr = holder.start(0).await.unwrap();

        let remote = RemoteListener::new(tx);
        let mut settings = RemoteConfig {
            enabled: false,
            port: addr.port(),
        };
        enable_remote(&remote, &mut settings).await;
        assert!(!settings.enabled);
        assert!(!remote.is_running());

        holder.stop().await;
        enable_remote(&remote, &mut settings).await;
        assert!(settings.enabled);
        assert!(remote.is_running());
        remote.stop().await;
    }
}
