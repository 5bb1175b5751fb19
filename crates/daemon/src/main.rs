// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! syncguardd - the syncguard supervisor.
//!
//! Decides when the syncthing daemon may run and drives its lifecycle.
//! Listens on a Unix socket for IPC from `syncguard` CLI processes.
//!
//! Usage:
//!   syncguardd [--state-dir <path>] [--config <path>]

use std::fs;
use std::io::Write;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use nix::sys::signal::{SigSet, Signal};
use sg_core::ConditionSensors;
use sg_ipc::{framing, DaemonRequest};
use sgd::controller::ControllerOptions;
use sgd::monitor::Delivery;
use sgd::notifier::{LogNotifier, Notifier};
use sgd::runtime::SyncthingRuntime;
use sgd::sensors::SystemSensors;
use sgd::service::Service;
use sgd::settings::{Settings, SettingsFile};
use sgd::signals::{FileWatchSource, PollingSource};
use sgd::{env, server, LOCK_NAME, LOG_NAME, OUTPUT_LOG_NAME, PAUSE_MARKER_NAME, PID_NAME, SOCKET_NAME};

fn main() {
    // Parse args
    let args: Vec<String> = std::env::args().collect();
    let state_dir = parse_flag(&args, "--state-dir")
        .map(PathBuf::from)
        .unwrap_or_else(env::default_state_dir);
    let config_path = parse_flag(&args, "--config")
        .map(PathBuf::from)
        .unwrap_or_else(Settings::default_path);

    if let Err(e) = fs::create_dir_all(&state_dir) {
        eprintln!("failed to create {}: {}", state_dir.display(), e);
        std::process::exit(1);
    }

    // Set up logging
    setup_logging(&state_dir.join(LOG_NAME));

    tracing::info!(
        "syncguardd starting, state_dir={}, config={}",
        state_dir.display(),
        config_path.display()
    );

    // Block termination signals before any thread exists so only the
    // signal thread receives them.
    let signals = block_signals();

    // Acquire file lock for single instance
    let lock_path = state_dir.join(LOCK_NAME);
    let lock_file = match acquire_lock(&lock_path) {
        Ok(f) => f,
        Err(e) => {
            tracing::error!("failed to acquire lock: {}", e);
            std::process::exit(1);
        }
    };

    // Write PID file
    let pid_path = state_dir.join(PID_NAME);
    if let Err(e) = write_pid_file(&pid_path) {
        tracing::error!("failed to write PID file: {}", e);
        std::process::exit(1);
    }

    // Bind Unix socket, removing a stale one
    let socket_path = state_dir.join(SOCKET_NAME);
    let _ = fs::remove_file(&socket_path);

    let listener = match UnixListener::bind(&socket_path) {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("failed to bind socket: {}", e);
            cleanup(&pid_path, &socket_path);
            std::process::exit(1);
        }
    };

    let settings = match Settings::load(&config_path) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(
                "failed to load settings {}, using defaults: {}",
                config_path.display(),
                e
            );
            Settings::default()
        }
    };

    let service = match start_service(&state_dir, &config_path, &settings) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("failed to start service: {}", e);
            cleanup(&pid_path, &socket_path);
            std::process::exit(1);
        }
    };

    if let Some(signals) = signals {
        spawn_signal_thread(signals, socket_path.clone());
    }

    tracing::info!("listening on {}", socket_path.display());

    // Signal readiness to parent process
    println!("READY");
    let _ = std::io::stdout().flush();

    server::serve(&listener, &service);

    // Cleanup
    service.shutdown();
    cleanup(&pid_path, &socket_path);
    drop(lock_file);
    tracing::info!("syncguardd stopped");
}

/// Wire sensors and signal sources into a running service.
fn start_service(state_dir: &Path, config_path: &Path, settings: &Settings) -> sgd::Result<Service> {
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    let sensors = Arc::new(SystemSensors::new(state_dir.join(PAUSE_MARKER_NAME)));
    let runtime = SyncthingRuntime::new(
        settings.daemon.clone(),
        Arc::clone(&notifier),
        state_dir.join(OUTPUT_LOG_NAME),
    )?;

    let service = Service::start(
        Arc::new(SettingsFile::new(config_path)),
        Arc::clone(&sensors) as Arc<dyn ConditionSensors>,
        Arc::new(runtime),
        notifier,
        ControllerOptions::default(),
    )?;

    let interval = settings.monitor.poll_interval();
    let power = Arc::clone(&sensors);
    service.subscribe(
        Box::new(PollingSource::new("power", interval, move || power.charging())),
        Delivery::Debounced(settings.monitor.power_debounce()),
    )?;
    let network = Arc::clone(&sensors);
    service.subscribe(
        Box::new(PollingSource::new("connectivity", interval, move || {
            network.network()
        })),
        Delivery::Immediate,
    )?;
    let power_save = Arc::clone(&sensors);
    service.subscribe(
        Box::new(PollingSource::new("power-save", interval, move || {
            power_save.power_saving()
        })),
        Delivery::Immediate,
    )?;
    service.subscribe(
        Box::new(FileWatchSource::new("global-sync", sensors.pause_marker())),
        Delivery::Immediate,
    )?;
    service.subscribe(
        Box::new(FileWatchSource::new("settings", config_path)),
        Delivery::Immediate,
    )?;
    service.watch_storage(settings.daemon.home_dir(), interval)?;

    Ok(service)
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn setup_logging(log_path: &Path) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Try to open log file, fall back to stderr
    if let Ok(file) = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
    {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn block_signals() -> Option<SigSet> {
    let mut set = SigSet::empty();
    set.add(Signal::SIGINT);
    set.add(Signal::SIGTERM);
    match set.thread_block() {
        Ok(()) => Some(set),
        Err(e) => {
            tracing::warn!("failed to block termination signals: {}", e);
            None
        }
    }
}

/// Turn SIGINT/SIGTERM into a shutdown request on our own socket.
fn spawn_signal_thread(set: SigSet, socket_path: PathBuf) {
    let spawned = thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || match set.wait() {
            Ok(signal) => {
                tracing::info!("received {:?}, shutting down", signal);
                match UnixStream::connect(&socket_path) {
                    Ok(mut stream) => {
                        let _ = framing::write_request(&mut stream, &DaemonRequest::Shutdown);
                        let _ = framing::read_response(&mut stream);
                    }
                    Err(e) => tracing::error!("failed to request shutdown: {}", e),
                }
            }
            Err(e) => tracing::warn!("signal wait failed: {}", e),
        });
    if let Err(e) = spawned {
        tracing::warn!("failed to start signal thread: {}", e);
    }
}

fn acquire_lock(lock_path: &Path) -> std::io::Result<fs::File> {
    use fs2::FileExt;

    let file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(lock_path)?;
    file.try_lock_exclusive()
        .map_err(|_| std::io::Error::other("another supervisor instance is already running"))?;
    Ok(file)
}

fn write_pid_file(pid_path: &Path) -> std::io::Result<()> {
    fs::write(pid_path, format!("{}", std::process::id()))
}

fn cleanup(pid_path: &Path, socket_path: &Path) {
    let _ = fs::remove_file(pid_path);
    let _ = fs::remove_file(socket_path);
}
