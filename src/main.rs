//! transit-watch - A transit service alert engine for the terminal.
//!
//! Loads service alerts from a simulated or HTTP source, filters them along
//! composable facets, aggregates statistics over the whole network and keeps
//! the user's preferences across restarts.
//!
//! # Features
//!
//! - **Composable Filters**: line group, severity, time window, location and
//!   rush hour mode, all remembered between runs
//! - **Network Statistics**: counts per severity, rush hour impacts and lines in
//!   good service, always computed over every alert
//! - **Localization**: English, Spanish and French tables with fallback to the
//!   default language, extendable from a locales directory
//! - **Notifications**: transient messages for critical alerts, restored or
//!   reset preferences and failures
//! - **Graceful Degradation**: storage, source or data failures never stop the
//!   session, it keeps running with defaults or an empty collection
//!
//! # Usage
//!
//! ```bash
//! transit-watch --config config.yaml --data ./transit-data
//! ```
//!
//! Without `--data`, preferences only last for the running session. Type
//! `help` once started to list the console commands.
//!
//! # Architecture
//!
//! - [`alerts`] - Alert records, sources, filter engine and statistics
//! - [`commands`] - Console command parsing and terminal rendering
//! - [`config`] - YAML configuration with environment variable overrides
//! - [`i18n`] - Translation tables and lookup with fallback
//! - [`notifications`] - Timed notification lifecycle
//! - [`preferences`] - Preference record and its persistence
//! - [`session`] - Session controller tying everything together
//! - [`utils`] - Data directory helpers
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (default: `info`)
//! - `TRANSIT_<SECTION>__<KEY>` - Overrides a configuration value

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    signal,
    sync::mpsc,
};

use crate::{
    alerts::{ConfiguredSource, HttpAlertSource, SimulatedAlertSource},
    commands::{CommandParseError, ConsolePresenter, ConsoleShareTarget},
    config::{Config, SourceConfig, SourceKind},
    i18n::Translator,
    notifications::{NotificationChannel, NotificationKind, NotificationPhase},
    preferences::{FileStorage, MemoryStorage, PreferenceStore, StorageBackend},
    session::{SessionCommand, SessionController},
};

mod alerts;
mod commands;
mod config;
mod i18n;
mod notifications;
mod preferences;
mod session;
mod utils;

/// Command-line arguments for transit-watch.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file.
    ///
    /// A missing file is fine, every setting has a default. See the [`config`]
    /// module for the expected format.
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Path to the directory for storing persistent data.
    ///
    /// Preferences are kept under `preferences/`. When omitted they are kept in
    /// memory for the running session only.
    #[arg(short, long)]
    data: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Put logger at info level by default
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    info!("starting transit-watch {}...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("failed to load config file: {:#}", e);
            return;
        }
    };

    match args.data {
        Some(data_dir) => {
            let dir = match utils::prepare_preferences_dir(&data_dir) {
                Ok(dir) => dir,
                Err(e) => {
                    error!("failed to prepare data directory: {:#}", e);
                    return;
                }
            };
            let storage = FileStorage::new(&dir, config.storage.quota_bytes);
            run_session(config, PreferenceStore::new(storage)).await;
        }
        None => {
            warn!("no data directory given, preferences will not survive a restart");
            run_session(config, PreferenceStore::new(MemoryStorage::default())).await;
        }
    }

    info!("bye");
}

fn build_source(config: &SourceConfig) -> ConfiguredSource {
    match config.kind {
        SourceKind::Simulated => {
            info!("using simulated alert source");
            ConfiguredSource::Simulated(SimulatedAlertSource::new(
                Duration::from_millis(config.latency_ms),
                config.fixtures.clone(),
            ))
        }
        SourceKind::Http => {
            if config.feeds.is_empty() {
                warn!("http alert source has no feeds configured");
            }
            info!("using http alert source with {} feeds", config.feeds.len());
            ConfiguredSource::Http(HttpAlertSource::new(config.feeds.clone()))
        }
    }
}

/// Wires the session together and runs it until shutdown.
async fn run_session<B: StorageBackend>(config: Config, store: PreferenceStore<B>) {
    let mut translator = Translator::builtin(&config.session.default_language);
    if let Some(dir) = &config.session.locales {
        translator.load_directory(dir);
    }
    let languages: Vec<String> = translator
        .languages()
        .into_iter()
        .map(|(code, name)| format!("{} ({})", code, name))
        .collect();
    info!("available languages: {}", languages.join(", "));

    let (notifier, mut notifications) = NotificationChannel::new();
    tokio::spawn(async move {
        while let Some(event) = notifications.recv().await {
            if event.phase != NotificationPhase::Entered {
                continue;
            }
            let notification = event.notification;
            match notification.kind {
                NotificationKind::Warning | NotificationKind::Error | NotificationKind::Critical => {
                    warn!(
                        "{} [{}] {}",
                        notification.created_at.format("%H:%M:%S"),
                        notification.kind,
                        notification.message
                    )
                }
                NotificationKind::Info | NotificationKind::Success => info!(
                    "{} [{}] {}",
                    notification.created_at.format("%H:%M:%S"),
                    notification.kind,
                    notification.message
                ),
            }
        }
    });

    if config.session.refresh_interval == 0 {
        warn!("refresh interval must be positive, using 1 second");
    }
    let refresh_interval = Duration::from_secs(config.session.refresh_interval.max(1));

    let mut controller = SessionController::new(
        build_source(&config.source),
        store,
        ConsolePresenter::stdout(translator.clone()),
        translator,
        notifier,
        refresh_interval,
    );

    let (sender, receiver) = mpsc::unbounded_channel();
    tokio::spawn(read_commands(sender.clone()));
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("interrupted, shutting down");
            let _ = sender.send(SessionCommand::Shutdown);
        }
    });

    controller.initialize().await;
    info!(
        "session {} in {}: {} alerts shown, {} critical on the network",
        controller.state(),
        controller.preferences().language,
        controller.visible_alerts().len(),
        controller.statistics().critical_count
    );
    controller.run(receiver, ConsoleShareTarget::stdout()).await;
}

/// Forwards commands typed on stdin until it closes.
async fn read_commands(sender: mpsc::UnboundedSender<SessionCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match commands::parse_line(&line) {
                Ok(Some(command)) => {
                    if sender.send(command).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(CommandParseError::Usage(usage)) => println!("{}", usage),
                Err(e) => warn!("{}", e),
            },
            Ok(None) => {
                info!("stdin closed, shutting down");
                let _ = sender.send(SessionCommand::Shutdown);
                break;
            }
            Err(e) => {
                error!("failed to read stdin: {}", e);
                break;
            }
        }
    }
}
