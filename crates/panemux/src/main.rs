//! panemux - a terminal multiplexer core, driven headless.
//!
//! Main entry point. Hosts a `SessionManager` over the native PTY bridge:
//! restores the previous session (or starts a fresh tab), attaches stdin
//! to the active pane, prints the active pane's output, and snapshots the
//! session on shutdown. Tab bars, split rendering, and keystroke handling
//! belong to a UI layer on top of the same session API.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use layout::PaneId;
use once_cell::sync::Lazy;
use pty::{NativePtyBridge, PtyEvent};
use session::{RoutedEvent, SessionManager, TabId};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, error, info};

/// Application startup time for performance monitoring
static STARTUP_TIME: Lazy<Instant> = Lazy::new(Instant::now);

/// Check if debug mode is enabled via environment variable.
fn is_debug_mode() -> bool {
    std::env::var("PANEMUX_DEBUG").is_ok()
}

/// Initialize the logging system.
fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // In debug mode, enable trace logging for panemux
    let default_filter = if is_debug_mode() {
        "panemux=trace,session=trace,pty=debug,info"
    } else {
        "panemux=info,warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    if is_debug_mode() {
        info!(
            "panemux v{} starting up (DEBUG MODE ENABLED)",
            env!("CARGO_PKG_VERSION")
        );
        info!("Set RUST_LOG for custom log levels, e.g. RUST_LOG=session=trace");
    } else {
        info!("panemux v{} starting up", env!("CARGO_PKG_VERSION"));
    }
}

/// Initialize required directories (cross-platform).
fn init_paths() -> Result<()> {
    let config_dir = panemux_paths::config_dir();
    let data_dir = panemux_paths::data_dir();

    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

    debug!(
        "Initialized paths - config: {:?}, data: {:?}",
        config_dir, data_dir
    );
    Ok(())
}

/// Load the persisted session if enabled and valid, else start fresh.
/// Either way the returned manager has at least one tab.
fn restore_or_create(config: &settings::Config, bridge: Arc<NativePtyBridge>) -> SessionManager {
    let mut manager = if config.restore_session {
        session::persist::load(&panemux_paths::session_file())
            .and_then(|snapshot| {
                match SessionManager::restore(snapshot, bridge.clone(), config.resize_debounce()) {
                    Ok(manager) => Some(manager),
                    Err(e) => {
                        tracing::warn!("Discarding saved session: {:#}", e);
                        None
                    }
                }
            })
            .unwrap_or_else(|| SessionManager::new(bridge.clone(), config.resize_debounce()))
    } else {
        SessionManager::new(bridge, config.resize_debounce())
    };

    if manager.tabs().is_empty() {
        manager.create_tab();
    }
    manager
}

fn active_pane(manager: &SessionManager) -> Option<(TabId, PaneId)> {
    let tab = manager.active_tab()?;
    Some((tab, manager.tab(tab)?.active_pane()))
}

/// The owner loop: applies bridge events serially and forwards stdin to
/// the active pane. Runs until the active pane's process completes, stdin
/// closes, or Ctrl-C.
async fn run(
    manager: &mut SessionManager,
    mut events: UnboundedReceiver<PtyEvent>,
    config: &settings::Config,
) -> Result<()> {
    let (_, pane) = active_pane(manager).context("No active pane after startup")?;
    manager
        .spawn_for_pane(pane, config.default_cols, config.default_rows)
        .context("Failed to start a shell for the active pane")?;

    let mut stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut input = [0u8; 1024];

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                match manager.route_event(event) {
                    Some(RoutedEvent::Output { tab, pane, data }) => {
                        if active_pane(manager) == Some((tab, pane)) {
                            stdout.write_all(&data).await?;
                            stdout.flush().await?;
                        }
                    }
                    Some(RoutedEvent::ProcessExited { tab, pane }) => {
                        if active_pane(manager) == Some((tab, pane)) {
                            info!("Active pane's process completed");
                            break;
                        }
                    }
                    Some(RoutedEvent::TitleChanged { pane, title, .. }) => {
                        debug!("{} retitled to {:?}", pane, title);
                    }
                    None => {}
                }
            }
            read = stdin.read(&mut input) => {
                match read {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if let Some((_, pane)) = active_pane(manager) {
                            manager.write_input(pane, &input[..n]);
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let _ = *STARTUP_TIME;

    init_logging();

    if let Err(e) = init_paths() {
        error!("Failed to initialize paths: {}", e);
    }
    let _ = settings::ensure_config_file();
    let config = settings::load_config();

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let bridge = Arc::new(NativePtyBridge::new(&config, events_tx));
    let mut manager = restore_or_create(&config, bridge.clone());
    info!(
        "Session ready with {} tab(s) in {:?}",
        manager.tabs().len(),
        STARTUP_TIME.elapsed()
    );

    if let Err(e) = run(&mut manager, events_rx, &config).await {
        error!("Session loop failed: {:#}", e);
    }

    if config.restore_session {
        if let Err(e) = session::persist::save(&manager.snapshot(), &panemux_paths::session_file())
        {
            error!("Failed to save session: {:#}", e);
        }
    }
    info!("Exiting after {:?}", STARTUP_TIME.elapsed());
}
