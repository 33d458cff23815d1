/* src/console/mod.rs */

use crate::monitor::Monitor;
use crate::setup::config::DashboardConfig;
use anyhow::{Context, Result};
use log::{LevelFilter, info};
use ratatui::backend::CrosstermBackend;
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tui_logger::{init_logger, set_default_level, set_level_for_target};

pub mod app;
pub mod format;
pub mod host;
pub mod input;
pub mod render_loop;
pub mod surface;
pub mod throughput;
pub mod ui;

/// Routes the `log` facade into tui-logger so nothing is printed over the dashboard.
pub fn init_logging(level: &str) -> Result<()> {
    let level: LevelFilter = level
        .parse()
        .with_context(|| format!("Unknown log level '{}'", level))?;
    init_logger(LevelFilter::Trace).map_err(|e| anyhow::anyhow!("{:?}", e))?;
    set_default_level(level);
    set_level_for_target("mio", LevelFilter::Warn);
    Ok(())
}

pub async fn run_dashboard(
    monitor: &Monitor,
    cfg: &DashboardConfig,
    cancel: CancellationToken,
) -> Result<()> {
    let tick = Duration::from_millis(cfg.tick_ms);
    let (control_tx, control_rx) = mpsc::channel(16);

    let _screen = surface::ScreenGuard::enter().context("Failed to prepare the terminal")?;
    let mut surface =
        surface::TerminalSurface::new(CrosstermBackend::new(io::stdout()), cfg.show_debug)?;
    let mut app = app::App::new(tick, Box::new(host::SysinfoHost::new()));
    let input = input::spawn_input_thread(control_tx, cancel.clone());

    info!("Dashboard running, refreshing every {:?}.", tick);
    let result = render_loop::run_render_loop(
        monitor,
        &mut surface,
        &mut app,
        tick,
        control_rx,
        cancel.clone(),
    )
    .await;

    cancel.cancel();
    // The input thread notices cancellation within one poll interval.
    let _ = tokio::task::spawn_blocking(move || input.join()).await;
    result.context("Dashboard rendering failed")
}
