/* src/console/render_loop.rs */

use crate::console::app::{App, Trigger};
use crate::console::input::ControlEvent;
use crate::console::surface::DisplaySurface;
use crate::monitor::Monitor;
use log::{debug, info};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Samples the monitor and redraws on every tick, on resize, and whenever a
/// new event lands in the log. Returns once cancelled or asked to quit; a
/// draw error ends the loop with that error.
pub async fn run_render_loop<S: DisplaySurface>(
    monitor: &Monitor,
    surface: &mut S,
    app: &mut App,
    tick: Duration,
    mut controls: mpsc::Receiver<ControlEvent>,
    cancel: CancellationToken,
) -> io::Result<()> {
    let mut ticker = time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut controls_open = true;

    loop {
        let trigger = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            control = controls.recv(), if controls_open => match control {
                Some(ControlEvent::Resize(width, height)) => {
                    debug!("Terminal resized to {}x{}", width, height);
                    surface.resize(width, height)?;
                    Trigger::Resize
                }
                Some(ControlEvent::Quit) => {
                    info!("Quit requested.");
                    cancel.cancel();
                    break;
                }
                None => {
                    controls_open = false;
                    continue;
                }
            },
            _ = ticker.tick() => Trigger::Tick,
            _ = monitor.redraw.notified() => Trigger::Event,
        };

        let frame = app.build_frame(monitor, trigger);
        surface.draw(&frame)?;
    }

    Ok(())
}
