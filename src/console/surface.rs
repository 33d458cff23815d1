/* src/console/surface.rs */

use crate::console::app::DashboardFrame;
use crate::console::ui;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{LevelFilter, warn};
use ratatui::{Terminal, backend::Backend, layout::Rect};
use std::io;
use tui_logger::TuiWidgetState;

/// Where a dashboard frame ends up. The render loop owns its surface
/// exclusively, so two draws can never overlap.
pub trait DisplaySurface {
    fn resize(&mut self, width: u16, height: u16) -> io::Result<()>;
    fn draw(&mut self, frame: &DashboardFrame) -> io::Result<()>;
}

pub struct TerminalSurface<B: Backend> {
    terminal: Terminal<B>,
    debug_state: Option<TuiWidgetState>,
}

impl<B: Backend> TerminalSurface<B> {
    pub fn new(backend: B, show_debug: bool) -> io::Result<Self> {
        let debug_state =
            show_debug.then(|| TuiWidgetState::new().set_default_display_level(LevelFilter::Debug));
        Ok(TerminalSurface {
            terminal: Terminal::new(backend)?,
            debug_state,
        })
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        self.terminal.backend()
    }
}

impl<B: Backend> DisplaySurface for TerminalSurface<B> {
    fn resize(&mut self, width: u16, height: u16) -> io::Result<()> {
        self.terminal.resize(Rect::new(0, 0, width, height))
    }

    fn draw(&mut self, frame: &DashboardFrame) -> io::Result<()> {
        let debug_state = self.debug_state.as_ref();
        self.terminal.draw(|f| ui::draw(f, frame, debug_state))?;
        Ok(())
    }
}

/// Raw mode plus alternate screen for as long as it lives.
pub struct ScreenGuard;

impl ScreenGuard {
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(ScreenGuard)
    }
}

impl Drop for ScreenGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            warn!("Failed to leave raw mode: {}", e);
        }
        if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show) {
            warn!("Failed to restore the terminal: {}", e);
        }
    }
}
