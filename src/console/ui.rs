/* src/console/ui.rs */

use crate::console::app::{DashboardFrame, Panel};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    widgets::{Block, Borders, Paragraph},
};
use tui_logger::{TuiLoggerWidget, TuiWidgetState};

pub const STATS_WIDTH: u16 = 35;
const DEBUG_HEIGHT: u16 = 7;

pub fn draw(f: &mut Frame, frame: &DashboardFrame, debug_state: Option<&TuiWidgetState>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(f.area());

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(STATS_WIDTH)])
        .split(rows[0]);

    draw_panel(f, top[0], &frame.connections, Color::Green, false);
    draw_panel(f, top[1], &frame.stats, Color::Reset, false);

    match debug_state {
        Some(state) => {
            let bottom = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(1), Constraint::Length(DEBUG_HEIGHT)])
                .split(rows[1]);
            draw_panel(f, bottom[0], &frame.log, Color::Yellow, true);

            let debug_output = TuiLoggerWidget::default()
                .block(Block::default().title("Debug").borders(Borders::ALL))
                .output_timestamp(Some("%H:%M:%S".to_string()))
                .output_separator(' ')
                .output_file(false)
                .state(state)
                .style_error(Style::default().red())
                .style_warn(Style::default().yellow())
                .style_debug(Style::default().green())
                .style_trace(Style::default().magenta());
            f.render_widget(debug_output, bottom[1]);
        }
        None => draw_panel(f, rows[1], &frame.log, Color::Yellow, true),
    }
}

fn draw_panel(f: &mut Frame, area: Rect, panel: &Panel, color: Color, follow_tail: bool) {
    // Keep the newest lines visible once the panel overflows.
    let scroll = if follow_tail {
        let visible = area.height.saturating_sub(2) as usize;
        panel.lines.len().saturating_sub(visible) as u16
    } else {
        0
    };

    let text = panel.lines.join("\n");
    let widget = Paragraph::new(text)
        .style(Style::default().fg(color))
        .scroll((scroll, 0))
        .block(
            Block::default()
                .title(panel.title.as_str())
                .borders(Borders::ALL),
        );
    f.render_widget(widget, area);
}
