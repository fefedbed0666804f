use beatgrid::shared::DisplayState;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use super::grid::draw_step_grid;
use super::mode::TuiState;

const HELP: &str = "space play/pause  bksp stop  arrows move  enter/1-v toggle  m mute  -/= pgup/pgdn tempo  [/] kit  ,/. vol  o export  C clear  esc quit";

pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState, ts: &TuiState, blink_on: bool) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // transport screen
            Constraint::Length(12), // step grid
            Constraint::Length(1),  // status line
            Constraint::Min(1),     // key help
        ])
        .split(area);

    draw_screen(frame, sections[0], state);
    draw_grid(frame, sections[1], state, ts, blink_on);
    draw_status(frame, sections[2], state);
    frame.render_widget(
        Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray)),
        sections[3],
    );
}

fn draw_screen(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let play = if state.playing {
        Span::styled("▶ PLAYING", Style::default().fg(Color::LightGreen).add_modifier(Modifier::BOLD))
    } else {
        Span::styled("■ STOPPED", Style::default().fg(Color::Gray))
    };
    let line = Line::from(vec![
        play,
        Span::raw("   "),
        Span::styled(format!("{:>5.1} BPM", state.bpm), Style::default().fg(Color::LightCyan)),
        Span::raw("   kit: "),
        Span::styled(state.kit_label.clone(), Style::default().fg(Color::LightMagenta)),
        Span::raw(format!("   vol: {:>3.0}%", state.master_volume * 100.0)),
    ]);
    let block = Block::default().borders(Borders::ALL).title(" beatgrid ");
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_grid(frame: &mut Frame, area: Rect, state: &DisplayState, ts: &TuiState, blink_on: bool) {
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    draw_step_grid(frame, inner, state, ts, blink_on);
}

fn draw_status(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let text = match state.playing_step {
        Some(step) if state.status_text.is_empty() => format!("step {:>2}", step + 1),
        _ => state.status_text.clone(),
    };
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::Yellow)),
        area,
    );
}
