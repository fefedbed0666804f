use beatgrid::shared::{DisplayState, NUM_STEPS, NUM_TRACKS, TRACK_LABELS};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::mode::TuiState;

const LABEL_WIDTH: u16 = 10;

pub fn draw_step_grid(frame: &mut Frame, area: Rect, state: &DisplayState, ts: &TuiState, blink_on: bool) {
    let row_constraints = [Constraint::Length(2); NUM_TRACKS];
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(row_constraints)
        .split(area);

    for (track, row_area) in rows.iter().enumerate() {
        let mut spans = Vec::with_capacity(NUM_STEPS + 1);

        let label_style = if state.muted[track] {
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
        } else if track == ts.cursor_track as usize {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(
            format!("{:<width$}", TRACK_LABELS[track], width = LABEL_WIDTH as usize),
            label_style,
        ));

        for step in 0..NUM_STEPS {
            let active = state.grid[track][step];
            let under_playhead = state.playing_step == Some(step as u8);
            let under_cursor = track == ts.cursor_track as usize && step == ts.cursor_step as usize;

            let mut style = match (active, under_playhead) {
                (true, true) => Style::default().fg(Color::LightYellow),
                (true, false) if state.muted[track] => Style::default().fg(Color::DarkGray),
                (true, false) => Style::default().fg(Color::LightMagenta),
                (false, true) => Style::default().fg(Color::Gray),
                (false, false) => Style::default().fg(Color::DarkGray),
            };
            if under_cursor && blink_on {
                style = style.add_modifier(Modifier::REVERSED);
            }
            let glyph = if active { " ■ " } else { " · " };
            spans.push(Span::styled(glyph, style));
            // a gap every beat
            if step % 4 == 3 {
                spans.push(Span::raw(" "));
            }
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), *row_area);
    }
}
