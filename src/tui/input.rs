use std::time::Duration;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use beatgrid::shared::InputEvent;
use super::mode::TuiState;

const VOLUME_STEP: f32 = 0.05;

// poll for input from tui, tracks the cursor in tuistate,
// resolves keys to semantic input events for the middle layer
pub fn poll_input(timeout: Duration, ts: &mut TuiState) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(vec![]);
        }
        return Ok(handle_key(key.code, ts));
    }
    Ok(vec![])
}

pub fn handle_key(code: KeyCode, ts: &mut TuiState) -> Vec<InputEvent> {
    match code {
        KeyCode::Esc => vec![InputEvent::Quit],
        KeyCode::Char(' ') => vec![InputEvent::PlayPress],
        KeyCode::Backspace => vec![InputEvent::StopPress],

        // cursor never leaves the tui
        KeyCode::Up => { ts.move_cursor(-1, 0); vec![] }
        KeyCode::Down => { ts.move_cursor(1, 0); vec![] }
        KeyCode::Left => { ts.move_cursor(0, -1); vec![] }
        KeyCode::Right => { ts.move_cursor(0, 1); vec![] }
        KeyCode::Enter => vec![InputEvent::ToggleCell { track: ts.cursor_track, step: ts.cursor_step }],

        // the 4x4 pad block toggles steps on the cursor's track
        KeyCode::Char(c @ ('1' | '2' | '3' | '4'
            | 'q' | 'w' | 'e' | 'r'
            | 'a' | 's' | 'd' | 'f'
            | 'z' | 'x' | 'c' | 'v')) => {
            match char_to_step(c) {
                Some(step) => {
                    ts.cursor_step = step;
                    vec![InputEvent::ToggleCell { track: ts.cursor_track, step }]
                }
                None => vec![],
            }
        }
        KeyCode::Char('m') => vec![InputEvent::ToggleMute(ts.cursor_track)],

        // tempo
        KeyCode::Char('-') => vec![InputEvent::NudgeTempo(-1.0)],
        KeyCode::Char('=') => vec![InputEvent::NudgeTempo(1.0)],
        KeyCode::PageDown => vec![InputEvent::NudgeTempo(-5.0)],
        KeyCode::PageUp => vec![InputEvent::NudgeTempo(5.0)],

        // sound
        KeyCode::Char('[') => vec![InputEvent::KitPrev],
        KeyCode::Char(']') => vec![InputEvent::KitNext],
        KeyCode::Char(',') => vec![InputEvent::NudgeVolume(-VOLUME_STEP)],
        KeyCode::Char('.') => vec![InputEvent::NudgeVolume(VOLUME_STEP)],

        // pattern
        KeyCode::Char('o') => vec![InputEvent::Export],
        KeyCode::Char('C') => vec![InputEvent::ClearPattern],

        _ => vec![],
    }
}

// convert char to step index
fn char_to_step(c: char) -> Option<u8> {
    let idx = match c {
        '1' => 0, '2' => 1, '3' => 2, '4' => 3,
        'q' => 4, 'w' => 5, 'e' => 6, 'r' => 7,
        'a' => 8, 's' => 9, 'd' => 10, 'f' => 11,
        'z' => 12, 'x' => 13, 'c' => 14, 'v' => 15,
        _ => return None,
    };
    Some(idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_keys_toggle_on_cursor_track() {
        let mut ts = TuiState::default();
        handle_key(KeyCode::Down, &mut ts);
        handle_key(KeyCode::Down, &mut ts);
        assert_eq!(
            handle_key(KeyCode::Char('f'), &mut ts),
            vec![InputEvent::ToggleCell { track: 2, step: 11 }]
        );
        assert_eq!(ts.cursor_step, 11);
    }

    #[test]
    fn enter_toggles_under_cursor() {
        let mut ts = TuiState::default();
        handle_key(KeyCode::Left, &mut ts);
        assert_eq!(
            handle_key(KeyCode::Enter, &mut ts),
            vec![InputEvent::ToggleCell { track: 0, step: 15 }]
        );
    }

    #[test]
    fn transport_keys() {
        let mut ts = TuiState::default();
        assert_eq!(handle_key(KeyCode::Char(' '), &mut ts), vec![InputEvent::PlayPress]);
        assert_eq!(handle_key(KeyCode::Backspace, &mut ts), vec![InputEvent::StopPress]);
        assert_eq!(handle_key(KeyCode::PageUp, &mut ts), vec![InputEvent::NudgeTempo(5.0)]);
        assert!(handle_key(KeyCode::Char('k'), &mut ts).is_empty());
    }
}
