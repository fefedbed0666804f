use beatgrid::shared::{NUM_STEPS, NUM_TRACKS};

// state local to tui: where the cursor sits on the grid.
#[derive(Clone, Debug, Default)]
pub struct TuiState {
    pub cursor_track: u8,
    pub cursor_step: u8,
}

impl TuiState {
    // moves wrap around the grid edges
    pub fn move_cursor(&mut self, d_track: i32, d_step: i32) {
        self.cursor_track = (self.cursor_track as i32 + d_track).rem_euclid(NUM_TRACKS as i32) as u8;
        self.cursor_step = (self.cursor_step as i32 + d_step).rem_euclid(NUM_STEPS as i32) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_wraps() {
        let mut ts = TuiState::default();
        ts.move_cursor(-1, -1);
        assert_eq!((ts.cursor_track, ts.cursor_step), (4, 15));
        ts.move_cursor(1, 1);
        assert_eq!((ts.cursor_track, ts.cursor_step), (0, 0));
    }
}
