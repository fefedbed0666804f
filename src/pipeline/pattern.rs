// The on/off grid the user edits, and the per-track mute flags. Both are plain
// state containers: the transport reads them, the middle layer writes them.

use crate::shared::{NUM_STEPS, NUM_TRACKS};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatternGrid {
    cells: [[bool; NUM_STEPS]; NUM_TRACKS],
}

impl PatternGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(cells: [[bool; NUM_STEPS]; NUM_TRACKS]) -> Self {
        Self { cells }
    }

    /// Flip one cell and return its new value. Out-of-range cells stay off.
    pub fn toggle(&mut self, track: usize, step: usize) -> bool {
        match self.cell_mut(track, step) {
            Some(cell) => {
                *cell = !*cell;
                *cell
            }
            None => {
                log::warn!("toggle outside the grid: track {track}, step {step}");
                false
            }
        }
    }

    pub fn set(&mut self, track: usize, step: usize, active: bool) {
        if let Some(cell) = self.cell_mut(track, step) {
            *cell = active;
        }
    }

    pub fn is_active(&self, track: usize, step: usize) -> bool {
        self.cells
            .get(track)
            .and_then(|row| row.get(step))
            .copied()
            .unwrap_or(false)
    }

    /// Tracks that sound on `step`, in track order.
    pub fn active_tracks(&self, step: usize) -> impl Iterator<Item = usize> + '_ {
        (0..NUM_TRACKS).filter(move |&track| self.is_active(track, step))
    }

    pub fn clear(&mut self) {
        self.cells = [[false; NUM_STEPS]; NUM_TRACKS];
    }

    pub fn rows(&self) -> &[[bool; NUM_STEPS]; NUM_TRACKS] {
        &self.cells
    }

    pub fn active_count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&c| c).count()
    }

    fn cell_mut(&mut self, track: usize, step: usize) -> Option<&mut bool> {
        self.cells.get_mut(track).and_then(|row| row.get_mut(step))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MuteState {
    muted: [bool; NUM_TRACKS],
}

impl MuteState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_muted(&self, track: usize) -> bool {
        self.muted.get(track).copied().unwrap_or(false)
    }

    pub fn set(&mut self, track: usize, muted: bool) {
        if let Some(m) = self.muted.get_mut(track) {
            *m = muted;
        }
    }

    pub fn toggle(&mut self, track: usize) -> bool {
        let muted = !self.is_muted(track);
        self.set(track, muted);
        muted
    }

    pub fn flags(&self) -> [bool; NUM_TRACKS] {
        self.muted
    }
}
