// The current input plan:
//
// Cursor / grid (5 tracks x 16 steps):
//   arrows        //  move the cursor (resolved by the tui, never reaches the middle)
//   Enter         //  ToggleCell(cursor track, cursor step)
//   1 2 3 4       //  ToggleCell(cursor track, 0 .. 3)
//   q w e r       //  ToggleCell(cursor track, 4 .. 7)
//   a s d f       //  ToggleCell(cursor track, 8 .. 11)
//   z x c v       //  ToggleCell(cursor track, 12 .. 15)
//   m             //  ToggleMute(cursor track)
//
// Transport:
//   Space         //  PlayPress (start / pause)
//   Backspace     //  StopPress (stop and rewind to step 0)
//   - / =         //  NudgeTempo(-1 / +1)
//   PgDn / PgUp   //  NudgeTempo(-5 / +5)
//
// Sound:
//   [ / ]         //  KitPrev / KitNext (wraps around)
//   , / .         //  NudgeVolume(-0.05 / +0.05)
//
// Pattern:
//   o             //  Export (json snapshot into the export dir)
//   C             //  ClearPattern
//
// Quit:
//   Esc           //  Quit
//
// The rendering process is the same as ever: the middle layer owns the sequencer
// state, and the TUI only draws whatever `middle.display_state()` hands it.

pub const NUM_TRACKS: usize = 5;
pub const NUM_STEPS: usize = 16;

pub const MIN_BPM: f64 = 60.0;
pub const MAX_BPM: f64 = 240.0;
pub const DEFAULT_BPM: f64 = 120.0;

// how far ahead of the audio clock the transport schedules, in seconds
pub const LOOKAHEAD_SECS: f64 = 0.1;
// how often the transport wakes up to top up the lookahead window
pub const WAKE_PERIOD_MS: u64 = 25;

pub const DEFAULT_MASTER_VOLUME: f32 = 0.5;

pub const TRACK_LABELS: [&str; NUM_TRACKS] = ["Hi-Hat", "Snare", "Kick", "Bass", "Synth"];

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    // grid
    ToggleCell { track: u8, step: u8 },
    ToggleMute(u8),
    ClearPattern,

    // transport
    PlayPress,
    StopPress,
    NudgeTempo(f64),

    // sound
    KitPrev,
    KitNext,
    NudgeVolume(f32),

    // pattern export
    Export,

    // quit button (esc)
    Quit,
}

#[derive(Clone, Debug)]
pub struct DisplayState {
    pub grid: [[bool; NUM_STEPS]; NUM_TRACKS],
    pub muted: [bool; NUM_TRACKS],
    pub playing: bool,
    pub playing_step: Option<u8>, // the step currently being heard, not the lookahead position
    pub bpm: f64,
    pub kit_label: String,
    pub master_volume: f32,
    pub status_text: String, // last thing worth telling the user (export path, audio errors)
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            grid: [[false; NUM_STEPS]; NUM_TRACKS],
            muted: [false; NUM_TRACKS],
            playing: false,
            playing_step: None,
            bpm: DEFAULT_BPM,
            kit_label: String::new(),
            master_volume: DEFAULT_MASTER_VOLUME,
            status_text: String::new(),
        }
    }
}
