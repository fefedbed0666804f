// Pattern export: a self-describing json snapshot of the grid, tempo and kit.
// Written on demand into the export dir, read back by `bounce`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize}; // serde does json
use thiserror::Error;

use crate::pipeline::pattern::PatternGrid;
use crate::shared::{NUM_STEPS, NUM_TRACKS, TRACK_LABELS};

pub const APP_NAME: &str = "Web Step Sequencer";
pub const FORMAT_VERSION: &str = "4.1";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot grid is {tracks}x{steps}, expected {NUM_TRACKS}x{NUM_STEPS}")]
    Dimensions { tracks: usize, steps: usize },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeta {
    pub app: String,
    pub version: String,
    pub export_date: String, // RFC 3339, UTC
    pub tempo: f64,
    pub kit: String,
    pub step_count: usize,
    pub track_count: usize,
    pub tracks: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatternSnapshot {
    pub meta: SnapshotMeta,
    pub pattern: Vec<Vec<bool>>, // [track][step]
}

impl PatternSnapshot {
    pub fn capture(grid: &PatternGrid, tempo: f64, kit: &str, at: DateTime<Utc>) -> Self {
        Self {
            meta: SnapshotMeta {
                app: APP_NAME.to_string(),
                version: FORMAT_VERSION.to_string(),
                export_date: at.to_rfc3339_opts(SecondsFormat::Millis, true),
                tempo,
                kit: kit.to_string(),
                step_count: NUM_STEPS,
                track_count: NUM_TRACKS,
                tracks: TRACK_LABELS.iter().map(|s| s.to_string()).collect(),
            },
            pattern: grid.rows().iter().map(|row| row.to_vec()).collect(),
        }
    }

    /// `Sequencer_<YYYYMMDD>_<tempo>bpm.json`, dated by the export date.
    pub fn file_name(&self) -> String {
        let date: String = self
            .meta
            .export_date
            .chars()
            .take(10)
            .filter(|c| *c != '-')
            .collect();
        format!("Sequencer_{}_{}bpm.json", date, self.meta.tempo)
    }

    pub fn to_grid(&self) -> Result<PatternGrid, SnapshotError> {
        let steps = self.pattern.first().map(|row| row.len()).unwrap_or(0);
        let wrong_shape = self.pattern.len() != NUM_TRACKS
            || self.pattern.iter().any(|row| row.len() != NUM_STEPS);
        if wrong_shape {
            return Err(SnapshotError::Dimensions { tracks: self.pattern.len(), steps });
        }
        let mut grid = PatternGrid::new();
        for (track, row) in self.pattern.iter().enumerate() {
            for (step, &active) in row.iter().enumerate() {
                grid.set(track, step, active);
            }
        }
        Ok(grid)
    }
}

/// Write the snapshot into `dir`, making the dir if it doesn't exist already.
pub fn save_snapshot(dir: &Path, snapshot: &PatternSnapshot) -> Result<PathBuf, SnapshotError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(snapshot.file_name());
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(&path, json)?;
    log::info!("exported pattern to {}", path.display());
    Ok(path)
}

pub fn load_snapshot(path: &Path) -> Result<PatternSnapshot, SnapshotError> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 3, 23, 23, 0).unwrap()
    }

    fn sample_grid() -> PatternGrid {
        let mut grid = PatternGrid::new();
        grid.toggle(2, 0);
        grid.toggle(2, 8);
        grid.toggle(0, 15);
        grid
    }

    #[test]
    fn capture_fills_meta() {
        let snap = PatternSnapshot::capture(&sample_grid(), 120.0, "8bit", fixed_time());
        assert_eq!(snap.meta.export_date, "2025-12-03T23:23:00.000Z");
        assert_eq!(snap.meta.kit, "8bit");
        assert_eq!(snap.meta.tracks, vec!["Hi-Hat", "Snare", "Kick", "Bass", "Synth"]);
        assert_eq!(snap.pattern.len(), NUM_TRACKS);
        assert!(snap.pattern[2][8]);
        assert!(!snap.pattern[1][8]);
    }

    #[test]
    fn file_name_carries_date_and_tempo() {
        let snap = PatternSnapshot::capture(&PatternGrid::new(), 128.0, "standard", fixed_time());
        assert_eq!(snap.file_name(), "Sequencer_20251203_128bpm.json");
    }

    #[test]
    fn json_uses_camel_case_keys() {
        let snap = PatternSnapshot::capture(&PatternGrid::new(), 90.0, "soft", fixed_time());
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["meta"]["stepCount"], 16);
        assert_eq!(json["meta"]["trackCount"], 5);
        assert!(json["meta"]["exportDate"].is_string());
        assert_eq!(json["pattern"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn grid_survives_the_file() {
        let dir = std::env::temp_dir().join(format!("beatgrid-snapshot-{}", std::process::id()));
        let snap = PatternSnapshot::capture(&sample_grid(), 140.0, "standard", fixed_time());
        let path = save_snapshot(&dir, &snap).unwrap();
        let loaded = load_snapshot(&path).unwrap();
        assert_eq!(loaded.to_grid().unwrap(), sample_grid());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn wrong_dimensions_are_rejected() {
        let mut snap = PatternSnapshot::capture(&PatternGrid::new(), 120.0, "standard", fixed_time());
        snap.pattern[3].pop();
        assert!(matches!(snap.to_grid(), Err(SnapshotError::Dimensions { .. })));
        snap.pattern.truncate(2);
        assert!(matches!(snap.to_grid(), Err(SnapshotError::Dimensions { tracks: 2, .. })));
    }
}
