//! Best-score table
//!
//! Persisted to LocalStorage; keeps the top runs across all presets.

use serde::{Deserialize, Serialize};

use crate::error::SimResult;
use crate::sim::{DifficultyPreset, RunStats, Skin};

/// Maximum number of runs to keep
pub const MAX_BEST_SCORES: usize = 10;

/// One finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub score: u64,
    pub preset: DifficultyPreset,
    pub skin: Skin,
    pub pipes_passed: u32,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// Top runs, sorted by score descending
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BestScores {
    pub entries: Vec<ScoreEntry>,
}

impl BestScores {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "skyflap_best_scores";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_BEST_SCORES {
            return true;
        }
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Insert a finished run. Returns the 1-indexed rank, or None if it didn't qualify.
    pub fn record(
        &mut self,
        stats: &RunStats,
        preset: DifficultyPreset,
        skin: Skin,
        timestamp: f64,
    ) -> Option<usize> {
        if !self.qualifies(stats.score) {
            return None;
        }
        let entry = ScoreEntry {
            score: stats.score,
            preset,
            skin,
            pipes_passed: stats.pipes_passed,
            timestamp,
        };

        // Ties keep the older run ahead
        let index = self
            .entries
            .iter()
            .position(|e| stats.score > e.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(index, entry);
        self.entries.truncate(MAX_BEST_SCORES);
        Some(index + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> u64 {
        self.entries.first().map_or(0, |e| e.score)
    }

    pub fn best_for(&self, preset: DifficultyPreset) -> u64 {
        self.entries
            .iter()
            .filter(|e| e.preset == preset)
            .map(|e| e.score)
            .max()
            .unwrap_or(0)
    }

    pub fn from_json(json: &str) -> SimResult<Self> {
        let mut scores: Self = serde_json::from_str(json)?;
        scores.entries.sort_by(|a, b| b.score.cmp(&a.score));
        scores.entries.truncate(MAX_BEST_SCORES);
        Ok(scores)
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Load best scores from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(scores) => {
                        log::info!("Loaded {} best scores", scores.entries.len());
                        return scores;
                    }
                    Err(e) => log::warn!("Discarding stored best scores: {e}"),
                }
            }
        }

        log::info!("No best scores found, starting fresh");
        Self::new()
    }

    /// Save best scores to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            match self.to_json() {
                Ok(json) => {
                    let _ = storage.set_item(Self::STORAGE_KEY, &json);
                    log::info!("Best scores saved ({} entries)", self.entries.len());
                }
                Err(e) => log::error!("Failed to serialise best scores: {e}"),
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
