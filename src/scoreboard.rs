use crate::engine::load_record;
use crate::error::Result;
use crate::storage::Store;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SCOREBOARD_KEY: &str = "math-drill-scoreboard";
pub const MAX_ENTRIES_PER_LEVEL: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub time_secs: u64,
    pub date: DateTime<Utc>,
}

/// Best round times, kept separately for each level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scoreboard {
    levels: BTreeMap<u8, Vec<ScoreEntry>>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(store: &impl Store) -> Self {
        load_record(store, SCOREBOARD_KEY).unwrap_or_default()
    }

    pub fn save(&self, store: &mut impl Store) -> Result<()> {
        let value = serde_json::to_value(self)?;
        store.save(SCOREBOARD_KEY, &value)
    }

    /// Adds a time and returns its 0-based rank if it made the list.
    pub fn record(&mut self, level: u8, time_secs: u64) -> Option<usize> {
        self.record_at(level, time_secs, Utc::now())
    }

    fn record_at(&mut self, level: u8, time_secs: u64, date: DateTime<Utc>) -> Option<usize> {
        let entries = self.levels.entry(level).or_default();
        // ties rank after existing entries
        let rank = entries.partition_point(|e| e.time_secs <= time_secs);
        if rank >= MAX_ENTRIES_PER_LEVEL {
            return None;
        }

        entries.insert(rank, ScoreEntry { time_secs, date });
        entries.truncate(MAX_ENTRIES_PER_LEVEL);
        Some(rank)
    }

    pub fn best(&self, level: u8) -> &[ScoreEntry] {
        self.levels.get(&level).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        self.levels.clear();
    }
}
