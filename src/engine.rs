//! Adaptive difficulty: question generation, answer history and the
//! promotion/demotion rules.
//!
//! Level changes are two-phase. Evaluation after each answer only marks a
//! pending change; the caller commits it with [`DifficultyEngine::apply_pending_level_change`]
//! at a natural breakpoint such as the end of a quiz round.

use crate::config::{DrillConfig, EvaluationRules};
use crate::error::{DrillError, Result};
use crate::history::{AnswerRecord, HistoryLog};
use crate::level::{LevelConfig, LevelTable};
use crate::question::{OperationKind, Question};
use crate::storage::Store;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PROGRESSION_KEY: &str = "math-drill-difficulty";
pub const HISTORY_KEY: &str = "math-drill-history";

/// The persisted part of the learner's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Progression {
    pub current_level: u8,
    pub questions_at_level: u32,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            current_level: 1,
            questions_at_level: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Upgrade,
    Downgrade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingLevelChange {
    pub kind: ChangeKind,
    pub target_level: u8,
}

/// A level change described for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelChange {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub target_level: u8,
    pub target_level_name: String,
    pub target_level_icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub level: u8,
    pub level_name: String,
    pub level_icon: String,
    pub questions_at_level: u32,
    pub success_rate: u32,
    pub average_time: f64,
    pub total_questions: usize,
}

pub struct DifficultyEngine<S: Store, R: Rng = StdRng> {
    levels: LevelTable,
    rules: EvaluationRules,
    store: S,
    rng: R,
    progression: Progression,
    history: HistoryLog,
    pending: Option<PendingLevelChange>,
}

impl<S: Store> DifficultyEngine<S, StdRng> {
    /// Default levels and rules with an entropy-seeded generator.
    pub fn open(store: S) -> Self {
        let levels = LevelTable::builtin();
        let rules = EvaluationRules::default();
        Self::with_parts(levels, rules, store, StdRng::from_entropy())
    }
}

impl<S: Store, R: Rng> DifficultyEngine<S, R> {
    pub fn new(config: DrillConfig, store: S, rng: R) -> Result<Self> {
        config.rules.validate()?;
        let levels = config.level_table()?;
        Ok(Self::with_parts(levels, config.rules, store, rng))
    }

    fn with_parts(levels: LevelTable, rules: EvaluationRules, store: S, rng: R) -> Self {
        let progression = load_progression(&store, &levels);
        let history = HistoryLog::from_records(
            load_record(&store, HISTORY_KEY).unwrap_or_default(),
            rules.history_capacity,
        );
        info!(
            "Difficulty engine ready at level {} ({} answers in history)",
            progression.current_level,
            history.len()
        );

        Self {
            levels,
            rules,
            store,
            rng,
            progression,
            history,
            pending: None,
        }
    }

    pub fn levels(&self) -> &LevelTable {
        &self.levels
    }

    pub fn rules(&self) -> &EvaluationRules {
        &self.rules
    }

    pub fn level_config(&self, level: u8) -> Result<&LevelConfig> {
        self.levels.level_config(level)
    }

    fn current_config(&self) -> &LevelConfig {
        self.levels.clamped(self.progression.current_level)
    }

    pub fn current_level(&self) -> u8 {
        self.progression.current_level
    }

    pub fn questions_at_level(&self) -> u32 {
        self.progression.questions_at_level
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn generate_question(&mut self) -> Question {
        let config = self.levels.clamped(self.progression.current_level);
        Question::generate(config, &mut self.rng)
    }

    /// Records an answer and re-evaluates the level. Returns the change
    /// marked by this answer, if any.
    pub fn record_answer(
        &mut self,
        correct: bool,
        response_time_seconds: f64,
        kind: OperationKind,
    ) -> Option<LevelChange> {
        self.history.push(AnswerRecord::new(
            correct,
            response_time_seconds,
            kind,
            self.progression.current_level,
        ));
        self.progression.questions_at_level += 1;

        let marked = self.evaluate_difficulty();
        self.persist();
        marked.and_then(|change| self.describe(change))
    }

    pub fn success_rate(&self, window: usize) -> f64 {
        self.history.success_rate(window)
    }

    pub fn average_response_time(&self, window: usize) -> f64 {
        self.history.average_response_time(window)
    }

    pub fn consecutive_errors(&self) -> usize {
        self.history.consecutive_errors()
    }

    fn evaluate_difficulty(&mut self) -> Option<PendingLevelChange> {
        if self.history.len() < self.rules.min_history {
            return None;
        }

        let level = self.progression.current_level;

        if level > 1 {
            if self.consecutive_errors() >= self.rules.demotion_consecutive_errors {
                return Some(self.mark(ChangeKind::Downgrade, level - 1));
            }
            if self.history.len() >= self.rules.demotion_window
                && self.success_rate(self.rules.demotion_window)
                    < self.rules.demotion_min_success_rate
            {
                return Some(self.mark(ChangeKind::Downgrade, level - 1));
            }
        }

        if level < self.levels.max_level() {
            if self.progression.questions_at_level < self.rules.promotion_min_questions {
                return None;
            }

            let window = self.rules.promotion_window;
            let accurate = self.success_rate(window) >= self.rules.promotion_min_success_rate;
            let fast = self.average_response_time(window) <= self.current_config().max_time;
            if accurate && fast {
                return Some(self.mark(ChangeKind::Upgrade, level + 1));
            }
        }

        None
    }

    fn mark(&mut self, kind: ChangeKind, target_level: u8) -> PendingLevelChange {
        let change = PendingLevelChange { kind, target_level };
        if let Some(previous) = self.pending.replace(change) {
            if previous != change {
                info!(
                    "Replacing pending {:?} to level {}",
                    previous.kind, previous.target_level
                );
            }
        }
        info!(
            "Pending {:?} from level {} to level {}",
            kind, self.progression.current_level, target_level
        );
        change
    }

    fn describe(&self, change: PendingLevelChange) -> Option<LevelChange> {
        let config = self.levels.level_config(change.target_level).ok()?;
        Some(LevelChange {
            kind: change.kind,
            target_level: change.target_level,
            target_level_name: config.name.clone(),
            target_level_icon: config.icon.clone(),
        })
    }

    pub fn has_pending_level_change(&self) -> bool {
        self.pending.is_some()
    }

    pub fn peek_pending_level_change(&self) -> Option<LevelChange> {
        self.pending.and_then(|change| self.describe(change))
    }

    /// Commits the pending change. Does nothing and returns `None` when no
    /// change is pending.
    pub fn apply_pending_level_change(&mut self) -> Option<LevelChange> {
        let change = self.pending.take()?;
        let Some(descriptor) = self.describe(change) else {
            warn!("Dropping pending change to unknown level {}", change.target_level);
            return None;
        };

        self.progression = Progression {
            current_level: change.target_level,
            questions_at_level: 0,
        };
        info!(
            "Level {:?} applied: now level {} ({})",
            change.kind, change.target_level, descriptor.target_level_name
        );
        self.persist();
        Some(descriptor)
    }

    pub fn cancel_pending_level_change(&mut self) {
        if let Some(change) = self.pending.take() {
            info!(
                "Cancelled pending {:?} to level {}",
                change.kind, change.target_level
            );
        }
    }

    pub fn stats(&self) -> Stats {
        let config = self.current_config();
        let window = self.rules.stats_window;
        Stats {
            level: self.progression.current_level,
            level_name: config.name.clone(),
            level_icon: config.icon.clone(),
            questions_at_level: self.progression.questions_at_level,
            success_rate: self.success_rate(window).round() as u32,
            average_time: (self.average_response_time(window) * 10.0).round() / 10.0,
            total_questions: self.history.len(),
        }
    }

    pub fn reset(&mut self) {
        self.progression = Progression::default();
        self.history.clear();
        self.pending = None;
        info!("Progress reset to level 1");
        self.persist();
    }

    fn persist(&mut self) {
        if let Err(e) = self.try_persist() {
            warn!("Failed to save progress: {}", e);
        }
    }

    fn try_persist(&mut self) -> Result<()> {
        let progression = serde_json::to_value(self.progression)?;
        let history = serde_json::to_value(self.history.records())?;
        self.store.save(PROGRESSION_KEY, &progression)?;
        self.store.save(HISTORY_KEY, &history)?;
        Ok(())
    }
}

/// Loads and decodes a record, logging and discarding anything unusable.
pub(crate) fn load_record<T: DeserializeOwned>(store: &impl Store, key: &str) -> Option<T> {
    let value: Value = match store.load(key) {
        Ok(value) => value?,
        Err(e) => {
            warn!("Ignoring stored '{}': {}", key, e);
            return None;
        }
    };

    match serde_json::from_value(value) {
        Ok(record) => Some(record),
        Err(e) => {
            let err = DrillError::MalformedPersistedState {
                key: key.to_string(),
                reason: e.to_string(),
            };
            warn!("Ignoring stored '{}': {}", key, err);
            None
        }
    }
}

fn load_progression(store: &impl Store, levels: &LevelTable) -> Progression {
    let Some(progression) = load_record::<Progression>(store, PROGRESSION_KEY) else {
        return Progression::default();
    };

    if !levels.contains(progression.current_level) {
        warn!(
            "Stored level {} is not in the table, starting over",
            progression.current_level
        );
        return Progression::default();
    }
    progression
}
