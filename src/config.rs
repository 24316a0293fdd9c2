use crate::error::{DrillError, Result};
use crate::history::DEFAULT_CAPACITY;
use crate::level::{default_levels, LevelConfig, LevelTable};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Thresholds used when deciding whether the level should change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EvaluationRules {
    pub history_capacity: usize,
    /// Answers needed in the history before any evaluation happens.
    pub min_history: usize,
    pub demotion_consecutive_errors: usize,
    pub demotion_window: usize,
    pub demotion_min_success_rate: f64,
    pub promotion_min_questions: u32,
    pub promotion_window: usize,
    pub promotion_min_success_rate: f64,
    pub stats_window: usize,
}

impl Default for EvaluationRules {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_CAPACITY,
            min_history: 5,
            demotion_consecutive_errors: 3,
            demotion_window: 5,
            demotion_min_success_rate: 60.0,
            promotion_min_questions: 10,
            promotion_window: 10,
            promotion_min_success_rate: 80.0,
            stats_window: 10,
        }
    }
}

impl EvaluationRules {
    pub fn validate(&self) -> Result<()> {
        let windows = [
            ("historyCapacity", self.history_capacity),
            ("demotionWindow", self.demotion_window),
            ("promotionWindow", self.promotion_window),
            ("statsWindow", self.stats_window),
            ("demotionConsecutiveErrors", self.demotion_consecutive_errors),
        ];
        if let Some((name, _)) = windows.iter().find(|(_, value)| *value == 0) {
            return Err(DrillError::InvalidConfig(format!("{} must be at least 1", name)));
        }

        let bounded = [
            ("minHistory", self.min_history),
            ("demotionWindow", self.demotion_window),
            ("promotionWindow", self.promotion_window),
            ("demotionConsecutiveErrors", self.demotion_consecutive_errors),
        ];
        for (name, value) in bounded {
            if value > self.history_capacity {
                return Err(DrillError::InvalidConfig(format!(
                    "{} {} exceeds historyCapacity {}",
                    name, value, self.history_capacity
                )));
            }
        }

        let rates = [
            ("demotionMinSuccessRate", self.demotion_min_success_rate),
            ("promotionMinSuccessRate", self.promotion_min_success_rate),
        ];
        for (name, rate) in rates {
            if !(0.0..=100.0).contains(&rate) {
                return Err(DrillError::InvalidConfig(format!(
                    "{} {} is outside 0..=100",
                    name, rate
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillConfig {
    #[serde(default = "default_levels")]
    pub levels: Vec<LevelConfig>,
    #[serde(default)]
    pub rules: EvaluationRules,
}

impl Default for DrillConfig {
    fn default() -> Self {
        Self {
            levels: default_levels(),
            rules: EvaluationRules::default(),
        }
    }
}

impl DrillConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: DrillConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.rules.validate()?;
        self.level_table().map(|_| ())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn level_table(&self) -> Result<LevelTable> {
        LevelTable::new(self.levels.clone())
    }
}
