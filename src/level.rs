use crate::error::{DrillError, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

const WEIGHT_TOTAL: f64 = 100.0;
const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Parameters of one difficulty level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelConfig {
    pub name: String,
    pub icon: String,
    #[serde(default)]
    pub addition_weight: f64,
    #[serde(default)]
    pub multiplication_weight: f64,
    #[serde(default)]
    pub inverse_multiplication_weight: f64,
    #[serde(default)]
    pub division_weight: f64,
    /// First factors allowed in multiplication and division.
    pub multiplication_tables: Vec<u32>,
    /// Target seconds per answer for promotion.
    pub max_time: f64,
    pub min_value: u32,
    pub max_value: u32,
}

impl LevelConfig {
    /// Weights in band order: addition, multiplication, inverse, division.
    pub fn weights(&self) -> [f64; 4] {
        [
            self.addition_weight,
            self.multiplication_weight,
            self.inverse_multiplication_weight,
            self.division_weight,
        ]
    }

    pub fn draw_operand<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(self.min_value..=self.max_value)
    }

    pub fn draw_table<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        // validated tables are never empty
        self.multiplication_tables
            .choose(rng)
            .copied()
            .unwrap_or(self.min_value)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_value > self.max_value {
            return Err(DrillError::InvalidConfig(format!(
                "level '{}': minValue {} exceeds maxValue {}",
                self.name, self.min_value, self.max_value
            )));
        }
        if self.multiplication_tables.is_empty() {
            return Err(DrillError::InvalidConfig(format!(
                "level '{}' has no multiplication tables",
                self.name
            )));
        }
        if self.weights().iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(DrillError::InvalidConfig(format!(
                "level '{}' has a negative or non-finite weight",
                self.name
            )));
        }
        let total: f64 = self.weights().iter().sum();
        if (total - WEIGHT_TOTAL).abs() > WEIGHT_TOLERANCE {
            return Err(DrillError::InvalidConfig(format!(
                "level '{}' weights sum to {}, expected {}",
                self.name, total, WEIGHT_TOTAL
            )));
        }
        let largest_table = self.multiplication_tables.iter().copied().max().unwrap_or(0);
        if largest_table.checked_mul(self.max_value).is_none()
            || self.max_value.checked_add(self.max_value).is_none()
        {
            return Err(DrillError::InvalidConfig(format!(
                "level '{}': answers with table {} and maxValue {} do not fit in u32",
                self.name, largest_table, self.max_value
            )));
        }
        if !self.max_time.is_finite() || self.max_time <= 0.0 {
            return Err(DrillError::InvalidConfig(format!(
                "level '{}' has no usable maxTime",
                self.name
            )));
        }
        Ok(())
    }
}

fn level(
    name: &str,
    icon: &str,
    weights: [f64; 4],
    tables: &[u32],
    max_time: f64,
    min_value: u32,
) -> LevelConfig {
    LevelConfig {
        name: name.to_string(),
        icon: icon.to_string(),
        addition_weight: weights[0],
        multiplication_weight: weights[1],
        inverse_multiplication_weight: weights[2],
        division_weight: weights[3],
        multiplication_tables: tables.to_vec(),
        max_time,
        min_value,
        max_value: 10,
    }
}

/// The default progression: addition gives way to multiplication and then
/// to division, tables widen, trivial operands drop out and the time target
/// tightens.
pub fn default_levels() -> Vec<LevelConfig> {
    vec![
        level("Beginner", "🌱", [80.0, 20.0, 0.0, 0.0], &[2, 5, 10], 8.0, 0),
        level("Apprentice", "🌿", [60.0, 40.0, 0.0, 0.0], &[2, 5, 10], 7.0, 0),
        level(
            "Intermediate",
            "🌳",
            [40.0, 45.0, 15.0, 0.0],
            &[2, 3, 4, 5, 6, 10],
            6.0,
            0,
        ),
        level(
            "Advanced",
            "⭐",
            [30.0, 40.0, 20.0, 10.0],
            &[2, 3, 4, 5, 6, 10],
            5.0,
            1,
        ),
        level(
            "Expert",
            "🏆",
            [15.0, 40.0, 25.0, 20.0],
            &[2, 3, 4, 5, 6, 7, 8, 9, 10],
            5.0,
            2,
        ),
    ]
}

/// Levels numbered from 1, validated on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelTable {
    levels: Vec<LevelConfig>,
}

impl LevelTable {
    pub fn new(levels: Vec<LevelConfig>) -> Result<Self> {
        if levels.is_empty() {
            return Err(DrillError::InvalidConfig("no levels defined".to_string()));
        }
        if levels.len() > u8::MAX as usize {
            return Err(DrillError::InvalidConfig(format!(
                "{} levels defined, at most {} supported",
                levels.len(),
                u8::MAX
            )));
        }
        for config in &levels {
            config.validate()?;
        }
        Ok(Self { levels })
    }

    pub fn builtin() -> Self {
        Self {
            levels: default_levels(),
        }
    }

    pub fn max_level(&self) -> u8 {
        self.levels.len() as u8
    }

    pub fn contains(&self, level: u8) -> bool {
        (1..=self.max_level()).contains(&level)
    }

    pub fn level_config(&self, level: u8) -> Result<&LevelConfig> {
        if !self.contains(level) {
            return Err(DrillError::InvalidLevel {
                level,
                max: self.max_level(),
            });
        }
        Ok(&self.levels[level as usize - 1])
    }

    /// Config for `level`, or for the nearest level in the table.
    pub fn clamped(&self, level: u8) -> &LevelConfig {
        let index = level.clamp(1, self.max_level()) as usize - 1;
        &self.levels[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &LevelConfig)> {
        self.levels
            .iter()
            .enumerate()
            .map(|(i, config)| (i as u8 + 1, config))
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::builtin()
    }
}
