use crate::error::{DrillError, Result};
use crate::level::LevelConfig;
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Addition,
    Multiplication,
    /// Division asked as a missing factor: `a × ? = r`.
    InverseMultiplication,
    /// Division in `r ÷ a = ?` notation.
    Division,
}

impl OperationKind {
    /// Band order used when picking a kind from a level's weights.
    pub const ALL: [OperationKind; 4] = [
        OperationKind::Addition,
        OperationKind::Multiplication,
        OperationKind::InverseMultiplication,
        OperationKind::Division,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            OperationKind::Addition => "+",
            OperationKind::Multiplication | OperationKind::InverseMultiplication => "×",
            OperationKind::Division => "÷",
        }
    }

    pub fn is_division(&self) -> bool {
        matches!(
            self,
            OperationKind::InverseMultiplication | OperationKind::Division
        )
    }

    /// Maps a draw in `[0, 100)` onto the contiguous weight bands.
    ///
    /// A draw past the last band (weights summing below 100) lands in the
    /// last kind that has a positive weight.
    pub fn from_draw(weights: [f64; 4], draw: f64) -> OperationKind {
        let mut threshold = 0.0;
        for (kind, weight) in Self::ALL.iter().zip(weights) {
            threshold += weight;
            if weight > 0.0 && draw < threshold {
                return *kind;
            }
        }

        Self::ALL
            .iter()
            .zip(weights)
            .rev()
            .find(|(_, weight)| *weight > 0.0)
            .map(|(kind, _)| *kind)
            .unwrap_or(OperationKind::Addition)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub operand_a: u32,
    pub operand_b: u32,
    pub operation_kind: OperationKind,
    /// The dividend shown for division kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_result: Option<u64>,
}

impl Question {
    pub fn addition(a: u32, b: u32) -> Self {
        Self {
            operand_a: a,
            operand_b: b,
            operation_kind: OperationKind::Addition,
            expected_result: None,
        }
    }

    pub fn multiplication(a: u32, b: u32) -> Self {
        Self {
            operand_a: a,
            operand_b: b,
            operation_kind: OperationKind::Multiplication,
            expected_result: None,
        }
    }

    /// `divisor` is shown, `quotient` is what the learner must find.
    pub fn division(kind: OperationKind, divisor: u32, quotient: u32) -> Self {
        Self {
            operand_a: divisor,
            operand_b: quotient,
            operation_kind: kind,
            expected_result: Some(u64::from(divisor) * u64::from(quotient)),
        }
    }

    pub fn generate<R: Rng + ?Sized>(config: &LevelConfig, rng: &mut R) -> Self {
        let draw = rng.gen_range(0.0..100.0);
        let kind = OperationKind::from_draw(config.weights(), draw);

        let question = match kind {
            OperationKind::Addition => {
                Self::addition(config.draw_operand(rng), config.draw_operand(rng))
            }
            OperationKind::Multiplication => {
                let table = config.draw_table(rng);
                let value = config.draw_operand(rng);
                if rng.gen_bool(0.5) {
                    Self::multiplication(value, table)
                } else {
                    Self::multiplication(table, value)
                }
            }
            OperationKind::InverseMultiplication | OperationKind::Division => {
                let divisor = config.draw_table(rng);
                Self::division(kind, divisor, config.draw_operand(rng))
            }
        };

        debug!("Generated {} ({:?})", question.prompt(), kind);
        question
    }

    /// The value the learner has to supply.
    pub fn answer(&self) -> u64 {
        let (a, b) = (u64::from(self.operand_a), u64::from(self.operand_b));
        match self.operation_kind {
            OperationKind::Addition => a + b,
            OperationKind::Multiplication => a * b,
            OperationKind::InverseMultiplication | OperationKind::Division => b,
        }
    }

    pub fn is_correct(&self, submitted: f64) -> bool {
        submitted == self.answer() as f64
    }

    fn dividend(&self) -> u64 {
        self.expected_result
            .unwrap_or_else(|| u64::from(self.operand_a) * u64::from(self.operand_b))
    }

    /// Text answers that do not parse count as wrong.
    pub fn check_answer(&self, input: &str) -> bool {
        match parse_answer(input) {
            Ok(value) => self.is_correct(value),
            Err(e) => {
                debug!("Treating answer as incorrect: {}", e);
                false
            }
        }
    }

    pub fn prompt(&self) -> String {
        match self.operation_kind {
            OperationKind::Addition | OperationKind::Multiplication => format!(
                "{} {} {} = ?",
                self.operand_a,
                self.operation_kind.symbol(),
                self.operand_b
            ),
            OperationKind::InverseMultiplication => {
                format!("{} × ? = {}", self.operand_a, self.dividend())
            }
            OperationKind::Division => {
                format!("{} ÷ {} = ?", self.dividend(), self.operand_a)
            }
        }
    }
}

pub fn parse_answer(input: &str) -> Result<f64> {
    let trimmed = input.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(DrillError::InvalidAnswerInput(trimmed.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LevelTable;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn addition_only() -> LevelConfig {
        LevelConfig {
            addition_weight: 100.0,
            multiplication_weight: 0.0,
            inverse_multiplication_weight: 0.0,
            division_weight: 0.0,
            ..LevelTable::builtin().level_config(1).unwrap().clone()
        }
    }

    #[test]
    fn test_bands_follow_weight_order() {
        let weights = [40.0, 30.0, 20.0, 10.0];
        assert_eq!(OperationKind::from_draw(weights, 0.0), OperationKind::Addition);
        assert_eq!(OperationKind::from_draw(weights, 39.99), OperationKind::Addition);
        assert_eq!(OperationKind::from_draw(weights, 40.0), OperationKind::Multiplication);
        assert_eq!(
            OperationKind::from_draw(weights, 75.0),
            OperationKind::InverseMultiplication
        );
        assert_eq!(OperationKind::from_draw(weights, 99.9), OperationKind::Division);
    }

    #[test]
    fn test_draw_beyond_bands_falls_into_last_weighted_kind() {
        let weights = [50.0, 30.0, 0.0, 0.0];
        assert_eq!(OperationKind::from_draw(weights, 95.0), OperationKind::Multiplication);
        assert_eq!(OperationKind::from_draw([0.0; 4], 10.0), OperationKind::Addition);
    }

    #[test]
    fn test_zero_weight_band_is_never_selected() {
        let weights = [0.0, 100.0, 0.0, 0.0];
        assert_eq!(OperationKind::from_draw(weights, 0.0), OperationKind::Multiplication);
    }

    #[test]
    fn test_addition_only_level_generates_additions_in_range() {
        let config = addition_only();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let q = Question::generate(&config, &mut rng);
            assert_eq!(q.operation_kind, OperationKind::Addition);
            assert!(q.operand_a <= 10 && q.operand_b <= 10);
        }
    }

    #[test]
    fn test_multiplication_uses_a_table_on_one_side() {
        let config = LevelConfig {
            addition_weight: 0.0,
            multiplication_weight: 100.0,
            inverse_multiplication_weight: 0.0,
            division_weight: 0.0,
            ..addition_only()
        };
        let mut rng = StdRng::seed_from_u64(11);
        let mut swapped = false;
        for _ in 0..200 {
            let q = Question::generate(&config, &mut rng);
            assert_eq!(q.operation_kind, OperationKind::Multiplication);
            let a_is_table = config.multiplication_tables.contains(&q.operand_a);
            let b_is_table = config.multiplication_tables.contains(&q.operand_b);
            assert!(a_is_table || b_is_table);
            swapped |= !a_is_table;
        }
        assert!(swapped);
    }

    #[test]
    fn test_division_questions_carry_the_dividend() {
        let config = LevelConfig {
            addition_weight: 0.0,
            multiplication_weight: 0.0,
            inverse_multiplication_weight: 50.0,
            division_weight: 50.0,
            ..addition_only()
        };
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let q = Question::generate(&config, &mut rng);
            assert!(q.operation_kind.is_division());
            assert!(config.multiplication_tables.contains(&q.operand_a));
            assert_eq!(q.expected_result, Some(q.answer() * u64::from(q.operand_a)));
            assert_eq!(q.answer(), u64::from(q.operand_b));
        }
    }

    #[test]
    fn test_division_answer_is_the_quotient() {
        let q = Question::division(OperationKind::Division, 4, 7);
        assert_eq!(q.expected_result, Some(28));
        assert!(q.check_answer("7"));
        assert!(!q.check_answer("28"));
    }

    #[test]
    fn test_check_answer_parses_text() {
        let q = Question::addition(3, 4);
        assert!(q.check_answer(" 7 "));
        assert!(q.check_answer("7.0"));
        assert!(!q.check_answer("seven"));
        assert!(!q.check_answer(""));
        assert!(Question::multiplication(6, 7).check_answer("42"));
    }

    #[test]
    fn test_parse_answer_rejects_non_numbers() {
        assert!(matches!(
            parse_answer("abc"),
            Err(DrillError::InvalidAnswerInput(_))
        ));
        assert!(parse_answer("NaN").is_err());
        assert_eq!(parse_answer("12").unwrap(), 12.0);
    }

    #[test]
    fn test_large_operands_do_not_overflow() {
        let sum = Question::addition(70_000, 70_000);
        assert_eq!(sum.prompt(), "70000 + 70000 = ?");
        assert_eq!(sum.answer(), 140_000);

        let product = Question::multiplication(u32::MAX, u32::MAX);
        assert_eq!(product.answer(), u64::from(u32::MAX) * u64::from(u32::MAX));
        assert!(product.prompt().ends_with("= ?"));

        let division = Question::division(OperationKind::Division, 70_000, 70_000);
        assert_eq!(division.expected_result, Some(4_900_000_000));
        assert_eq!(division.prompt(), "4900000000 ÷ 70000 = ?");
        assert!(division.check_answer("70000"));
    }

    #[test]
    fn test_prompts() {
        assert_eq!(Question::addition(3, 4).prompt(), "3 + 4 = ?");
        assert_eq!(Question::multiplication(6, 7).prompt(), "6 × 7 = ?");
        assert_eq!(
            Question::division(OperationKind::InverseMultiplication, 4, 7).prompt(),
            "4 × ? = 28"
        );
        assert_eq!(
            Question::division(OperationKind::Division, 4, 7).prompt(),
            "28 ÷ 4 = ?"
        );
    }
}
