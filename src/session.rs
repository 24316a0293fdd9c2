//! A quiz round: questions until a goal of correct answers is reached.
//! The end of the round is the breakpoint where a pending level change is
//! committed and the round time goes on the scoreboard.

use crate::engine::{DifficultyEngine, LevelChange};
use crate::question::Question;
use crate::scoreboard::Scoreboard;
use crate::storage::Store;
use log::{info, warn};
use rand::Rng;

pub const DEFAULT_GOAL: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub expected: u64,
    pub finished: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub total_secs: u64,
    /// Position on the scoreboard, if the time made it.
    pub rank: Option<usize>,
    pub level_change: Option<LevelChange>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuizSession {
    goal: u32,
    level: u8,
    correct: u32,
    answered: u32,
}

impl QuizSession {
    pub fn start<S: Store, R: Rng>(engine: &DifficultyEngine<S, R>, goal: u32) -> Self {
        Self {
            goal: goal.max(1),
            level: engine.current_level(),
            correct: 0,
            answered: 0,
        }
    }

    pub fn goal(&self) -> u32 {
        self.goal
    }

    /// Level the round started at; its time is ranked under this level.
    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn correct(&self) -> u32 {
        self.correct
    }

    pub fn answered(&self) -> u32 {
        self.answered
    }

    pub fn is_finished(&self) -> bool {
        self.correct >= self.goal
    }

    pub fn answer<S: Store, R: Rng>(
        &mut self,
        engine: &mut DifficultyEngine<S, R>,
        question: &Question,
        input: &str,
        elapsed_secs: f64,
    ) -> AnswerOutcome {
        let correct = question.check_answer(input);
        engine.record_answer(correct, elapsed_secs, question.operation_kind);

        self.answered += 1;
        if correct {
            self.correct += 1;
        }

        AnswerOutcome {
            correct,
            expected: question.answer(),
            finished: self.is_finished(),
        }
    }

    /// Closes a finished round, consuming it. An unfinished round is handed
    /// back unchanged.
    pub fn finish<S: Store, R: Rng>(
        self,
        engine: &mut DifficultyEngine<S, R>,
        scoreboard: &mut Scoreboard,
        store: &mut impl Store,
        total_secs: u64,
    ) -> std::result::Result<SessionSummary, QuizSession> {
        if !self.is_finished() {
            return Err(self);
        }

        let rank = scoreboard.record(self.level, total_secs);
        if let Err(e) = scoreboard.save(store) {
            warn!("Failed to save scoreboard: {}", e);
        }
        let level_change = engine.apply_pending_level_change();
        info!(
            "Round finished in {}s at level {} ({} answers)",
            total_secs, self.level, self.answered
        );

        Ok(SessionSummary {
            total_secs,
            rank,
            level_change,
        })
    }

    /// Ends the round early without committing any level change.
    pub fn abandon<S: Store, R: Rng>(self, engine: &mut DifficultyEngine<S, R>) {
        engine.cancel_pending_level_change();
    }
}
