//! Adaptive arithmetic drill: levels, question generation and the rules
//! that move a learner between levels.

pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod level;
pub mod question;
pub mod scoreboard;
pub mod session;
pub mod storage;

pub use config::{DrillConfig, EvaluationRules};
pub use engine::{
    ChangeKind, DifficultyEngine, LevelChange, PendingLevelChange, Progression, Stats,
};
pub use error::{DrillError, Result};
pub use history::{AnswerRecord, HistoryLog};
pub use level::{LevelConfig, LevelTable};
pub use question::{parse_answer, OperationKind, Question};
pub use scoreboard::{ScoreEntry, Scoreboard};
pub use session::{AnswerOutcome, QuizSession, SessionSummary};
pub use storage::{FileStore, MemoryStore, Store};
