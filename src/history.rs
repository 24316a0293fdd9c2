use crate::question::OperationKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CAPACITY: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub correct: bool,
    pub response_time_seconds: f64,
    pub operation_kind: OperationKind,
    pub level_at_time: u8,
    pub timestamp: DateTime<Utc>,
}

impl AnswerRecord {
    pub fn new(correct: bool, response_time_seconds: f64, kind: OperationKind, level: u8) -> Self {
        Self {
            correct,
            response_time_seconds: finite_seconds(response_time_seconds),
            operation_kind: kind,
            level_at_time: level,
            timestamp: Utc::now(),
        }
    }
}

/// JSON has no infinity or NaN, so both are mapped onto finite values.
fn finite_seconds(secs: f64) -> f64 {
    if secs.is_nan() {
        0.0
    } else {
        secs.clamp(0.0, f64::MAX)
    }
}

/// Recent answers, newest first, bounded to a fixed capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryLog {
    records: Vec<AnswerRecord>,
    capacity: usize,
}

impl HistoryLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Rebuilds a log from persisted records, dropping any beyond capacity.
    pub fn from_records(mut records: Vec<AnswerRecord>, capacity: usize) -> Self {
        records.truncate(capacity);
        Self { records, capacity }
    }

    pub fn push(&mut self, record: AnswerRecord) {
        self.records.insert(0, record);
        self.records.truncate(self.capacity);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn records(&self) -> &[AnswerRecord] {
        &self.records
    }

    fn recent(&self, window: usize) -> &[AnswerRecord] {
        &self.records[..window.min(self.records.len())]
    }

    /// Percentage (0-100) of correct answers among the latest `window`.
    pub fn success_rate(&self, window: usize) -> f64 {
        let recent = self.recent(window);
        if recent.is_empty() {
            return 0.0;
        }
        let correct = recent.iter().filter(|r| r.correct).count();
        correct as f64 / recent.len() as f64 * 100.0
    }

    pub fn average_response_time(&self, window: usize) -> f64 {
        let recent = self.recent(window);
        if recent.is_empty() {
            return 0.0;
        }
        let total: f64 = recent.iter().map(|r| r.response_time_seconds).sum();
        total / recent.len() as f64
    }

    /// Wrong answers in a row, counting back from the newest.
    pub fn consecutive_errors(&self) -> usize {
        self.records.iter().take_while(|r| !r.correct).count()
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(correct: bool, secs: f64) -> AnswerRecord {
        AnswerRecord::new(correct, secs, OperationKind::Addition, 1)
    }

    fn log_of(answers: &[(bool, f64)]) -> HistoryLog {
        let mut log = HistoryLog::default();
        for (correct, secs) in answers {
            log.push(record(*correct, *secs));
        }
        log
    }

    #[test]
    fn test_empty_log_statistics() {
        let log = HistoryLog::default();
        assert_eq!(log.success_rate(10), 0.0);
        assert_eq!(log.average_response_time(10), 0.0);
        assert_eq!(log.consecutive_errors(), 0);
    }

    #[test]
    fn test_push_keeps_newest_first_and_truncates() {
        let mut log = HistoryLog::new(3);
        for secs in 1..=5 {
            log.push(record(true, secs as f64));
        }
        let times: Vec<f64> = log.records().iter().map(|r| r.response_time_seconds).collect();
        assert_eq!(times, vec![5.0, 4.0, 3.0]);
    }

    #[test]
    fn test_window_uses_most_recent_answers() {
        // oldest first: four wrong then two right
        let log = log_of(&[
            (false, 9.0),
            (false, 9.0),
            (false, 9.0),
            (false, 9.0),
            (true, 2.0),
            (true, 4.0),
        ]);
        assert_eq!(log.success_rate(2), 100.0);
        assert_eq!(log.average_response_time(2), 3.0);
        assert_eq!(log.success_rate(4), 50.0);
        // window larger than the log covers everything
        assert!((log.success_rate(10) - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_consecutive_errors_stop_at_first_correct() {
        let log = log_of(&[(false, 1.0), (true, 1.0), (false, 1.0), (false, 1.0)]);
        assert_eq!(log.consecutive_errors(), 2);

        let all_wrong = log_of(&[(false, 1.0), (false, 1.0)]);
        assert_eq!(all_wrong.consecutive_errors(), 2);
    }

    #[test]
    fn test_from_records_truncates() {
        let records = (0..30).map(|_| record(true, 1.0)).collect();
        let log = HistoryLog::from_records(records, DEFAULT_CAPACITY);
        assert_eq!(log.len(), 20);
    }

    #[test]
    fn test_negative_times_are_clamped() {
        assert_eq!(record(true, -3.0).response_time_seconds, 0.0);
    }

    #[test]
    fn test_non_finite_times_become_finite() {
        assert_eq!(record(true, f64::INFINITY).response_time_seconds, f64::MAX);
        assert_eq!(record(true, f64::NEG_INFINITY).response_time_seconds, 0.0);
        assert_eq!(record(true, f64::NAN).response_time_seconds, 0.0);

        let json = serde_json::to_value(record(false, f64::INFINITY)).unwrap();
        let back: AnswerRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back.response_time_seconds, f64::MAX);
    }
}
