use std::collections::BTreeMap;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::model::ids::{LessonId, QuizId};

//
// ─── PROGRESS RECORD ───────────────────────────────────────────────────────────
//

/// Session-accumulated local state for one lesson.
///
/// Every field is optional on the wire; an absent field means "never set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_completed: Option<bool>,
}

impl ProgressRecord {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed.unwrap_or(false)
    }

    #[must_use]
    pub fn time_spent(&self) -> u64 {
        self.time_spent_seconds.unwrap_or(0)
    }

    #[must_use]
    pub fn is_exercise_completed(&self) -> bool {
        self.exercise_completed.unwrap_or(false)
    }

    pub fn add_time(&mut self, seconds: u64) {
        self.time_spent_seconds = Some(self.time_spent().saturating_add(seconds));
    }

    /// Fold another record in without losing any completion already recorded.
    pub fn merge(&mut self, other: &ProgressRecord) {
        if other.is_completed() {
            self.completed = Some(true);
        } else if self.completed.is_none() {
            self.completed = other.completed;
        }
        if other.is_exercise_completed() {
            self.exercise_completed = Some(true);
        } else if self.exercise_completed.is_none() {
            self.exercise_completed = other.exercise_completed;
        }
        if let Some(theirs) = other.time_spent_seconds {
            self.time_spent_seconds = Some(self.time_spent().max(theirs));
        }
    }
}

//
// ─── PROGRESS MAP ──────────────────────────────────────────────────────────────
//

/// Local progress keyed by lesson id (the persisted `progress` entry).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressMap {
    records: BTreeMap<LessonId, ProgressRecord>,
}

impl ProgressMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON value, skipping entries that do not parse.
    #[must_use]
    pub fn from_json_lenient(value: Value) -> Self {
        Self {
            records: parse_keyed_map(value, "progress"),
        }
    }

    #[must_use]
    pub fn get(&self, lesson: LessonId) -> Option<&ProgressRecord> {
        self.records.get(&lesson)
    }

    pub fn record_mut(&mut self, lesson: LessonId) -> &mut ProgressRecord {
        self.records.entry(lesson).or_default()
    }

    #[must_use]
    pub fn is_completed(&self, lesson: LessonId) -> bool {
        self.get(lesson).is_some_and(ProgressRecord::is_completed)
    }

    /// Sets the local completion flag. Returns `true` if it was not already set.
    pub fn mark_completed(&mut self, lesson: LessonId) -> bool {
        let record = self.record_mut(lesson);
        let newly = !record.is_completed();
        record.completed = Some(true);
        newly
    }

    pub fn add_time(&mut self, lesson: LessonId, seconds: u64) {
        self.record_mut(lesson).add_time(seconds);
    }

    pub fn mark_exercise_completed(&mut self, lesson: LessonId) {
        self.record_mut(lesson).exercise_completed = Some(true);
    }

    pub fn merge_from(&mut self, other: &ProgressMap) {
        for (lesson, record) in &other.records {
            self.record_mut(*lesson).merge(record);
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LessonId, &ProgressRecord)> {
        self.records.iter()
    }
}

//
// ─── QUIZ RESULTS ──────────────────────────────────────────────────────────────
//

/// A scored answer, stored once per quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub selected_answer: usize,
    pub is_correct: bool,
}

/// Local quiz results keyed by quiz id (the persisted `quizResults` entry).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuizResults {
    results: BTreeMap<QuizId, QuizResult>,
}

impl QuizResults {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_json_lenient(value: Value) -> Self {
        Self {
            results: parse_keyed_map(value, "quizResults"),
        }
    }

    #[must_use]
    pub fn get(&self, quiz: QuizId) -> Option<&QuizResult> {
        self.results.get(&quiz)
    }

    #[must_use]
    pub fn is_answered(&self, quiz: QuizId) -> bool {
        self.results.contains_key(&quiz)
    }

    /// Stores the result only if the quiz has none yet.
    ///
    /// Returns `false` (and leaves the stored result untouched) otherwise.
    pub fn insert_once(&mut self, quiz: QuizId, result: QuizResult) -> bool {
        if self.results.contains_key(&quiz) {
            return false;
        }
        self.results.insert(quiz, result);
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

//
// ─── EXERCISE CODES ────────────────────────────────────────────────────────────
//

/// Last saved exercise code per lesson (the persisted `exerciseCodes` entry).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExerciseCodes {
    codes: BTreeMap<LessonId, String>,
}

impl ExerciseCodes {
    #[must_use]
    pub fn from_json_lenient(value: Value) -> Self {
        Self {
            codes: parse_keyed_map(value, "exerciseCodes"),
        }
    }

    #[must_use]
    pub fn get(&self, lesson: LessonId) -> Option<&str> {
        self.codes.get(&lesson).map(String::as_str)
    }

    pub fn set(&mut self, lesson: LessonId, code: impl Into<String>) {
        self.codes.insert(lesson, code.into());
    }
}

/// Parse a JSON object keyed by numeric ids, dropping any entry whose key or
/// value is malformed instead of failing the whole map.
fn parse_keyed_map<K, V>(value: Value, what: &str) -> BTreeMap<K, V>
where
    K: FromStr + Ord,
    V: DeserializeOwned,
{
    let Value::Object(entries) = value else {
        debug!(entry = what, "persisted entry is not an object, using empty");
        return BTreeMap::new();
    };

    let mut out = BTreeMap::new();
    for (raw_key, raw_value) in entries {
        let Ok(key) = raw_key.parse::<K>() else {
            debug!(entry = what, key = %raw_key, "skipping entry with malformed key");
            continue;
        };
        match serde_json::from_value::<V>(raw_value) {
            Ok(parsed) => {
                out.insert(key, parsed);
            }
            Err(err) => {
                debug!(entry = what, key = %raw_key, error = %err, "skipping malformed entry");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_serializes_only_present_fields() {
        let mut map = ProgressMap::new();
        map.mark_completed(LessonId::new(3));
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json, json!({"3": {"completed": true}}));
    }

    #[test]
    fn lenient_parse_skips_bad_entries() {
        let value = json!({
            "10": {"completed": true, "time_spent_seconds": 40},
            "oops": {"completed": true},
            "11": "not an object",
            "12": {"time_spent_seconds": 5}
        });
        let map = ProgressMap::from_json_lenient(value);
        assert_eq!(map.len(), 2);
        assert!(map.is_completed(LessonId::new(10)));
        assert_eq!(map.get(LessonId::new(12)).unwrap().time_spent(), 5);
    }

    #[test]
    fn lenient_parse_of_non_object_is_empty() {
        assert!(ProgressMap::from_json_lenient(json!([1, 2])).is_empty());
        assert!(QuizResults::from_json_lenient(Value::Null).is_empty());
    }

    #[test]
    fn merge_keeps_completion_and_larger_time() {
        let mut mine = ProgressRecord {
            completed: Some(true),
            time_spent_seconds: Some(100),
            exercise_completed: None,
        };
        let theirs = ProgressRecord {
            completed: Some(false),
            time_spent_seconds: Some(60),
            exercise_completed: Some(true),
        };
        mine.merge(&theirs);
        assert!(mine.is_completed());
        assert_eq!(mine.time_spent(), 100);
        assert!(mine.is_exercise_completed());
    }

    #[test]
    fn quiz_results_are_write_once() {
        let mut results = QuizResults::new();
        let first = QuizResult { selected_answer: 1, is_correct: true };
        let second = QuizResult { selected_answer: 0, is_correct: false };
        assert!(results.insert_once(QuizId::new(4), first));
        assert!(!results.insert_once(QuizId::new(4), second));
        assert_eq!(results.get(QuizId::new(4)), Some(&first));
    }

    #[test]
    fn exercise_codes_round_trip_through_lenient_parse() {
        let mut codes = ExerciseCodes::default();
        codes.set(LessonId::new(2), "print('hi')");
        let value = serde_json::to_value(&codes).unwrap();
        let back = ExerciseCodes::from_json_lenient(value);
        assert_eq!(back.get(LessonId::new(2)), Some("print('hi')"));
    }
}
