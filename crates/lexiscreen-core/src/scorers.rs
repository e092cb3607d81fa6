//! Per-test scorers.
//!
//! Each scorer turns the raw record of one completed attempt into a 0–100
//! [`TestScore`]. An attempt that is abandoned part-way never reaches a
//! scorer, so nothing here models partial progress except the
//! working-memory staircase, which a host drives trial by trial.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScoreError;
use crate::model::{percent, TestId, TestScore};

// ---------------------------------------------------------------------------
// Quiz-style tests
// ---------------------------------------------------------------------------

/// Number of questions in the fixed bank of a quiz-style test.
///
/// Returns `None` for tests that are not scored by counting correct answers.
pub fn quiz_bank_size(test: TestId) -> Option<usize> {
    match test {
        TestId::Phonological => Some(6),
        TestId::AudioDiscrimination => Some(5),
        TestId::DirectionSense => Some(7),
        TestId::WorkingMemory | TestId::ProcessingSpeed | TestId::Ran => None,
    }
}

/// Score a completed quiz from per-question correctness, in question order.
///
/// score = round(correct / total × 100)
pub fn score_quiz(
    test: TestId,
    responses: &[bool],
    at: DateTime<Utc>,
) -> Result<TestScore, ScoreError> {
    let expected = quiz_bank_size(test).ok_or(ScoreError::NotQuizStyle(test))?;
    if responses.len() != expected {
        return Err(ScoreError::ResponseCount {
            test,
            expected,
            actual: responses.len(),
        });
    }

    let correct = responses.iter().filter(|r| **r).count();
    let value = percent(correct as f64, expected as f64);
    tracing::debug!(%test, correct, total = expected, value, "scored quiz");
    TestScore::new(test, value.into(), at)
}

// ---------------------------------------------------------------------------
// Processing speed
// ---------------------------------------------------------------------------

/// Weight of click accuracy in the processing-speed score.
const ACCURACY_WEIGHT: f64 = 60.0;

/// Weight of target completion in the processing-speed score.
const COMPLETION_WEIGHT: f64 = 40.0;

/// Running tally for one processing-speed round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingSpeedTally {
    /// Targets clicked while visible.
    pub correct: u32,
    /// Clicks on distractors.
    pub incorrect: u32,
    /// Targets that expired without a click.
    pub missed: u32,
    /// Targets shown during the round.
    pub targets_seen: u32,
}

impl ProcessingSpeedTally {
    /// A new target appeared.
    pub fn target_shown(&mut self) {
        self.targets_seen += 1;
    }

    /// The user clicked a target.
    pub fn hit(&mut self) {
        self.correct += 1;
    }

    /// The user clicked a distractor.
    pub fn false_click(&mut self) {
        self.incorrect += 1;
    }

    /// A target expired unclicked.
    pub fn miss(&mut self) {
        self.missed += 1;
    }

    /// accuracy × 60 + completion × 40, unrounded.
    pub fn raw_score(&self) -> f64 {
        let clicks = u64::from(self.correct) + u64::from(self.incorrect);
        let accuracy = if clicks == 0 {
            0.0
        } else {
            self.correct as f64 / clicks as f64 * ACCURACY_WEIGHT
        };
        let completion = if self.targets_seen == 0 {
            0.0
        } else {
            self.correct as f64 / self.targets_seen as f64 * COMPLETION_WEIGHT
        };
        accuracy + completion
    }
}

/// Score a finished processing-speed round.
pub fn score_processing_speed(
    tally: &ProcessingSpeedTally,
    at: DateTime<Utc>,
) -> Result<TestScore, ScoreError> {
    let accounted = u64::from(tally.correct) + u64::from(tally.missed);
    if accounted > u64::from(tally.targets_seen) {
        return Err(ScoreError::TallyExceedsTargets {
            hits: tally.correct,
            misses: tally.missed,
            seen: tally.targets_seen,
        });
    }

    let value = tally.raw_score().round().clamp(0.0, 100.0) as u32;
    tracing::debug!(?tally, value, "scored processing speed");
    TestScore::new(TestId::ProcessingSpeed, value, at)
}

// ---------------------------------------------------------------------------
// Rapid automatized naming
// ---------------------------------------------------------------------------

/// What the RAN grid shows. Some categories are intrinsically slower to name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RanCategory {
    Letters,
    Numbers,
    Colors,
    Objects,
}

impl RanCategory {
    /// Multiplier applied to the time-based score.
    pub fn difficulty_factor(&self) -> f64 {
        match self {
            RanCategory::Letters => 1.0,
            RanCategory::Numbers => 0.95,
            RanCategory::Colors => 1.05,
            RanCategory::Objects => 1.10,
        }
    }
}

impl fmt::Display for RanCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RanCategory::Letters => write!(f, "letters"),
            RanCategory::Numbers => write!(f, "numbers"),
            RanCategory::Colors => write!(f, "colors"),
            RanCategory::Objects => write!(f, "objects"),
        }
    }
}

impl FromStr for RanCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "letters" | "letter" => Ok(RanCategory::Letters),
            "numbers" | "number" | "digits" => Ok(RanCategory::Numbers),
            "colors" | "colours" | "color" => Ok(RanCategory::Colors),
            "objects" | "object" => Ok(RanCategory::Objects),
            other => Err(format!("unknown RAN category: {other}")),
        }
    }
}

/// Linear interpolation from `from` at `start` seconds to `to` at `end` seconds.
fn lerp(elapsed: f64, start: f64, end: f64, from: f64, to: f64) -> f64 {
    from + (elapsed - start) / (end - start) * (to - from)
}

/// Time-based RAN score before the category factor.
///
/// | elapsed    | score            |
/// |------------|------------------|
/// | ≤ 18s      | 100              |
/// | 18s – 25s  | 95 → 85          |
/// | 25s – 35s  | 85 → 70          |
/// | 35s – 45s  | 70 → 50          |
/// | > 45s      | 50 − (t−45)/5, floor 30 |
pub fn ran_base_score(elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 18.0 {
        100.0
    } else if elapsed_secs <= 25.0 {
        lerp(elapsed_secs, 18.0, 25.0, 95.0, 85.0)
    } else if elapsed_secs <= 35.0 {
        lerp(elapsed_secs, 25.0, 35.0, 85.0, 70.0)
    } else if elapsed_secs <= 45.0 {
        lerp(elapsed_secs, 35.0, 45.0, 70.0, 50.0)
    } else {
        (50.0 - (elapsed_secs - 45.0) / 5.0).max(30.0)
    }
}

/// Score a RAN run from the stopwatch reading.
pub fn score_ran(
    elapsed: Duration,
    category: RanCategory,
    at: DateTime<Utc>,
) -> Result<TestScore, ScoreError> {
    score_ran_secs(elapsed.as_secs_f64(), category, at)
}

/// Score a RAN run from elapsed seconds.
pub fn score_ran_secs(
    elapsed_secs: f64,
    category: RanCategory,
    at: DateTime<Utc>,
) -> Result<TestScore, ScoreError> {
    if !elapsed_secs.is_finite() || elapsed_secs < 0.0 {
        return Err(ScoreError::InvalidElapsed(elapsed_secs));
    }

    let base = ran_base_score(elapsed_secs);
    let value = (base * category.difficulty_factor())
        .clamp(0.0, 100.0)
        .round() as u32;
    tracing::debug!(elapsed_secs, %category, base, value, "scored RAN");
    TestScore::new(TestId::Ran, value, at)
}

// ---------------------------------------------------------------------------
// Working memory
// ---------------------------------------------------------------------------

/// Sequence length of the first trial.
pub const WORKING_MEMORY_START_LEVEL: u8 = 3;
/// Shortest sequence the staircase steps down to.
pub const WORKING_MEMORY_MIN_LEVEL: u8 = 3;
/// Longest sequence the staircase steps up to.
pub const WORKING_MEMORY_MAX_LEVEL: u8 = 9;
/// Trials per session.
pub const WORKING_MEMORY_TRIALS: usize = 10;

/// Adaptive one-up/one-down staircase over recall sequence length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingMemoryStaircase {
    level: u8,
    outcomes: Vec<bool>,
}

impl Default for WorkingMemoryStaircase {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkingMemoryStaircase {
    pub fn new() -> Self {
        Self {
            level: WORKING_MEMORY_START_LEVEL,
            outcomes: Vec::with_capacity(WORKING_MEMORY_TRIALS),
        }
    }

    /// Length of the sequence to present next.
    pub fn current_length(&self) -> u8 {
        self.level
    }

    /// Trials recorded so far.
    pub fn trials_completed(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_complete(&self) -> bool {
        self.outcomes.len() >= WORKING_MEMORY_TRIALS
    }

    /// Record one recall and step the level. Returns the next sequence length.
    ///
    /// Trials past the session length are ignored.
    pub fn record(&mut self, correct: bool) -> u8 {
        if self.is_complete() {
            return self.level;
        }
        self.outcomes.push(correct);
        self.level = if correct {
            (self.level + 1).min(WORKING_MEMORY_MAX_LEVEL)
        } else {
            self.level
                .saturating_sub(1)
                .max(WORKING_MEMORY_MIN_LEVEL)
        };
        self.level
    }

    /// Unrounded level + accuracy score for the trials recorded so far.
    pub fn raw_score(&self) -> f64 {
        let span = (WORKING_MEMORY_MAX_LEVEL - WORKING_MEMORY_MIN_LEVEL + 1) as f64;
        let level_score = ((self.level as f64 - 2.0) / span * 70.0).max(0.0);
        let accuracy_score = if self.outcomes.is_empty() {
            0.0
        } else {
            let correct = self.outcomes.iter().filter(|o| **o).count();
            correct as f64 / self.outcomes.len() as f64 * 30.0
        };
        level_score + accuracy_score
    }

    /// Final score once every trial is recorded.
    pub fn finish(&self, at: DateTime<Utc>) -> Result<TestScore, ScoreError> {
        if !self.is_complete() {
            return Err(ScoreError::ResponseCount {
                test: TestId::WorkingMemory,
                expected: WORKING_MEMORY_TRIALS,
                actual: self.outcomes.len(),
            });
        }
        let value = self.raw_score().round().clamp(0.0, 100.0) as u32;
        tracing::debug!(final_level = self.level, value, "scored working memory");
        TestScore::new(TestId::WorkingMemory, value, at)
    }
}

/// Replay a full session of recall outcomes through the staircase.
pub fn score_working_memory(
    outcomes: &[bool],
    at: DateTime<Utc>,
) -> Result<TestScore, ScoreError> {
    if outcomes.len() != WORKING_MEMORY_TRIALS {
        return Err(ScoreError::ResponseCount {
            test: TestId::WorkingMemory,
            expected: WORKING_MEMORY_TRIALS,
            actual: outcomes.len(),
        });
    }

    let mut staircase = WorkingMemoryStaircase::new();
    for &correct in outcomes {
        staircase.record(correct);
    }
    staircase.finish(at)
}
