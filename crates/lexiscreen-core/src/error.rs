//! Domain error types.
//!
//! Scorers and the checklist gate return these typed errors so callers can
//! tell a rejected attempt apart from an I/O failure. The handwriting
//! analysis path wraps [`ClassifierError`] in `anyhow::Error`; callers recover
//! it with `downcast_ref`.

use thiserror::Error;

use crate::model::TestId;

/// Errors produced while turning raw responses into a score.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    /// The attempt did not answer every question in the bank.
    #[error("{test} expects {expected} responses, got {actual}")]
    ResponseCount {
        test: TestId,
        expected: usize,
        actual: usize,
    },

    /// The test is not scored from a fixed question bank.
    #[error("{0} is not a quiz-style test")]
    NotQuizStyle(TestId),

    /// A score was outside 0–100.
    #[error("score {0} is outside 0-100")]
    OutOfRange(u32),

    /// Elapsed time was negative, NaN or infinite.
    #[error("invalid elapsed time: {0}s")]
    InvalidElapsed(f64),

    /// More hits or misses were tallied than targets shown.
    #[error("tally exceeds targets seen: {hits} hits + {misses} misses > {seen} targets")]
    TallyExceedsTargets { hits: u32, misses: u32, seen: u32 },
}

/// Errors produced by the checklist completeness gate and scorer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChecklistError {
    /// Questions in the active age group were left unanswered.
    #[error("{} unanswered question(s): {}", .0.len(), .0.join(", "))]
    Unanswered(Vec<String>),

    /// An answer fell outside the 0–3 Likert range.
    #[error("answer {value} for {question} is outside 0-3")]
    InvalidAnswer { question: String, value: u8 },

    /// An answer was given for a question that is not in the age group's bank.
    #[error("unknown question id: {0}")]
    UnknownQuestion(String),
}

/// Errors that can occur when classifying a handwriting sample.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifierError {
    /// The image payload had no bytes.
    #[error("image payload is empty")]
    EmptyImage,

    /// The classifier backend could not be reached.
    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    /// The classifier returned a sub-score outside 1–5.
    #[error("{feature} sub-score {value} is outside 1-5")]
    FeatureOutOfRange { feature: &'static str, value: u8 },
}

impl ClassifierError {
    /// Returns `true` if submitting the same image again cannot succeed.
    pub fn is_permanent(&self) -> bool {
        !matches!(self, ClassifierError::Unavailable(_))
    }
}
