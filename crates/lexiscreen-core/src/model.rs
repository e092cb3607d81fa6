//! Core data model types for lexiscreen.
//!
//! These records are what the scorers produce and what the result store
//! persists. Field names serialize in camelCase to match the stored layout.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScoreError;

/// The six cognitive mini-tests in the battery.
///
/// Declaration order is the order tests are administered and the order they
/// sort in maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestId {
    Phonological,
    WorkingMemory,
    ProcessingSpeed,
    Ran,
    AudioDiscrimination,
    DirectionSense,
}

impl TestId {
    /// All tests in administration order.
    pub const ALL: [TestId; 6] = [
        TestId::Phonological,
        TestId::WorkingMemory,
        TestId::ProcessingSpeed,
        TestId::Ran,
        TestId::AudioDiscrimination,
        TestId::DirectionSense,
    ];

    /// Stable key used in the persisted `testResults`/`testDates` maps.
    pub fn key(&self) -> &'static str {
        match self {
            TestId::Phonological => "phonological",
            TestId::WorkingMemory => "workingMemory",
            TestId::ProcessingSpeed => "processingSpeed",
            TestId::Ran => "ran",
            TestId::AudioDiscrimination => "audioDiscrimination",
            TestId::DirectionSense => "directionSense",
        }
    }

    /// Human-readable test name.
    pub fn title(&self) -> &'static str {
        match self {
            TestId::Phonological => "Phonological Awareness",
            TestId::WorkingMemory => "Working Memory",
            TestId::ProcessingSpeed => "Processing Speed",
            TestId::Ran => "Rapid Automatized Naming",
            TestId::AudioDiscrimination => "Audio Discrimination",
            TestId::DirectionSense => "Direction Sense",
        }
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for TestId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "phonological" => Ok(TestId::Phonological),
            "workingmemory" | "memory" => Ok(TestId::WorkingMemory),
            "processingspeed" | "processing" => Ok(TestId::ProcessingSpeed),
            "ran" => Ok(TestId::Ran),
            "audiodiscrimination" | "audio" => Ok(TestId::AudioDiscrimination),
            "directionsense" | "direction" => Ok(TestId::DirectionSense),
            _ => Err(format!("unknown test: {s}")),
        }
    }
}

/// A single 0–100 result for one completed test attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestScore {
    pub test_id: TestId,
    pub value: u8,
    pub timestamp: DateTime<Utc>,
}

impl TestScore {
    /// Create a score, rejecting values above 100.
    pub fn new(test_id: TestId, value: u32, timestamp: DateTime<Utc>) -> Result<Self, ScoreError> {
        if value > 100 {
            return Err(ScoreError::OutOfRange(value));
        }
        Ok(Self {
            test_id,
            value: value as u8,
            timestamp,
        })
    }
}

/// Age groups the symptom checklist is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AgeGroup {
    Preschool,
    SchoolAge,
    Adult,
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgeGroup::Preschool => write!(f, "preschool"),
            AgeGroup::SchoolAge => write!(f, "schoolAge"),
            AgeGroup::Adult => write!(f, "adult"),
        }
    }
}

impl FromStr for AgeGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(|c: char| c == '-' || c == '_', "").as_str() {
            "preschool" => Ok(AgeGroup::Preschool),
            "schoolage" | "school" => Ok(AgeGroup::SchoolAge),
            "adult" => Ok(AgeGroup::Adult),
            other => Err(format!("unknown age group: {other}")),
        }
    }
}

/// The scored symptom checklist. Only one is kept at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistResult {
    pub date: DateTime<Utc>,
    pub age_group: AgeGroup,
    pub overall_score: u8,
    /// Category id → 0–100 score.
    pub category_scores: BTreeMap<String, u8>,
}

/// One handwriting dimension: the 1–5 rating and its fixed description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScore {
    pub score: u8,
    pub description: String,
}

/// The scored handwriting sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandwritingResult {
    pub date: DateTime<Utc>,
    pub letter_formation: SubScore,
    pub letter_spacing: SubScore,
    pub line_alignment: SubScore,
    /// Higher is worse; inverted when computing the overall score.
    pub letter_reversals: SubScore,
    pub overall_score: u8,
}

/// Who is being screened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(default)]
    pub is_logged_in: bool,
}

/// Round a ratio of `part / whole` to an integer percentage.
///
/// Returns 0 when `whole` is zero.
pub fn percent(part: f64, whole: f64) -> u8 {
    if whole <= 0.0 {
        return 0;
    }
    ((part / whole) * 100.0).round().clamp(0.0, 100.0) as u8
}
