//! Handwriting scoring and the classifier boundary.
//!
//! A classifier turns an uploaded image into four 1–5 sub-scores. How it
//! does so is not this crate's concern; the [`HandwritingClassifier`] trait
//! is the seam. This module owns the fixed description tables and the
//! weighted overall score.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;
use crate::model::{percent, HandwritingResult, SubScore};
use crate::store::{KeyValueStore, ResultStore};

/// Lowest valid sub-score.
pub const MIN_SUBSCORE: u8 = 1;
/// Highest valid sub-score.
pub const MAX_SUBSCORE: u8 = 5;

/// The four handwriting dimensions a classifier rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    LetterFormation,
    LetterSpacing,
    LineAlignment,
    LetterReversals,
}

impl Feature {
    pub fn name(&self) -> &'static str {
        match self {
            Feature::LetterFormation => "letter_formation",
            Feature::LetterSpacing => "letter_spacing",
            Feature::LineAlignment => "line_alignment",
            Feature::LetterReversals => "letter_reversals",
        }
    }

    /// Lower-case label used in the "Unable to assess" fallback.
    fn label(&self) -> &'static str {
        match self {
            Feature::LetterFormation => "letter formation",
            Feature::LetterSpacing => "letter spacing",
            Feature::LineAlignment => "line alignment",
            Feature::LetterReversals => "letter reversals",
        }
    }

    fn table(&self) -> &'static [&'static str; 5] {
        match self {
            Feature::LetterFormation => &LETTER_FORMATION,
            Feature::LetterSpacing => &LETTER_SPACING,
            Feature::LineAlignment => &LINE_ALIGNMENT,
            Feature::LetterReversals => &LETTER_REVERSALS,
        }
    }
}

const LETTER_FORMATION: [&str; 5] = [
    "Letters are frequently malformed and difficult to recognize",
    "Many letters are inconsistently formed",
    "Letter formation is generally acceptable with some inconsistencies",
    "Letters are well formed with minor irregularities",
    "Letters are consistently well formed",
];

const LETTER_SPACING: [&str; 5] = [
    "Spacing between letters and words is highly irregular",
    "Spacing is often too tight or too wide",
    "Spacing is somewhat uneven",
    "Spacing is mostly even",
    "Spacing between letters and words is consistent",
];

const LINE_ALIGNMENT: [&str; 5] = [
    "Writing drifts far above and below the line",
    "Writing frequently wanders off the baseline",
    "Writing occasionally departs from the baseline",
    "Writing mostly follows the baseline",
    "Writing follows the baseline consistently",
];

// Higher is worse for reversals.
const LETTER_REVERSALS: [&str; 5] = [
    "No letter reversals observed",
    "Rare letter reversals observed",
    "Occasional letter reversals (e.g. b/d, p/q)",
    "Frequent letter reversals",
    "Very frequent letter reversals across the sample",
];

/// Fixed description for a sub-score value.
///
/// Values outside 1–5 map to "Unable to assess …".
pub fn describe(feature: Feature, score: u8) -> String {
    match score {
        MIN_SUBSCORE..=MAX_SUBSCORE => feature.table()[(score - 1) as usize].to_string(),
        _ => format!("Unable to assess {}", feature.label()),
    }
}

/// The four sub-scores produced by a classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandwritingFeatures {
    pub letter_formation: u8,
    pub letter_spacing: u8,
    pub line_alignment: u8,
    pub letter_reversals: u8,
}

impl HandwritingFeatures {
    /// Build features, rejecting any sub-score outside 1–5.
    pub fn new(
        letter_formation: u8,
        letter_spacing: u8,
        line_alignment: u8,
        letter_reversals: u8,
    ) -> Result<Self, ClassifierError> {
        let features = Self {
            letter_formation,
            letter_spacing,
            line_alignment,
            letter_reversals,
        };
        features.validate()?;
        Ok(features)
    }

    /// Check every sub-score is in 1–5.
    pub fn validate(&self) -> Result<(), ClassifierError> {
        for (feature, value) in self.iter() {
            if !(MIN_SUBSCORE..=MAX_SUBSCORE).contains(&value) {
                return Err(ClassifierError::FeatureOutOfRange {
                    feature: feature.name(),
                    value,
                });
            }
        }
        Ok(())
    }

    fn iter(&self) -> [(Feature, u8); 4] {
        [
            (Feature::LetterFormation, self.letter_formation),
            (Feature::LetterSpacing, self.letter_spacing),
            (Feature::LineAlignment, self.line_alignment),
            (Feature::LetterReversals, self.letter_reversals),
        ]
    }

    /// round((formation + spacing + alignment + (5 − reversals)) / 16 × 100)
    pub fn overall_score(&self) -> u8 {
        let sum = self.letter_formation as i32
            + self.letter_spacing as i32
            + self.line_alignment as i32
            + (MAX_SUBSCORE as i32 - self.letter_reversals as i32);
        percent(sum as f64, 16.0)
    }
}

/// Turn classifier output into a dated result with descriptions.
pub fn score_handwriting(
    features: &HandwritingFeatures,
    at: DateTime<Utc>,
) -> Result<HandwritingResult, ClassifierError> {
    features.validate()?;
    let sub = |feature: Feature, score: u8| SubScore {
        score,
        description: describe(feature, score),
    };

    Ok(HandwritingResult {
        date: at,
        letter_formation: sub(Feature::LetterFormation, features.letter_formation),
        letter_spacing: sub(Feature::LetterSpacing, features.letter_spacing),
        line_alignment: sub(Feature::LineAlignment, features.line_alignment),
        letter_reversals: sub(Feature::LetterReversals, features.letter_reversals),
        overall_score: features.overall_score(),
    })
}

// ---------------------------------------------------------------------------
// Classifier boundary
// ---------------------------------------------------------------------------

/// An uploaded handwriting image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read an image from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read image: {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }
}

/// Trait for backends that rate a handwriting image.
#[async_trait]
pub trait HandwritingClassifier: Send + Sync {
    /// Human-readable classifier name.
    fn name(&self) -> &str;

    /// Rate an image on the four handwriting dimensions.
    async fn classify(&self, image: &ImagePayload) -> Result<HandwritingFeatures, ClassifierError>;
}

/// A classifier that returns ratings supplied up front, e.g. by an assessor
/// who reviewed the sample by hand.
pub struct RatedClassifier {
    features: HandwritingFeatures,
}

impl RatedClassifier {
    pub fn new(features: HandwritingFeatures) -> Self {
        Self { features }
    }
}

#[async_trait]
impl HandwritingClassifier for RatedClassifier {
    fn name(&self) -> &str {
        "rated"
    }

    async fn classify(&self, image: &ImagePayload) -> Result<HandwritingFeatures, ClassifierError> {
        if image.bytes.is_empty() {
            return Err(ClassifierError::EmptyImage);
        }
        Ok(self.features)
    }
}

/// Classify an image, score it and persist the result.
///
/// A classifier failure is returned as a [`ClassifierError`] inside the
/// `anyhow::Error`; nothing is written to the store in that case.
pub async fn analyze_handwriting<S: KeyValueStore>(
    classifier: &dyn HandwritingClassifier,
    image: &ImagePayload,
    store: &mut ResultStore<S>,
    at: DateTime<Utc>,
) -> Result<HandwritingResult> {
    let features = match classifier.classify(image).await {
        Ok(features) => features,
        Err(e) => {
            tracing::warn!(
                classifier = classifier.name(),
                image = %image.file_name,
                error = %e,
                "handwriting analysis failed"
            );
            return Err(e.into());
        }
    };

    let result = score_handwriting(&features, at)?;
    store.save_handwriting(&result)?;
    tracing::info!(
        classifier = classifier.name(),
        overall_score = result.overall_score,
        "handwriting result saved"
    );
    Ok(result)
}
