//! Score aggregation and risk classification.
//!
//! Everything here is a pure function of a [`ResultSnapshot`] and an
//! [`AggregationPolicy`]. The engine keeps no state; presenters call
//! [`aggregate`] each time they render.
//!
//! Two independent threshold tables read the same average:
//! - [`RiskBands`] classify the *unrounded* mean into Low/Mild/Moderate/High.
//! - [`RecommendationTiers`] pick the tier of advice from the *rounded* mean.
//!
//! Their cut points differ (80/60/40 vs 75/60) and are configured separately.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::TestId;
use crate::store::ResultSnapshot;

// ---------------------------------------------------------------------------
// Score sources
// ---------------------------------------------------------------------------

/// Where an averaged score came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "test")]
pub enum ScoreSource {
    Test(TestId),
    Handwriting,
    Checklist,
}

impl ScoreSource {
    /// Chart and summary order.
    pub const CANONICAL_ORDER: [ScoreSource; 8] = [
        ScoreSource::Test(TestId::Phonological),
        ScoreSource::Test(TestId::WorkingMemory),
        ScoreSource::Test(TestId::ProcessingSpeed),
        ScoreSource::Test(TestId::Ran),
        ScoreSource::Handwriting,
        ScoreSource::Test(TestId::AudioDiscrimination),
        ScoreSource::Test(TestId::DirectionSense),
        ScoreSource::Checklist,
    ];

    /// Short display label used on charts.
    pub fn label(&self) -> &'static str {
        match self {
            ScoreSource::Test(TestId::Phonological) => "Phonological",
            ScoreSource::Test(TestId::WorkingMemory) => "Working Memory",
            ScoreSource::Test(TestId::ProcessingSpeed) => "Processing",
            ScoreSource::Test(TestId::Ran) => "RAN",
            ScoreSource::Test(TestId::AudioDiscrimination) => "Audio",
            ScoreSource::Test(TestId::DirectionSense) => "Direction",
            ScoreSource::Handwriting => "Handwriting",
            ScoreSource::Checklist => "Checklist",
        }
    }
}

impl fmt::Display for ScoreSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One score entering the average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub source: ScoreSource,
    pub value: u8,
}

/// Every present score in canonical order.
pub fn collect_scores(snapshot: &ResultSnapshot) -> Vec<ScoreEntry> {
    ScoreSource::CANONICAL_ORDER
        .iter()
        .filter_map(|&source| {
            let value = match source {
                ScoreSource::Test(id) => snapshot.test_results.get(&id).copied(),
                ScoreSource::Handwriting => snapshot.handwriting.as_ref().map(|h| h.overall_score),
                ScoreSource::Checklist => snapshot.checklist.as_ref().map(|c| c.overall_score),
            };
            value.map(|value| ScoreEntry { source, value })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// How much each source counts toward the mean.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightingPolicy {
    /// Every present score counts once.
    #[default]
    Uniform,
}

impl WeightingPolicy {
    pub fn weight(&self, _source: ScoreSource) -> f64 {
        match self {
            WeightingPolicy::Uniform => 1.0,
        }
    }
}

/// Lower bounds (inclusive) of the risk levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskBands {
    pub low: f64,
    pub mild: f64,
    pub moderate: f64,
}

impl Default for RiskBands {
    fn default() -> Self {
        Self {
            low: 80.0,
            mild: 60.0,
            moderate: 40.0,
        }
    }
}

/// Upper bounds (exclusive) of the recommendation tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommendationTiers {
    pub high_concern_below: u8,
    pub moderate_concern_below: u8,
}

impl Default for RecommendationTiers {
    fn default() -> Self {
        Self {
            high_concern_below: 60,
            moderate_concern_below: 75,
        }
    }
}

/// Reference line drawn on every chart bar.
pub const DEFAULT_CHART_THRESHOLD: u8 = 70;

fn default_chart_threshold() -> u8 {
    DEFAULT_CHART_THRESHOLD
}

/// All tunables of the aggregation engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregationPolicy {
    #[serde(default)]
    pub weighting: WeightingPolicy,
    #[serde(default)]
    pub risk_bands: RiskBands,
    #[serde(default)]
    pub recommendation_tiers: RecommendationTiers,
    #[serde(default = "default_chart_threshold")]
    pub chart_threshold: u8,
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self {
            weighting: WeightingPolicy::default(),
            risk_bands: RiskBands::default(),
            recommendation_tiers: RecommendationTiers::default(),
            chart_threshold: DEFAULT_CHART_THRESHOLD,
        }
    }
}

// ---------------------------------------------------------------------------
// Averages and risk
// ---------------------------------------------------------------------------

/// Weighted mean of the entries, or `None` if there are none.
pub fn mean_score(entries: &[ScoreEntry], weighting: WeightingPolicy) -> Option<f64> {
    let (sum, weight) = entries.iter().fold((0.0, 0.0), |(sum, weight), e| {
        let w = weighting.weight(e.source);
        (sum + e.value as f64 * w, weight + w)
    });
    if weight > 0.0 {
        Some(sum / weight)
    } else {
        None
    }
}

/// Rounded mean; 0 when nothing has been recorded.
pub fn average_score_or_zero(entries: &[ScoreEntry], weighting: WeightingPolicy) -> u8 {
    mean_score(entries, weighting)
        .map(|m| m.round().clamp(0.0, 100.0) as u8)
        .unwrap_or(0)
}

/// Categorical screening outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Mild,
    Moderate,
    High,
    Unknown,
}

impl RiskLevel {
    /// Classify a mean score against the bands.
    pub fn from_mean(mean: f64, bands: &RiskBands) -> Self {
        if mean >= bands.low {
            RiskLevel::Low
        } else if mean >= bands.mild {
            RiskLevel::Mild
        } else if mean >= bands.moderate {
            RiskLevel::Moderate
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Mild => "Mild",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
            RiskLevel::Unknown => "Unknown",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RiskLevel::Low => {
                "Results are within the typical range. There are no strong indicators of dyslexia at this time."
            }
            RiskLevel::Mild => {
                "Some results fall slightly below the typical range. Monitoring and light support are advised."
            }
            RiskLevel::Moderate => {
                "Several results fall below the typical range. A structured intervention and further evaluation are advised."
            }
            RiskLevel::High => {
                "Many results fall well below the typical range. A comprehensive evaluation by a specialist is strongly recommended."
            }
            RiskLevel::Unknown => {
                "Not enough information yet. Complete at least one assessment to see a risk summary."
            }
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk level from the unrounded mean; `Unknown` when nothing has been recorded.
pub fn risk_level_or_unknown(entries: &[ScoreEntry], policy: &AggregationPolicy) -> RiskLevel {
    mean_score(entries, policy.weighting)
        .map(|mean| RiskLevel::from_mean(mean, &policy.risk_bands))
        .unwrap_or(RiskLevel::Unknown)
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

/// Which set of tier-specific advice leads the recommendation list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendationTier {
    HighConcern,
    ModerateConcern,
    LowConcern,
}

impl RecommendationTier {
    pub fn for_average(average: u8, tiers: &RecommendationTiers) -> Self {
        if average < tiers.high_concern_below {
            RecommendationTier::HighConcern
        } else if average < tiers.moderate_concern_below {
            RecommendationTier::ModerateConcern
        } else {
            RecommendationTier::LowConcern
        }
    }

    pub fn recommendations(&self) -> &'static [&'static str; 3] {
        match self {
            RecommendationTier::HighConcern => &HIGH_CONCERN,
            RecommendationTier::ModerateConcern => &MODERATE_CONCERN,
            RecommendationTier::LowConcern => &LOW_CONCERN,
        }
    }
}

const HIGH_CONCERN: [&str; 3] = [
    "Schedule a comprehensive evaluation with an educational psychologist or dyslexia specialist",
    "Begin a structured, multisensory literacy program (e.g. an Orton-Gillingham based approach)",
    "Discuss classroom accommodations such as extra time and audiobooks with the school",
];

const MODERATE_CONCERN: [&str; 3] = [
    "Consider a follow-up assessment with a reading specialist",
    "Practice phonological awareness activities such as rhyming and sound blending several times a week",
    "Monitor progress and repeat the screening in three to six months",
];

const LOW_CONCERN: [&str; 3] = [
    "Continue regular reading practice to maintain current skills",
    "Encourage reading for enjoyment across a variety of books",
    "Repeat the screening if new difficulties appear",
];

/// Always included, after the tier-specific advice.
pub const BASE_RECOMMENDATIONS: [&str; 3] = [
    "Share these results with teachers and caregivers",
    "Remember that this screening is not a diagnosis",
    "Keep a record of observed difficulties to support any further evaluation",
];

/// Tier advice followed by the base recommendations.
///
/// The tier comes from [`average_score_or_zero`], so an empty pool gets
/// high-concern advice.
pub fn recommendations(entries: &[ScoreEntry], policy: &AggregationPolicy) -> Vec<String> {
    let average = average_score_or_zero(entries, policy.weighting);
    let tier = RecommendationTier::for_average(average, &policy.recommendation_tiers);
    let mut out = Vec::with_capacity(6);
    out.extend(tier.recommendations().iter().map(|s| s.to_string()));
    out.extend(BASE_RECOMMENDATIONS.iter().map(|s| s.to_string()));
    out
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

/// One bar of the comparison chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub name: String,
    pub score: u8,
    pub threshold: u8,
}

/// Chart bars in canonical order, omitting absent sources.
pub fn chart_series(entries: &[ScoreEntry], threshold: u8) -> Vec<ChartPoint> {
    entries
        .iter()
        .map(|e| ChartPoint {
            name: e.source.label().to_string(),
            score: e.value,
            threshold,
        })
        .collect()
}

/// The derived summary handed to presenters. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub average_score: u8,
    pub risk_level: RiskLevel,
    pub risk_description: String,
    /// Tier used for the leading recommendations.
    pub recommendation_tier: RecommendationTier,
    pub recommendations: Vec<String>,
    pub chart_series: Vec<ChartPoint>,
    pub entries: Vec<ScoreEntry>,
}

/// Compute the full summary from a snapshot.
pub fn aggregate(snapshot: &ResultSnapshot, policy: &AggregationPolicy) -> AggregateResult {
    let entries = collect_scores(snapshot);
    let average_score = average_score_or_zero(&entries, policy.weighting);
    let risk_level = risk_level_or_unknown(&entries, policy);
    let recommendation_tier =
        RecommendationTier::for_average(average_score, &policy.recommendation_tiers);

    tracing::debug!(
        sources = entries.len(),
        average_score,
        risk = %risk_level,
        "aggregated results"
    );

    AggregateResult {
        average_score,
        risk_level,
        risk_description: risk_level.description().to_string(),
        recommendation_tier,
        recommendations: recommendations(&entries, policy),
        chart_series: chart_series(&entries, policy.chart_threshold),
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AgeGroup, ChecklistResult, HandwritingResult, SubScore};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn entries(values: &[u8]) -> Vec<ScoreEntry> {
        values
            .iter()
            .zip(TestId::ALL)
            .map(|(&value, id)| ScoreEntry {
                source: ScoreSource::Test(id),
                value,
            })
            .collect()
    }

    fn snapshot_with(tests: &[(TestId, u8)]) -> ResultSnapshot {
        ResultSnapshot {
            test_results: tests.iter().copied().collect(),
            ..Default::default()
        }
    }

    fn handwriting(overall: u8) -> HandwritingResult {
        let sub = |score| SubScore {
            score,
            description: String::new(),
        };
        HandwritingResult {
            date: Utc::now(),
            letter_formation: sub(3),
            letter_spacing: sub(3),
            line_alignment: sub(3),
            letter_reversals: sub(3),
            overall_score: overall,
        }
    }

    fn checklist(overall: u8) -> ChecklistResult {
        ChecklistResult {
            date: Utc::now(),
            age_group: AgeGroup::Adult,
            overall_score: overall,
            category_scores: BTreeMap::new(),
        }
    }

    #[test]
    fn thresholds_diverge_at_sixty() {
        let policy = AggregationPolicy::default();
        let scores = entries(&[80, 60, 40]);
        assert_eq!(average_score_or_zero(&scores, policy.weighting), 60);
        assert_eq!(risk_level_or_unknown(&scores, &policy), RiskLevel::Mild);

        let recs = recommendations(&scores, &policy);
        assert_eq!(recs.len(), 6);
        assert_eq!(recs[0], MODERATE_CONCERN[0]);
        assert_eq!(&recs[3..], &BASE_RECOMMENDATIONS.map(String::from)[..]);
    }

    #[test]
    fn empty_conventions() {
        let policy = AggregationPolicy::default();
        assert_eq!(average_score_or_zero(&[], policy.weighting), 0);
        assert_eq!(risk_level_or_unknown(&[], &policy), RiskLevel::Unknown);

        // An empty pool averages 0, which selects the high-concern tier.
        let recs = recommendations(&[], &policy);
        assert_eq!(recs.len(), 6);
        assert_eq!(recs[0], HIGH_CONCERN[0]);
        assert_eq!(&recs[3..], &BASE_RECOMMENDATIONS.map(String::from)[..]);

        let result = aggregate(&ResultSnapshot::default(), &policy);
        assert_eq!(result.average_score, 0);
        assert_eq!(result.risk_level, RiskLevel::Unknown);
        assert_eq!(result.recommendation_tier, RecommendationTier::HighConcern);
        assert_eq!(result.recommendations.len(), 6);
        assert!(result.chart_series.is_empty());
    }

    #[test]
    fn risk_uses_unrounded_mean() {
        let policy = AggregationPolicy::default();
        // mean 79.5 rounds to 80 but stays Mild
        let scores = entries(&[80, 79]);
        assert_eq!(average_score_or_zero(&scores, policy.weighting), 80);
        assert_eq!(risk_level_or_unknown(&scores, &policy), RiskLevel::Mild);
    }

    #[test]
    fn risk_band_boundaries() {
        let bands = RiskBands::default();
        assert_eq!(RiskLevel::from_mean(100.0, &bands), RiskLevel::Low);
        assert_eq!(RiskLevel::from_mean(80.0, &bands), RiskLevel::Low);
        assert_eq!(RiskLevel::from_mean(79.9, &bands), RiskLevel::Mild);
        assert_eq!(RiskLevel::from_mean(40.0, &bands), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_mean(39.9, &bands), RiskLevel::High);
    }

    #[test]
    fn tier_boundaries() {
        let tiers = RecommendationTiers::default();
        assert_eq!(
            RecommendationTier::for_average(59, &tiers),
            RecommendationTier::HighConcern
        );
        assert_eq!(
            RecommendationTier::for_average(74, &tiers),
            RecommendationTier::ModerateConcern
        );
        assert_eq!(
            RecommendationTier::for_average(75, &tiers),
            RecommendationTier::LowConcern
        );
    }

    #[test]
    fn handwriting_and_checklist_join_the_pool() {
        let mut snapshot = snapshot_with(&[(TestId::Phonological, 90)]);
        snapshot.handwriting = Some(handwriting(30));
        snapshot.checklist = Some(checklist(60));

        let result = aggregate(&snapshot, &AggregationPolicy::default());
        assert_eq!(result.entries.len(), 3);
        assert_eq!(result.average_score, 60);
        assert_eq!(result.risk_level, RiskLevel::Mild);
    }

    #[test]
    fn chart_follows_canonical_order() {
        let mut snapshot = snapshot_with(&[
            (TestId::DirectionSense, 71),
            (TestId::Phonological, 50),
            (TestId::Ran, 88),
        ]);
        snapshot.checklist = Some(checklist(40));
        snapshot.handwriting = Some(handwriting(69));

        let result = aggregate(&snapshot, &AggregationPolicy::default());
        let names: Vec<&str> = result.chart_series.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Phonological", "RAN", "Handwriting", "Direction", "Checklist"]
        );
        assert!(result.chart_series.iter().all(|p| p.threshold == 70));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let snapshot = snapshot_with(&[(TestId::Ran, 45), (TestId::WorkingMemory, 52)]);
        let policy = AggregationPolicy::default();
        assert_eq!(aggregate(&snapshot, &policy), aggregate(&snapshot, &policy));
    }

    #[test]
    fn high_risk_gets_high_concern_advice() {
        let result = aggregate(
            &snapshot_with(&[(TestId::Ran, 20), (TestId::Phonological, 30)]),
            &AggregationPolicy::default(),
        );
        assert_eq!(result.risk_level, RiskLevel::High);
        assert_eq!(
            result.recommendation_tier,
            RecommendationTier::HighConcern
        );
        assert_eq!(result.recommendations[0], HIGH_CONCERN[0]);
    }

    #[test]
    fn policy_from_partial_toml() {
        let policy: AggregationPolicy = toml::from_str(
            r#"
chart_threshold = 65

[risk_bands]
low = 85.0
mild = 65.0
moderate = 45.0
"#,
        )
        .unwrap();
        assert_eq!(policy.chart_threshold, 65);
        assert_eq!(policy.risk_bands.low, 85.0);
        assert_eq!(policy.recommendation_tiers, RecommendationTiers::default());
        assert_eq!(policy.weighting, WeightingPolicy::Uniform);
    }
}
