//! Assessment report type with JSON persistence and a markdown rendering.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::{aggregate, AggregateResult, AggregationPolicy};
use crate::checklist::category_title;
use crate::model::{ChecklistResult, HandwritingResult, TestId, UserProfile};
use crate::store::ResultSnapshot;

/// A printable snapshot of everything recorded plus the derived summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was generated.
    pub created_at: DateTime<Utc>,
    pub profile: Option<UserProfile>,
    pub aggregate: AggregateResult,
    /// Completed tests in administration order.
    pub tests: Vec<TestLine>,
    pub checklist: Option<ChecklistResult>,
    pub handwriting: Option<HandwritingResult>,
}

/// One completed test as listed in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestLine {
    pub test: TestId,
    pub score: u8,
    pub completed_at: Option<DateTime<Utc>>,
}

impl AssessmentReport {
    /// Build a report from the current store contents.
    pub fn build(snapshot: &ResultSnapshot, policy: &AggregationPolicy, now: DateTime<Utc>) -> Self {
        let tests = TestId::ALL
            .into_iter()
            .filter_map(|test| {
                snapshot.test_results.get(&test).map(|&score| TestLine {
                    test,
                    score,
                    completed_at: snapshot.test_dates.get(&test).copied(),
                })
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            created_at: now,
            profile: snapshot.profile.clone(),
            aggregate: aggregate(snapshot, policy),
            tests,
            checklist: snapshot.checklist.clone(),
            handwriting: snapshot.handwriting.clone(),
        }
    }

    /// Display name of the person screened, if a profile exists.
    pub fn subject_name(&self) -> Option<&str> {
        self.profile
            .as_ref()
            .map(|p| p.name.as_str())
            .filter(|n| !n.trim().is_empty())
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: AssessmentReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        let agg = &self.aggregate;

        md.push_str("# Screening Summary\n\n");
        if let Some(name) = self.subject_name() {
            md.push_str(&format!("**Name:** {name}\n\n"));
        }
        md.push_str(&format!(
            "**Average score:** {}% | **Risk level:** {}\n\n{}\n\n",
            agg.average_score, agg.risk_level, agg.risk_description
        ));

        if !agg.chart_series.is_empty() {
            md.push_str("## Scores\n\n");
            md.push_str("| Assessment | Score | Threshold | |\n");
            md.push_str("|------------|-------|-----------|---|\n");
            for point in &agg.chart_series {
                let flag = if point.score < point.threshold {
                    "below"
                } else {
                    ""
                };
                md.push_str(&format!(
                    "| {} | {}% | {}% | {} |\n",
                    point.name, point.score, point.threshold, flag
                ));
            }
            md.push('\n');
        }

        if let Some(checklist) = &self.checklist {
            md.push_str(&format!(
                "## Checklist ({})\n\n",
                checklist.age_group
            ));
            for (category, score) in &checklist.category_scores {
                let title = category_title(checklist.age_group, category).unwrap_or(category.as_str());
                md.push_str(&format!("- {title}: {score}%\n"));
            }
            md.push('\n');
        }

        if let Some(hw) = &self.handwriting {
            md.push_str(&format!("## Handwriting ({}%)\n\n", hw.overall_score));
            for (label, sub) in [
                ("Letter formation", &hw.letter_formation),
                ("Letter spacing", &hw.letter_spacing),
                ("Line alignment", &hw.line_alignment),
                ("Letter reversals", &hw.letter_reversals),
            ] {
                md.push_str(&format!("- {label} ({}/5): {}\n", sub.score, sub.description));
            }
            md.push('\n');
        }

        md.push_str("## Recommendations\n\n");
        for (i, rec) in agg.recommendations.iter().enumerate() {
            md.push_str(&format!("{}. {rec}\n", i + 1));
        }

        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::RiskLevel;
    use crate::handwriting::{score_handwriting, HandwritingFeatures};
    use crate::model::AgeGroup;
    use std::collections::BTreeMap;

    fn sample_snapshot() -> ResultSnapshot {
        let now = Utc::now();
        ResultSnapshot {
            test_results: BTreeMap::from([(TestId::Ran, 54), (TestId::Phonological, 67)]),
            test_dates: BTreeMap::from([(TestId::Ran, now)]),
            checklist: Some(ChecklistResult {
                date: now,
                age_group: AgeGroup::SchoolAge,
                overall_score: 40,
                category_scores: BTreeMap::from([("reading".to_string(), 40)]),
            }),
            handwriting: Some(
                score_handwriting(&HandwritingFeatures::new(3, 3, 3, 3).unwrap(), now).unwrap(),
            ),
            profile: Some(UserProfile {
                name: "Jordan".into(),
                age: Some(9),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn build_lists_tests_in_order() {
        let report =
            AssessmentReport::build(&sample_snapshot(), &AggregationPolicy::default(), Utc::now());
        let tests: Vec<TestId> = report.tests.iter().map(|t| t.test).collect();
        assert_eq!(tests, vec![TestId::Phonological, TestId::Ran]);
        assert!(report.tests[0].completed_at.is_none());
        assert!(report.tests[1].completed_at.is_some());
        // (67 + 54 + 69 + 40) / 4 = 57.5
        assert_eq!(report.aggregate.average_score, 58);
        assert_eq!(report.aggregate.risk_level, RiskLevel::Moderate);
    }

    #[test]
    fn json_roundtrip() {
        let report =
            AssessmentReport::build(&sample_snapshot(), &AggregationPolicy::default(), Utc::now());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = AssessmentReport::load_json(&path).unwrap();

        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.aggregate, report.aggregate);
        assert_eq!(loaded.subject_name(), Some("Jordan"));
    }

    #[test]
    fn markdown_output() {
        let report =
            AssessmentReport::build(&sample_snapshot(), &AggregationPolicy::default(), Utc::now());
        let md = report.to_markdown();
        assert!(md.contains("**Name:** Jordan"));
        assert!(md.contains("**Risk level:** Moderate"));
        assert!(md.contains("| RAN | 54% | 70% | below |"));
        assert!(md.contains("- Reading: 40%"));
        assert!(md.contains("Letter reversals (3/5)"));
        assert!(md.contains("6. "));
    }

    #[test]
    fn markdown_for_empty_store() {
        let report = AssessmentReport::build(
            &ResultSnapshot::default(),
            &AggregationPolicy::default(),
            Utc::now(),
        );
        let md = report.to_markdown();
        assert!(md.contains("**Risk level:** Unknown"));
        assert!(!md.contains("## Scores"));
        assert!(report.subject_name().is_none());
    }
}
