//! Symptom checklist: question banks, the completeness gate, and scoring.
//!
//! Answers are 0–3 Likert ratings (never, sometimes, often, always). A
//! category's score is its share of the maximum possible rating sum.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ChecklistError;
use crate::model::{percent, AgeGroup, ChecklistResult};

/// Highest rating a single answer can take.
pub const MAX_ANSWER: u8 = 3;

/// Labels for each rating, indexed by value.
pub const ANSWER_LABELS: [&str; 4] = ["Never", "Sometimes", "Often", "Always"];

/// One checklist statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub id: &'static str,
    pub text: &'static str,
}

/// A group of questions scored together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub id: &'static str,
    pub title: &'static str,
    pub questions: &'static [Question],
}

const PRESCHOOL: &[Category] = &[
    Category {
        id: "speech_language",
        title: "Speech & Language",
        questions: &[
            Question { id: "ps-speech-1", text: "Mispronounces familiar words or uses \"baby talk\" longer than peers" },
            Question { id: "ps-speech-2", text: "Has trouble learning nursery rhymes or songs" },
            Question { id: "ps-speech-3", text: "Struggles to find the right word when speaking" },
            Question { id: "ps-speech-4", text: "Has difficulty following multi-step directions" },
            Question { id: "ps-speech-5", text: "Confuses words that sound alike" },
        ],
    },
    Category {
        id: "early_literacy",
        title: "Early Literacy",
        questions: &[
            Question { id: "ps-literacy-1", text: "Has trouble learning the names of letters" },
            Question { id: "ps-literacy-2", text: "Does not recognize letters in their own name" },
            Question { id: "ps-literacy-3", text: "Finds it hard to recognize words that rhyme" },
            Question { id: "ps-literacy-4", text: "Has difficulty learning colors, shapes or numbers" },
            Question { id: "ps-literacy-5", text: "Shows little interest in books or being read to" },
        ],
    },
];

const SCHOOL_AGE: &[Category] = &[
    Category {
        id: "reading",
        title: "Reading",
        questions: &[
            Question { id: "sa-reading-1", text: "Reads slowly or with great effort" },
            Question { id: "sa-reading-2", text: "Guesses at words instead of sounding them out" },
            Question { id: "sa-reading-3", text: "Loses their place or skips lines when reading" },
            Question { id: "sa-reading-4", text: "Has trouble understanding what was just read" },
            Question { id: "sa-reading-5", text: "Avoids reading aloud in class" },
        ],
    },
    Category {
        id: "writing",
        title: "Writing & Spelling",
        questions: &[
            Question { id: "sa-writing-1", text: "Spells the same word differently on one page" },
            Question { id: "sa-writing-2", text: "Reverses letters such as b/d or p/q" },
            Question { id: "sa-writing-3", text: "Handwriting is hard to read" },
            Question { id: "sa-writing-4", text: "Has trouble copying from the board" },
            Question { id: "sa-writing-5", text: "Written work is much weaker than spoken ability" },
        ],
    },
    Category {
        id: "phonological",
        title: "Phonological Processing",
        questions: &[
            Question { id: "sa-phonological-1", text: "Has difficulty breaking words into sounds" },
            Question { id: "sa-phonological-2", text: "Struggles to blend sounds into words" },
            Question { id: "sa-phonological-3", text: "Mixes up the order of sounds in long words" },
            Question { id: "sa-phonological-4", text: "Has trouble telling similar sounds apart" },
            Question { id: "sa-phonological-5", text: "Finds rhyming and word games difficult" },
        ],
    },
    Category {
        id: "attention_memory",
        title: "Attention & Memory",
        questions: &[
            Question { id: "sa-memory-1", text: "Forgets instructions soon after hearing them" },
            Question { id: "sa-memory-2", text: "Has trouble learning times tables or sequences" },
            Question { id: "sa-memory-3", text: "Confuses left and right" },
            Question { id: "sa-memory-4", text: "Has difficulty telling time on an analog clock" },
            Question { id: "sa-memory-5", text: "Tires quickly during reading or writing tasks" },
        ],
    },
];

const ADULT: &[Category] = &[
    Category {
        id: "reading",
        title: "Reading",
        questions: &[
            Question { id: "ad-reading-1", text: "Needs to re-read text several times to understand it" },
            Question { id: "ad-reading-2", text: "Reads noticeably slower than colleagues" },
            Question { id: "ad-reading-3", text: "Avoids reading aloud in meetings" },
            Question { id: "ad-reading-4", text: "Has trouble reading unfamiliar names or words" },
            Question { id: "ad-reading-5", text: "Finds dense forms or documents overwhelming" },
        ],
    },
    Category {
        id: "writing",
        title: "Writing & Spelling",
        questions: &[
            Question { id: "ad-writing-1", text: "Relies heavily on spell-check" },
            Question { id: "ad-writing-2", text: "Struggles to organize ideas in writing" },
            Question { id: "ad-writing-3", text: "Takes a long time to write emails or reports" },
            Question { id: "ad-writing-4", text: "Makes errors when copying numbers or text" },
            Question { id: "ad-writing-5", text: "Avoids writing by hand in front of others" },
        ],
    },
    Category {
        id: "organization",
        title: "Organization & Time",
        questions: &[
            Question { id: "ad-organization-1", text: "Has difficulty planning and prioritizing tasks" },
            Question { id: "ad-organization-2", text: "Often misjudges how long tasks will take" },
            Question { id: "ad-organization-3", text: "Misses appointments or deadlines" },
            Question { id: "ad-organization-4", text: "Finds it hard to follow written directions or maps" },
            Question { id: "ad-organization-5", text: "Keeps extensive notes or reminders to stay on track" },
        ],
    },
    Category {
        id: "memory",
        title: "Memory",
        questions: &[
            Question { id: "ad-memory-1", text: "Forgets phone numbers or PINs soon after hearing them" },
            Question { id: "ad-memory-2", text: "Loses track of multi-step verbal instructions" },
            Question { id: "ad-memory-3", text: "Has trouble remembering names of people just met" },
            Question { id: "ad-memory-4", text: "Mixes up dates, times or sequences" },
            Question { id: "ad-memory-5", text: "Struggles to take notes while listening" },
        ],
    },
];

/// The categories presented for an age group, in display order.
pub fn categories(age_group: AgeGroup) -> &'static [Category] {
    match age_group {
        AgeGroup::Preschool => PRESCHOOL,
        AgeGroup::SchoolAge => SCHOOL_AGE,
        AgeGroup::Adult => ADULT,
    }
}

/// Every question for an age group, in display order.
pub fn questions(age_group: AgeGroup) -> impl Iterator<Item = &'static Question> {
    categories(age_group).iter().flat_map(|c| c.questions.iter())
}

/// A completed (or partially completed) checklist as submitted by a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistSubmission {
    pub age_group: AgeGroup,
    /// Question id → rating.
    #[serde(default)]
    pub answers: BTreeMap<String, u8>,
}

/// The completeness gate.
///
/// Rejects unknown question ids and ratings above 3, then lists every
/// unanswered question. A host calls this before letting the user advance;
/// [`score_checklist`] calls it again before scoring.
pub fn validate_submission(submission: &ChecklistSubmission) -> Result<(), ChecklistError> {
    let known: HashSet<&str> = questions(submission.age_group).map(|q| q.id).collect();

    for (id, &value) in &submission.answers {
        if !known.contains(id.as_str()) {
            return Err(ChecklistError::UnknownQuestion(id.clone()));
        }
        if value > MAX_ANSWER {
            return Err(ChecklistError::InvalidAnswer {
                question: id.clone(),
                value,
            });
        }
    }

    let missing: Vec<String> = questions(submission.age_group)
        .filter(|q| !submission.answers.contains_key(q.id))
        .map(|q| q.id.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ChecklistError::Unanswered(missing));
    }

    Ok(())
}

/// Score a complete checklist.
///
/// Each category and the overall score is round(sum / (count × 3) × 100).
pub fn score_checklist(
    submission: &ChecklistSubmission,
    at: DateTime<Utc>,
) -> Result<ChecklistResult, ChecklistError> {
    validate_submission(submission)?;

    let mut category_scores = BTreeMap::new();
    let mut total_sum = 0u32;
    let mut total_count = 0u32;

    for category in categories(submission.age_group) {
        let sum: u32 = category
            .questions
            .iter()
            .map(|q| submission.answers.get(q.id).copied().unwrap_or(0) as u32)
            .sum();
        let count = category.questions.len() as u32;
        let max = (count * MAX_ANSWER as u32) as f64;

        category_scores.insert(category.id.to_string(), percent(sum as f64, max));
        total_sum += sum;
        total_count += count;
    }

    let overall_score = percent(total_sum as f64, (total_count * MAX_ANSWER as u32) as f64);
    tracing::debug!(
        age_group = %submission.age_group,
        overall_score,
        "scored checklist"
    );

    Ok(ChecklistResult {
        date: at,
        age_group: submission.age_group,
        overall_score,
        category_scores,
    })
}

/// Title of a category id within an age group, if it exists.
pub fn category_title(age_group: AgeGroup, category_id: &str) -> Option<&'static str> {
    categories(age_group)
        .iter()
        .find(|c| c.id == category_id)
        .map(|c| c.title)
}

// ---------------------------------------------------------------------------
// Submission files
// ---------------------------------------------------------------------------

/// Parse a TOML submission file.
pub fn parse_submission(path: &Path) -> Result<ChecklistSubmission> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read checklist file: {}", path.display()))?;

    parse_submission_str(&content, path)
}

/// Parse a TOML submission string (useful for testing).
pub fn parse_submission_str(content: &str, source_path: &Path) -> Result<ChecklistSubmission> {
    toml::from_str(content)
        .with_context(|| format!("failed to parse checklist TOML: {}", source_path.display()))
}

/// Render a fill-in template listing every question of an age group.
pub fn template_toml(age_group: AgeGroup) -> String {
    let mut out = String::new();
    out.push_str("# lexiscreen symptom checklist\n");
    out.push_str("# Rate each statement: 0 = Never, 1 = Sometimes, 2 = Often, 3 = Always\n\n");
    out.push_str(&format!("age_group = \"{age_group}\"\n\n[answers]\n"));

    for category in categories(age_group) {
        out.push_str(&format!("\n# {}\n", category.title));
        for q in category.questions {
            out.push_str(&format!("# {}\n\"{}\" = 0\n", q.text, q.id));
        }
    }
    out
}
