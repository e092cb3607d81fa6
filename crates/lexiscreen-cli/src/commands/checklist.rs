//! The `lexiscreen checklist` command.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;

use lexiscreen_core::checklist::{category_title, parse_submission, score_checklist, template_toml};
use lexiscreen_core::model::AgeGroup;

use super::Paths;

pub fn execute(paths: &Paths, answers: Option<PathBuf>, template: Option<AgeGroup>) -> Result<()> {
    if let Some(age_group) = template {
        print!("{}", template_toml(age_group));
        return Ok(());
    }

    let Some(answers) = answers else {
        anyhow::bail!("pass --answers FILE to score a checklist, or --template AGE_GROUP");
    };

    let submission = parse_submission(&answers)?;
    let result = score_checklist(&submission, Utc::now())?;

    let (_, mut store) = paths.open()?;
    store.save_checklist(&result)?;

    println!(
        "Checklist ({}): {}%",
        result.age_group, result.overall_score
    );
    for (category, score) in &result.category_scores {
        let title = category_title(result.age_group, category).unwrap_or(category.as_str());
        println!("  {title}: {score}%");
    }

    Ok(())
}
