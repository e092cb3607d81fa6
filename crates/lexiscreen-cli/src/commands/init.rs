//! The `lexiscreen init` command.

use std::path::Path;

use anyhow::Result;

use lexiscreen_core::checklist::template_toml;
use lexiscreen_core::model::AgeGroup;

pub fn execute(age_group: AgeGroup) -> Result<()> {
    if Path::new("lexiscreen.toml").exists() {
        println!("lexiscreen.toml already exists, skipping.");
    } else {
        std::fs::write("lexiscreen.toml", SAMPLE_CONFIG)?;
        println!("Created lexiscreen.toml");
    }

    let template_path = format!("checklist-{age_group}.toml");
    if Path::new(&template_path).exists() {
        println!("{template_path} already exists, skipping.");
    } else {
        std::fs::write(&template_path, template_toml(age_group))?;
        println!("Created {template_path}");
    }

    println!("\nNext steps:");
    println!("  1. Record tests: lexiscreen record quiz --test phonological --answers 1,0,1,1,0,1");
    println!("  2. Fill in {template_path}, then: lexiscreen checklist --answers {template_path}");
    println!("  3. View the summary: lexiscreen results");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# lexiscreen configuration

# Where results are stored. ${VAR} references are expanded.
store_path = "./lexiscreen-data/results.json"
output_dir = "./lexiscreen-reports"

[policy]
weighting = "uniform"
chart_threshold = 70

[policy.risk_bands]
low = 80.0
mild = 60.0
moderate = 40.0

[policy.recommendation_tiers]
high_concern_below = 60
moderate_concern_below = 75
"#;
