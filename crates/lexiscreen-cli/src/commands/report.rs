//! The `lexiscreen report` command.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;

use lexiscreen_core::report::AssessmentReport;
use lexiscreen_report::html::write_html_report;

use super::Paths;

pub fn execute(paths: &Paths, format: String, output: Option<PathBuf>) -> Result<()> {
    let (config, store) = paths.open()?;
    let snapshot = store.load_all()?;
    let report = AssessmentReport::build(&snapshot, &config.policy, Utc::now());

    let output = output.unwrap_or(config.output_dir);
    std::fs::create_dir_all(&output)?;

    let timestamp = report.created_at.format("%Y%m%d-%H%M%S");
    let (html, json) = match format.as_str() {
        "html" => (true, false),
        "json" => (false, true),
        "all" => (true, true),
        other => anyhow::bail!("unknown format: {other} (expected html, json or all)"),
    };

    if json {
        let path = output.join(format!("report-{timestamp}.json"));
        report.save_json(&path)?;
        println!("JSON report: {}", path.display());
    }
    if html {
        let path = output.join(format!("report-{timestamp}.html"));
        write_html_report(&report, &path)?;
        println!("HTML report: {}", path.display());
    }

    tracing::info!(id = %report.id, risk = %report.aggregate.risk_level, "report written");
    Ok(())
}
