//! The `lexiscreen results` command.

use anyhow::Result;
use chrono::Utc;

use lexiscreen_core::aggregate::{aggregate, AggregateResult};
use lexiscreen_core::report::AssessmentReport;
use lexiscreen_core::store::ResultSnapshot;

use super::Paths;

pub fn execute(paths: &Paths, format: String) -> Result<()> {
    let (config, store) = paths.open()?;
    let snapshot = store.load_all()?;

    match format.as_str() {
        "markdown" | "md" => {
            let report = AssessmentReport::build(&snapshot, &config.policy, Utc::now());
            print!("{}", report.to_markdown());
        }
        "json" => {
            let result = aggregate(&snapshot, &config.policy);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        "text" => {
            let result = aggregate(&snapshot, &config.policy);
            print_summary(&snapshot, &result);
        }
        other => anyhow::bail!("unknown format: {other} (expected text, json or markdown)"),
    }

    Ok(())
}

fn print_summary(snapshot: &ResultSnapshot, result: &AggregateResult) {
    use comfy_table::{Cell, Table};

    if snapshot.has_no_scores() {
        println!("No results recorded yet.");
    } else {
        let mut table = Table::new();
        table.set_header(vec!["Assessment", "Score", "Threshold", ""]);
        for point in &result.chart_series {
            let flag = if point.score < point.threshold {
                "below"
            } else {
                ""
            };
            table.add_row(vec![
                Cell::new(&point.name),
                Cell::new(format!("{}%", point.score)),
                Cell::new(format!("{}%", point.threshold)),
                Cell::new(flag),
            ]);
        }
        println!("{table}");
    }

    println!(
        "\nAverage score: {}%  Risk level: {}",
        result.average_score, result.risk_level
    );
    println!("{}", result.risk_description);

    let pending = snapshot.pending_tests();
    if !pending.is_empty() {
        let names: Vec<&str> = pending.iter().map(|t| t.title()).collect();
        println!("\nNot yet taken: {}", names.join(", "));
    }

    println!("\nRecommendations:");
    for (i, rec) in result.recommendations.iter().enumerate() {
        println!("  {}. {rec}", i + 1);
    }
}
