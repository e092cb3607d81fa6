//! Printable HTML report.
//!
//! Produces a self-contained HTML file with all CSS inlined and the score
//! comparison drawn as an inline SVG bar chart with the threshold marked.

use anyhow::Result;
use std::path::Path;

use lexiscreen_core::aggregate::{ChartPoint, RiskLevel};
use lexiscreen_core::checklist::{category_title, ANSWER_LABELS};
use lexiscreen_core::report::AssessmentReport;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn risk_class(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "risk-low",
        RiskLevel::Mild => "risk-mild",
        RiskLevel::Moderate => "risk-moderate",
        RiskLevel::High => "risk-high",
        RiskLevel::Unknown => "risk-unknown",
    }
}

/// Generate an HTML report from an assessment report.
pub fn generate_html(report: &AssessmentReport) -> String {
    let mut html = String::new();
    let agg = &report.aggregate;

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>Screening report: {}</title>\n",
        html_escape(report.subject_name().unwrap_or("anonymous"))
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>Dyslexia Screening Report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Generated {} | Report {}</p>\n",
        report.created_at.format("%Y-%m-%d %H:%M UTC"),
        report.id
    ));
    if let Some(profile) = &report.profile {
        html.push_str("<table class=\"profile\">\n<tbody>\n");
        let mut row = |label: &str, value: &str| {
            html.push_str(&format!(
                "<tr><th>{label}</th><td>{}</td></tr>\n",
                html_escape(value)
            ));
        };
        row("Name", &profile.name);
        if let Some(age) = profile.age {
            row("Age", &age.to_string());
        }
        if let Some(school) = &profile.school {
            row("School", school);
        }
        if let Some(grade) = &profile.grade {
            row("Grade", grade);
        }
        if let Some(email) = &profile.email {
            row("Email", email);
        }
        html.push_str("</tbody></table>\n");
    }
    html.push_str("</header>\n");

    // Summary
    html.push_str("<section class=\"summary\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str(&format!(
        "<div class=\"risk {}\"><span class=\"average\">{}%</span> <span class=\"level\">{} risk</span></div>\n",
        risk_class(agg.risk_level),
        agg.average_score,
        agg.risk_level
    ));
    html.push_str(&format!("<p>{}</p>\n", html_escape(&agg.risk_description)));
    if !agg.chart_series.is_empty() {
        html.push_str(&generate_bar_chart(&agg.chart_series));
    }
    html.push_str("</section>\n");

    // Per-test results
    if !report.tests.is_empty() {
        html.push_str("<section class=\"tests\">\n");
        html.push_str("<h2>Cognitive Tests</h2>\n");
        html.push_str("<table>\n");
        html.push_str("<thead><tr><th>Test</th><th>Score</th><th>Completed</th></tr></thead>\n");
        html.push_str("<tbody>\n");
        for line in &report.tests {
            let completed = line
                .completed_at
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string());
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}%</td><td>{}</td></tr>\n",
                line.test.title(),
                line.score,
                completed
            ));
        }
        html.push_str("</tbody></table>\n");
        html.push_str("</section>\n");
    }

    // Checklist
    if let Some(checklist) = &report.checklist {
        html.push_str("<section class=\"checklist\">\n");
        html.push_str(&format!(
            "<h2>Symptom Checklist ({})</h2>\n",
            checklist.age_group
        ));
        html.push_str(&format!(
            "<p class=\"meta\">Overall {}% | completed {} | scale: {}</p>\n",
            checklist.overall_score,
            checklist.date.format("%Y-%m-%d"),
            ANSWER_LABELS.join(" / ")
        ));
        html.push_str("<table>\n<thead><tr><th>Category</th><th>Score</th></tr></thead>\n<tbody>\n");
        for (category, score) in &checklist.category_scores {
            let title = category_title(checklist.age_group, category).unwrap_or(category.as_str());
            html.push_str(&format!(
                "<tr><td>{}</td><td>{score}%</td></tr>\n",
                html_escape(title)
            ));
        }
        html.push_str("</tbody></table>\n");
        html.push_str("</section>\n");
    }

    // Handwriting
    if let Some(hw) = &report.handwriting {
        html.push_str("<section class=\"handwriting\">\n");
        html.push_str(&format!(
            "<h2>Handwriting Analysis ({}%)</h2>\n",
            hw.overall_score
        ));
        html.push_str("<table>\n<thead><tr><th>Feature</th><th>Rating</th><th>Observation</th></tr></thead>\n<tbody>\n");
        for (label, sub) in [
            ("Letter formation", &hw.letter_formation),
            ("Letter spacing", &hw.letter_spacing),
            ("Line alignment", &hw.line_alignment),
            ("Letter reversals", &hw.letter_reversals),
        ] {
            html.push_str(&format!(
                "<tr><td>{label}</td><td>{}/5</td><td>{}</td></tr>\n",
                sub.score,
                html_escape(&sub.description)
            ));
        }
        html.push_str("</tbody></table>\n");
        html.push_str("</section>\n");
    }

    // Recommendations
    html.push_str("<section class=\"recommendations\">\n");
    html.push_str("<h2>Recommendations</h2>\n<ol>\n");
    for rec in &agg.recommendations {
        html.push_str(&format!("<li>{}</li>\n", html_escape(rec)));
    }
    html.push_str("</ol>\n");
    html.push_str("<p class=\"disclaimer\">This screening is not a diagnosis. Only a qualified professional can diagnose dyslexia.</p>\n");
    html.push_str("</section>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &AssessmentReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn generate_bar_chart(series: &[ChartPoint]) -> String {
    let bar_height = 26;
    let max_width = 400;
    let padding = 10;
    let label_width = 140;

    let total_height = series.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\" role=\"img\" aria-label=\"Scores against threshold\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, point) in series.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = point.score as usize * max_width / 100;

        let color = if point.score >= point.threshold {
            "#22c55e"
        } else if point.score + 20 >= point.threshold {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&point.name)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            point.score
        ));
    }

    // Threshold line; every point carries the same threshold.
    if let Some(first) = series.first() {
        let x = label_width + first.threshold as usize * max_width / 100;
        svg.push_str(&format!(
            "  <line class=\"threshold\" x1=\"{x}\" y1=\"0\" x2=\"{x}\" y2=\"{total_height}\" stroke=\"#6b7280\" stroke-dasharray=\"4 3\"/>\n"
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; }
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); max-width: 900px; }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
.risk { font-size: 1.5rem; padding: 1rem; border-radius: 8px; }
.risk .average { font-weight: bold; }
.risk-low { background: #dcfce7; }
.risk-mild { background: #fef9c3; }
.risk-moderate { background: #ffedd5; }
.risk-high { background: #fde2e2; }
.risk-unknown { background: var(--border); }
.disclaimer { font-style: italic; color: #6b7280; }
svg { margin: 1rem 0; }
@media print {
  body { padding: 0; }
  section { page-break-inside: avoid; }
}
"#;
