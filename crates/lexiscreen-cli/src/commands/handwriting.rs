//! The `lexiscreen handwriting` command.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;

use lexiscreen_core::handwriting::{
    analyze_handwriting, HandwritingFeatures, ImagePayload, RatedClassifier,
};

use super::Paths;

pub async fn execute(
    paths: &Paths,
    image: PathBuf,
    formation: u8,
    spacing: u8,
    alignment: u8,
    reversals: u8,
) -> Result<()> {
    let features = HandwritingFeatures::new(formation, spacing, alignment, reversals)?;
    let payload = ImagePayload::from_path(&image)?;
    let classifier = RatedClassifier::new(features);

    let (_, mut store) = paths.open()?;
    let result = analyze_handwriting(&classifier, &payload, &mut store, Utc::now()).await?;

    println!("Handwriting: {}%", result.overall_score);
    for (label, sub) in [
        ("Letter formation", &result.letter_formation),
        ("Letter spacing", &result.letter_spacing),
        ("Line alignment", &result.line_alignment),
        ("Letter reversals", &result.letter_reversals),
    ] {
        println!("  {label} ({}/5): {}", sub.score, sub.description);
    }

    Ok(())
}
