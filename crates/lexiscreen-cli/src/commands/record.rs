//! The `lexiscreen record` command.

use anyhow::Result;
use chrono::Utc;

use lexiscreen_core::model::TestScore;
use lexiscreen_core::scorers::{
    score_processing_speed, score_quiz, score_ran_secs, score_working_memory,
    ProcessingSpeedTally,
};

use super::{parse_outcomes, Paths};
use crate::RecordCommand;

pub fn execute(paths: &Paths, command: RecordCommand) -> Result<()> {
    let score = score(command)?;

    let (_, mut store) = paths.open()?;
    store.save_test_score(&score)?;

    println!(
        "{}: {}% (saved to {})",
        score.test_id.title(),
        score.value,
        store.inner().path().display()
    );

    let pending = store.load_all()?.pending_tests();
    if !pending.is_empty() {
        let names: Vec<&str> = pending.iter().map(|t| t.title()).collect();
        println!("Remaining tests: {}", names.join(", "));
    }

    Ok(())
}

fn score(command: RecordCommand) -> Result<TestScore> {
    let now = Utc::now();
    let score = match command {
        RecordCommand::Quiz { test, answers } => score_quiz(test, &parse_outcomes(&answers)?, now)?,
        RecordCommand::ProcessingSpeed {
            correct,
            incorrect,
            missed,
            targets,
        } => {
            let tally = ProcessingSpeedTally {
                correct,
                incorrect,
                missed,
                targets_seen: targets,
            };
            score_processing_speed(&tally, now)?
        }
        RecordCommand::Ran { seconds, category } => score_ran_secs(seconds, category, now)?,
        RecordCommand::WorkingMemory { trials } => {
            score_working_memory(&parse_outcomes(&trials)?, now)?
        }
    };
    Ok(score)
}
