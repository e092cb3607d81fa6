//! lexiscreen CLI: records screening results and renders the summary.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use lexiscreen_core::model::{AgeGroup, TestId};
use lexiscreen_core::scorers::RanCategory;

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "lexiscreen", version, about = "Dyslexia screening score recorder")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Result store path (overrides config and LEXISCREEN_STORE)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and checklist template
    Init {
        /// Age group for the checklist template
        #[arg(long, default_value = "schoolAge")]
        age_group: AgeGroup,
    },

    /// Score and store a cognitive test attempt
    Record {
        #[command(subcommand)]
        test: RecordCommand,
    },

    /// Score and store a symptom checklist
    Checklist {
        /// TOML file with `age_group` and an `[answers]` table
        #[arg(long, conflicts_with = "template")]
        answers: Option<PathBuf>,

        /// Print a fill-in template for an age group instead of scoring
        #[arg(long)]
        template: Option<AgeGroup>,
    },

    /// Rate a handwriting sample and store the result
    Handwriting {
        /// Image of the handwriting sample
        #[arg(long)]
        image: PathBuf,

        /// Letter formation rating (1-5, higher is better)
        #[arg(long)]
        formation: u8,

        /// Letter spacing rating (1-5, higher is better)
        #[arg(long)]
        spacing: u8,

        /// Line alignment rating (1-5, higher is better)
        #[arg(long)]
        alignment: u8,

        /// Letter reversals rating (1-5, higher is worse)
        #[arg(long)]
        reversals: u8,
    },

    /// Show or update the profile of the person screened
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        school: Option<String>,
        #[arg(long)]
        grade: Option<String>,
    },

    /// Show the aggregated results
    Results {
        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Write an assessment report
    Report {
        /// Output format: html, json, all
        #[arg(long, default_value = "html")]
        format: String,

        /// Output directory (defaults to the configured output_dir)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum RecordCommand {
    /// Quiz-style test: phonological, audio-discrimination, direction-sense
    Quiz {
        /// Which test was taken
        #[arg(long)]
        test: TestId,

        /// Per-question outcomes in order, e.g. "1,0,1,1,0,1"
        #[arg(long)]
        answers: String,
    },

    /// Processing-speed round tally
    ProcessingSpeed {
        /// Targets clicked
        #[arg(long)]
        correct: u32,

        /// Non-targets clicked
        #[arg(long, default_value = "0")]
        incorrect: u32,

        /// Targets that expired unclicked
        #[arg(long, default_value = "0")]
        missed: u32,

        /// Targets shown during the round
        #[arg(long)]
        targets: u32,
    },

    /// Rapid automatized naming run
    Ran {
        /// Stopwatch reading in seconds
        #[arg(long)]
        seconds: f64,

        /// Stimulus category: letters, numbers, colors, objects
        #[arg(long, default_value = "letters")]
        category: RanCategory,
    },

    /// Working-memory session of ten recall trials
    WorkingMemory {
        /// Per-trial recall outcomes in order, e.g. "1,1,0,1,1,1,0,0,1,1"
        #[arg(long)]
        trials: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lexiscreen_core=info".parse().unwrap())
                .add_directive("lexiscreen=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let paths = commands::Paths {
        config: cli.config,
        store: cli.store,
    };

    let result = match cli.command {
        Commands::Init { age_group } => commands::init::execute(age_group),
        Commands::Record { test } => commands::record::execute(&paths, test),
        Commands::Checklist { answers, template } => {
            commands::checklist::execute(&paths, answers, template)
        }
        Commands::Handwriting {
            image,
            formation,
            spacing,
            alignment,
            reversals,
        } => {
            commands::handwriting::execute(
                &paths, image, formation, spacing, alignment, reversals,
            )
            .await
        }
        Commands::Profile {
            name,
            age,
            email,
            school,
            grade,
        } => commands::profile::execute(
            &paths,
            commands::profile::ProfileUpdate {
                name,
                age,
                email,
                school,
                grade,
            },
        ),
        Commands::Results { format } => commands::results::execute(&paths, format),
        Commands::Report { format, output } => commands::report::execute(&paths, format, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
