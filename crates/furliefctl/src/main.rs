//! Furlief Control - CLI for the Furlief waitlist service
//!
//! Classifies quiz answers and symptom selections offline, and reads the
//! admin dashboard from a running furliefd.

mod client;
mod output;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use client::AdminClient;
use furlief_common::dashboard::export_filename;
use furlief_shared::quiz::{evaluate, QuizAnswers};
use furlief_shared::symptoms::{assess_symptoms, parse_selection, SymptomId, CATALOG};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "furliefctl")]
#[command(about = "Furlief waitlist control", long_about = None)]
#[command(version)]
struct Cli {
    /// furliefd base URL
    #[arg(long, global = true, default_value = "http://127.0.0.1:7870")]
    server: String,

    /// Admin bearer token
    #[arg(long, global = true, env = "FURLIEF_ADMIN_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify quiz answers from a JSON file
    Quiz {
        /// File with `[[...], ...]` or `{"answers": [[...], ...]}`
        answers: PathBuf,
    },

    /// Assess a symptom selection (ids: scratching, redness, hairloss, ...)
    Symptoms {
        ids: Vec<String>,
    },

    /// Show dashboard statistics
    Stats,

    /// List signups
    Signups {
        /// Match email or first name
        #[arg(long)]
        search: Option<String>,

        /// all, active, converted or unsubscribed
        #[arg(long)]
        status: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Export signups as CSV
    Export {
        /// Output file (default: furlief-waitlist-YYYY-MM-DD.csv)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AnswersFile {
    Wrapped { answers: QuizAnswers },
    Raw(QuizAnswers),
}

fn parse_answers(content: &str) -> Result<QuizAnswers> {
    let file: AnswersFile =
        serde_json::from_str(content).context("Expected a JSON array of answer lists")?;
    Ok(match file {
        AnswersFile::Wrapped { answers } | AnswersFile::Raw(answers) => answers,
    })
}

fn quiz(path: PathBuf) -> Result<()> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let answers = parse_answers(&content)?;
    let (tier, result) = evaluate(&answers);
    output::display_quiz(tier, &result, answers.answered());
    Ok(())
}

fn symptoms(ids: Vec<String>) -> Result<()> {
    let selected = parse_selection(&ids);
    if ids.iter().any(|id| SymptomId::from_id(id).is_none()) {
        let known: Vec<&str> = CATALOG.iter().map(|s| s.id.as_str()).collect();
        eprintln!("[NOTE] Unknown symptom ids ignored. Known: {}", known.join(", "));
    }
    output::display_assessment(&assess_symptoms(&selected));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Quiz { answers } => quiz(answers),
        Commands::Symptoms { ids } => symptoms(ids),
        Commands::Stats => {
            let client = AdminClient::new(&cli.server, cli.token)?;
            output::display_stats(&client.stats().await?);
            Ok(())
        }
        Commands::Signups {
            search,
            status,
            page,
        } => {
            if page == 0 {
                bail!("Pages start at 1");
            }
            let client = AdminClient::new(&cli.server, cli.token)?;
            let listing = client
                .signups(search.as_deref(), status.as_deref(), page)
                .await?;
            output::display_signups(&listing);
            Ok(())
        }
        Commands::Export { output } => {
            let client = AdminClient::new(&cli.server, cli.token)?;
            let csv = client.export().await?;
            let path = output.unwrap_or_else(|| PathBuf::from(export_filename(Utc::now())));
            std::fs::write(&path, &csv)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Exported {} signups to {}", csv.lines().count().saturating_sub(1), path.display());
            Ok(())
        }
    }
}
