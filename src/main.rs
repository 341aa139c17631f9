// src/main.rs
mod codeforces;
mod config;
mod events;
mod extractors;
mod storage;
mod utils;

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;

use codeforces::client;
use codeforces::models::ProblemPage;
use config::{Config, LanguageSpec};
use extractors::{contest, problem};
use storage::StorageManager;
use utils::AppError;

/// Command Line Interface for the Codeforces sample fetcher
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The Codeforces contest number
    contest: String,

    /// The programming language to use (key into the language table)
    #[arg(short, long, default_value = "c++17")]
    language: String,

    /// Output directory; problems land in {output_dir}/{contest}/{letter}
    #[arg(short, long, default_value = ".")]
    output_dir: String,

    /// Directory holding templates and build files (overrides the config)
    #[arg(long)]
    template_dir: Option<PathBuf>,

    /// JSON config file with the template directory and language table
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting processing for args: {:?}", args);

    // 3. Resolve configuration and the target language
    let mut cfg = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::builtin(),
    };
    if let Some(dir) = &args.template_dir {
        cfg.template_dir = dir.clone();
    }

    let lang = cfg
        .language(&args.language)
        .ok_or_else(|| {
            AppError::Config(format!(
                "Unknown language {:?} (known: {})",
                args.language,
                cfg.language_names().join(", ")
            ))
        })?
        .clone();

    // 4. Initialize storage
    let storage = StorageManager::new(&args.output_dir)?;

    // 5. Find the contest and its problems
    tracing::info!("Parsing contest {}, please wait...", args.contest);
    let html = client::fetch_contest_page(&args.contest).await?;
    let contest_page = contest::extract(&args.contest, events::stream(&html));

    if contest_page.title.is_empty() {
        tracing::warn!("Contest title not found on the page; continuing without it");
    } else {
        tracing::info!("*** Round name: {} ***", contest_page.title);
    }
    tracing::info!("Found {} problems", contest_page.problems.len());

    if contest_page.problems.is_empty() {
        return Err(AppError::Processing(format!(
            "No problems found for contest {}",
            args.contest
        )));
    }

    // 6. Process each problem: scaffold, fetch, extract samples
    let mut success_count = 0;
    let mut failure_count = 0;
    let mut sample_counts: BTreeMap<String, usize> = BTreeMap::new();

    for problem_ref in &contest_page.problems {
        tracing::info!(
            "Downloading problem {}: {}...",
            problem_ref.letter,
            problem_ref.title
        );

        match process_problem(&storage, &cfg, &lang, &args.contest, &problem_ref.letter).await {
            Ok(page) => {
                if page.truncated {
                    tracing::warn!(
                        "Problem {} page looked truncated; consider re-running",
                        problem_ref.letter
                    );
                }
                tracing::info!("{} sample test(s) found", page.num_tests());
                sample_counts.insert(problem_ref.letter.clone(), page.num_tests());
                success_count += 1;
            }
            Err(e) => {
                // One problem failing leaves its siblings alone.
                tracing::error!("Failed to process problem {}: {}", problem_ref.letter, e);
                failure_count += 1;
            }
        }
    }

    // 7. Persist contest metadata
    match storage.save_contest_metadata(&contest_page, &sample_counts) {
        Ok(path) => tracing::info!("Saved contest metadata to: {}", path.display()),
        Err(e) => tracing::error!("Failed to save contest metadata: {}", e),
    }

    tracing::info!(
        "Processing finished. Success: {}, Failures: {}",
        success_count,
        failure_count
    );

    if success_count == 0 && failure_count > 0 {
        return Err(AppError::Processing(format!(
            "Failed to set up any of {} problems",
            failure_count
        )));
    }

    Ok(())
}

/// Fetch + extract + persist pipeline for a single problem.
async fn process_problem(
    storage: &StorageManager,
    cfg: &Config,
    lang: &LanguageSpec,
    contest_id: &str,
    letter: &str,
) -> Result<ProblemPage, AppError> {
    let problem_dir = storage.problem_dir(contest_id, letter)?;
    storage.scaffold_problem(&problem_dir, letter, cfg, lang)?;

    let html = client::fetch_problem_page(contest_id, letter).await?;
    let mut sink = storage.sample_sink(&problem_dir);
    let page = problem::extract(&mut sink, events::stream(&html))?;

    Ok(page)
}
