// src/storage/mod.rs
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::codeforces::models::ContestPage;
use crate::config::{Config, LanguageSpec};
use crate::extractors::problem::{SampleKind, SampleSink};
use crate::utils::error::StorageError;

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self {
            base_dir: base_path,
        })
    }

    /// Creates (if needed) and returns the working directory of one problem:
    /// `{base}/{contest}/{letter}/`.
    pub fn problem_dir(&self, contest_id: &str, letter: &str) -> Result<PathBuf, StorageError> {
        let dir = self.base_dir.join(contest_id).join(letter);
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(StorageError::IoError)?;
        }
        Ok(dir)
    }

    /// Returns the file-backed sample sink for one problem directory.
    pub fn sample_sink(&self, problem_dir: &Path) -> SampleFileSink {
        SampleFileSink {
            dir: problem_dir.to_path_buf(),
        }
    }

    /// Copies the language template (as `{letter}.{ext}`) and the configured
    /// companion build files into the problem directory, and records the
    /// language's build/run recipe next to them. Files already present are
    /// kept as-is so a rerun never clobbers work in progress.
    pub fn scaffold_problem(
        &self,
        problem_dir: &Path,
        letter: &str,
        config: &Config,
        lang: &LanguageSpec,
    ) -> Result<(), StorageError> {
        let template_src = config.template_dir.join(&lang.template);
        if template_src.exists() {
            let ext = Path::new(&lang.template)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("txt");
            copy_if_absent(&template_src, &problem_dir.join(format!("{}.{}", letter, ext)))?;
        } else {
            tracing::warn!(
                "Template {} not found; skipping template copy",
                template_src.display()
            );
        }

        for name in &config.build_files {
            let src = config.template_dir.join(name);
            if src.exists() {
                copy_if_absent(&src, &problem_dir.join(name))?;
            } else {
                tracing::debug!("Build file {} not found; skipping", src.display());
            }
        }

        let recipe = serde_json::to_string_pretty(lang)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        let recipe_path = problem_dir.join("judge.json");
        if !recipe_path.exists() {
            fs::write(&recipe_path, recipe).map_err(StorageError::IoError)?;
        }

        Ok(())
    }

    /// Saves contest metadata (title, problem list, per-problem sample
    /// counts) in JSON format under the contest directory.
    pub fn save_contest_metadata(
        &self,
        contest: &ContestPage,
        sample_counts: &BTreeMap<String, usize>,
    ) -> Result<PathBuf, StorageError> {
        let target_dir = self.base_dir.join(&contest.contest_id);
        if !target_dir.exists() {
            fs::create_dir_all(&target_dir).map_err(StorageError::IoError)?;
        }

        let file_path = target_dir.join("contest.json");

        let metadata = serde_json::json!({
            "contest_id": contest.contest_id,
            "title": contest.title,
            "problems": contest.problems,
            "sample_counts": sample_counts,
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, metadata_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved metadata to {}", file_path.display());

        Ok(file_path)
    }
}

fn copy_if_absent(src: &Path, dest: &Path) -> Result<(), StorageError> {
    if dest.exists() {
        tracing::debug!("{} already exists, keeping it", dest.display());
        return Ok(());
    }
    fs::copy(src, dest).map_err(StorageError::IoError)?;
    Ok(())
}

/// Sample sink writing `{index}.in` / `{index}.out` into one problem's
/// directory. Each open truncates any previous file for that slot; the
/// extractor drops the handle to close it.
pub struct SampleFileSink {
    dir: PathBuf,
}

impl SampleSink for SampleFileSink {
    type Writer = File;

    fn open(&mut self, index: usize, kind: SampleKind) -> std::io::Result<File> {
        File::create(self.dir.join(format!("{}.{}", index, kind.extension())))
    }
}
