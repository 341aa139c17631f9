// src/config.rs
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::utils::error::AppError;

/// Build/run recipe for one target language. The tool only consumes
/// `template`; the rest is written into each problem's `judge.json` for the
/// companion test runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageSpec {
    /// Template file name inside the template directory.
    pub template: String,
    pub compile_cmd: String,
    #[serde(default)]
    pub debug_flags: String,
    pub run_cmd: String,
}

/// Explicit tool configuration, passed down from main. Nothing in here is a
/// process-wide global.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory holding language templates and companion build files.
    pub template_dir: PathBuf,

    /// Companion files copied into every problem directory when present.
    #[serde(default = "default_build_files")]
    pub build_files: Vec<String>,

    /// Language name -> build/run recipe.
    pub languages: HashMap<String, LanguageSpec>,
}

fn default_build_files() -> Vec<String> {
    vec!["Makefile".to_string()]
}

impl Config {
    /// The built-in language table, matching the stock templates.
    pub fn builtin() -> Self {
        let mut languages = HashMap::new();
        languages.insert(
            "c++17".to_string(),
            LanguageSpec {
                template: "template.cpp".to_string(),
                compile_cmd: "g++ -g -std=c++1z -Wall $DBG".to_string(),
                debug_flags: "-DDEBUG".to_string(),
                run_cmd: "./a.out".to_string(),
            },
        );
        languages.insert(
            "go".to_string(),
            LanguageSpec {
                template: "main.go".to_string(),
                compile_cmd: "go build $DBG -o a.out".to_string(),
                debug_flags: "-ldflags '-X=main.DEBUG=Y'".to_string(),
                run_cmd: "./a.out".to_string(),
            },
        );
        languages.insert(
            "kotlin".to_string(),
            LanguageSpec {
                template: "main.kt".to_string(),
                compile_cmd: "kotlinc -include-runtime -d out.jar".to_string(),
                debug_flags: "-d".to_string(),
                run_cmd: "java -jar out.jar $DBG".to_string(),
            },
        );

        Self {
            template_dir: PathBuf::from("./templates"),
            build_files: default_build_files(),
            languages,
        }
    }

    /// Loads a JSON config file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| AppError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    pub fn language(&self, name: &str) -> Option<&LanguageSpec> {
        self.languages.get(name)
    }

    /// Known language names, sorted for stable error messages.
    pub fn language_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.languages.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_has_the_stock_languages() {
        let cfg = Config::builtin();
        assert_eq!(cfg.language_names(), ["c++17", "go", "kotlin"]);
        assert_eq!(cfg.language("c++17").unwrap().template, "template.cpp");
        assert!(cfg.language("rust").is_none());
    }

    #[test]
    fn config_parses_from_json() {
        let raw = r#"{
            "template_dir": "/opt/cp/templates",
            "languages": {
                "rust": {
                    "template": "main.rs",
                    "compile_cmd": "cargo build --release",
                    "run_cmd": "./target/release/main"
                }
            }
        }"#;
        let cfg: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.template_dir, PathBuf::from("/opt/cp/templates"));
        // Defaults fill in what the file omits.
        assert_eq!(cfg.build_files, ["Makefile"]);
        assert_eq!(cfg.language("rust").unwrap().debug_flags, "");
    }
}
