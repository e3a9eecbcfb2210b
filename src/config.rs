use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

use crate::records::FINISHED_STATUS;
use crate::rolling::FORM_WINDOW;

const DEFAULT_COMPETITION: &str = "PL";
const DEFAULT_SEASON_START: i32 = 2018;
const DEFAULT_SEASON_END: i32 = 2024;
const DEFAULT_DATA_DIR: &str = "data";
const MAX_WINDOW: usize = 50;

/// Loads `.env.local` then `.env` from the working directory, if present.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub token: String,
    pub competition: String,
    pub season_start: i32,
    pub season_end: i32,
}

impl IngestConfig {
    pub fn from_env() -> Result<Self> {
        let token = env::var("FOOTBALL_DATA_TOKEN")
            .map(|t| t.trim().to_string())
            .unwrap_or_default();
        if token.is_empty() {
            return Err(anyhow!("FOOTBALL_DATA_TOKEN missing (set it in .env)"));
        }
        let competition = env::var("COMPETITION_CODE")
            .ok()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_COMPETITION.to_string());
        let season_start = env_parse("SEASON_START").unwrap_or(DEFAULT_SEASON_START);
        let season_end = env_parse("SEASON_END")
            .unwrap_or(DEFAULT_SEASON_END)
            .max(season_start);
        Ok(Self {
            token,
            competition,
            season_start,
            season_end,
        })
    }

    pub fn seasons(&self) -> impl Iterator<Item = i32> {
        self.season_start..=self.season_end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub window: usize,
    pub finished_status: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window: FORM_WINDOW,
            finished_status: FINISHED_STATUS.to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(window) = env_parse::<usize>("FORM_WINDOW") {
            cfg.window = window.clamp(1, MAX_WINDOW);
        }
        cfg
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.clamp(1, MAX_WINDOW);
        self
    }
}

/// Fixed logical locations of the pipeline's inputs and outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub root: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_env() -> Self {
        let root = env::var("MATCH_FORM_DATA_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        Self::new(root)
    }

    pub fn matches_db(&self) -> PathBuf {
        self.root.join("raw").join("matches.sqlite")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.root.join("processed")
    }

    pub fn with_processed_dir(&self, dir: &Path) -> ProcessedPaths {
        ProcessedPaths {
            team_events: dir.join("team_events.parquet"),
            match_training: dir.join("match_training.parquet"),
            run_summary: dir.join("run_summary.json"),
        }
    }

    pub fn processed(&self) -> ProcessedPaths {
        self.with_processed_dir(&self.processed_dir())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedPaths {
    pub team_events: PathBuf,
    pub match_training: PathBuf,
    pub run_summary: PathBuf,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}
