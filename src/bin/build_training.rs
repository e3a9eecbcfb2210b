use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use match_form::columnar;
use match_form::config::{DataPaths, PipelineConfig, load_dotenv};
use match_form::run_pipeline;
use match_form::store;

fn main() -> Result<()> {
    load_dotenv();
    env_logger::init();

    let paths = DataPaths::from_env();
    let mut cfg = PipelineConfig::from_env();
    if let Some(window) = parse_str_arg("--window").and_then(|w| w.parse::<usize>().ok()) {
        cfg = cfg.with_window(window);
    }
    let db_path = parse_str_arg("--db")
        .map(PathBuf::from)
        .unwrap_or_else(|| paths.matches_db());
    let out = match parse_str_arg("--out-dir") {
        Some(dir) => paths.with_processed_dir(&PathBuf::from(dir)),
        None => paths.processed(),
    };

    if !db_path.exists() {
        return Err(anyhow!(
            "missing match database {} (run ingest_matches first)",
            db_path.display()
        ));
    }
    let conn = store::open_db(&db_path)?;
    let records = store::load_matches(&conn)?;

    let output = run_pipeline(&records, &cfg).context("pipeline aborted")?;

    columnar::write_team_form(&out.team_events, &output.team_form, cfg.window)?;
    columnar::write_training_rows(&out.match_training, &output.training_rows, cfg.window)?;
    let summary_json =
        serde_json::to_string_pretty(&output.summary).context("serialize run summary")?;
    fs::write(&out.run_summary, summary_json)
        .with_context(|| format!("write {}", out.run_summary.display()))?;

    println!("Training build complete (window={})", cfg.window);
    println!("Team events: {}", out.team_events.display());
    println!("Training table: {}", out.match_training.display());
    println!("{}", output.summary);

    Ok(())
}

fn parse_str_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
