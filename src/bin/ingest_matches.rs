use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;

use match_form::config::{DataPaths, IngestConfig, load_dotenv};
use match_form::fetch;
use match_form::store::{self, IngestRun};

const SEASON_PAUSE_SECS: u64 = 2;

fn main() -> Result<()> {
    load_dotenv();
    env_logger::init();

    let mut cfg = IngestConfig::from_env()?;
    if let Some(code) = parse_str_arg("--competition") {
        cfg.competition = code;
    }
    if let Some((start, end)) = parse_str_arg("--seasons").as_deref().and_then(parse_season_range)
    {
        cfg.season_start = start;
        cfg.season_end = end;
    }

    let db_path = parse_str_arg("--db")
        .map(PathBuf::from)
        .unwrap_or_else(|| DataPaths::from_env().matches_db());
    let mut conn = store::open_db(&db_path)?;

    let started_at = Utc::now();
    let mut seasons_total = 0usize;
    let mut seasons_succeeded = 0usize;
    let mut matches_upserted = 0usize;
    let mut errors = Vec::new();

    for season in cfg.seasons() {
        seasons_total += 1;
        println!("Fetching {} season {season} ...", cfg.competition);
        match fetch::fetch_competition_matches(&cfg.token, &cfg.competition, season) {
            Ok(rows) => {
                println!("  got {} matches", rows.len());
                matches_upserted += store::upsert_matches(&mut conn, &rows)
                    .with_context(|| format!("store season {season}"))?;
                seasons_succeeded += 1;
            }
            Err(err) => {
                log::warn!("season {season} failed: {err:#}");
                errors.push(format!("season {season}: {err:#}"));
            }
        }
        if season < cfg.season_end {
            thread::sleep(Duration::from_secs(SEASON_PAUSE_SECS));
        }
    }

    store::record_ingest_run(
        &conn,
        &IngestRun {
            competition: cfg.competition.clone(),
            started_at,
            seasons_total,
            seasons_succeeded,
            matches_upserted,
            errors: errors.clone(),
        },
    )?;

    println!("Match ingest complete");
    println!("DB: {}", db_path.display());
    println!("Competition: {}", cfg.competition);
    println!("Seasons: {seasons_succeeded}/{seasons_total}");
    println!("Matches upserted: {matches_upserted}");
    if let Some(latest) = store::latest_utc_date(&conn)? {
        println!("Latest kickoff UTC: {latest}");
    }
    if !errors.is_empty() {
        println!("Errors: {}", errors.len());
        for err in errors.iter().take(8) {
            println!(" - {err}");
        }
    }

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

fn parse_season_range(raw: &str) -> Option<(i32, i32)> {
    let (start, end) = match raw.split_once('-') {
        Some((a, b)) => (a.trim().parse().ok()?, b.trim().parse().ok()?),
        None => {
            let year = raw.trim().parse().ok()?;
            (year, year)
        }
    };
    (start <= end).then_some((start, end))
}
