use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};

use crate::records::{MatchRecord, parse_utc_date};

#[derive(Debug, Clone)]
pub struct IngestRun {
    pub competition: String,
    pub started_at: DateTime<Utc>,
    pub seasons_total: usize,
    pub seasons_succeeded: usize,
    pub matches_upserted: usize,
    pub errors: Vec<String>,
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS matches (
            match_id INTEGER PRIMARY KEY,
            season_start_year INTEGER NULL,
            utc_date TEXT NULL,
            status TEXT NOT NULL,
            matchday INTEGER NULL,
            stage TEXT NULL,
            home_team_id INTEGER NULL,
            home_team TEXT NULL,
            away_team_id INTEGER NULL,
            away_team TEXT NULL,
            home_goals INTEGER NULL,
            away_goals INTEGER NULL,
            winner TEXT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_matches_season ON matches(season_start_year);
        CREATE INDEX IF NOT EXISTS idx_matches_utc_date ON matches(utc_date);
        CREATE INDEX IF NOT EXISTS idx_matches_status ON matches(status);

        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            competition TEXT NOT NULL,
            started_at TEXT NOT NULL,
            finished_at TEXT NOT NULL,
            seasons_total INTEGER NOT NULL,
            seasons_succeeded INTEGER NOT NULL,
            matches_upserted INTEGER NOT NULL,
            errors_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Inserts or refreshes `rows` in a single transaction. Returns the row count.
pub fn upsert_matches(conn: &mut Connection, rows: &[MatchRecord]) -> Result<usize> {
    let tx = conn.transaction().context("begin upsert transaction")?;
    let updated_at = Utc::now().to_rfc3339();
    for row in rows {
        upsert_match(&tx, row, &updated_at)?;
    }
    tx.commit().context("commit upsert transaction")?;
    Ok(rows.len())
}

fn upsert_match(tx: &rusqlite::Transaction<'_>, m: &MatchRecord, updated_at: &str) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO matches (
            match_id, season_start_year, utc_date, status, matchday, stage,
            home_team_id, home_team, away_team_id, away_team,
            home_goals, away_goals, winner, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10,
            ?11, ?12, ?13, ?14
        )
        ON CONFLICT(match_id) DO UPDATE SET
            season_start_year = excluded.season_start_year,
            utc_date = excluded.utc_date,
            status = excluded.status,
            matchday = excluded.matchday,
            stage = excluded.stage,
            home_team_id = excluded.home_team_id,
            home_team = excluded.home_team,
            away_team_id = excluded.away_team_id,
            away_team = excluded.away_team,
            home_goals = excluded.home_goals,
            away_goals = excluded.away_goals,
            winner = excluded.winner,
            updated_at = excluded.updated_at
        "#,
        params![
            m.match_id as i64,
            m.season_start_year,
            m.utc_date.map(|d| d.to_rfc3339()),
            m.status,
            m.matchday,
            m.stage,
            m.home_team_id.map(i64::from),
            m.home_team,
            m.away_team_id.map(i64::from),
            m.away_team,
            m.home_goals,
            m.away_goals,
            m.winner,
            updated_at,
        ],
    )
    .with_context(|| format!("upsert match {}", m.match_id))?;
    Ok(())
}

/// Every stored fixture, oldest first. Rows with an unparseable kickoff come
/// back with `utc_date = None` rather than failing the load.
pub fn load_matches(conn: &Connection) -> Result<Vec<MatchRecord>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                match_id, season_start_year, utc_date, status, matchday, stage,
                home_team_id, home_team, away_team_id, away_team,
                home_goals, away_goals, winner
            FROM matches
            ORDER BY utc_date ASC, match_id ASC
            "#,
        )
        .context("prepare load matches query")?;

    let rows = stmt
        .query_map([], |row| {
            let utc_date: Option<String> = row.get(2)?;
            let home_team_id: Option<i64> = row.get(6)?;
            let away_team_id: Option<i64> = row.get(8)?;
            Ok(MatchRecord {
                match_id: row.get::<_, i64>(0)? as u64,
                season_start_year: row.get(1)?,
                utc_date: utc_date.as_deref().and_then(parse_utc_date),
                status: row.get(3)?,
                matchday: row.get(4)?,
                stage: row.get(5)?,
                home_team_id: home_team_id.and_then(|id| u32::try_from(id).ok()),
                home_team: row.get(7)?,
                away_team_id: away_team_id.and_then(|id| u32::try_from(id).ok()),
                away_team: row.get(9)?,
                home_goals: row.get(10)?,
                away_goals: row.get(11)?,
                winner: row.get(12)?,
            })
        })
        .context("query load matches")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode match row")?);
    }
    Ok(out)
}

pub fn record_ingest_run(conn: &Connection, run: &IngestRun) -> Result<i64> {
    let errors_json = serde_json::to_string(&run.errors).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "INSERT INTO ingest_runs(competition, started_at, finished_at, seasons_total, seasons_succeeded, matches_upserted, errors_json)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            run.competition,
            run.started_at.to_rfc3339(),
            Utc::now().to_rfc3339(),
            run.seasons_total as i64,
            run.seasons_succeeded as i64,
            run.matches_upserted as i64,
            errors_json,
        ],
    )
    .context("insert ingest run")?;
    Ok(conn.last_insert_rowid())
}

pub fn latest_utc_date(conn: &Connection) -> Result<Option<String>> {
    conn.query_row("SELECT MAX(utc_date) FROM matches", [], |row| {
        row.get::<_, Option<String>>(0)
    })
    .context("query latest utc_date")
}
