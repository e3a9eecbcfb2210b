use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use rand::Rng;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde_json::Value;

use crate::records::{MatchRecord, parse_utc_date};

const FOOTBALL_DATA_BASE: &str = "https://api.football-data.org/v4";
const REQUEST_TIMEOUT_SECS: u64 = 60;
const MAX_ATTEMPTS: u32 = 6;
const BACKOFF_BASE_MS: f64 = 1200.0;

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")
    })
}

pub fn fetch_competition_matches(
    token: &str,
    competition: &str,
    season: i32,
) -> Result<Vec<MatchRecord>> {
    let url = format!("{FOOTBALL_DATA_BASE}/competitions/{competition}/matches?season={season}");
    let body = get_with_retry(token, &url)
        .with_context(|| format!("fetch {competition} season {season}"))?;
    parse_matches_json(&body, season)
}

pub fn fetch_available_seasons(token: &str, competition: &str) -> Result<Vec<i32>> {
    let url = format!("{FOOTBALL_DATA_BASE}/competitions/{competition}");
    let body = get_with_retry(token, &url)
        .with_context(|| format!("fetch competition {competition}"))?;
    parse_available_seasons(&body)
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn backoff_delay(attempt: u32) -> Duration {
    let base = BACKOFF_BASE_MS * 2f64.powi(attempt.saturating_sub(1) as i32);
    let jitter = rand::thread_rng().gen_range(0.0..1000.0);
    Duration::from_millis((base + jitter) as u64)
}

fn get_with_retry(token: &str, url: &str) -> Result<String> {
    let client = http_client()?;
    let mut last_err: Option<anyhow::Error> = None;

    for attempt in 1..=MAX_ATTEMPTS {
        let sent = client.get(url).header("X-Auth-Token", token).send();
        match sent {
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().context("failed reading body")?;
                if status.is_success() {
                    return Ok(body);
                }
                let snippet = body.chars().take(300).collect::<String>();
                if !is_retryable(status) {
                    return Err(anyhow!("http {status} for {url}: {snippet}"));
                }
                last_err = Some(anyhow!("http {status} for {url}: {snippet}"));
            }
            Err(err) => {
                last_err = Some(anyhow::Error::new(err).context(format!("request {url}")));
            }
        }
        if attempt < MAX_ATTEMPTS {
            let delay = backoff_delay(attempt);
            log::warn!(
                "attempt {attempt}/{MAX_ATTEMPTS} for {url} failed; retrying in {:.1}s",
                delay.as_secs_f64()
            );
            thread::sleep(delay);
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow!("request failed for {url}")))
}

/// Flattens a `/competitions/{code}/matches` payload. Entries without an `id`
/// are skipped; every other missing field is carried as `None`.
pub fn parse_matches_json(raw: &str, season: i32) -> Result<Vec<MatchRecord>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let v: Value = serde_json::from_str(trimmed).context("invalid matches json")?;
    let Some(matches) = v.get("matches").and_then(|m| m.as_array()) else {
        return Ok(Vec::new());
    };
    Ok(matches
        .iter()
        .filter_map(|m| parse_match(m, season))
        .collect())
}

fn parse_match(m: &Value, season: i32) -> Option<MatchRecord> {
    let match_id = m.get("id").and_then(as_u64_any)?;
    let home = m.get("homeTeam");
    let away = m.get("awayTeam");
    let score = m.get("score");
    let full_time = score.and_then(|s| s.get("fullTime"));

    Some(MatchRecord {
        match_id,
        season_start_year: Some(season),
        utc_date: m
            .get("utcDate")
            .and_then(|d| d.as_str())
            .and_then(parse_utc_date),
        status: str_field(m, "status").unwrap_or_default(),
        matchday: m.get("matchday").and_then(as_i32_any),
        stage: str_field(m, "stage"),
        home_team_id: home.and_then(|t| t.get("id")).and_then(as_u32_any),
        home_team: home.and_then(|t| str_field(t, "name")),
        away_team_id: away.and_then(|t| t.get("id")).and_then(as_u32_any),
        away_team: away.and_then(|t| str_field(t, "name")),
        home_goals: full_time.and_then(|s| s.get("home")).and_then(as_i32_any),
        away_goals: full_time.and_then(|s| s.get("away")).and_then(as_i32_any),
        winner: score.and_then(|s| str_field(s, "winner")),
    })
}

/// Season start years listed by a `/competitions/{code}` payload, sorted and
/// deduplicated.
pub fn parse_available_seasons(raw: &str) -> Result<Vec<i32>> {
    let v: Value = serde_json::from_str(raw.trim()).context("invalid competition json")?;
    let mut years = v
        .get("seasons")
        .and_then(|s| s.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|s| s.get("startDate").and_then(|d| d.as_str()))
                .filter_map(|d| d.get(..4))
                .filter_map(|y| y.parse::<i32>().ok())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    years.sort_unstable();
    years.dedup();
    Ok(years)
}

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(|x| x.as_str())
        .map(|s| s.to_string())
}

fn as_u64_any(v: &Value) -> Option<u64> {
    if let Some(n) = v.as_u64() {
        return Some(n);
    }
    v.as_str()?.trim().parse::<u64>().ok()
}

fn as_u32_any(v: &Value) -> Option<u32> {
    u32::try_from(as_u64_any(v)?).ok()
}

fn as_i32_any(v: &Value) -> Option<i32> {
    if let Some(n) = v.as_i64() {
        return i32::try_from(n).ok();
    }
    v.as_str()?.trim().parse::<i32>().ok()
}
