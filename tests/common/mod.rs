#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use match_form::records::MatchRecord;

pub fn kickoff(hours: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 8, 11, 19, 0, 0).unwrap() + Duration::hours(hours)
}

pub fn fixture(
    match_id: u64,
    hours: i64,
    home: u32,
    away: u32,
    home_goals: Option<i32>,
    away_goals: Option<i32>,
) -> MatchRecord {
    let status = if home_goals.is_some() && away_goals.is_some() {
        "FINISHED"
    } else {
        "SCHEDULED"
    };
    MatchRecord {
        match_id,
        season_start_year: Some(2023),
        utc_date: Some(kickoff(hours)),
        status: status.to_string(),
        matchday: None,
        stage: Some("REGULAR_SEASON".to_string()),
        home_team_id: Some(home),
        home_team: Some(format!("Team {home}")),
        away_team_id: Some(away),
        away_team: Some(format!("Team {away}")),
        home_goals,
        away_goals,
        winner: None,
    }
}

/// A seeded league: `n` fixtures between `teams` teams, every kickoff distinct,
/// roughly one in ten without a score.
pub fn random_league(seed: u64, teams: u32, n: u64) -> Vec<MatchRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let home = rng.gen_range(1..=teams);
            let mut away = rng.gen_range(1..=teams);
            while away == home {
                away = rng.gen_range(1..=teams);
            }
            let scored = !rng.gen_bool(0.1);
            let home_goals = scored.then(|| rng.gen_range(0..5));
            let away_goals = scored.then(|| rng.gen_range(0..5));
            fixture(1000 + i, i as i64 * 3, home, away, home_goals, away_goals)
        })
        .collect()
}
