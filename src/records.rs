use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

pub const FINISHED_STATUS: &str = "FINISHED";

/// One fixture between two teams, as it comes out of ingestion.
///
/// Every field other than `match_id` may be missing upstream; the pipeline
/// decides per stage what a missing value means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: u64,
    pub season_start_year: Option<i32>,
    pub utc_date: Option<DateTime<Utc>>,
    pub status: String,
    pub matchday: Option<i32>,
    pub stage: Option<String>,
    pub home_team_id: Option<u32>,
    pub home_team: Option<String>,
    pub away_team_id: Option<u32>,
    pub away_team: Option<String>,
    pub home_goals: Option<i32>,
    pub away_goals: Option<i32>,
    pub winner: Option<String>,
}

impl MatchRecord {
    pub fn is_finished(&self) -> bool {
        self.has_status(FINISHED_STATUS)
    }

    pub fn has_status(&self, status: &str) -> bool {
        self.status.trim().eq_ignore_ascii_case(status)
    }

    pub fn has_outcome(&self) -> bool {
        self.home_goals.is_some() && self.away_goals.is_some()
    }

    /// Kickoff and both sides known; anything less cannot be placed on a timeline.
    pub fn is_well_formed(&self) -> bool {
        self.utc_date.is_some() && self.home_team_id.is_some() && self.away_team_id.is_some()
    }

    pub fn goals(&self) -> Option<(i32, i32)> {
        let (Some(home), Some(away)) = (self.home_goals, self.away_goals) else {
            return None;
        };
        Some((home, away))
    }
}

/// Parses a kickoff string into UTC. Offsets are normalised; naive timestamps
/// are taken as UTC. Anything else yields `None`.
pub fn parse_utc_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_utc_date_normalises_offsets() {
        let expected = Utc.with_ymd_and_hms(2024, 8, 16, 19, 0, 0).unwrap();
        assert_eq!(parse_utc_date("2024-08-16T19:00:00Z"), Some(expected));
        assert_eq!(parse_utc_date("2024-08-16T21:00:00+02:00"), Some(expected));
        assert_eq!(parse_utc_date("2024-08-16 19:00:00"), Some(expected));
        assert_eq!(parse_utc_date("not a date"), None);
        assert_eq!(parse_utc_date("  "), None);
    }

    #[test]
    fn status_match_is_case_insensitive() {
        let record = MatchRecord {
            match_id: 1,
            season_start_year: None,
            utc_date: None,
            status: "finished".to_string(),
            matchday: None,
            stage: None,
            home_team_id: Some(1),
            home_team: None,
            away_team_id: Some(2),
            away_team: None,
            home_goals: Some(1),
            away_goals: None,
            winner: None,
        };
        assert!(record.is_finished());
        assert!(!record.has_outcome());
        assert!(!record.is_well_formed());
        assert_eq!(record.goals(), None);
    }
}
