use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::records::MatchRecord;

/// One team's side of a fixture. Immutable once derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamEvent {
    pub team_id: u32,
    pub match_id: u64,
    pub event_timestamp: DateTime<Utc>,
    /// League points earned (3/1/0); `None` while the result is unknown.
    pub points: Option<u8>,
    pub goals_for: Option<i32>,
    pub goals_against: Option<i32>,
}

/// What this event adds to a rolling window. Unknown results count as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Contribution {
    pub points: i64,
    pub goals_for: i64,
    pub goals_against: i64,
}

impl TeamEvent {
    pub fn contribution(&self) -> Contribution {
        Contribution {
            points: self.points.map(i64::from).unwrap_or(0),
            goals_for: self.goals_for.map(i64::from).unwrap_or(0),
            goals_against: self.goals_against.map(i64::from).unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DerivedEvents {
    pub events: Vec<TeamEvent>,
    /// Records without kickoff or without both team ids.
    pub dropped_malformed: usize,
    /// Well-formed records whose score is not (yet) known.
    pub incomplete_outcomes: usize,
}

pub fn outcome_points(home_goals: i32, away_goals: i32) -> (u8, u8) {
    if home_goals > away_goals {
        (3, 0)
    } else if home_goals < away_goals {
        (0, 3)
    } else {
        (1, 1)
    }
}

/// Splits every well-formed fixture into a home and an away [`TeamEvent`].
///
/// Status is ignored: scheduled fixtures still occupy a slot in
/// each team's timeline and contribute zeros to later windows.
pub fn derive_team_events(records: &[MatchRecord]) -> DerivedEvents {
    let mut out = DerivedEvents {
        events: Vec::with_capacity(records.len() * 2),
        ..DerivedEvents::default()
    };

    for record in records {
        let (Some(event_timestamp), Some(home_id), Some(away_id)) =
            (record.utc_date, record.home_team_id, record.away_team_id)
        else {
            out.dropped_malformed += 1;
            continue;
        };

        let points = record.goals().map(|(h, a)| outcome_points(h, a));
        if points.is_none() {
            out.incomplete_outcomes += 1;
        }

        out.events.push(TeamEvent {
            team_id: home_id,
            match_id: record.match_id,
            event_timestamp,
            points: points.map(|(home, _)| home),
            goals_for: record.home_goals,
            goals_against: record.away_goals,
        });
        out.events.push(TeamEvent {
            team_id: away_id,
            match_id: record.match_id,
            event_timestamp,
            points: points.map(|(_, away)| away),
            goals_for: record.away_goals,
            goals_against: record.home_goals,
        });
    }

    out
}
