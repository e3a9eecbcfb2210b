use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::label::{OutcomeLabel, label_for};
use crate::records::MatchRecord;
use crate::rolling::{FormWindow, TeamForm};

/// Keyed access to precomputed team form.
///
/// Every vector is stored under the `(team_id, match_id)` of the event that
/// produced it, so looking up a fixture's own key returns form built strictly
/// from earlier matches.
#[derive(Debug, Clone, Default)]
pub struct FeatureStore {
    exact: HashMap<(u32, u64), (DateTime<Utc>, FormWindow)>,
    timelines: HashMap<u32, BTreeMap<(DateTime<Utc>, u64), FormWindow>>,
}

impl FeatureStore {
    pub fn from_form(form: &[TeamForm]) -> Self {
        let mut store = Self::default();
        for row in form {
            store.exact.insert(
                (row.team_id(), row.match_id()),
                (row.event_timestamp(), row.window),
            );
            store
                .timelines
                .entry(row.team_id())
                .or_default()
                .insert((row.event_timestamp(), row.match_id()), row.window);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }

    /// Exact `(team_id, match_id, at)` lookup. A stored vector whose kickoff
    /// differs from `at` is treated as missing.
    pub fn lookup(&self, team_id: u32, match_id: u64, at: DateTime<Utc>) -> Option<FormWindow> {
        let (stored_at, window) = self.exact.get(&(team_id, match_id))?;
        (*stored_at == at).then_some(*window)
    }

    /// Most recent vector for `team_id` effective at or before `at`.
    ///
    /// When several events share `at` the one with the greatest `match_id`
    /// wins. The training join does not use this; it is the as-of query a
    /// registry-backed store would answer.
    pub fn as_of(&self, team_id: u32, at: DateTime<Utc>) -> Option<FormWindow> {
        self.timelines
            .get(&team_id)?
            .range(..=(at, u64::MAX))
            .next_back()
            .map(|(_, window)| *window)
    }
}

/// One finished fixture with both teams' pre-match form and its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRow {
    pub match_id: u64,
    pub season_start_year: Option<i32>,
    pub event_timestamp: DateTime<Utc>,
    pub home_team_id: u32,
    pub away_team_id: u32,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub home_goals: i32,
    pub away_goals: i32,
    pub home_form: FormWindow,
    pub away_form: FormWindow,
    pub label: OutcomeLabel,
}

#[derive(Debug, Clone, Default)]
pub struct JoinedRows {
    pub rows: Vec<TrainingRow>,
    /// Eligible fixtures skipped because their status is not the finished marker.
    pub not_finished: usize,
    /// Sides that had no stored vector and were zero-filled.
    pub join_misses: usize,
}

/// Builds one training row per finished, scored, well-formed fixture.
///
/// Form for each side is fetched by exact key; a miss zero-fills that side and
/// is logged, but the row is still emitted.
pub fn build_training_rows(
    records: &[MatchRecord],
    store: &FeatureStore,
    finished_status: &str,
) -> JoinedRows {
    let mut out = JoinedRows::default();

    for record in records {
        let (Some(at), Some(home_id), Some(away_id)) =
            (record.utc_date, record.home_team_id, record.away_team_id)
        else {
            continue;
        };
        let (Some((home_goals, away_goals)), Some(label)) = (record.goals(), label_for(record))
        else {
            continue;
        };
        if !record.has_status(finished_status) {
            out.not_finished += 1;
            continue;
        }

        let home_form = side_form(store, home_id, record.match_id, at, &mut out.join_misses);
        let away_form = side_form(store, away_id, record.match_id, at, &mut out.join_misses);

        out.rows.push(TrainingRow {
            match_id: record.match_id,
            season_start_year: record.season_start_year,
            event_timestamp: at,
            home_team_id: home_id,
            away_team_id: away_id,
            home_team: record.home_team.clone(),
            away_team: record.away_team.clone(),
            home_goals,
            away_goals,
            home_form,
            away_form,
            label,
        });
    }

    out.rows.sort_by(|a, b| {
        a.event_timestamp
            .cmp(&b.event_timestamp)
            .then(a.match_id.cmp(&b.match_id))
    });
    out
}

fn side_form(
    store: &FeatureStore,
    team_id: u32,
    match_id: u64,
    at: DateTime<Utc>,
    misses: &mut usize,
) -> FormWindow {
    match store.lookup(team_id, match_id, at) {
        Some(window) => window,
        None => {
            *misses += 1;
            log::warn!(
                "no form vector for team {team_id} match {match_id} at {}; zero-filling",
                at.to_rfc3339()
            );
            FormWindow::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::TeamEvent;
    use chrono::{Duration, TimeZone};

    fn kickoff(day: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap() + Duration::days(day)
    }

    fn form(team_id: u32, match_id: u64, day: i64, points: i64) -> TeamForm {
        TeamForm {
            event: TeamEvent {
                team_id,
                match_id,
                event_timestamp: kickoff(day),
                points: Some(0),
                goals_for: Some(0),
                goals_against: Some(0),
            },
            window: FormWindow {
                points,
                goals_for: 0,
                goals_against: 0,
            },
        }
    }

    #[test]
    fn lookup_requires_matching_kickoff() {
        let store = FeatureStore::from_form(&[form(1, 10, 0, 4)]);
        assert_eq!(store.lookup(1, 10, kickoff(0)).map(|w| w.points), Some(4));
        assert_eq!(store.lookup(1, 10, kickoff(1)), None);
        assert_eq!(store.lookup(2, 10, kickoff(0)), None);
    }

    #[test]
    fn store_holds_one_vector_per_event() {
        assert!(FeatureStore::default().is_empty());
        let store =
            FeatureStore::from_form(&[form(1, 10, 0, 0), form(2, 10, 0, 0), form(1, 11, 7, 3)]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn as_of_picks_latest_at_or_before() {
        let store = FeatureStore::from_form(&[
            form(1, 10, 0, 0),
            form(1, 11, 7, 3),
            form(1, 12, 7, 4),
            form(1, 13, 14, 7),
        ]);
        assert_eq!(store.as_of(1, kickoff(-1)), None);
        assert_eq!(store.as_of(1, kickoff(3)).map(|w| w.points), Some(0));
        assert_eq!(store.as_of(1, kickoff(7)).map(|w| w.points), Some(4));
        assert_eq!(store.as_of(1, kickoff(20)).map(|w| w.points), Some(7));
        assert_eq!(store.as_of(9, kickoff(20)), None);
    }

    #[test]
    fn missing_side_is_zero_filled_and_counted() {
        let store = FeatureStore::from_form(&[form(1, 10, 0, 6)]);
        let record = MatchRecord {
            match_id: 10,
            season_start_year: Some(2023),
            utc_date: Some(kickoff(0)),
            status: "FINISHED".to_string(),
            matchday: Some(1),
            stage: None,
            home_team_id: Some(1),
            home_team: Some("Home".to_string()),
            away_team_id: Some(2),
            away_team: Some("Away".to_string()),
            home_goals: Some(0),
            away_goals: Some(0),
            winner: Some("DRAW".to_string()),
        };
        let joined = build_training_rows(std::slice::from_ref(&record), &store, "FINISHED");
        assert_eq!(joined.rows.len(), 1);
        assert_eq!(joined.join_misses, 1);
        assert_eq!(joined.rows[0].home_form.points, 6);
        assert_eq!(joined.rows[0].away_form, FormWindow::default());
        assert_eq!(joined.rows[0].label, OutcomeLabel::Draw);
        assert_eq!(Some(joined.rows[0].label), label_for(&record));
    }
}
