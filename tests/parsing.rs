use chrono::{TimeZone, Utc};

use match_form::fetch::{parse_available_seasons, parse_matches_json};

const MATCHES_JSON: &str = r#"{
  "filters": {"season": "2023"},
  "matches": [
    {
      "id": 435943,
      "utcDate": "2023-08-11T19:00:00Z",
      "status": "FINISHED",
      "matchday": 1,
      "stage": "REGULAR_SEASON",
      "homeTeam": {"id": 328, "name": "Burnley FC"},
      "awayTeam": {"id": 65, "name": "Manchester City FC"},
      "score": {"winner": "AWAY_TEAM", "fullTime": {"home": 0, "away": 3}}
    },
    {
      "id": "436321",
      "utcDate": "2024-05-19T15:00:00Z",
      "status": "TIMED",
      "matchday": 38,
      "stage": "REGULAR_SEASON",
      "homeTeam": {"id": 65, "name": "Manchester City FC"},
      "awayTeam": {"id": null, "name": null},
      "score": {"winner": null, "fullTime": {"home": null, "away": null}}
    },
    {
      "utcDate": "2024-05-19T15:00:00Z",
      "status": "FINISHED"
    }
  ]
}"#;

#[test]
fn parses_football_data_matches() {
    let rows = parse_matches_json(MATCHES_JSON, 2023).expect("fixture should parse");
    assert_eq!(rows.len(), 2);

    let first = &rows[0];
    assert_eq!(first.match_id, 435943);
    assert_eq!(first.season_start_year, Some(2023));
    assert_eq!(
        first.utc_date,
        Some(Utc.with_ymd_and_hms(2023, 8, 11, 19, 0, 0).unwrap())
    );
    assert!(first.is_finished());
    assert_eq!(first.home_team_id, Some(328));
    assert_eq!(first.away_team.as_deref(), Some("Manchester City FC"));
    assert_eq!(first.goals(), Some((0, 3)));
    assert_eq!(first.winner.as_deref(), Some("AWAY_TEAM"));
}

#[test]
fn unplayed_fixture_keeps_missing_fields() {
    let rows = parse_matches_json(MATCHES_JSON, 2023).expect("fixture should parse");
    let second = &rows[1];
    assert_eq!(second.match_id, 436321);
    assert_eq!(second.status, "TIMED");
    assert_eq!(second.away_team_id, None);
    assert!(!second.has_outcome());
    assert!(!second.is_well_formed());
}

#[test]
fn null_or_empty_payload_is_empty() {
    assert!(parse_matches_json("null", 2020).unwrap().is_empty());
    assert!(parse_matches_json("", 2020).unwrap().is_empty());
    assert!(parse_matches_json(r#"{"matches": null}"#, 2020).unwrap().is_empty());
    assert!(parse_matches_json("{not json", 2020).is_err());
}

#[test]
fn parses_available_seasons() {
    let raw = r#"{
      "code": "PL",
      "seasons": [
        {"startDate": "2024-08-16", "endDate": "2025-05-25"},
        {"startDate": "2023-08-11", "endDate": "2024-05-19"},
        {"startDate": "2023-08-11"},
        {"startDate": null},
        {"startDate": "19"}
      ]
    }"#;
    assert_eq!(parse_available_seasons(raw).unwrap(), vec![2023, 2024]);
    assert!(parse_available_seasons(r#"{"code": "PL"}"#).unwrap().is_empty());
}
