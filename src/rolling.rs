use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::events::{Contribution, TeamEvent};

pub const FORM_WINDOW: usize = 5;

/// Sums over the events strictly before a given event, within one team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormWindow {
    pub points: i64,
    pub goals_for: i64,
    pub goals_against: i64,
}

impl FormWindow {
    fn add(&mut self, c: Contribution) {
        self.points += c.points;
        self.goals_for += c.goals_for;
        self.goals_against += c.goals_against;
    }

    fn sub(&mut self, c: Contribution) {
        self.points -= c.points;
        self.goals_for -= c.goals_for;
        self.goals_against -= c.goals_against;
    }
}

/// A team event together with the form it carried into that match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamForm {
    pub event: TeamEvent,
    pub window: FormWindow,
}

impl TeamForm {
    pub fn team_id(&self) -> u32 {
        self.event.team_id
    }

    pub fn match_id(&self) -> u64 {
        self.event.match_id
    }

    pub fn event_timestamp(&self) -> DateTime<Utc> {
        self.event.event_timestamp
    }
}

/// Computes the trailing `window`-match form for every event.
///
/// Within a team, events are ordered by `(event_timestamp, match_id)`. The
/// form at position `i` sums positions `max(0, i - window)..i`; position `i`
/// itself is never read, so a team's first event is all zero and a team with
/// fewer than `window` predecessors gets the sum of those it has.
///
/// Output order is `(team_id, event_timestamp, match_id)` regardless of input
/// order.
pub fn compute_team_form(
    events: &[TeamEvent],
    window: usize,
) -> Result<Vec<TeamForm>, PipelineError> {
    if window == 0 {
        return Err(PipelineError::InvalidWindow(window));
    }

    let mut partitions: HashMap<u32, Vec<&TeamEvent>> = HashMap::new();
    for event in events {
        partitions.entry(event.team_id).or_default().push(event);
    }

    let mut partitions = partitions.into_iter().collect::<Vec<_>>();
    partitions.sort_unstable_by_key(|(team_id, _)| *team_id);

    let per_team = partitions
        .into_par_iter()
        .map(|(_, team_events)| rolling_for_team(team_events, window))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(per_team.into_iter().flatten().collect())
}

fn rolling_for_team(
    mut team_events: Vec<&TeamEvent>,
    window: usize,
) -> Result<Vec<TeamForm>, PipelineError> {
    let mut seen = HashSet::with_capacity(team_events.len());
    for event in &team_events {
        if !seen.insert(event.match_id) {
            return Err(PipelineError::DuplicateTeamEvent {
                team_id: event.team_id,
                match_id: event.match_id,
            });
        }
    }

    team_events.sort_by(|a, b| {
        a.event_timestamp
            .cmp(&b.event_timestamp)
            .then(a.match_id.cmp(&b.match_id))
    });

    let mut trailing: VecDeque<Contribution> = VecDeque::with_capacity(window);
    let mut running = FormWindow::default();
    let mut out = Vec::with_capacity(team_events.len());

    for event in team_events {
        out.push(TeamForm {
            event: event.clone(),
            window: running,
        });

        let contribution = event.contribution();
        running.add(contribution);
        trailing.push_back(contribution);
        if trailing.len() > window
            && let Some(expired) = trailing.pop_front()
        {
            running.sub(expired);
        }
    }

    Ok(out)
}
