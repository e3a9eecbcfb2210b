use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::events::derive_team_events;
use crate::join::{FeatureStore, TrainingRow, build_training_rows};
use crate::label::OutcomeLabel;
use crate::records::MatchRecord;
use crate::rolling::{TeamForm, compute_team_form};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub records_in: usize,
    pub dropped_malformed: usize,
    pub incomplete_outcomes: usize,
    pub not_finished: usize,
    pub team_events: usize,
    pub join_misses: usize,
    pub training_rows: usize,
    /// Indexed by [`OutcomeLabel::class`].
    pub label_counts: [usize; 3],
}

impl RunSummary {
    pub fn label_count(&self, label: OutcomeLabel) -> usize {
        self.label_counts[label.class() as usize]
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Records in: {}", self.records_in)?;
        writeln!(f, "Dropped (malformed): {}", self.dropped_malformed)?;
        writeln!(f, "Incomplete outcomes: {}", self.incomplete_outcomes)?;
        writeln!(f, "Scored but not finished: {}", self.not_finished)?;
        writeln!(f, "Team events: {}", self.team_events)?;
        writeln!(f, "Join misses (zero-filled): {}", self.join_misses)?;
        writeln!(f, "Training rows: {}", self.training_rows)?;
        write!(
            f,
            "Labels: {}={} {}={} {}={}",
            OutcomeLabel::HomeWin.name(),
            self.label_count(OutcomeLabel::HomeWin),
            OutcomeLabel::Draw.name(),
            self.label_count(OutcomeLabel::Draw),
            OutcomeLabel::AwayWin.name(),
            self.label_count(OutcomeLabel::AwayWin),
        )
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub team_form: Vec<TeamForm>,
    pub training_rows: Vec<TrainingRow>,
    pub summary: RunSummary,
}

/// Fixtures in, leakage-free training table out.
///
/// Malformed records, unknown scores and join misses are counted in the
/// summary; only structural problems (a repeated match, duplicate team
/// events, a zero window) abort the run.
pub fn run_pipeline(
    records: &[MatchRecord],
    cfg: &PipelineConfig,
) -> Result<PipelineOutput, PipelineError> {
    ensure_unique_matches(records)?;
    let derived = derive_team_events(records);
    log::info!(
        "derived {} team events from {} records ({} malformed, {} without score)",
        derived.events.len(),
        records.len(),
        derived.dropped_malformed,
        derived.incomplete_outcomes
    );

    let team_form = compute_team_form(&derived.events, cfg.window)?;
    let store = FeatureStore::from_form(&team_form);
    log::info!("indexed {} form vectors", store.len());
    let joined = build_training_rows(records, &store, &cfg.finished_status);
    if joined.join_misses > 0 {
        log::warn!("{} fixture sides were zero-filled", joined.join_misses);
    }

    let mut label_counts = [0usize; 3];
    for row in &joined.rows {
        label_counts[row.label.class() as usize] += 1;
    }

    let summary = RunSummary {
        records_in: records.len(),
        dropped_malformed: derived.dropped_malformed,
        incomplete_outcomes: derived.incomplete_outcomes,
        not_finished: joined.not_finished,
        team_events: team_form.len(),
        join_misses: joined.join_misses,
        training_rows: joined.rows.len(),
        label_counts,
    };

    Ok(PipelineOutput {
        team_form,
        training_rows: joined.rows,
        summary,
    })
}

/// Every well-formed record must carry its own `match_id`. Malformed records
/// never reach the event stream, so their ids are not checked.
fn ensure_unique_matches(records: &[MatchRecord]) -> Result<(), PipelineError> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records.iter().filter(|r| r.is_well_formed()) {
        if !seen.insert(record.match_id) {
            return Err(PipelineError::DuplicateMatch {
                match_id: record.match_id,
            });
        }
    }
    Ok(())
}
