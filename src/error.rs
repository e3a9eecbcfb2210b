use thiserror::Error;

/// Structural failures that abort a pipeline run.
///
/// Data-quality problems (malformed records, missing scores, join misses) are
/// never reported here; they are counted in [`crate::pipeline::RunSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("duplicate team event for team {team_id} in match {match_id}")]
    DuplicateTeamEvent { team_id: u32, match_id: u64 },
    #[error("match {match_id} appears in more than one record")]
    DuplicateMatch { match_id: u64 },
    #[error("form window must be at least 1 (got {0})")]
    InvalidWindow(usize),
}
