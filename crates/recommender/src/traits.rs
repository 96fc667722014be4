//! Core traits for the candidate filtering stage.

use crate::error::Result;
use crate::types::ScoredSong;
use crate::user_context::ListeningContext;

/// A stage that removes scored candidates.
///
/// Filters take ownership of the candidate list and hand back what
/// survives, so a pipeline can chain them without cloning.
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging)
    fn name(&self) -> &str;

    /// Apply this filter to a set of candidates
    fn apply(
        &self,
        candidates: Vec<ScoredSong>,
        context: &ListeningContext,
    ) -> Result<Vec<ScoredSong>>;
}
