//! Filter to remove songs the user has already played.

use crate::error::Result;
use crate::traits::Filter;
use crate::types::ScoredSong;
use crate::user_context::ListeningContext;

/// Removes candidates with a positive listen count for the target user.
///
/// Uses the HashSet in `ListeningContext::listened_songs` for O(1) lookups.
pub struct AlreadyListenedFilter;

impl Filter for AlreadyListenedFilter {
    fn name(&self) -> &str {
        "AlreadyListenedFilter"
    }

    fn apply(
        &self,
        candidates: Vec<ScoredSong>,
        context: &ListeningContext,
    ) -> Result<Vec<ScoredSong>> {
        Ok(candidates
            .into_iter()
            .filter(|candidate| !context.has_listened(candidate.song_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_listened_filter() {
        let mut context = ListeningContext::new(1);
        context.listened_songs.insert(100);
        context.listened_songs.insert(200);

        let candidates = vec![
            ScoredSong::new(100, 9.0, 1.0),
            ScoredSong::new(101, 8.0, 0.0),
            ScoredSong::new(200, 7.0, 0.0),
            ScoredSong::new(300, 6.0, 0.0),
        ];

        let filtered = AlreadyListenedFilter.apply(candidates, &context).unwrap();

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].song_id, 101);
        assert_eq!(filtered[1].song_id, 300);
    }
}
