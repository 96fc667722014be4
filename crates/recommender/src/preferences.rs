//! User Preference View: a user's most-played songs.

use crate::error::{RecommendError, Result};
use crate::matrix::InteractionMatrix;
use data_loader::{Song, SongCatalog, SongId, UserId};

/// The `k` songs `user_id` played most, with their counts.
///
/// Every matrix column is a candidate, so a user with fewer than `k` played
/// songs is padded with zero-count songs. Ties keep column order (ascending
/// song id).
pub fn top_preference_counts(
    user_id: UserId,
    matrix: &InteractionMatrix,
    k: usize,
) -> Result<Vec<(SongId, f64)>> {
    let row = matrix
        .row(user_id)
        .ok_or(RecommendError::UserNotFound { user_id })?;

    let mut counts: Vec<(SongId, f64)> = matrix
        .song_ids()
        .iter()
        .copied()
        .zip(row.iter().copied())
        .collect();

    // stable: equal counts stay in column order
    counts.sort_by(|a, b| b.1.total_cmp(&a.1));
    counts.truncate(k);
    Ok(counts)
}

/// Same as [`top_preference_counts`], resolved to catalog records.
/// Songs missing from the catalog are skipped.
pub fn top_preferences<C: SongCatalog + ?Sized>(
    user_id: UserId,
    matrix: &InteractionMatrix,
    catalog: &C,
    k: usize,
) -> Result<Vec<Song>> {
    Ok(top_preference_counts(user_id, matrix, k)?
        .into_iter()
        .filter_map(|(song_id, _)| catalog.get_song(song_id).cloned())
        .collect())
}
