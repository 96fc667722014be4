//! Per-request view of the target user's listening history.
//!
//! Gathered once up front so the scoring stages and filters don't repeat
//! matrix lookups.

use crate::error::{RecommendError, Result};
use crate::matrix::InteractionMatrix;
use data_loader::{SongId, UserId};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct ListeningContext {
    pub user_id: UserId,
    /// Matrix row index of the user
    pub row: usize,
    /// Songs with a positive listen count
    pub listened_songs: HashSet<SongId>,
    /// Column indices of `listened_songs`, ascending
    pub listened_columns: Vec<usize>,
    /// Sum of the user's row
    pub total_plays: f64,
}

impl ListeningContext {
    /// Context with no history; handy for exercising filters in isolation
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            row: 0,
            listened_songs: HashSet::new(),
            listened_columns: Vec::new(),
            total_plays: 0.0,
        }
    }

    pub fn has_listened(&self, song_id: SongId) -> bool {
        self.listened_songs.contains(&song_id)
    }
}

/// Build a ListeningContext for `user_id` from the interaction matrix.
///
/// Fails with `UserNotFound` when the user has no row.
pub fn build_listening_context(
    matrix: &InteractionMatrix,
    user_id: UserId,
) -> Result<ListeningContext> {
    let row = matrix
        .user_index(user_id)
        .ok_or(RecommendError::UserNotFound { user_id })?;
    let counts = matrix.row_at(row);

    let listened_columns: Vec<usize> = counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0.0)
        .map(|(col, _)| col)
        .collect();
    let listened_songs = listened_columns
        .iter()
        .map(|&col| matrix.song_ids()[col])
        .collect();

    Ok(ListeningContext {
        user_id,
        row,
        listened_songs,
        listened_columns,
        total_plays: counts.iter().sum(),
    })
}
