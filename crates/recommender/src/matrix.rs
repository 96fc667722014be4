//! User × song interaction matrix.
//!
//! Dense, row-major table of listen counts. Rows are every distinct user id
//! seen in the listen history, columns every distinct song id, both in
//! ascending id order. Ids are usually sparse, so label lookups go through
//! hash maps rather than positional arithmetic.

use crate::error::{RecommendError, Result};
use data_loader::{ListenEvent, SongId, UserId};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionMatrix {
    user_ids: Vec<UserId>,
    song_ids: Vec<SongId>,
    user_index: HashMap<UserId, usize>,
    song_index: HashMap<SongId, usize>,
    /// `user_ids.len() * song_ids.len()` counts, row-major
    counts: Vec<f64>,
}

impl InteractionMatrix {
    /// Build the matrix from raw listen events.
    ///
    /// Repeated `(user, song)` pairs are summed. Negative or non-finite
    /// counts are rejected before anything is allocated.
    pub fn build(events: &[ListenEvent]) -> Result<Self> {
        if let Some(bad) = events
            .iter()
            .find(|e| !e.listen_count.is_finite() || e.listen_count < 0.0)
        {
            return Err(RecommendError::MalformedData(format!(
                "listen count {} for user {} / song {} is not a non-negative number",
                bad.listen_count, bad.user_id, bad.song_id
            )));
        }

        let user_ids: Vec<UserId> = events
            .iter()
            .map(|e| e.user_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let song_ids: Vec<SongId> = events
            .iter()
            .map(|e| e.song_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let user_index: HashMap<UserId, usize> =
            user_ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        let song_index: HashMap<SongId, usize> =
            song_ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let n_songs = song_ids.len();
        let mut counts = vec![0.0; user_ids.len() * n_songs];
        for event in events {
            let row = user_index[&event.user_id];
            let col = song_index[&event.song_id];
            counts[row * n_songs + col] += event.listen_count;
        }

        let matrix = Self {
            user_ids,
            song_ids,
            user_index,
            song_index,
            counts,
        };
        debug!(
            users = matrix.n_users(),
            songs = matrix.n_songs(),
            nonzero = matrix.counts.iter().filter(|&&c| c > 0.0).count(),
            "built interaction matrix"
        );
        Ok(matrix)
    }

    pub fn n_users(&self) -> usize {
        self.user_ids.len()
    }

    pub fn n_songs(&self) -> usize {
        self.song_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Row labels, ascending
    pub fn user_ids(&self) -> &[UserId] {
        &self.user_ids
    }

    /// Column labels, ascending
    pub fn song_ids(&self) -> &[SongId] {
        &self.song_ids
    }

    pub fn user_index(&self, user_id: UserId) -> Option<usize> {
        self.user_index.get(&user_id).copied()
    }

    pub fn song_index(&self, song_id: SongId) -> Option<usize> {
        self.song_index.get(&song_id).copied()
    }

    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.user_index.contains_key(&user_id)
    }

    /// Listen counts of one user, indexed like `song_ids()`
    pub fn row(&self, user_id: UserId) -> Option<&[f64]> {
        self.user_index(user_id).map(|idx| self.row_at(idx))
    }

    /// Panics if `idx >= n_users()`
    pub fn row_at(&self, idx: usize) -> &[f64] {
        let n = self.n_songs();
        &self.counts[idx * n..(idx + 1) * n]
    }

    /// Listen counts of the song at column `idx` across all users
    pub fn column(&self, idx: usize) -> Vec<f64> {
        (0..self.n_users()).map(|row| self.row_at(row)[idx]).collect()
    }

    /// Count for a `(user, song)` pair; 0 for pairs that never occurred,
    /// `None` if either id is not in the matrix at all.
    pub fn get(&self, user_id: UserId, song_id: SongId) -> Option<f64> {
        let row = self.user_index(user_id)?;
        let col = self.song_index(song_id)?;
        Some(self.row_at(row)[col])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events() -> Vec<ListenEvent> {
        vec![
            ListenEvent::new(3, 20, 5.0),
            ListenEvent::new(1, 10, 5.0),
            ListenEvent::new(1, 30, 1.0),
            ListenEvent::new(2, 10, 4.0),
        ]
    }

    #[test]
    fn test_build_labels_sorted() {
        let matrix = InteractionMatrix::build(&events()).unwrap();

        assert_eq!(matrix.user_ids(), &[1, 2, 3]);
        assert_eq!(matrix.song_ids(), &[10, 20, 30]);
        assert_eq!(matrix.n_users(), 3);
        assert_eq!(matrix.n_songs(), 3);
    }

    #[test]
    fn test_missing_pairs_are_zero() {
        let matrix = InteractionMatrix::build(&events()).unwrap();

        assert_eq!(matrix.row(1).unwrap(), &[5.0, 0.0, 1.0]);
        assert_eq!(matrix.row(3).unwrap(), &[0.0, 5.0, 0.0]);
        assert_eq!(matrix.get(2, 30), Some(0.0));
        assert_eq!(matrix.get(9, 30), None);
        assert_eq!(matrix.column(0), vec![5.0, 4.0, 0.0]);
    }

    #[test]
    fn test_duplicate_pairs_are_summed() {
        let events = vec![ListenEvent::new(1, 10, 2.0), ListenEvent::new(1, 10, 3.0)];
        let matrix = InteractionMatrix::build(&events).unwrap();

        assert_eq!(matrix.n_songs(), 1);
        assert_eq!(matrix.get(1, 10), Some(5.0));
    }

    #[test]
    fn test_negative_count_rejected() {
        let events = vec![ListenEvent::new(1, 10, 2.0), ListenEvent::new(1, 11, -1.0)];
        let err = InteractionMatrix::build(&events).unwrap_err();
        assert!(matches!(err, RecommendError::MalformedData(_)));
    }

    #[test]
    fn test_infinite_count_rejected() {
        let events = vec![ListenEvent::new(1, 10, f64::INFINITY)];
        assert!(InteractionMatrix::build(&events).is_err());
    }

    #[test]
    fn test_empty_events() {
        let matrix = InteractionMatrix::build(&[]).unwrap();
        assert!(matrix.is_empty());
        assert!(matrix.row(1).is_none());
    }
}
