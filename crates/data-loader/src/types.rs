//! Core domain types for the listening-history dataset.
//!
//! The loader keeps the three raw tables (users, songs, listen events) and a
//! couple of lookup indices. Everything derived from them (interaction
//! matrix, similarities) lives in the `recommender` crate.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for a song
pub type SongId = u32;

// =============================================================================
// Entities
// =============================================================================

/// A listener. The recommender only needs the id; any other columns in
/// `user.csv` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
}

/// A song in the catalog. Immutable reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub artist: String,
}

/// Aggregate play count of one song by one user.
///
/// The same `(user_id, song_id)` pair may appear more than once in the raw
/// history; consumers sum the counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ListenEvent {
    pub user_id: UserId,
    pub song_id: SongId,
    /// Non-negative number of plays
    pub listen_count: f64,
}

impl ListenEvent {
    pub fn new(user_id: UserId, song_id: SongId, listen_count: f64) -> Self {
        Self {
            user_id,
            song_id,
            listen_count,
        }
    }
}

// =============================================================================
// Song catalog abstraction
// =============================================================================

/// Read-only lookup of song records by id.
///
/// The recommender resolves ranked ids through this trait so it does not
/// depend on how the catalog was loaded.
pub trait SongCatalog {
    /// Look up a single song
    fn get_song(&self, id: SongId) -> Option<&Song>;

    /// All song ids in the catalog, ascending
    fn song_ids(&self) -> Vec<SongId>;
}

impl SongCatalog for HashMap<SongId, Song> {
    fn get_song(&self, id: SongId) -> Option<&Song> {
        self.get(&id)
    }

    fn song_ids(&self) -> Vec<SongId> {
        let mut ids: Vec<SongId> = self.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

// =============================================================================
// DataIndex - in-memory dataset
// =============================================================================

/// Holds the loaded tables plus lookup indices.
#[derive(Debug, Default)]
pub struct DataIndex {
    pub(crate) users: HashMap<UserId, User>,
    pub(crate) songs: HashMap<SongId, Song>,

    /// Raw listen history in file order
    pub(crate) listen_events: Vec<ListenEvent>,
    /// Listen events grouped by user
    pub(crate) user_events: HashMap<UserId, Vec<ListenEvent>>,

    /// Song ids that were inserted twice with different metadata.
    /// Reported by `validate`.
    pub(crate) song_conflicts: Vec<SongId>,
    /// User ids that were inserted more than once
    pub(crate) user_duplicates: Vec<UserId>,
}

impl DataIndex {
    /// Creates a new, empty DataIndex
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a user by ID
    pub fn get_user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    /// Get a song by ID
    pub fn get_song(&self, id: SongId) -> Option<&Song> {
        self.songs.get(&id)
    }

    /// All listen events of a user (empty slice if none)
    pub fn get_user_events(&self, user_id: UserId) -> &[ListenEvent] {
        self.user_events
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// The full listen history, in insertion order
    pub fn listen_events(&self) -> &[ListenEvent] {
        &self.listen_events
    }

    /// All songs, ordered by id
    pub fn songs(&self) -> Vec<&Song> {
        let mut songs: Vec<&Song> = self.songs.values().collect();
        songs.sort_unstable_by_key(|s| s.id);
        songs
    }

    /// All user ids, ascending
    pub fn get_all_user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.users.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Case-insensitive substring search over title and artist.
    ///
    /// Exact title matches come first, then the rest by id.
    pub fn search_songs(&self, query: &str) -> Vec<&Song> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<(u8, &Song)> = self
            .songs
            .values()
            .filter_map(|song| {
                let title = song.title.to_lowercase();
                if title == needle {
                    Some((0, song))
                } else if title.contains(&needle) || song.artist.to_lowercase().contains(&needle) {
                    Some((1, song))
                } else {
                    None
                }
            })
            .collect();

        matches.sort_unstable_by_key(|(rank, song)| (*rank, song.id));
        matches.into_iter().map(|(_, song)| song).collect()
    }

    /// Insert a user into the index.
    ///
    /// A repeated id keeps the first record and is remembered for `validate`.
    pub fn insert_user(&mut self, user: User) {
        if self.users.contains_key(&user.id) {
            self.user_duplicates.push(user.id);
        } else {
            self.users.insert(user.id, user);
        }
    }

    /// Insert a song into the index.
    ///
    /// Re-inserting an identical record is a no-op. A second record with
    /// the same id but a different title or artist keeps the first one and
    /// is remembered as a conflict.
    pub fn insert_song(&mut self, song: Song) {
        match self.songs.get(&song.id) {
            Some(existing) if *existing == song => {}
            Some(_) => self.song_conflicts.push(song.id),
            None => {
                self.songs.insert(song.id, song);
            }
        }
    }

    /// Insert a listen event and update the per-user index
    pub fn insert_listen_event(&mut self, event: ListenEvent) {
        self.listen_events.push(event);
        self.user_events
            .entry(event.user_id)
            .or_default()
            .push(event);
    }

    /// (users, songs, listen events)
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.users.len(), self.songs.len(), self.listen_events.len())
    }
}

impl SongCatalog for DataIndex {
    fn get_song(&self, id: SongId) -> Option<&Song> {
        self.songs.get(&id)
    }

    fn song_ids(&self) -> Vec<SongId> {
        let mut ids: Vec<SongId> = self.songs.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
