//! DataIndex loading and validation.
//!
//! Loading is parse → insert → validate. Validation rejects anything the
//! recommender would otherwise have to guess about (negative counts,
//! conflicting song metadata, dangling references), so downstream code can
//! trust the tables it is handed.

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use std::collections::HashSet;
use std::path::Path;

impl DataIndex {
    /// Load the dataset from a directory containing `user.csv`,
    /// `songs.csv` and `listen_history.csv`.
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        let users_path = data_dir.join(parser::USERS_FILE);
        let songs_path = data_dir.join(parser::SONGS_FILE);
        let history_path = data_dir.join(parser::LISTEN_HISTORY_FILE);

        // Three-way parallel parse: nest two rayon joins
        let ((users, songs), events) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_users(&users_path),
                    || parser::parse_songs(&songs_path),
                )
            },
            || parser::parse_listen_events(&history_path),
        );

        let users = users?;
        let songs = songs?;
        let events = events?;

        let index = Self::from_parts(users, songs, events)?;
        let (users, songs, events) = index.counts();
        tracing::info!(users, songs, events, dir = %data_dir.display(), "dataset loaded");
        Ok(index)
    }

    /// Build and validate an index from already-parsed tables
    pub fn from_parts(
        users: Vec<User>,
        songs: Vec<Song>,
        events: Vec<ListenEvent>,
    ) -> Result<Self> {
        let mut index = DataIndex::new();
        for user in users {
            index.insert_user(user);
        }
        for song in songs {
            index.insert_song(song);
        }
        for event in events {
            index.insert_listen_event(event);
        }
        index.validate()?;
        Ok(index)
    }

    /// Validate data integrity
    ///
    /// Checks that:
    /// - no user id appears twice
    /// - no song id was loaded twice with different title/artist
    /// - every listen count is finite and non-negative
    /// - every listen event references a known user and a known song
    pub fn validate(&self) -> Result<()> {
        if let Some(&user_id) = self.user_duplicates.first() {
            return Err(DataLoadError::ValidationError(format!(
                "user {} appears more than once",
                user_id
            )));
        }

        if let Some(&song_id) = self.song_conflicts.first() {
            return Err(DataLoadError::ValidationError(format!(
                "song {} appears more than once with conflicting metadata",
                song_id
            )));
        }

        for event in &self.listen_events {
            if !event.listen_count.is_finite() || event.listen_count < 0.0 {
                return Err(DataLoadError::InvalidValue {
                    field: "listen_count".to_string(),
                    value: event.listen_count.to_string(),
                });
            }
            if !self.users.contains_key(&event.user_id) {
                return Err(DataLoadError::MissingReference {
                    entity: "User".to_string(),
                    id: event.user_id,
                });
            }
            if !self.songs.contains_key(&event.song_id) {
                return Err(DataLoadError::MissingReference {
                    entity: "Song".to_string(),
                    id: event.song_id,
                });
            }
        }

        let duplicates = self.count_duplicate_pairs();
        if duplicates > 0 {
            tracing::debug!(duplicates, "duplicate (user, song) pairs will be summed");
        }
        Ok(())
    }

    /// Number of listen events whose (user, song) pair was already seen
    pub fn count_duplicate_pairs(&self) -> usize {
        let mut seen = HashSet::with_capacity(self.listen_events.len());
        self.listen_events
            .iter()
            .filter(|e| !seen.insert((e.user_id, e.song_id)))
            .count()
    }
}
