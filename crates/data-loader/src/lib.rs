//! # Data Loader Crate
//!
//! Loads the listening-history dataset (users, songs, listen events) from
//! CSV files into an in-memory [`DataIndex`].
//!
//! ## Main Components
//!
//! - **types**: Core domain types (User, Song, ListenEvent, DataIndex, SongCatalog)
//! - **parser**: Parse CSV files into Rust structs
//! - **index**: Load, insert and validate
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::DataIndex;
//! use std::path::Path;
//!
//! let index = DataIndex::load_from_files(Path::new("data"))?;
//! let song = index.get_song(1).unwrap();
//! println!("{} by {}", song.title, song.artist);
//! ```

pub mod error;
pub mod types;
pub mod parser;
pub mod index;

pub use error::{DataLoadError, Result};
pub use types::{DataIndex, ListenEvent, Song, SongCatalog, SongId, User, UserId};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_index_creation() {
        let index = DataIndex::new();
        assert_eq!(index.counts(), (0, 0, 0));
    }

    #[test]
    fn test_insert_song() {
        let mut index = DataIndex::new();
        index.insert_song(Song {
            id: 1,
            title: "Yesterday".to_string(),
            artist: "The Beatles".to_string(),
        });

        let retrieved = index.get_song(1).unwrap();
        assert_eq!(retrieved.title, "Yesterday");
        assert_eq!(SongCatalog::song_ids(&index), vec![1]);
    }

    #[test]
    fn test_insert_listen_event() {
        let mut index = DataIndex::new();
        index.insert_listen_event(ListenEvent::new(1, 1193, 4.0));

        let events = index.get_user_events(1);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].listen_count, 4.0);
        assert_eq!(index.listen_events().len(), 1);
    }

    #[test]
    fn test_empty_queries() {
        let index = DataIndex::new();

        assert!(index.get_user(999).is_none());
        assert!(index.get_song(999).is_none());
        assert!(index.get_user_events(999).is_empty());
        assert!(index.search_songs("anything").is_empty());
    }

    #[test]
    fn test_search_songs() {
        let mut index = DataIndex::new();
        for (id, title, artist) in [
            (1, "Help!", "The Beatles"),
            (2, "Help Me", "Joni Mitchell"),
            (3, "Helpless", "Neil Young"),
            (4, "Dancing Queen", "ABBA"),
        ] {
            index.insert_song(Song {
                id,
                title: title.to_string(),
                artist: artist.to_string(),
            });
        }

        let ids: Vec<SongId> = index.search_songs("help me").iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2]);

        let ids: Vec<SongId> = index.search_songs("HELP").iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let ids: Vec<SongId> = index.search_songs("abba").iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![4]);
    }

    #[test]
    fn test_hashmap_catalog() {
        let mut catalog = std::collections::HashMap::new();
        for id in [3, 1, 2] {
            catalog.insert(
                id,
                Song {
                    id,
                    title: format!("Song {}", id),
                    artist: "X".to_string(),
                },
            );
        }
        assert_eq!(catalog.song_ids(), vec![1, 2, 3]);
        assert_eq!(SongCatalog::get_song(&catalog, 2).unwrap().title, "Song 2");
    }
}
