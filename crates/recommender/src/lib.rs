//! # Recommender Crate
//!
//! Hybrid collaborative filtering over a listening history.
//!
//! ## Components
//!
//! ### Interaction Matrix
//! Dense user × song table of listen counts built from raw listen events
//! (duplicate pairs summed).
//!
//! ### Song Similarity
//! Symmetric song × song cosine similarity over the matrix columns.
//!
//! ### Hybrid Recommender
//! Plays of every other user (user-based) plus similarity to the songs the
//! user already played (item-based), filtered and ranked.
//!
//! ### Preferences
//! A user's most-played songs.
//!
//! ## Example Usage
//!
//! ```ignore
//! use recommender::{HybridRecommender, InteractionMatrix, SongSimilarity};
//!
//! let matrix = InteractionMatrix::build(data_index.listen_events())?;
//! let similarity = SongSimilarity::compute(&matrix);
//!
//! let recommender = HybridRecommender::new(&matrix, &similarity, &*data_index)?;
//! let songs = recommender.recommend_songs(user_id, 5)?;
//! ```
//!
//! Build the matrix and similarity once, then share them read-only; every
//! operation here is a pure function of its inputs.

pub mod error;
pub mod types;
pub mod matrix;
pub mod similarity;
pub mod user_context;
pub mod traits;
pub mod filters;
pub mod filter_pipeline;
pub mod hybrid;
pub mod preferences;

pub use error::{RecommendError, Result};
pub use filter_pipeline::FilterPipeline;
pub use hybrid::{HybridRecommender, recommend};
pub use matrix::InteractionMatrix;
pub use preferences::{top_preference_counts, top_preferences};
pub use similarity::{SongSimilarity, cosine_similarity};
pub use traits::Filter;
pub use types::{DEFAULT_EPSILON, DEFAULT_NUM_RECOMMENDATIONS, HybridConfig, Neighbor, ScoredSong};
pub use user_context::{ListeningContext, build_listening_context};
