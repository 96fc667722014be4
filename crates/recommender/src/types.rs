//! Result types shared by the recommender stages.

use data_loader::{SongId, UserId};
use serde::{Deserialize, Serialize};

/// Default number of recommendations / preferences returned
pub const DEFAULT_NUM_RECOMMENDATIONS: usize = 5;

/// Floor for the user-similarity denominator
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Tunables for the hybrid recommender
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HybridConfig {
    /// How many songs to return when the caller doesn't say
    pub num_recommendations: usize,
    /// Lower clip applied to `sum(row_u) * sum(user_vector)`
    pub epsilon: f64,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            num_recommendations: DEFAULT_NUM_RECOMMENDATIONS,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl HybridConfig {
    pub fn with_num_recommendations(mut self, k: usize) -> Self {
        self.num_recommendations = k;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }
}

/// A candidate song with the two score components that produced it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredSong {
    pub song_id: SongId,
    /// Total plays of this song by every other user
    pub user_based_score: f64,
    /// Summed similarity to the songs the user already played
    pub item_based_score: f64,
    pub combined_score: f64,
}

impl ScoredSong {
    pub fn new(song_id: SongId, user_based_score: f64, item_based_score: f64) -> Self {
        Self {
            song_id,
            user_based_score,
            item_based_score,
            combined_score: user_based_score + item_based_score,
        }
    }
}

/// Another listener ranked by taste overlap with the target user
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub user_id: UserId,
    pub similarity: f64,
}
