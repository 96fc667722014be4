//! # Recommendation Service
//!
//! Owns the precomputed model for one dataset and answers requests:
//! 1. Build the interaction matrix from the listen history
//! 2. Compute the song similarity matrix
//! 3. Publish both behind `Arc`; from here on they are read-only
//! 4. Per request, run the hybrid recommender on the blocking pool and map
//!    the ranked ids to display records
//!
//! Cloning the service is cheap and every clone shares the same matrices,
//! so concurrent requests need no locking.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use data_loader::{DataIndex, SongId, UserId};
use recommender::{
    HybridConfig, HybridRecommender, InteractionMatrix, Neighbor, ScoredSong, SongSimilarity,
    top_preference_counts,
};

/// A recommended song, ready for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongRecommendation {
    pub song_id: SongId,
    pub title: String,
    pub artist: String,
    pub score: f64,
    pub user_based_score: f64,
    pub item_based_score: f64,
    pub explanation: String,
}

/// One of a user's most played songs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongPreference {
    pub song_id: SongId,
    pub title: String,
    pub artist: String,
    pub listen_count: f64,
}

#[derive(Clone)]
pub struct RecommendationService {
    data_index: Arc<DataIndex>,
    matrix: Arc<InteractionMatrix>,
    similarity: Arc<SongSimilarity>,
    config: HybridConfig,
}

impl RecommendationService {
    /// Build the matrix and similarity for `data_index`.
    ///
    /// The O(songs² · users) similarity pass runs on the blocking pool.
    pub async fn new(data_index: Arc<DataIndex>, config: HybridConfig) -> Result<Self> {
        let start = Instant::now();

        let (matrix, similarity) = tokio::task::spawn_blocking({
            let data_index = data_index.clone();
            move || -> Result<(InteractionMatrix, SongSimilarity)> {
                let matrix = InteractionMatrix::build(data_index.listen_events())
                    .context("Failed to build interaction matrix")?;
                let similarity = SongSimilarity::compute(&matrix);
                Ok((matrix, similarity))
            }
        })
        .await
        .context("Model build task panicked")??;

        info!(
            "Built model: {} users x {} songs in {:.2?}",
            matrix.n_users(),
            matrix.n_songs(),
            start.elapsed()
        );

        Ok(Self {
            data_index,
            matrix: Arc::new(matrix),
            similarity: Arc::new(similarity),
            config,
        })
    }

    pub fn data_index(&self) -> &DataIndex {
        &self.data_index
    }

    pub fn matrix(&self) -> &InteractionMatrix {
        &self.matrix
    }

    pub fn config(&self) -> &HybridConfig {
        &self.config
    }

    /// Main entry point: top `limit` unheard songs for a user, best first.
    ///
    /// An unknown user surfaces as `recommender::RecommendError::UserNotFound`
    /// inside the returned error.
    pub async fn get_recommendations(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<SongRecommendation>> {
        let start_time = Instant::now();

        let scored = tokio::task::spawn_blocking({
            let service = self.clone();
            move || service.score(user_id, limit)
        })
        .await
        .context("Recommendation task panicked")??;

        let recommendations = self.to_recommendations(scored);
        info!(
            "Selected {} recommendations for user {} in {:.2?}",
            recommendations.len(),
            user_id,
            start_time.elapsed()
        );
        Ok(recommendations)
    }

    /// The user's `limit` most played songs
    pub fn get_preferences(&self, user_id: UserId, limit: usize) -> Result<Vec<SongPreference>> {
        let counts = top_preference_counts(user_id, &self.matrix, limit)?;
        Ok(counts
            .into_iter()
            .filter_map(|(song_id, listen_count)| {
                let song = self.data_index.get_song(song_id)?;
                Some(SongPreference {
                    song_id,
                    title: song.title.clone(),
                    artist: song.artist.clone(),
                    listen_count,
                })
            })
            .collect())
    }

    /// The `n` listeners most similar to `user_id`
    pub fn neighbors(&self, user_id: UserId, n: usize) -> Result<Vec<Neighbor>> {
        let mut neighbors = self.recommender()?.rank_neighbors(user_id)?;
        neighbors.truncate(n);
        Ok(neighbors)
    }

    fn recommender(&self) -> Result<HybridRecommender<'_, DataIndex>> {
        Ok(
            HybridRecommender::new(&self.matrix, &self.similarity, &*self.data_index)?
                .with_config(self.config),
        )
    }

    fn score(&self, user_id: UserId, limit: usize) -> Result<Vec<ScoredSong>> {
        Ok(self.recommender()?.recommend(user_id, limit)?)
    }

    fn to_recommendations(&self, scored: Vec<ScoredSong>) -> Vec<SongRecommendation> {
        scored
            .into_iter()
            .filter_map(|s| {
                let song = self.data_index.get_song(s.song_id)?;
                Some(SongRecommendation {
                    song_id: s.song_id,
                    title: song.title.clone(),
                    artist: song.artist.clone(),
                    score: s.combined_score,
                    user_based_score: s.user_based_score,
                    item_based_score: s.item_based_score,
                    explanation: format!(
                        "{:.0} plays by other listeners, similarity {:.2} to your songs",
                        s.user_based_score, s.item_based_score
                    ),
                })
            })
            .collect()
    }
}
