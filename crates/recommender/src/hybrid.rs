//! Hybrid Recommender
//!
//! Blends user-based and item-based collaborative filtering:
//!
//! ## Algorithm
//! 1. Take the target user's row of the interaction matrix
//! 2. Rank every other user by
//!    `dot(row_u, row_target) / max(sum(row_u) * sum(row_target), epsilon)`,
//!    ties by ascending user id
//! 3. User-based score of a song = its total plays across **all** other
//!    users. The ranking from step 2 fixes the summation order and is
//!    reported for explanations, but does not cut the neighbor set
//! 4. Item-based score of a song = sum of its similarity to every song the
//!    target user has played
//! 5. Combined score = user-based + item-based, for every catalog song
//! 6. Drop songs the user already played (filter pipeline)
//! 7. Sort by combined score descending, ties by ascending song id, keep `k`
//!
//! Catalog songs that nobody ever played have no matrix column and score 0
//! on both components.

use crate::error::{RecommendError, Result};
use crate::filter_pipeline::FilterPipeline;
use crate::filters::AlreadyListenedFilter;
use crate::matrix::InteractionMatrix;
use crate::similarity::SongSimilarity;
use crate::types::{HybridConfig, Neighbor, ScoredSong};
use crate::user_context::{ListeningContext, build_listening_context};
use data_loader::{Song, SongCatalog, UserId};
use tracing::{debug, instrument};

/// Scores and ranks songs for one user at a time.
///
/// Borrows the precomputed matrix and similarity; both are read-only, so a
/// single pair can serve any number of recommenders concurrently.
pub struct HybridRecommender<'a, C: SongCatalog + ?Sized> {
    matrix: &'a InteractionMatrix,
    similarity: &'a SongSimilarity,
    catalog: &'a C,
    config: HybridConfig,
    filters: FilterPipeline,
}

impl<'a, C: SongCatalog + ?Sized> HybridRecommender<'a, C> {
    /// Create a recommender with the default config and the
    /// already-listened filter.
    ///
    /// Fails with `MalformedData` if `similarity` was not computed from a
    /// matrix with the same song columns.
    pub fn new(
        matrix: &'a InteractionMatrix,
        similarity: &'a SongSimilarity,
        catalog: &'a C,
    ) -> Result<Self> {
        if matrix.song_ids() != similarity.song_ids() {
            return Err(RecommendError::MalformedData(format!(
                "similarity matrix covers {} songs but interaction matrix has {}",
                similarity.len(),
                matrix.n_songs()
            )));
        }

        Ok(Self {
            matrix,
            similarity,
            catalog,
            config: HybridConfig::default(),
            filters: FilterPipeline::new().add_filter(AlreadyListenedFilter),
        })
    }

    pub fn with_config(mut self, config: HybridConfig) -> Self {
        self.config = config;
        self
    }

    /// Configure the user-similarity denominator floor (default: 1e-9)
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    pub fn config(&self) -> &HybridConfig {
        &self.config
    }

    /// Top `config.num_recommendations` songs for a user
    pub fn recommend_default(&self, user_id: UserId) -> Result<Vec<ScoredSong>> {
        self.recommend(user_id, self.config.num_recommendations)
    }

    /// Ranked, filtered candidates for `user_id`, at most `k` of them.
    #[instrument(skip(self))]
    pub fn recommend(&self, user_id: UserId, k: usize) -> Result<Vec<ScoredSong>> {
        let context = build_listening_context(self.matrix, user_id)?;
        debug!(
            "User {} has played {} songs ({} plays)",
            user_id,
            context.listened_songs.len(),
            context.total_plays
        );

        let neighbors = self.neighbors(&context);
        let candidates = self.score_candidates(&context, &neighbors);
        let mut remaining = self.filters.apply(candidates, &context)?;

        remaining.sort_by(|a, b| {
            b.combined_score
                .total_cmp(&a.combined_score)
                .then_with(|| a.song_id.cmp(&b.song_id))
        });
        remaining.truncate(k);

        debug!("Returning {} recommendations for user {}", remaining.len(), user_id);
        Ok(remaining)
    }

    /// Like [`recommend`](Self::recommend) but resolved to catalog records,
    /// in rank order.
    pub fn recommend_songs(&self, user_id: UserId, k: usize) -> Result<Vec<Song>> {
        Ok(self
            .recommend(user_id, k)?
            .iter()
            .filter_map(|scored| self.catalog.get_song(scored.song_id).cloned())
            .collect())
    }

    /// Every other user ranked by similarity to `user_id`
    pub fn rank_neighbors(&self, user_id: UserId) -> Result<Vec<Neighbor>> {
        let context = build_listening_context(self.matrix, user_id)?;
        Ok(self.neighbors(&context))
    }

    fn neighbors(&self, context: &ListeningContext) -> Vec<Neighbor> {
        let target = self.matrix.row_at(context.row);

        let mut neighbors: Vec<Neighbor> = self
            .matrix
            .user_ids()
            .iter()
            .enumerate()
            .filter(|(row, _)| *row != context.row)
            .map(|(row, &user_id)| {
                let counts = self.matrix.row_at(row);
                let overlap: f64 = counts.iter().zip(target).map(|(a, b)| a * b).sum();
                let total: f64 = counts.iter().sum();
                let denominator = (total * context.total_plays).max(self.config.epsilon);
                Neighbor {
                    user_id,
                    similarity: overlap / denominator,
                }
            })
            .collect();

        neighbors.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        neighbors
    }

    /// Per-column sum of every neighbor's row, in ranked order
    fn user_based_scores(&self, neighbors: &[Neighbor]) -> Vec<f64> {
        let mut scores = vec![0.0; self.matrix.n_songs()];
        for neighbor in neighbors {
            if let Some(counts) = self.matrix.row(neighbor.user_id) {
                for (score, count) in scores.iter_mut().zip(counts) {
                    *score += count;
                }
            }
        }
        scores
    }

    /// Per-column sum of similarity rows of the songs the user played
    fn item_based_scores(&self, context: &ListeningContext) -> Vec<f64> {
        let mut scores = vec![0.0; self.similarity.len()];
        for &col in &context.listened_columns {
            for (score, sim) in scores.iter_mut().zip(self.similarity.row_at(col)) {
                *score += sim;
            }
        }
        scores
    }

    /// Combined score for every catalog song, before filtering
    fn score_candidates(
        &self,
        context: &ListeningContext,
        neighbors: &[Neighbor],
    ) -> Vec<ScoredSong> {
        let user_based = self.user_based_scores(neighbors);
        let item_based = self.item_based_scores(context);

        self.catalog
            .song_ids()
            .into_iter()
            .map(|song_id| match self.matrix.song_index(song_id) {
                Some(col) => ScoredSong::new(song_id, user_based[col], item_based[col]),
                None => ScoredSong::new(song_id, 0.0, 0.0),
            })
            .collect()
    }
}

/// One-shot hybrid recommendation: the top `k` unheard catalog songs for
/// `user_id`, best first.
pub fn recommend<C: SongCatalog + ?Sized>(
    user_id: UserId,
    matrix: &InteractionMatrix,
    similarity: &SongSimilarity,
    catalog: &C,
    k: usize,
) -> Result<Vec<Song>> {
    HybridRecommender::new(matrix, similarity, catalog)?.recommend_songs(user_id, k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{ListenEvent, SongId};
    use std::collections::HashMap;

    const A: SongId = 1;
    const B: SongId = 2;
    const C: SongId = 3;

    fn catalog(ids: &[SongId]) -> HashMap<SongId, Song> {
        ids.iter()
            .map(|&id| {
                (
                    id,
                    Song {
                        id,
                        title: format!("Song {}", id),
                        artist: "Artist".to_string(),
                    },
                )
            })
            .collect()
    }

    // user1=[5,0,1], user2=[4,0,2], user3=[0,5,0]
    fn example() -> (InteractionMatrix, SongSimilarity, HashMap<SongId, Song>) {
        let matrix = InteractionMatrix::build(&[
            ListenEvent::new(1, A, 5.0),
            ListenEvent::new(1, C, 1.0),
            ListenEvent::new(2, A, 4.0),
            ListenEvent::new(2, C, 2.0),
            ListenEvent::new(3, B, 5.0),
        ])
        .unwrap();
        let similarity = SongSimilarity::compute(&matrix);
        (matrix, similarity, catalog(&[A, B, C]))
    }

    #[test]
    fn test_example_scenario() {
        let (matrix, similarity, catalog) = example();
        let recommender = HybridRecommender::new(&matrix, &similarity, &catalog).unwrap();

        let result = recommender.recommend(1, 2).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].song_id, B);
        assert_eq!(result[0].user_based_score, 5.0);
        assert_eq!(result[0].item_based_score, 0.0);
        assert_eq!(result[0].combined_score, 5.0);

        let songs = recommend(1, &matrix, &similarity, &catalog, 2).unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].id, B);
    }

    #[test]
    fn test_rank_neighbors() {
        let (matrix, similarity, catalog) = example();
        let recommender = HybridRecommender::new(&matrix, &similarity, &catalog).unwrap();

        let neighbors = recommender.rank_neighbors(1).unwrap();
        assert_eq!(neighbors.len(), 2);
        assert_eq!(neighbors[0].user_id, 2);
        // dot([4,0,2],[5,0,1]) / (6 * 6)
        assert!((neighbors[0].similarity - 22.0 / 36.0).abs() < 1e-12);
        assert_eq!(neighbors[1].user_id, 3);
        assert_eq!(neighbors[1].similarity, 0.0);
    }

    #[test]
    fn test_neighbor_ties_by_user_id() {
        let matrix = InteractionMatrix::build(&[
            ListenEvent::new(1, A, 1.0),
            ListenEvent::new(7, B, 1.0),
            ListenEvent::new(4, B, 1.0),
            ListenEvent::new(5, C, 1.0),
        ])
        .unwrap();
        let similarity = SongSimilarity::compute(&matrix);
        let catalog = catalog(&[A, B, C]);
        let recommender = HybridRecommender::new(&matrix, &similarity, &catalog).unwrap();

        let ids: Vec<UserId> = recommender
            .rank_neighbors(1)
            .unwrap()
            .iter()
            .map(|n| n.user_id)
            .collect();
        assert_eq!(ids, vec![4, 5, 7]);
    }

    #[test]
    fn test_user_score_sums_every_neighbor() {
        // user 3 shares nothing with user 1 but still contributes plays
        let matrix = InteractionMatrix::build(&[
            ListenEvent::new(1, A, 3.0),
            ListenEvent::new(2, A, 1.0),
            ListenEvent::new(2, B, 2.0),
            ListenEvent::new(3, B, 10.0),
            ListenEvent::new(3, C, 4.0),
        ])
        .unwrap();
        let similarity = SongSimilarity::compute(&matrix);
        let catalog = catalog(&[A, B, C]);
        let recommender = HybridRecommender::new(&matrix, &similarity, &catalog).unwrap();

        let result = recommender.recommend(1, 5).unwrap();
        let b = result.iter().find(|s| s.song_id == B).unwrap();
        let c = result.iter().find(|s| s.song_id == C).unwrap();
        assert_eq!(b.user_based_score, 12.0);
        assert_eq!(c.user_based_score, 4.0);
    }

    #[test]
    fn test_item_score_sums_listened_similarities() {
        let (matrix, similarity, catalog) = example();
        let recommender = HybridRecommender::new(&matrix, &similarity, &catalog).unwrap();

        // user 3 has played only B; A and C are unrelated to B
        let result = recommender.recommend(3, 5).unwrap();
        assert_eq!(result.len(), 2);
        for scored in &result {
            assert_eq!(scored.item_based_score, 0.0);
        }
        // A: 5 + 4 = 9 plays, C: 1 + 2 = 3
        assert_eq!(result[0].song_id, A);
        assert_eq!(result[0].combined_score, 9.0);
        assert_eq!(result[1].song_id, C);
    }

    #[test]
    fn test_never_returns_listened_songs() {
        let (matrix, similarity, catalog) = example();
        let recommender = HybridRecommender::new(&matrix, &similarity, &catalog).unwrap();

        for &user_id in matrix.user_ids() {
            let row = matrix.row(user_id).unwrap();
            for scored in recommender.recommend(user_id, 10).unwrap() {
                let col = matrix.song_index(scored.song_id).unwrap();
                assert_eq!(row[col], 0.0);
            }
        }
    }

    #[test]
    fn test_everything_listened_is_empty() {
        let matrix = InteractionMatrix::build(&[
            ListenEvent::new(1, A, 1.0),
            ListenEvent::new(1, B, 1.0),
            ListenEvent::new(2, A, 3.0),
        ])
        .unwrap();
        let similarity = SongSimilarity::compute(&matrix);
        let catalog = catalog(&[A, B]);
        let recommender = HybridRecommender::new(&matrix, &similarity, &catalog).unwrap();

        assert!(recommender.recommend(1, 5).unwrap().is_empty());
    }

    #[test]
    fn test_empty_catalog_is_empty() {
        let (matrix, similarity, _) = example();
        let empty: HashMap<SongId, Song> = HashMap::new();
        let recommender = HybridRecommender::new(&matrix, &similarity, &empty).unwrap();

        assert!(recommender.recommend(1, 5).unwrap().is_empty());
    }

    #[test]
    fn test_length_bounded_by_k() {
        let (matrix, similarity, catalog) = example();
        let recommender = HybridRecommender::new(&matrix, &similarity, &catalog).unwrap();

        assert_eq!(recommender.recommend(3, 1).unwrap().len(), 1);
        assert!(recommender.recommend(3, 0).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_user() {
        let (matrix, similarity, catalog) = example();
        let recommender = HybridRecommender::new(&matrix, &similarity, &catalog).unwrap();

        assert_eq!(
            recommender.recommend(42, 5).unwrap_err(),
            RecommendError::UserNotFound { user_id: 42 }
        );
        assert!(recommender.rank_neighbors(42).is_err());
    }

    #[test]
    fn test_unplayed_catalog_song_scores_zero() {
        let (matrix, similarity, catalog_map) = example();
        let mut catalog = catalog_map;
        catalog.extend(self::catalog(&[99]));
        let recommender = HybridRecommender::new(&matrix, &similarity, &catalog).unwrap();

        let result = recommender.recommend(1, 5).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].song_id, B);
        assert_eq!(result[1].song_id, 99);
        assert_eq!(result[1].combined_score, 0.0);
    }

    #[test]
    fn test_idempotent() {
        let (matrix, similarity, catalog) = example();
        let recommender = HybridRecommender::new(&matrix, &similarity, &catalog).unwrap();

        assert_eq!(
            recommender.recommend(3, 5).unwrap(),
            recommender.recommend(3, 5).unwrap()
        );
    }

    #[test]
    fn test_mismatched_similarity_rejected() {
        let (matrix, _, catalog) = example();
        let other = InteractionMatrix::build(&[ListenEvent::new(1, A, 1.0)]).unwrap();
        let similarity = SongSimilarity::compute(&other);

        let err = HybridRecommender::new(&matrix, &similarity, &catalog).err();
        assert!(matches!(err, Some(RecommendError::MalformedData(_))));
    }

    #[test]
    fn test_default_config() {
        let (matrix, similarity, catalog) = example();
        let recommender = HybridRecommender::new(&matrix, &similarity, &catalog)
            .unwrap()
            .with_config(HybridConfig::default().with_num_recommendations(1));

        assert_eq!(recommender.config().num_recommendations, 1);
        assert_eq!(recommender.recommend_default(3).unwrap().len(), 1);
    }
}
