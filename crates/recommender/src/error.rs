//! Error types for the recommender crate.

use data_loader::UserId;
use thiserror::Error;

/// Failures of the recommendation core.
///
/// A zero-vector song column is not an error: its similarity is simply 0.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecommendError {
    /// The user id is not a row of the interaction matrix
    #[error("User {user_id} not found in the data")]
    UserNotFound { user_id: UserId },

    /// Input rejected before any computation started
    #[error("Malformed data: {0}")]
    MalformedData(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, RecommendError>;
