//! Server crate for the SongRecs recommendation engine.
//!
//! Holds the service that builds the model once and answers concurrent
//! recommendation and preference requests against it.

pub mod service;

pub use service::{RecommendationService, SongPreference, SongRecommendation};
