//! The FilterPipeline chains filters in insertion order.

use crate::error::Result;
use crate::traits::Filter;
use crate::types::ScoredSong;
use crate::user_context::ListeningContext;

/// Chains multiple filters together into a processing pipeline.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new().add_filter(AlreadyListenedFilter);
/// let remaining = pipeline.apply(candidates, &context)?;
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    /// Create a new empty FilterPipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the end of the pipeline (builder pattern).
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Apply all filters in sequence; the first failing filter aborts.
    pub fn apply(
        &self,
        candidates: Vec<ScoredSong>,
        context: &ListeningContext,
    ) -> Result<Vec<ScoredSong>> {
        let mut current = candidates;
        for filter in &self.filters {
            let before = current.len();
            current = filter.apply(current, context)?;
            tracing::debug!(
                "Filter applied: {} ({} -> {} candidates)",
                filter.name(),
                before,
                current.len()
            );
        }
        Ok(current)
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecommendError;
    use crate::filters::AlreadyListenedFilter;

    struct RejectAll;

    impl Filter for RejectAll {
        fn name(&self) -> &str {
            "RejectAll"
        }

        fn apply(
            &self,
            _candidates: Vec<ScoredSong>,
            _context: &ListeningContext,
        ) -> Result<Vec<ScoredSong>> {
            Err(RecommendError::MalformedData("rejected".to_string()))
        }
    }

    fn candidates() -> Vec<ScoredSong> {
        vec![ScoredSong::new(1, 2.0, 0.5), ScoredSong::new(2, 1.0, 0.0)]
    }

    #[test]
    fn test_empty_pipeline() {
        let pipeline = FilterPipeline::new();
        assert!(pipeline.is_empty());

        let filtered = pipeline.apply(candidates(), &ListeningContext::new(1)).unwrap();
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_single_filter() {
        let mut context = ListeningContext::new(1);
        context.listened_songs.insert(1);

        let pipeline = FilterPipeline::new().add_filter(AlreadyListenedFilter);
        let filtered = pipeline.apply(candidates(), &context).unwrap();

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].song_id, 2);
    }

    #[test]
    fn test_failing_filter_aborts() {
        let pipeline = FilterPipeline::new()
            .add_filter(AlreadyListenedFilter)
            .add_filter(RejectAll);
        assert_eq!(pipeline.len(), 2);
        assert!(pipeline.apply(candidates(), &ListeningContext::new(1)).is_err());
    }
}
