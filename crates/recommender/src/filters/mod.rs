//! Filter implementations for the candidate pipeline.

pub mod already_listened;

pub use already_listened::AlreadyListenedFilter;
