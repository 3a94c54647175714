//! # Last-value caching with delivery grouping.

mod cache;

pub use cache::ParameterCache;
