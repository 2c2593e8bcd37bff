// Common types and utilities shared across the application

pub mod errors;
pub mod geo;
pub mod matching;
pub mod pagination;

pub use errors::{ApiError, ApiResult};
pub use geo::{calculate_distance_km, coarsen_coords, validate_coordinates};
pub use matching::{KeywordMatcher, Matchable, ScoredMatch};
pub use pagination::clamp_limit;
