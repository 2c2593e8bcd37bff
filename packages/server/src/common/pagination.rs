//! Limit handling for list endpoints.

/// Clamp a caller-supplied page size to `1..=max`, using `default` when absent.
pub fn clamp_limit(requested: Option<i64>, default: i64, max: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, max)
}
