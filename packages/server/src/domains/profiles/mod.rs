//! Profiles domain - the app-side row for each auth user, including the
//! last-seen location and the safety check window.

pub mod actions;
pub mod models;

pub use models::{Profile, SafetyStatus};
