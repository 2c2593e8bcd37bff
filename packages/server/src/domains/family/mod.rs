//! Family domain - two-way family links and safety check windows.

pub mod actions;
pub mod models;

pub use models::{FamilyLink, FamilyMember};
