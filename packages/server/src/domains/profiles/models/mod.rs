pub mod profile;

pub use profile::{Profile, SafetyStatus};
