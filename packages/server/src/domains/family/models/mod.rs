pub mod family_link;

pub use family_link::{FamilyLink, FamilyMember};
