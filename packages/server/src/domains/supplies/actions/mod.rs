pub mod aggregate;
pub mod items;
pub mod pins;

pub use aggregate::{aggregate_supplies, ItemTotal, RegionSupplies, UNKNOWN_REGION};
pub use items::*;
pub use pins::*;
