pub mod location;

pub use location::{update_location, UpdateLocationRequest};
