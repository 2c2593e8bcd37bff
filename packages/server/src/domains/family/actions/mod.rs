pub mod links;
pub mod safety_check;

pub use links::*;
pub use safety_check::*;
