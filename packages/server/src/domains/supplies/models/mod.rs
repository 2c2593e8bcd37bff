pub mod item;
pub mod pin;
pub mod pin_item;

pub use item::Item;
pub use pin::{FulfillOutcome, NewPin, NewPinItem, Pin, PinStatus};
pub use pin_item::{PinItemLine, SupplyRow};
