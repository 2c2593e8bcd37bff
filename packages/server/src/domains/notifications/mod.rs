//! Notifications domain - per-user inbox rows mirrored onto the user's
//! realtime channel.

pub mod actions;
pub mod model;

pub use actions::notify;
pub use model::{kinds, NewNotification, Notification};
