// HTTP routes
pub mod alerts;
pub mod auth;
pub mod chat;
pub mod directory;
pub mod family;
pub mod health;
pub mod location;
pub mod notifications;
pub mod realtime;
pub mod supplies;

pub use alerts::*;
pub use auth::*;
pub use chat::*;
pub use directory::*;
pub use family::*;
pub use health::*;
pub use location::*;
pub use notifications::*;
pub use realtime::*;
pub use supplies::*;
