// Business domains
pub mod alerts;
pub mod auth;
pub mod chat;
pub mod directory;
pub mod family;
pub mod notifications;
pub mod profiles;
pub mod supplies;
