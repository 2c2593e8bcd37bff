//! Alerts domain - manual broadcasts and USGS earthquake polling.

pub mod actions;
pub mod models;

pub use actions::UsgsWatcher;
pub use models::{Alert, AlertKind, NewAlert, Severity};
