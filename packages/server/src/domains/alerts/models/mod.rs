pub mod alert;

pub use alert::{Alert, AlertKind, NearFilter, NewAlert, Severity};
