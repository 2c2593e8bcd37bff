pub mod broadcast;
pub mod usgs_watcher;

pub use broadcast::*;
pub use usgs_watcher::{alert_from_quake, PollSummary, SeenSet, UsgsWatcher};
