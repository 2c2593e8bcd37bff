//! USGS earthquake polling.
//!
//! Each poll fetches the feed, drops quakes below the magnitude floor and
//! anything already seen, then inserts the rest as alerts. Only rows that
//! were actually inserted are broadcast; the `external_id` unique key keeps
//! restarts (which empty the seen set) from broadcasting twice.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::domains::alerts::actions::broadcast::publish_alert;
use crate::domains::alerts::models::{AlertKind, NewAlert, Severity};
use crate::kernel::{BaseEarthquakeFeed, QuakeEvent, ServerDeps};

pub const SEEN_CAPACITY: usize = 5_000;

/// Insertion-ordered set that forgets its oldest ids past `capacity`
#[derive(Debug)]
pub struct SeenSet {
    ids: HashSet<String>,
    order: VecDeque<String>,
    capacity: usize,
}

impl SeenSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            ids: HashSet::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns false if the id was already present
    pub fn insert(&mut self, id: &str) -> bool {
        if !self.ids.insert(id.to_string()) {
            return false;
        }
        self.order.push_back(id.to_string());

        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Outcome of one poll
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PollSummary {
    pub fetched: usize,
    pub below_threshold: usize,
    pub already_seen: usize,
    pub broadcast: usize,
}

/// Alert fields for a feed quake
pub fn alert_from_quake(quake: &QuakeEvent) -> NewAlert {
    let place = quake.place.as_deref().unwrap_or("unknown location");
    let title = match quake.magnitude {
        Some(m) => format!("M{:.1} earthquake - {}", m, place),
        None => format!("Earthquake - {}", place),
    };

    let mut message = match quake.magnitude {
        Some(m) => format!(
            "A magnitude {:.1} earthquake was recorded {} at {}.",
            m,
            place,
            quake.occurred_at.format("%Y-%m-%d %H:%M UTC")
        ),
        None => format!(
            "An earthquake was recorded {} at {}.",
            place,
            quake.occurred_at.format("%Y-%m-%d %H:%M UTC")
        ),
    };
    if let Some(depth) = quake.depth_km {
        message.push_str(&format!(" Depth {:.1} km.", depth));
    }
    if let Some(url) = &quake.url {
        message.push_str(&format!(" Details: {}", url));
    }

    NewAlert {
        kind: AlertKind::Earthquake,
        severity: Severity::from_magnitude(quake.magnitude),
        title,
        message,
        latitude: Some(quake.latitude),
        longitude: Some(quake.longitude),
        magnitude: quake.magnitude,
        source: "usgs".to_string(),
        external_id: Some(quake.id.clone()),
        occurred_at: quake.occurred_at,
    }
}

pub struct UsgsWatcher {
    feed: Arc<dyn BaseEarthquakeFeed>,
    min_magnitude: f64,
    seen: Mutex<SeenSet>,
}

impl UsgsWatcher {
    pub fn new(feed: Arc<dyn BaseEarthquakeFeed>, min_magnitude: f64) -> Self {
        Self::with_capacity(feed, min_magnitude, SEEN_CAPACITY)
    }

    pub fn with_capacity(
        feed: Arc<dyn BaseEarthquakeFeed>,
        min_magnitude: f64,
        capacity: usize,
    ) -> Self {
        Self {
            feed,
            min_magnitude,
            seen: Mutex::new(SeenSet::new(capacity)),
        }
    }

    pub fn seen_count(&self) -> usize {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn is_seen(&self, id: &str) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(id)
    }

    fn mark_seen(&self, id: &str) {
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id);
    }

    /// Run one poll. A failed fetch returns the error and marks nothing.
    pub async fn poll_once(&self, deps: &ServerDeps) -> Result<PollSummary> {
        let quakes = self.feed.fetch_recent().await?;

        let mut summary = PollSummary {
            fetched: quakes.len(),
            ..PollSummary::default()
        };

        for quake in &quakes {
            if quake.magnitude.map_or(true, |m| m < self.min_magnitude) {
                summary.below_threshold += 1;
                continue;
            }
            if self.is_seen(&quake.id) {
                summary.already_seen += 1;
                continue;
            }

            match publish_alert(&alert_from_quake(quake), deps).await {
                Ok(Some(alert)) => {
                    info!(
                        alert_id = %alert.id,
                        external_id = %quake.id,
                        magnitude = ?quake.magnitude,
                        "Earthquake alert broadcast"
                    );
                    summary.broadcast += 1;
                    self.mark_seen(&quake.id);
                }
                Ok(None) => {
                    debug!(external_id = %quake.id, "Earthquake already stored");
                    summary.already_seen += 1;
                    self.mark_seen(&quake.id);
                }
                Err(e) => {
                    // Left unseen so the next poll retries it
                    warn!(error = %e, external_id = %quake.id, "Failed to store earthquake alert");
                }
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn quake(id: &str, magnitude: Option<f64>) -> QuakeEvent {
        QuakeEvent {
            id: id.to_string(),
            magnitude,
            place: Some("10 km NE of Ridgecrest, CA".to_string()),
            occurred_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap(),
            latitude: 35.7,
            longitude: -117.5,
            depth_km: Some(8.2),
            url: Some("https://earthquake.usgs.gov/earthquakes/eventpage/ci1".to_string()),
        }
    }

    #[test]
    fn test_seen_set_evicts_oldest() {
        let mut seen = SeenSet::new(2);
        assert!(seen.insert("a"));
        assert!(seen.insert("b"));
        assert!(!seen.insert("a"));
        assert!(seen.insert("c"));

        assert_eq!(seen.len(), 2);
        assert!(!seen.contains("a"));
        assert!(seen.contains("b"));
        assert!(seen.contains("c"));
    }

    #[test]
    fn test_alert_from_quake() {
        let alert = alert_from_quake(&quake("ci1", Some(6.4)));

        assert_eq!(alert.kind, AlertKind::Earthquake);
        assert_eq!(alert.severity, Severity::Critical);
        assert_eq!(alert.title, "M6.4 earthquake - 10 km NE of Ridgecrest, CA");
        assert!(alert.message.contains("2025-03-01 12:30 UTC"));
        assert!(alert.message.contains("Depth 8.2 km"));
        assert_eq!(alert.external_id.as_deref(), Some("ci1"));
        assert_eq!(alert.source, "usgs");
    }

    #[test]
    fn test_alert_from_quake_without_magnitude() {
        let mut q = quake("ci2", None);
        q.place = None;
        let alert = alert_from_quake(&q);

        assert_eq!(alert.severity, Severity::Info);
        assert_eq!(alert.title, "Earthquake - unknown location");
    }
}
