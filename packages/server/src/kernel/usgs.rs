//! USGS earthquake GeoJSON feed client.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{instrument, warn};

use super::{BaseEarthquakeFeed, QuakeEvent};

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    id: String,
    properties: Properties,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Properties {
    mag: Option<f64>,
    place: Option<String>,
    /// Milliseconds since epoch
    time: Option<i64>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    /// [longitude, latitude, depth_km]
    coordinates: Vec<f64>,
}

/// Convert a GeoJSON feed body into events, skipping malformed features
pub fn parse_feed(body: &str) -> Result<Vec<QuakeEvent>> {
    let collection: FeatureCollection = serde_json::from_str(body)
        .map_err(|e| anyhow!("Invalid USGS feed: {}", e))?;

    Ok(collection
        .features
        .into_iter()
        .filter_map(|feature| {
            let coords = feature.geometry.map(|g| g.coordinates).unwrap_or_default();
            if coords.len() < 2 {
                warn!(id = %feature.id, "USGS feature without coordinates");
                return None;
            }

            let occurred_at = feature
                .properties
                .time
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .unwrap_or_else(Utc::now);

            Some(QuakeEvent {
                id: feature.id,
                magnitude: feature.properties.mag,
                place: feature.properties.place,
                occurred_at,
                latitude: coords[1],
                longitude: coords[0],
                depth_km: coords.get(2).copied(),
                url: feature.properties.url,
            })
        })
        .collect())
}

pub struct UsgsFeedClient {
    client: Client,
    feed_url: String,
}

impl UsgsFeedClient {
    pub fn new(feed_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            feed_url: feed_url.into(),
        }
    }
}

#[async_trait]
impl BaseEarthquakeFeed for UsgsFeedClient {
    #[instrument(skip(self), fields(feed = %self.feed_url))]
    async fn fetch_recent(&self) -> Result<Vec<QuakeEvent>> {
        let response = self
            .client
            .get(&self.feed_url)
            .timeout(std::time::Duration::from_secs(15))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("USGS feed returned {}", response.status());
        }

        parse_feed(&response.text().await?)
    }
}
