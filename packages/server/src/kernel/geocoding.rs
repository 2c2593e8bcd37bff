use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, instrument};

use super::BaseGeocoder;

const USER_AGENT: &str = "ReliefCoordination/1.0 (Disaster Response Platform)";

/// Nominatim reverse lookup response
#[derive(Debug, Deserialize)]
struct NominatimReverse {
    #[serde(default)]
    address: Option<NominatimAddress>,
    #[serde(default)]
    error: Option<String>,
}

impl NominatimReverse {
    /// Region label from the address parts only; `display_name` is
    /// street-level and never a region.
    fn region(&self) -> Option<String> {
        self.address.as_ref().and_then(region_label)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NominatimAddress {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub municipality: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

/// Build "Locality, State" from a Nominatim address.
///
/// Locality falls back city → town → village → municipality → county; the
/// second part falls back state → country.
pub fn region_label(address: &NominatimAddress) -> Option<String> {
    let locality = [
        &address.city,
        &address.town,
        &address.village,
        &address.municipality,
        &address.county,
    ]
    .into_iter()
    .flatten()
    .map(|s| s.trim())
    .find(|s| !s.is_empty());

    let area = [&address.state, &address.country]
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty());

    match (locality, area) {
        (Some(l), Some(a)) => Some(format!("{}, {}", l, a)),
        (Some(l), None) => Some(l.to_string()),
        (None, Some(a)) => Some(a.to_string()),
        (None, None) => None,
    }
}

/// Reverse geocoder backed by Nominatim (OpenStreetMap)
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl BaseGeocoder for NominatimGeocoder {
    #[instrument(skip(self))]
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<Option<String>> {
        let url = format!("{}/reverse", self.base_url.trim_end_matches('/'));

        let response: NominatimReverse = self
            .client
            .get(&url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("format", "jsonv2".to_string()),
                ("zoom", "10".to_string()),
            ])
            .header("User-Agent", USER_AGENT)
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Reverse geocoding request failed");
                anyhow!("Reverse geocoding request failed: {}", e)
            })?
            .json()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to parse reverse geocoding response");
                anyhow!("Failed to parse reverse geocoding response: {}", e)
            })?;

        if let Some(err) = response.error {
            debug!(error = %err, "Nominatim has no address here");
            return Ok(None);
        }

        let label = response.region();

        debug!(?label, "Reverse geocoded");
        Ok(label)
    }
}
