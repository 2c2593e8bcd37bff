use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::common::{clamp_limit, validate_coordinates, ApiError, ApiResult};
use crate::domains::alerts::models::{Alert, AlertKind, NearFilter, NewAlert, Severity};
use crate::kernel::{channels, publish_best_effort, ServerDeps};

pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 200;
pub const DEFAULT_NEAR_RADIUS_KM: f64 = 500.0;
pub const MAX_NEAR_RADIUS_KM: f64 = 20_000.0;

#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastAlertRequest {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub magnitude: Option<f64>,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListAlertsQuery {
    pub limit: Option<i64>,
    pub kind: Option<String>,
    pub near_lat: Option<f64>,
    pub near_lng: Option<f64>,
    pub radius_km: Option<f64>,
}

fn parse_kind(raw: Option<&str>) -> ApiResult<Option<AlertKind>> {
    raw.map(str::trim)
        .filter(|k| !k.is_empty())
        .map(|k| {
            k.parse::<AlertKind>()
                .map_err(|_| ApiError::bad_request("kind must be earthquake, flood or other"))
        })
        .transpose()
}

impl BroadcastAlertRequest {
    /// Manual alerts default to kind `other` and severity `warning`
    pub fn validate(self) -> ApiResult<NewAlert> {
        let title = self.title.trim();
        let message = self.message.trim();
        if title.is_empty() {
            return Err(ApiError::bad_request("title must not be empty"));
        }
        if message.is_empty() {
            return Err(ApiError::bad_request("message must not be empty"));
        }

        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => validate_coordinates(lat, lng).map_err(ApiError::BadRequest)?,
            (None, None) => {}
            _ => {
                return Err(ApiError::bad_request(
                    "latitude and longitude must be given together",
                ))
            }
        }

        let severity = match self.severity.as_deref().map(str::trim) {
            None | Some("") => Severity::Warning,
            Some(s) => s.parse().map_err(|_| {
                ApiError::bad_request("severity must be info, warning or critical")
            })?,
        };

        Ok(NewAlert {
            kind: parse_kind(self.kind.as_deref())?.unwrap_or(AlertKind::Other),
            severity,
            title: title.to_string(),
            message: message.to_string(),
            latitude: self.latitude,
            longitude: self.longitude,
            magnitude: self.magnitude.filter(|m| m.is_finite()),
            source: "manual".to_string(),
            external_id: None,
            occurred_at: self.occurred_at.unwrap_or_else(Utc::now),
        })
    }
}

impl ListAlertsQuery {
    pub fn near_filter(&self) -> ApiResult<Option<NearFilter>> {
        let (latitude, longitude) = match (self.near_lat, self.near_lng) {
            (Some(lat), Some(lng)) => (lat, lng),
            (None, None) => return Ok(None),
            _ => {
                return Err(ApiError::bad_request(
                    "near_lat and near_lng must be given together",
                ))
            }
        };
        validate_coordinates(latitude, longitude).map_err(ApiError::BadRequest)?;

        let radius_km = self.radius_km.unwrap_or(DEFAULT_NEAR_RADIUS_KM);
        if !radius_km.is_finite() || radius_km <= 0.0 || radius_km > MAX_NEAR_RADIUS_KM {
            return Err(ApiError::bad_request(format!(
                "radius_km must be greater than 0 and at most {}",
                MAX_NEAR_RADIUS_KM
            )));
        }

        Ok(Some(NearFilter {
            latitude,
            longitude,
            radius_km,
        }))
    }
}

/// Persist an alert and push it to every client on the alerts channel.
pub async fn publish_alert(new: &NewAlert, deps: &ServerDeps) -> anyhow::Result<Option<Alert>> {
    let Some(alert) = Alert::insert(new, &deps.db_pool).await? else {
        return Ok(None);
    };

    publish_best_effort(
        deps.realtime.as_ref(),
        channels::ALERTS,
        channels::EVENT_NEW_ALERT,
        serde_json::to_value(&alert)?,
    )
    .await;

    Ok(Some(alert))
}

pub async fn broadcast_alert(
    request: BroadcastAlertRequest,
    is_admin: bool,
    sender: Uuid,
    deps: &ServerDeps,
) -> ApiResult<Alert> {
    if !is_admin {
        return Err(ApiError::Forbidden("admin only".to_string()));
    }
    let new = request.validate()?;

    let alert = publish_alert(&new, deps)
        .await?
        .ok_or_else(|| ApiError::Conflict("alert already exists".to_string()))?;

    info!(
        alert_id = %alert.id,
        kind = %alert.kind,
        severity = %alert.severity,
        sender = %sender,
        "Alert broadcast"
    );
    Ok(alert)
}

pub async fn list_alerts(query: ListAlertsQuery, deps: &ServerDeps) -> ApiResult<Vec<Alert>> {
    let limit = clamp_limit(query.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
    let kind = parse_kind(query.kind.as_deref())?;

    let alerts = match query.near_filter()? {
        Some(near) => Alert::find_recent_near(limit, kind, near, &deps.db_pool).await?,
        None => Alert::find_recent(limit, kind, &deps.db_pool).await?,
    };
    Ok(alerts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> BroadcastAlertRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_manual_alert_defaults() {
        let new = request(json!({"title": " Levee breach ", "message": "Evacuate zone B"}))
            .validate()
            .unwrap();

        assert_eq!(new.kind, AlertKind::Other);
        assert_eq!(new.severity, Severity::Warning);
        assert_eq!(new.title, "Levee breach");
        assert_eq!(new.source, "manual");
        assert!(new.external_id.is_none());
    }

    #[test]
    fn test_rejects_half_coordinates_and_bad_kind() {
        let half = request(json!({"title": "t", "message": "m", "latitude": 10.0}));
        assert!(half.validate().is_err());

        let bad_kind = request(json!({"title": "t", "message": "m", "kind": "tornado"}));
        assert!(bad_kind.validate().is_err());

        let out_of_range =
            request(json!({"title": "t", "message": "m", "latitude": 91.0, "longitude": 0.0}));
        assert!(out_of_range.validate().is_err());
    }

    #[test]
    fn test_near_filter() {
        let none = ListAlertsQuery::default();
        assert_eq!(none.near_filter().unwrap(), None);

        let near = ListAlertsQuery {
            near_lat: Some(35.0),
            near_lng: Some(139.0),
            ..Default::default()
        };
        let filter = near.near_filter().unwrap().unwrap();
        assert_eq!(filter.radius_km, DEFAULT_NEAR_RADIUS_KM);

        let half = ListAlertsQuery {
            near_lat: Some(35.0),
            ..Default::default()
        };
        assert!(half.near_filter().is_err());

        let zero_radius = ListAlertsQuery {
            near_lat: Some(35.0),
            near_lng: Some(139.0),
            radius_km: Some(0.0),
            ..Default::default()
        };
        assert!(zero_radius.near_filter().is_err());
    }
}
