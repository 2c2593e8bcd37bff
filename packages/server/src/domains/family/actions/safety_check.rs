//! Safety check windows: a family member asks "are you okay", the member
//! answers while the window is open, and a periodic sweep clears windows
//! whose expiry has passed.

use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::common::{ApiError, ApiResult};
use crate::domains::family::models::FamilyLink;
use crate::domains::notifications::{kinds, notify, NewNotification};
use crate::domains::profiles::{Profile, SafetyStatus};
use crate::kernel::{channels, publish_best_effort, ServerDeps};

pub const MIN_WINDOW_MINUTES: i64 = 1;
pub const MAX_WINDOW_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartSafetyCheckRequest {
    #[serde(default)]
    pub minutes: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RespondSafetyCheckRequest {
    pub status: String,
}

/// Window length in minutes, falling back to the configured default
pub fn window_minutes(requested: Option<i64>, default: i64) -> ApiResult<i64> {
    let minutes = requested.unwrap_or(default);
    if !(MIN_WINDOW_MINUTES..=MAX_WINDOW_MINUTES).contains(&minutes) {
        return Err(ApiError::bad_request(format!(
            "minutes must be between {} and {}",
            MIN_WINDOW_MINUTES, MAX_WINDOW_MINUTES
        )));
    }
    Ok(minutes)
}

/// Only `safe` and `need_help` are answers; `pending` is set by the server.
pub fn parse_answer(raw: &str) -> ApiResult<SafetyStatus> {
    match raw.trim().parse::<SafetyStatus>() {
        Ok(SafetyStatus::Pending) | Err(_) => Err(ApiError::bad_request(
            "status must be \"safe\" or \"need_help\"",
        )),
        Ok(status) => Ok(status),
    }
}

fn display_name(profile: &Profile) -> &str {
    profile.full_name.as_deref().unwrap_or(&profile.email)
}

pub async fn start_safety_check(
    requester_id: Uuid,
    member_id: Uuid,
    request: StartSafetyCheckRequest,
    deps: &ServerDeps,
) -> ApiResult<Profile> {
    let minutes = window_minutes(request.minutes, deps.safety_check_minutes)?;

    if !FamilyLink::is_linked(requester_id, member_id, &deps.db_pool).await? {
        return Err(ApiError::Forbidden(
            "safety checks can only be sent to linked family members".to_string(),
        ));
    }

    let started_at = Utc::now();
    let expires_at = started_at + Duration::minutes(minutes);

    let member = Profile::open_safety_check(member_id, started_at, expires_at, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {}", member_id)))?;

    let requester_name = match Profile::find_by_id(requester_id, &deps.db_pool).await? {
        Some(p) => display_name(&p).to_string(),
        None => "A family member".to_string(),
    };

    let payload = json!({
        "requested_by": requester_id,
        "started_at": started_at,
        "expires_at": expires_at,
    });

    // The window is already open; the realtime event below still reaches
    // the member if the inbox row cannot be written.
    let sent = notify(
        &NewNotification {
            user_id: member_id,
            kind: kinds::SAFETY_CHECK.to_string(),
            title: "Are you okay?".to_string(),
            body: format!(
                "{} is checking on you. Please respond within {} minutes.",
                requester_name, minutes
            ),
            data: payload.clone(),
        },
        deps,
    )
    .await;
    if let Err(e) = sent {
        warn!(error = %e, member_id = %member_id, "Failed to store safety check notification");
    }

    publish_best_effort(
        deps.realtime.as_ref(),
        &channels::user(member_id),
        channels::EVENT_SAFETY_CHECK,
        payload,
    )
    .await;

    info!(
        requester_id = %requester_id,
        member_id = %member_id,
        minutes,
        "Safety check started"
    );
    Ok(member)
}

pub async fn respond_safety_check(
    user_id: Uuid,
    request: RespondSafetyCheckRequest,
    deps: &ServerDeps,
) -> ApiResult<Profile> {
    let status = parse_answer(&request.status)?;

    let profile = Profile::answer_safety_check(user_id, status, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::Conflict("no open safety check".to_string()))?;

    let name = display_name(&profile).to_string();
    let (title, body) = match status {
        SafetyStatus::NeedHelp => (
            format!("{} needs help", name),
            format!("{} answered the safety check: needs help.", name),
        ),
        _ => (
            format!("{} is safe", name),
            format!("{} answered the safety check: safe.", name),
        ),
    };
    let payload = json!({
        "user_id": user_id,
        "status": status,
        "responded_at": Utc::now(),
    });

    for member_id in FamilyLink::member_ids(user_id, &deps.db_pool).await? {
        let sent = notify(
            &NewNotification {
                user_id: member_id,
                kind: kinds::SAFETY_STATUS.to_string(),
                title: title.clone(),
                body: body.clone(),
                data: payload.clone(),
            },
            deps,
        )
        .await;
        if let Err(e) = sent {
            warn!(error = %e, member_id = %member_id, "Failed to notify family member");
        }

        publish_best_effort(
            deps.realtime.as_ref(),
            &channels::user(member_id),
            channels::EVENT_SAFETY_STATUS,
            payload.clone(),
        )
        .await;
    }

    info!(user_id = %user_id, status = %status, "Safety check answered");
    Ok(profile)
}

/// Clear expired windows. Returns how many were cleared.
pub async fn cleanup_expired_safety_checks(deps: &ServerDeps) -> ApiResult<u64> {
    let cleared = Profile::clear_expired_safety_checks(&deps.db_pool).await?;
    if cleared > 0 {
        info!(cleared, "Expired safety checks cleared");
    }
    Ok(cleared)
}
