use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::common::{ApiError, ApiResult};
use crate::domains::family::models::{FamilyLink, FamilyMember};
use crate::domains::profiles::Profile;
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Deserialize)]
pub struct AddFamilyMemberRequest {
    pub email: String,
    #[serde(default)]
    pub relation: Option<String>,
}

/// Link the caller to the profile registered under `email`
pub async fn add_family_member(
    user_id: Uuid,
    request: AddFamilyMemberRequest,
    deps: &ServerDeps,
) -> ApiResult<FamilyLink> {
    let email = request.email.trim();
    if email.is_empty() {
        return Err(ApiError::bad_request("email is required"));
    }

    let member = Profile::find_by_email(email, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no user registered as {}", email)))?;

    if member.id == user_id {
        return Err(ApiError::bad_request("cannot link yourself"));
    }

    let relation = request
        .relation
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());

    let link = FamilyLink::link(user_id, member.id, relation, &deps.db_pool).await?;
    info!(user_id = %user_id, member_id = %member.id, "Family member linked");
    Ok(link)
}

pub async fn list_family(user_id: Uuid, deps: &ServerDeps) -> ApiResult<Vec<FamilyMember>> {
    Ok(FamilyLink::list_members(user_id, &deps.db_pool).await?)
}

pub async fn remove_family_member(
    user_id: Uuid,
    member_id: Uuid,
    deps: &ServerDeps,
) -> ApiResult<()> {
    let removed = FamilyLink::unlink(user_id, member_id, &deps.db_pool).await?;
    if removed == 0 {
        return Err(ApiError::NotFound(format!("family member {}", member_id)));
    }

    info!(user_id = %user_id, member_id = %member_id, "Family member unlinked");
    Ok(())
}
