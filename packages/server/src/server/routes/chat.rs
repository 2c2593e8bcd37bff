use axum::{extract::Extension, Json};
use tracing::debug;

use crate::common::ApiResult;
use crate::domains::chat::{self, ChatReply, ChatRequest};
use crate::server::app::AppState;
use crate::server::extract::ApiJson;
use crate::server::middleware::{AuthUser, ClientIp};

/// POST /api/chat (anonymous allowed)
pub async fn chat_handler(
    Extension(state): Extension<AppState>,
    user: Option<AuthUser>,
    client_ip: Option<Extension<ClientIp>>,
    ApiJson(request): ApiJson<ChatRequest>,
) -> ApiResult<Json<ChatReply>> {
    debug!(
        user_id = ?user.as_ref().map(|u| u.user_id),
        client_ip = ?client_ip.map(|Extension(ClientIp(ip))| ip),
        "Chat request"
    );
    Ok(Json(chat::chat(request, &state.deps).await?))
}
