use axum::{extract::Extension, Json};
use serde::Deserialize;

use crate::common::{clamp_limit, ScoredMatch};
use crate::domains::directory::{Contact, Session, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT};
use crate::server::app::AppState;
use crate::server::extract::ApiQuery;

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<i64>,
}

impl SearchQuery {
    fn limit(&self) -> usize {
        clamp_limit(self.limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT) as usize
    }
}

/// GET /api/contacts?q=&limit=
pub async fn search_contacts_handler(
    Extension(state): Extension<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Json<Vec<ScoredMatch<Contact>>> {
    Json(state.deps.directory.search_contacts(&query.q, query.limit()))
}

/// GET /api/sessions?q=&limit=
pub async fn search_sessions_handler(
    Extension(state): Extension<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Json<Vec<ScoredMatch<Session>>> {
    Json(state.deps.directory.search_sessions(&query.q, query.limit()))
}
