//! Load and save boundaries for the two synced documents.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use marquee_core::{MovieCollection, SavedTokens, SiteSettings, Snapshot, VersionTokens};
use serde::{Deserialize, Serialize};

use crate::auth::EditorAccess;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/load", get(load).fallback(method_not_allowed))
        .route("/api/save", post(save).fallback(method_not_allowed))
}

#[derive(Debug, Serialize)]
struct LoadResponse {
    ok: bool,
    #[serde(flatten)]
    snapshot: Snapshot,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveRequest {
    #[serde(default)]
    movies: Option<MovieCollection>,
    #[serde(default)]
    site: Option<SiteSettings>,
    /// Older clients send the tokens as `shas`.
    #[serde(default, alias = "shas")]
    version_tokens: Option<VersionTokens>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveResponse {
    ok: bool,
    new_version_tokens: SavedTokens,
}

async fn load(State(state): State<AppState>) -> ApiResult<Json<LoadResponse>> {
    let snapshot = state.gateway().load().await?;
    Ok(Json(LoadResponse { ok: true, snapshot }))
}

async fn save(
    State(state): State<AppState>,
    access: Result<EditorAccess, ApiError>,
    payload: Result<Json<SaveRequest>, JsonRejection>,
) -> ApiResult<Json<SaveResponse>> {
    let Json(request) = payload?;
    let (Some(movies), Some(site)) = (request.movies, request.site) else {
        return Err(ApiError::BadRequest("Missing payload".into()));
    };
    access?;

    let tokens = request.version_tokens.unwrap_or_default();
    let saved = state.gateway().save(&movies, &site, &tokens).await?;
    tracing::info!(movies = movies.len(), token = %saved.movies, "catalog saved");

    Ok(Json(SaveResponse {
        ok: true,
        new_version_tokens: saved,
    }))
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
