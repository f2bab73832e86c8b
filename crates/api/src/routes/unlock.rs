use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::auth::EditToken;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/unlock", post(unlock))
}

#[derive(Debug, Deserialize)]
struct UnlockRequest {
    password: String,
}

#[derive(Debug, Serialize)]
struct UnlockResponse {
    ok: bool,
    #[serde(flatten)]
    token: EditToken,
}

/// Exchange the editor passphrase for an edit token.
async fn unlock(
    State(state): State<AppState>,
    payload: Result<Json<UnlockRequest>, JsonRejection>,
) -> ApiResult<Json<UnlockResponse>> {
    let Json(req) = payload?;
    let token = state.auth().unlock(&req.password)?;
    Ok(Json(UnlockResponse { ok: true, token }))
}
