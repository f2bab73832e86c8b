use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/ping", get(ping))
}

/// Full health check: reports the document store and, when configured,
/// verifies database connectivity.
async fn health_check(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let database = if state.has_catalog() {
        sqlx::query("SELECT 1")
            .execute(state.catalog()?.pool())
            .await
            .map_err(|e| ApiError::Internal(format!("database health check failed: {e}")))?;
        "connected"
    } else {
        "disabled"
    };

    let paths = state.gateway().paths();
    Ok(Json(json!({
        "status": "ok",
        "store": state.gateway().store_name(),
        "documents": { "movies": paths.movies, "site": paths.site },
        "database": database,
        "editorGate": state.auth().is_enabled(),
    })))
}

/// Lightweight ping, touches nothing.
async fn ping() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::{build_router, test_support};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use marquee_core::store::memory::MemoryStore;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_reports_store_without_database() {
        let store = MemoryStore::new();
        let app = build_router(test_support::memory_state(&store));

        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = test_support::json_body(resp).await;
        assert_eq!(body["store"], "memory");
        assert_eq!(body["database"], "disabled");
        assert_eq!(body["documents"]["movies"], "data/movies.json");
        assert_eq!(body["editorGate"], false);
        assert_eq!(store.operation_count(), 0);
    }
}
