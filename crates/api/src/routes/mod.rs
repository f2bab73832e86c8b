pub mod health;
pub mod movies;
pub mod sync;
pub mod unlock;

use axum::Router;

use crate::state::AppState;

/// Assemble the full router with all route groups.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(sync::routes())
        .merge(unlock::routes())
        .merge(movies::routes())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Response;
    use http_body_util::BodyExt;
    use marquee_core::store::memory::MemoryStore;
    use marquee_core::{DocumentPaths, SyncGateway};
    use serde_json::Value;

    use crate::auth::EditorAuth;
    use crate::state::AppState;

    /// State over a fresh memory store, no database, open editor gate.
    pub fn memory_state(store: &MemoryStore) -> AppState {
        let gateway = SyncGateway::new(Arc::new(store.clone()), DocumentPaths::default());
        let auth = EditorAuth::new(None, "test-secret", Duration::from_secs(60)).unwrap();
        AppState::new(gateway, None, auth)
    }

    /// Same as [`memory_state`] with the gate locked behind `password`.
    pub fn gated_state(store: &MemoryStore, password: &str) -> AppState {
        let gateway = SyncGateway::new(Arc::new(store.clone()), DocumentPaths::default());
        let hash = crate::auth::tests::hash(password);
        let auth = EditorAuth::new(Some(hash), "test-secret", Duration::from_secs(60)).unwrap();
        AppState::new(gateway, None, auth)
    }

    pub async fn json_body(resp: Response<Body>) -> Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }
}
