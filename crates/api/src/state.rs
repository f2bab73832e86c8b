use std::sync::Arc;

use marquee_core::catalog::repository::MovieRepository;
use marquee_core::SyncGateway;

use crate::auth::EditorAuth;
use crate::error::{ApiError, ApiResult};

/// Shared application state, passed to all handlers via Axum's `State` extractor.
/// Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    gateway: SyncGateway,
    catalog: Option<MovieRepository>,
    auth: EditorAuth,
}

impl AppState {
    pub fn new(
        gateway: SyncGateway,
        catalog: Option<MovieRepository>,
        auth: EditorAuth,
    ) -> Self {
        Self {
            inner: Arc::new(InnerState {
                gateway,
                catalog,
                auth,
            }),
        }
    }

    pub fn gateway(&self) -> &SyncGateway {
        &self.inner.gateway
    }

    /// The relational catalog, or 503 when no database is configured.
    pub fn catalog(&self) -> ApiResult<&MovieRepository> {
        self.inner
            .catalog
            .as_ref()
            .ok_or_else(|| ApiError::Unavailable("catalog database is not configured".into()))
    }

    pub fn has_catalog(&self) -> bool {
        self.inner.catalog.is_some()
    }

    pub fn auth(&self) -> &EditorAuth {
        &self.inner.auth
    }
}
