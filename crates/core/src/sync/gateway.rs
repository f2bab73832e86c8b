use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{Resource, SavedTokens, SyncError, VersionTokens};
use crate::catalog::model::{Movie, MovieCollection, SiteSettings};
use crate::catalog::validate::validate_collection;
use crate::store::{DocumentStore, StoreError, VersionToken};

/// Store paths of the two documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPaths {
    pub movies: String,
    pub site: String,
}

impl DocumentPaths {
    pub fn path(&self, resource: Resource) -> &str {
        match resource {
            Resource::Movies => &self.movies,
            Resource::Site => &self.site,
        }
    }
}

impl Default for DocumentPaths {
    fn default() -> Self {
        Self {
            movies: "data/movies.json".to_string(),
            site: "data/site.json".to_string(),
        }
    }
}

/// Both documents as of one load, with the tokens to hand back on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub movies: MovieCollection,
    pub site: SiteSettings,
    pub version_tokens: VersionTokens,
}

/// Reads and writes the catalog and site documents as a pair.
///
/// Holds no mutable state; every call carries what it needs, so one gateway
/// can serve any number of concurrent requests.
#[derive(Clone)]
pub struct SyncGateway {
    store: Arc<dyn DocumentStore>,
    paths: DocumentPaths,
}

impl SyncGateway {
    pub fn new(store: Arc<dyn DocumentStore>, paths: DocumentPaths) -> Self {
        Self { store, paths }
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    pub fn paths(&self) -> &DocumentPaths {
        &self.paths
    }

    /// Fetch both documents concurrently.
    ///
    /// A missing document yields its default value and a `None` token. Any
    /// other failure on either side fails the whole load.
    pub async fn load(&self) -> Result<Snapshot, SyncError> {
        let ((movies, movies_token), (site, site_token)) = tokio::try_join!(
            self.load_resource::<MovieCollection>(Resource::Movies),
            self.load_resource::<SiteSettings>(Resource::Site),
        )?;

        tracing::debug!(
            movies = movies.len(),
            movies_token = ?movies_token,
            site_token = ?site_token,
            "catalog loaded"
        );

        Ok(Snapshot {
            movies,
            site,
            version_tokens: VersionTokens {
                movies: movies_token,
                site: site_token,
            },
        })
    }

    /// Conditionally write both documents.
    ///
    /// Each write is guarded by its token from `tokens`; a `None` token
    /// means create. The two writes are independent and both always run to
    /// completion, so a failure on one side does not roll back the other.
    /// Any failure fails the call, and a conflict wins over other failures.
    pub async fn save(
        &self,
        movies: &[Movie],
        site: &SiteSettings,
        tokens: &VersionTokens,
    ) -> Result<SavedTokens, SyncError> {
        validate_collection(movies)?;

        let movies_body = encode(Resource::Movies, movies)?;
        let site_body = encode(Resource::Site, site)?;

        let (movies_result, site_result) = tokio::join!(
            self.store_resource(Resource::Movies, movies_body, tokens.movies.as_ref()),
            self.store_resource(Resource::Site, site_body, tokens.site.as_ref()),
        );

        match (movies_result, site_result) {
            (Ok(movies), Ok(site)) => {
                tracing::debug!(%movies, %site, "catalog saved");
                Ok(SavedTokens { movies, site })
            }
            (Ok(token), Err(err)) => {
                warn_partial(Resource::Movies, &token, &err);
                Err(err)
            }
            (Err(err), Ok(token)) => {
                warn_partial(Resource::Site, &token, &err);
                Err(err)
            }
            (Err(movies_err), Err(site_err)) => {
                if site_err.is_conflict() && !movies_err.is_conflict() {
                    Err(site_err)
                } else {
                    Err(movies_err)
                }
            }
        }
    }

    async fn load_resource<T>(&self, resource: Resource) -> Result<(T, Option<VersionToken>), SyncError>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.paths.path(resource);
        let doc = self
            .store
            .fetch(path)
            .await
            .map_err(|source| SyncError::Upstream { resource, source })?;

        let Some(doc) = doc else {
            return Ok((T::default(), None));
        };

        // A document holding `null` reads like a missing one.
        let value: Option<T> = serde_json::from_slice(&doc.content)
            .map_err(|source| SyncError::Decode { resource, source })?;
        Ok((value.unwrap_or_default(), Some(doc.version)))
    }

    async fn store_resource(
        &self,
        resource: Resource,
        body: Vec<u8>,
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, SyncError> {
        let path = self.paths.path(resource);
        match self.store.store(path, body, expected).await {
            Ok(token) => Ok(token),
            Err(StoreError::Conflict { path }) => {
                tracing::warn!(%resource, %path, expected = ?expected, "write rejected: stale version token");
                Err(SyncError::Conflict { resource, path })
            }
            Err(source) => {
                tracing::warn!(%resource, %path, error = %source, "write failed");
                Err(SyncError::Upstream { resource, source })
            }
        }
    }
}

/// Canonical encoding: two-space indented JSON.
fn encode<T: Serialize + ?Sized>(resource: Resource, value: &T) -> Result<Vec<u8>, SyncError> {
    serde_json::to_vec_pretty(value).map_err(|source| SyncError::Encode { resource, source })
}

fn warn_partial(committed: Resource, token: &VersionToken, err: &SyncError) {
    tracing::warn!(
        %committed,
        new_token = %token,
        error = %err,
        "save partially applied: {committed} was written but the other document was not"
    );
}
