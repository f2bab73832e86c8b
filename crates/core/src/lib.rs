//! Catalog model, remote document stores and the sync gateway behind the
//! marquee movie catalog.

pub mod catalog;
pub mod store;
pub mod sync;

pub use catalog::model::{Movie, MovieCollection, Reviewer, SiteSettings};
pub use store::{DocumentStore, StoreError, VersionToken};
pub use sync::gateway::{DocumentPaths, Snapshot, SyncGateway};
pub use sync::{Resource, SavedTokens, SyncError, VersionTokens};
