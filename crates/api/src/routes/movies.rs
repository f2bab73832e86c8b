//! CRUD over the relational catalog.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use marquee_core::catalog::ranking::ranked;
use marquee_core::catalog::repository::MovieDraft;
use marquee_core::{Movie, Reviewer};
use serde::Serialize;

use crate::auth::EditorAccess;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/movies", get(list_movies).post(create_movie))
        .route("/v1/movies/import", post(import_movies))
        .route("/v1/movies/{id}", put(update_movie).delete(delete_movie))
        .route("/v1/rankings/{reviewer}", get(rankings))
}

#[derive(Debug, Serialize)]
struct RankedEntry<'a> {
    position: usize,
    /// The ranking reviewer's own rating.
    rating: Option<f64>,
    #[serde(flatten)]
    movie: &'a Movie,
}

/// Every movie in display order. Doubles as the catalog export.
async fn list_movies(State(state): State<AppState>) -> ApiResult<Json<Vec<Movie>>> {
    Ok(Json(state.catalog()?.list().await?))
}

async fn create_movie(
    State(state): State<AppState>,
    _access: EditorAccess,
    payload: Result<Json<MovieDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Movie>)> {
    let Json(draft) = payload?;
    let movie = state.catalog()?.create(&draft).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

async fn update_movie(
    State(state): State<AppState>,
    _access: EditorAccess,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<MovieDraft>, JsonRejection>,
) -> ApiResult<Json<Movie>> {
    let (Path(id), Json(draft)) = (id?, payload?);
    Ok(Json(state.catalog()?.update(&id, &draft).await?))
}

async fn delete_movie(
    State(state): State<AppState>,
    _access: EditorAccess,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    state.catalog()?.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the catalog with an exported list.
async fn import_movies(
    State(state): State<AppState>,
    _access: EditorAccess,
    payload: Result<Json<Vec<MovieDraft>>, JsonRejection>,
) -> ApiResult<Json<Vec<Movie>>> {
    let Json(drafts) = payload?;
    Ok(Json(state.catalog()?.replace_all(&drafts).await?))
}

/// One reviewer's best-to-worst list.
async fn rankings(
    State(state): State<AppState>,
    reviewer: Result<Path<Reviewer>, PathRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Path(reviewer) = reviewer?;
    let movies = state.catalog()?.list().await?;
    let entries: Vec<RankedEntry<'_>> = ranked(&movies, reviewer)
        .into_iter()
        .enumerate()
        .map(|(i, movie)| RankedEntry {
            position: i + 1,
            rating: reviewer.rating(movie),
            movie,
        })
        .collect();
    Ok(Json(serde_json::json!({
        "reviewer": reviewer,
        "movies": entries,
    })))
}
