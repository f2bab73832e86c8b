//! Postgres-backed catalog, the relational alternative to the JSON documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Map;
use sqlx::postgres::{PgArguments, PgPool};
use sqlx::query::QueryAs;
use sqlx::Postgres;
use thiserror::Error;
use uuid::Uuid;

use super::model::Movie;

const COLUMNS: &str = "id, title, year, poster_url, franchise, synopsis, runtime, genre, \
     director, producers, budget, distributed_by, imdb_url, episode_url, jonathan_rating, \
     karl_rating, jonathan_rank, karl_rank, sort_order, created_at, updated_at";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("movie {0} not found")]
    NotFound(String),
    #[error("invalid movie: {0}")]
    Invalid(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Editable fields of a movie. Ids and timestamps are assigned by the
/// repository, so any such keys in the input are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieDraft {
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub franchise: Option<String>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub runtime: Option<i32>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub producers: Option<String>,
    #[serde(default)]
    pub budget: Option<String>,
    #[serde(default)]
    pub distributed_by: Option<String>,
    #[serde(default)]
    pub imdb_url: Option<String>,
    #[serde(default)]
    pub episode_url: Option<String>,
    #[serde(default)]
    pub jonathan_rating: Option<f64>,
    #[serde(default)]
    pub karl_rating: Option<f64>,
    #[serde(default)]
    pub jonathan_rank: Option<i32>,
    #[serde(default)]
    pub karl_rank: Option<i32>,
    #[serde(default)]
    pub sort_order: i32,
}

impl MovieDraft {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.title.trim().is_empty() {
            return Err(CatalogError::Invalid("title is required".into()));
        }
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MovieRow {
    id: String,
    title: String,
    year: Option<i32>,
    poster_url: Option<String>,
    franchise: Option<String>,
    synopsis: Option<String>,
    runtime: Option<i32>,
    genre: Option<String>,
    director: Option<String>,
    producers: Option<String>,
    budget: Option<String>,
    distributed_by: Option<String>,
    imdb_url: Option<String>,
    episode_url: Option<String>,
    jonathan_rating: Option<f64>,
    karl_rating: Option<f64>,
    jonathan_rank: Option<i32>,
    karl_rank: Option<i32>,
    sort_order: i32,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<MovieRow> for Movie {
    fn from(row: MovieRow) -> Self {
        Movie {
            id: row.id,
            title: row.title,
            year: row.year,
            poster_url: row.poster_url,
            franchise: row.franchise,
            synopsis: row.synopsis,
            runtime: row.runtime,
            genre: row.genre,
            director: row.director,
            producers: row.producers,
            budget: row.budget,
            distributed_by: row.distributed_by,
            imdb_url: row.imdb_url,
            episode_url: row.episode_url,
            jonathan_rating: row.jonathan_rating,
            karl_rating: row.karl_rating,
            jonathan_rank: row.jonathan_rank,
            karl_rank: row.karl_rank,
            sort_order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
            extra: Map::new(),
        }
    }
}

/// Binds the draft fields as `$2..=$19`, in `COLUMNS` order after `id`.
fn bind_draft<'q>(
    query: QueryAs<'q, Postgres, MovieRow, PgArguments>,
    draft: &'q MovieDraft,
) -> QueryAs<'q, Postgres, MovieRow, PgArguments> {
    query
        .bind(draft.title.as_str())
        .bind(draft.year)
        .bind(draft.poster_url.as_deref())
        .bind(draft.franchise.as_deref())
        .bind(draft.synopsis.as_deref())
        .bind(draft.runtime)
        .bind(draft.genre.as_deref())
        .bind(draft.director.as_deref())
        .bind(draft.producers.as_deref())
        .bind(draft.budget.as_deref())
        .bind(draft.distributed_by.as_deref())
        .bind(draft.imdb_url.as_deref())
        .bind(draft.episode_url.as_deref())
        .bind(draft.jonathan_rating)
        .bind(draft.karl_rating)
        .bind(draft.jonathan_rank)
        .bind(draft.karl_rank)
        .bind(draft.sort_order)
}

fn insert_sql() -> String {
    format!(
        "INSERT INTO ratings (id, title, year, poster_url, franchise, synopsis, runtime, genre, \
         director, producers, budget, distributed_by, imdb_url, episode_url, jonathan_rating, \
         karl_rating, jonathan_rank, karl_rank, sort_order) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19) \
         RETURNING {COLUMNS}"
    )
}

fn update_sql() -> String {
    format!(
        "UPDATE ratings SET title = $2, year = $3, poster_url = $4, franchise = $5, synopsis = $6, \
         runtime = $7, genre = $8, director = $9, producers = $10, budget = $11, \
         distributed_by = $12, imdb_url = $13, episode_url = $14, jonathan_rating = $15, \
         karl_rating = $16, jonathan_rank = $17, karl_rank = $18, sort_order = $19, \
         updated_at = now() \
         WHERE id = $1 RETURNING {COLUMNS}"
    )
}

/// CRUD over the `ratings` table.
#[derive(Debug, Clone)]
pub struct MovieRepository {
    pool: PgPool,
}

impl MovieRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// All movies in display order.
    pub async fn list(&self) -> Result<Vec<Movie>, CatalogError> {
        let sql = format!("SELECT {COLUMNS} FROM ratings ORDER BY sort_order ASC, created_at ASC");
        let rows = sqlx::query_as::<_, MovieRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Movie::from).collect())
    }

    pub async fn create(&self, draft: &MovieDraft) -> Result<Movie, CatalogError> {
        draft.validate()?;
        let id = Uuid::new_v4().to_string();
        let sql = insert_sql();
        let row = bind_draft(sqlx::query_as::<_, MovieRow>(&sql).bind(id.as_str()), draft)
            .fetch_one(&self.pool)
            .await?;
        tracing::info!(id = %row.id, title = %row.title, "movie created");
        Ok(row.into())
    }

    /// Overwrite the editable fields of `id` and stamp `updated_at`.
    pub async fn update(&self, id: &str, draft: &MovieDraft) -> Result<Movie, CatalogError> {
        draft.validate()?;
        let sql = update_sql();
        let row = bind_draft(sqlx::query_as::<_, MovieRow>(&sql).bind(id), draft)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        tracing::info!(id, "movie updated");
        Ok(row.into())
    }

    pub async fn delete(&self, id: &str) -> Result<(), CatalogError> {
        let result = sqlx::query("DELETE FROM ratings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound(id.to_string()));
        }
        tracing::info!(id, "movie deleted");
        Ok(())
    }

    /// Replace the whole catalog with `drafts`, assigning fresh ids.
    ///
    /// Runs in one transaction: either every draft is stored or the previous
    /// catalog is left untouched.
    pub async fn replace_all(&self, drafts: &[MovieDraft]) -> Result<Vec<Movie>, CatalogError> {
        for draft in drafts {
            draft.validate()?;
        }

        let sql = insert_sql();
        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query("DELETE FROM ratings")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let mut movies = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let id = Uuid::new_v4().to_string();
            let row = bind_draft(sqlx::query_as::<_, MovieRow>(&sql).bind(id.as_str()), draft)
                .fetch_one(&mut *tx)
                .await?;
            movies.push(Movie::from(row));
        }
        tx.commit().await?;

        tracing::info!(removed, imported = movies.len(), "catalog replaced");
        Ok(movies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn draft_requires_title() {
        let draft = MovieDraft {
            title: "   ".into(),
            ..MovieDraft::default()
        };
        assert!(matches!(draft.validate(), Err(CatalogError::Invalid(_))));
    }

    #[test]
    fn draft_ignores_identity_fields_from_exports() {
        let exported = json!({
            "id": "8f1c",
            "title": "Thief",
            "year": 1981,
            "karl_rating": 7.5,
            "sort_order": 4,
            "created_at": "2023-01-01T00:00:00Z",
            "updated_at": null
        });
        let draft: MovieDraft = serde_json::from_value(exported).unwrap();
        assert_eq!(draft.title, "Thief");
        assert_eq!(draft.year, Some(1981));
        assert_eq!(draft.karl_rating, Some(7.5));
        assert_eq!(draft.sort_order, 4);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn insert_and_update_bind_the_same_placeholders() {
        assert!(insert_sql().contains("$19)"));
        assert!(update_sql().contains("sort_order = $19"));
        assert!(update_sql().contains("WHERE id = $1"));
    }

    fn draft(title: &str, sort_order: i32) -> MovieDraft {
        MovieDraft {
            title: title.into(),
            sort_order,
            ..MovieDraft::default()
        }
    }

    fn titles(movies: &[Movie]) -> Vec<&str> {
        movies.iter().map(|m| m.title.as_str()).collect()
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn create_then_list_in_display_order(pool: PgPool) {
        let repo = MovieRepository::new(pool);
        let ronin = repo.create(&draft("Ronin", 2)).await.unwrap();
        repo.create(&draft("Heat", 1)).await.unwrap();

        assert!(Uuid::parse_str(&ronin.id).is_ok());
        assert!(ronin.updated_at.is_none());
        assert_eq!(titles(&repo.list().await.unwrap()), ["Heat", "Ronin"]);
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn update_overwrites_fields_and_stamps_updated_at(pool: PgPool) {
        let repo = MovieRepository::new(pool);
        let created = repo.create(&draft("Heat", 1)).await.unwrap();

        let mut edit = draft("Heat (1995)", 3);
        edit.karl_rank = Some(1);
        let updated = repo.update(&created.id, &edit).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.title, "Heat (1995)");
        assert_eq!(updated.karl_rank, Some(1));
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at.is_some());
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn missing_rows_are_not_found(pool: PgPool) {
        let repo = MovieRepository::new(pool);

        let err = repo.update("nope", &draft("Heat", 1)).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(ref id) if id == "nope"), "{err:?}");

        let err = repo.delete("nope").await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)), "{err:?}");
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn delete_removes_the_row(pool: PgPool) {
        let repo = MovieRepository::new(pool);
        let heat = repo.create(&draft("Heat", 1)).await.unwrap();

        repo.delete(&heat.id).await.unwrap();
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn replace_all_swaps_the_catalog(pool: PgPool) {
        let repo = MovieRepository::new(pool);
        let old = repo.create(&draft("Heat", 1)).await.unwrap();

        let imported = repo
            .replace_all(&[draft("Thief", 2), draft("Ronin", 1)])
            .await
            .unwrap();
        assert_eq!(imported.len(), 2);
        assert!(imported.iter().all(|m| m.id != old.id));
        assert_eq!(titles(&repo.list().await.unwrap()), ["Ronin", "Thief"]);
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn failed_import_leaves_catalog_intact(pool: PgPool) {
        let repo = MovieRepository::new(pool);
        repo.create(&draft("Heat", 1)).await.unwrap();

        // Postgres refuses NUL bytes in text, so the second insert fails
        // after the delete and the first insert have run.
        let err = repo
            .replace_all(&[draft("Thief", 1), draft("Ron\0in", 2)])
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Database(_)), "{err:?}");

        assert_eq!(titles(&repo.list().await.unwrap()), ["Heat"]);
    }
}
