use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The whole catalog, persisted as a single JSON array.
pub type MovieCollection = Vec<Movie>;

/// One catalog record as stored in `movies.json` and the `ratings` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub franchise: Option<String>,
    #[serde(default)]
    pub synopsis: Option<String>,
    /// Runtime in minutes.
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
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Fields written by other clients that this model does not know about.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Movie {
    /// A bare record with only the required fields filled in.
    pub fn new(id: impl Into<String>, title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            year: None,
            poster_url: None,
            franchise: None,
            synopsis: None,
            runtime: None,
            genre: None,
            director: None,
            producers: None,
            budget: None,
            distributed_by: None,
            imdb_url: None,
            episode_url: None,
            jonathan_rating: None,
            karl_rating: None,
            jonathan_rank: None,
            karl_rank: None,
            sort_order: 0,
            created_at,
            updated_at: None,
            extra: Map::new(),
        }
    }
}

/// The two hosts whose ratings and rankings are tracked per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reviewer {
    Jonathan,
    Karl,
}

impl Reviewer {
    pub const ALL: [Reviewer; 2] = [Reviewer::Jonathan, Reviewer::Karl];

    pub fn rating(self, movie: &Movie) -> Option<f64> {
        match self {
            Reviewer::Jonathan => movie.jonathan_rating,
            Reviewer::Karl => movie.karl_rating,
        }
    }

    /// The reviewer's rank position. Zero and negative ranks read as unranked.
    pub fn rank(self, movie: &Movie) -> Option<i32> {
        let rank = match self {
            Reviewer::Jonathan => movie.jonathan_rank,
            Reviewer::Karl => movie.karl_rank,
        };
        rank.filter(|r| *r > 0)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Reviewer::Jonathan => "jonathan",
            Reviewer::Karl => "karl",
        }
    }
}

impl std::fmt::Display for Reviewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const DEFAULT_EDIT_PASSWORD: &str = "sage42";

/// Site-wide settings stored in `site.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    #[serde(default)]
    pub podcast_embed: String,
    #[serde(default)]
    pub edit_password: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for SiteSettings {
    /// Baseline used when the settings document has never been written.
    fn default() -> Self {
        Self {
            podcast_embed: String::new(),
            edit_password: DEFAULT_EDIT_PASSWORD.to_string(),
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_site_settings_wire_shape() {
        let value = serde_json::to_value(SiteSettings::default()).unwrap();
        assert_eq!(value, json!({ "podcastEmbed": "", "editPassword": "sage42" }));
    }

    #[test]
    fn movie_keeps_unknown_fields() {
        let raw = json!({
            "id": "m1",
            "title": "Alien",
            "year": 1979,
            "jonathan_rank": 2,
            "created_at": "2024-05-01T10:00:00Z",
            "letterboxd_url": "https://letterboxd.com/film/alien/"
        });
        let movie: Movie = serde_json::from_value(raw).unwrap();
        assert_eq!(movie.year, Some(1979));
        assert_eq!(Reviewer::Jonathan.rank(&movie), Some(2));
        assert_eq!(Reviewer::Karl.rank(&movie), None);
        assert_eq!(
            movie.extra.get("letterboxd_url"),
            Some(&json!("https://letterboxd.com/film/alien/"))
        );

        let back = serde_json::to_value(&movie).unwrap();
        assert_eq!(back["letterboxd_url"], "https://letterboxd.com/film/alien/");
        assert_eq!(back["poster_url"], Value::Null);
    }

    #[test]
    fn movie_requires_created_at() {
        let raw = json!({ "id": "m1", "title": "Alien" });
        assert!(serde_json::from_value::<Movie>(raw).is_err());
    }
}
