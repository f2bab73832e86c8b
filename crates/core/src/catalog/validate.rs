/// Catalog invariants checked before a collection is persisted.
use std::collections::{HashMap, HashSet};

use thiserror::Error;

use super::model::{Movie, Reviewer};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("movie id cannot be empty")]
    EmptyId,
    #[error("movie {0} has an empty title")]
    EmptyTitle(String),
    #[error("duplicate movie id {0}")]
    DuplicateId(String),
    #[error("{reviewer} rank {rank} is used by both {first} and {second}")]
    DuplicateRank {
        reviewer: Reviewer,
        rank: i32,
        first: String,
        second: String,
    },
}

/// Validate that a collection has unique ids, non-empty titles and a strict
/// rank order per reviewer.
pub fn validate_collection(movies: &[Movie]) -> Result<(), ValidationError> {
    let mut ids = HashSet::with_capacity(movies.len());
    for movie in movies {
        if movie.id.is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if movie.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle(movie.id.clone()));
        }
        if !ids.insert(movie.id.as_str()) {
            return Err(ValidationError::DuplicateId(movie.id.clone()));
        }
    }

    for reviewer in Reviewer::ALL {
        let mut seen: HashMap<i32, &str> = HashMap::new();
        for movie in movies {
            let Some(rank) = reviewer.rank(movie) else {
                continue;
            };
            if let Some(first) = seen.insert(rank, &movie.id) {
                return Err(ValidationError::DuplicateRank {
                    reviewer,
                    rank,
                    first: first.to_string(),
                    second: movie.id.clone(),
                });
            }
        }
    }

    Ok(())
}
