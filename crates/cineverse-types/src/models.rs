use serde::{Deserialize, Serialize};

/// Provenance tag stamped on movies created by the scraping pipeline.
/// Free text, not a foreign key into the users table.
pub const SCRAPER_PROVENANCE: &str = "scraper";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub year: Option<i64>,
    pub director: Option<String>,
    pub description: Option<String>,
    pub added_by: String,
}

/// Input for creating a movie. The id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDraft {
    pub title: String,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub added_by: String,
}

impl MovieDraft {
    /// A draft originating from the scraping pipeline.
    pub fn scraped(
        title: impl Into<String>,
        year: Option<i64>,
        director: Option<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            year,
            director,
            description,
            added_by: SCRAPER_PROVENANCE.to_string(),
        }
    }
}

/// Partial movie update. `None` means "leave the field unchanged".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoviePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl MoviePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.year.is_none()
            && self.director.is_none()
            && self.description.is_none()
    }
}
