//! Typed repository over the movies table.
//!
//! `added_by` is a free-text provenance tag (a username, or "scraper" for
//! rows supplied by the scraping pipeline); it is not validated against the
//! users table.

use std::path::Path;

use cineverse_types::{Movie, MovieDraft, MoviePatch};

use crate::codec::TableCodec;
use crate::error::StoreResult;
use crate::table::{Record, TableSpec};
use crate::TableStore;

pub static MOVIES: TableSpec = TableSpec {
    name: "movies",
    columns: &["id", "title", "year", "director", "description", "added_by"],
    int_columns: &["id", "year"],
    search_columns: &["title", "director", "description"],
};

pub struct MovieStore {
    inner: TableStore,
}

impl MovieStore {
    pub fn open(dir: &Path) -> StoreResult<Self> {
        Ok(Self {
            inner: TableStore::open_tabular(dir, &MOVIES)?,
        })
    }

    pub fn open_with(dir: &Path, codec: Box<dyn TableCodec>) -> StoreResult<Self> {
        Ok(Self {
            inner: TableStore::open(dir, &MOVIES, codec)?,
        })
    }

    pub fn create(&self, draft: MovieDraft) -> StoreResult<Movie> {
        let record = self.inner.create(draft_record(&draft))?;
        Ok(Movie {
            id: record.int_field("id").unwrap_or_default(),
            title: draft.title,
            year: draft.year,
            director: draft.director,
            description: draft.description,
            added_by: draft.added_by,
        })
    }

    pub fn get(&self, id: i64) -> StoreResult<Option<Movie>> {
        Ok(self.inner.find_by_id(id)?.as_ref().and_then(from_record))
    }

    pub fn list(&self) -> StoreResult<Vec<Movie>> {
        Ok(self
            .inner
            .load_all()?
            .rows()
            .iter()
            .filter_map(from_record)
            .collect())
    }

    pub fn update(&self, id: i64, patch: MoviePatch) -> StoreResult<Option<Movie>> {
        let mut updates = Record::new();
        if let Some(title) = &patch.title {
            updates.set("title", title.as_str());
        }
        if let Some(year) = patch.year {
            updates.set("year", year);
        }
        if let Some(director) = &patch.director {
            updates.set("director", director.as_str());
        }
        if let Some(description) = &patch.description {
            updates.set("description", description.as_str());
        }
        Ok(self
            .inner
            .upsert_by_id(id, updates)?
            .as_ref()
            .and_then(from_record))
    }

    pub fn delete(&self, id: i64) -> StoreResult<bool> {
        self.inner.delete_by_id(id)
    }

    pub fn search(&self, query: &str) -> StoreResult<Vec<Movie>> {
        Ok(self
            .inner
            .search(query)?
            .iter()
            .filter_map(from_record)
            .collect())
    }
}

fn draft_record(draft: &MovieDraft) -> Record {
    let mut record = Record::new();
    record.set("title", draft.title.as_str());
    record.set("year", draft.year);
    record.set("director", draft.director.clone());
    record.set("description", draft.description.clone());
    record.set("added_by", draft.added_by.as_str());
    record
}

fn from_record(record: &Record) -> Option<Movie> {
    Some(Movie {
        id: record.int_field("id")?,
        title: record.str_field("title").unwrap_or_default().to_string(),
        year: record.int_field("year"),
        director: record.str_field("director").map(str::to_string),
        description: record.str_field("description").map(str::to_string),
        added_by: record.str_field("added_by").unwrap_or_default().to_string(),
    })
}
