pub mod models;

pub use models::{Movie, MovieDraft, MoviePatch, User, SCRAPER_PROVENANCE};
