pub mod codec;
pub mod error;
pub mod movies;
pub mod table;
pub mod users;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

use crate::error::StoreResult;
use crate::table::{Record, Table, TableSpec};

pub use crate::codec::{JsonCodec, TableCodec, TabularCodec};
pub use crate::error::StoreError;
pub use crate::movies::MovieStore;
pub use crate::users::UserStore;

/// Lock-guarded read-modify-write access to one table file.
///
/// Mutations are serialized by a per-store mutex held across the whole
/// load-mutate-persist span. Readers take no lock: persist installs the new
/// bytes with an atomic rename, so a concurrent `load_all` sees either the
/// entirely-old or entirely-new table, never a mix.
///
/// The serialization is in-process only. Independent processes sharing the
/// same files cannot corrupt each other's reads, but they can lose each
/// other's updates; cross-process coordination is out of scope.
pub struct TableStore {
    path: PathBuf,
    spec: &'static TableSpec,
    codec: Box<dyn TableCodec>,
    write_lock: Mutex<()>,
}

impl TableStore {
    /// Open the table backed by `<dir>/<table name>.<codec extension>`,
    /// creating the directory and an empty table file if absent.
    pub fn open(
        dir: &Path,
        spec: &'static TableSpec,
        codec: Box<dyn TableCodec>,
    ) -> StoreResult<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.{}", spec.name, codec.extension()));
        let store = Self {
            path,
            spec,
            codec,
            write_lock: Mutex::new(()),
        };
        if !store.path.exists() {
            store.persist_locked(&Table::empty(spec))?;
        }
        info!("Table {} backed by {}", spec.name, store.path.display());
        Ok(store)
    }

    /// Open with the default tabular backend.
    pub fn open_tabular(dir: &Path, spec: &'static TableSpec) -> StoreResult<Self> {
        Self::open(dir, spec, Box::new(TabularCodec))
    }

    pub fn spec(&self) -> &'static TableSpec {
        self.spec
    }

    /// Current full contents. A missing backing file reads as an empty
    /// table; it is recreated on the next persist.
    pub fn load_all(&self) -> StoreResult<Table> {
        match fs::read(&self.path) {
            Ok(bytes) => self.codec.decode(&bytes, self.spec),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Table::empty(self.spec))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the full table contents atomically.
    pub fn persist(&self, table: &Table) -> StoreResult<()> {
        let _guard = self.lock();
        self.persist_locked(table)
    }

    /// Run one read-modify-write cycle under the store lock. The closure
    /// returns `(value, dirty)`; the table is persisted only when dirty.
    ///
    /// Every check-then-mutate sequence must go through here: a lock taken
    /// only around the final write would not prevent two concurrent
    /// creators from computing the same next id.
    pub fn update<T>(
        &self,
        f: impl FnOnce(&mut Table) -> StoreResult<(T, bool)>,
    ) -> StoreResult<T> {
        let _guard = self.lock();
        let mut table = self.load_all()?;
        let (value, dirty) = f(&mut table)?;
        if dirty {
            self.persist_locked(&table)?;
        }
        Ok(value)
    }

    /// Assign the next id, append, and persist as one critical section.
    pub fn create(&self, fields: Record) -> StoreResult<Record> {
        self.update(move |table| {
            let mut record = fields;
            record.set("id", table.next_id());
            table.push(record.clone());
            debug!(table = table.spec().name, "record created");
            Ok((record, true))
        })
    }

    pub fn find_by_id(&self, id: i64) -> StoreResult<Option<Record>> {
        Ok(self.load_all()?.find_by_id(id).cloned())
    }

    pub fn find_first(
        &self,
        pred: impl Fn(&Record) -> bool,
    ) -> StoreResult<Option<Record>> {
        Ok(self.load_all()?.find_first(pred).cloned())
    }

    pub fn find_all(&self, pred: impl Fn(&Record) -> bool) -> StoreResult<Vec<Record>> {
        Ok(self
            .load_all()?
            .find_all(pred)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Apply only the fields present in `updates` to the row with the given
    /// id. Returns the updated record, or `None` (without rewriting the
    /// file) if the id is absent.
    pub fn upsert_by_id(&self, id: i64, updates: Record) -> StoreResult<Option<Record>> {
        self.update(move |table| match table.find_by_id_mut(id) {
            Some(row) => {
                for (field, value) in updates.iter() {
                    row.set(field, value.clone());
                }
                Ok((Some(row.clone()), true))
            }
            None => Ok((None, false)),
        })
    }

    /// Remove the row with the given id. An absent id returns `false` and
    /// leaves the file byte-identical.
    pub fn delete_by_id(&self, id: i64) -> StoreResult<bool> {
        self.update(move |table| {
            let removed = table.remove_by_id(id);
            Ok((removed, removed))
        })
    }

    /// Case-insensitive substring match, OR-combined over the spec's
    /// searchable columns. Null fields never match.
    pub fn search(&self, query: &str) -> StoreResult<Vec<Record>> {
        let needle = query.to_lowercase();
        self.find_all(|record| {
            self.spec.search_columns.iter().any(|col| {
                record
                    .str_field(col)
                    .is_some_and(|text| text.to_lowercase().contains(&needle))
            })
        })
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // The backing file is never left half-written, so a poisoned lock
        // is safe to re-enter.
        self.write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn persist_locked(&self, table: &Table) -> StoreResult<()> {
        let bytes = self.codec.encode(table)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &self.path)?;
        debug!(
            table = self.spec.name,
            rows = table.len(),
            "table persisted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use tempfile::TempDir;

    use super::*;
    use crate::movies::MOVIES;
    use crate::table::Value;

    fn movie_store(tmp: &TempDir) -> TableStore {
        TableStore::open_tabular(tmp.path(), &MOVIES).unwrap()
    }

    fn draft(title: &str) -> Record {
        let mut r = Record::new();
        r.set("title", title);
        r.set("added_by", "tester");
        r
    }

    #[test]
    fn open_creates_file_with_header() {
        let tmp = TempDir::new().unwrap();
        let store = movie_store(&tmp);

        let raw = std::fs::read_to_string(tmp.path().join("movies.csv")).unwrap();
        assert_eq!(
            raw.lines().next(),
            Some("id,title,year,director,description,added_by")
        );
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn load_all_on_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = movie_store(&tmp);
        std::fs::remove_file(tmp.path().join("movies.csv")).unwrap();

        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn create_assigns_sequential_ids() {
        let tmp = TempDir::new().unwrap();
        let store = movie_store(&tmp);

        let a = store.create(draft("Alien")).unwrap();
        let b = store.create(draft("Blade Runner")).unwrap();
        assert_eq!(a.int_field("id"), Some(1));
        assert_eq!(b.int_field("id"), Some(2));
    }

    #[test]
    fn next_id_follows_current_max() {
        let tmp = TempDir::new().unwrap();
        let store = movie_store(&tmp);

        store.create(draft("Alien")).unwrap();
        let b = store.create(draft("Blade Runner")).unwrap();
        store.delete_by_id(b.int_field("id").unwrap()).unwrap();

        let c = store.create(draft("Casablanca")).unwrap();
        assert_eq!(c.int_field("id"), Some(2));
    }

    #[test]
    fn concurrent_creates_assign_distinct_ids() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(movie_store(&tmp));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store
                        .create(draft(&format!("Movie {i}")))
                        .unwrap()
                        .int_field("id")
                        .unwrap()
                })
            })
            .collect();

        let mut ids: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=16).collect::<Vec<i64>>());
        assert_eq!(store.load_all().unwrap().len(), 16);
    }

    #[test]
    fn persist_then_load_roundtrips() {
        let tmp = TempDir::new().unwrap();
        let store = movie_store(&tmp);

        let mut r = draft("Inception");
        r.set("year", 2010_i64);
        r.set("director", "Christopher Nolan");
        store.create(r).unwrap();

        let table = store.load_all().unwrap();
        let row = &table.rows()[0];
        assert_eq!(row.int_field("year"), Some(2010));
        assert_eq!(row.str_field("director"), Some("Christopher Nolan"));
        assert!(row.get("description").is_null());
    }

    #[test]
    fn upsert_applies_only_supplied_fields() {
        let tmp = TempDir::new().unwrap();
        let store = movie_store(&tmp);

        let mut r = draft("Inception");
        r.set("year", 2010_i64);
        let created = store.create(r).unwrap();
        let id = created.int_field("id").unwrap();

        let mut patch = Record::new();
        patch.set("title", "Inception (Director's Cut)");
        let updated = store.upsert_by_id(id, patch).unwrap().unwrap();

        assert_eq!(updated.str_field("title"), Some("Inception (Director's Cut)"));
        assert_eq!(updated.int_field("year"), Some(2010));
        assert_eq!(updated.str_field("added_by"), Some("tester"));
    }

    #[test]
    fn upsert_absent_id_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = movie_store(&tmp);

        let mut patch = Record::new();
        patch.set("title", "Ghost");
        assert!(store.upsert_by_id(99, patch).unwrap().is_none());
    }

    #[test]
    fn delete_absent_id_leaves_file_byte_identical() {
        let tmp = TempDir::new().unwrap();
        let store = movie_store(&tmp);
        store.create(draft("Alien")).unwrap();

        let path = tmp.path().join("movies.csv");
        let before = std::fs::read(&path).unwrap();
        assert!(!store.delete_by_id(99).unwrap());
        let after = std::fs::read(&path).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn delete_existing_id_removes_row() {
        let tmp = TempDir::new().unwrap();
        let store = movie_store(&tmp);
        let created = store.create(draft("Alien")).unwrap();

        assert!(store.delete_by_id(created.int_field("id").unwrap()).unwrap());
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn search_matches_case_insensitive_substrings() {
        let tmp = TempDir::new().unwrap();
        let store = movie_store(&tmp);

        store.create(draft("Inception")).unwrap();
        let mut matrix = draft("The Matrix");
        matrix.set("director", "Lana Wachowski");
        store.create(matrix).unwrap();

        let hits = store.search("incep").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].str_field("title"), Some("Inception"));

        let hits = store.search("WACHOWSKI").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].str_field("title"), Some("The Matrix"));
    }

    #[test]
    fn search_null_fields_never_match() {
        let tmp = TempDir::new().unwrap();
        let store = movie_store(&tmp);
        store.create(draft("Inception")).unwrap(); // director, description null

        assert!(store.search("nolan").unwrap().is_empty());
    }

    #[test]
    fn atomic_persist_readers_never_observe_a_mix() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(movie_store(&tmp));

        let mut small = Table::empty(&MOVIES);
        let mut rec = draft("Solo");
        rec.set("id", 1_i64);
        small.push(rec);

        let mut large = Table::empty(&MOVIES);
        for i in 1..=40_i64 {
            let mut rec = draft(&format!("Bulk {i}"));
            rec.set("id", i);
            large.push(rec);
        }

        store.persist(&small).unwrap();

        let writer = {
            let store = Arc::clone(&store);
            let (small, large) = (small.clone(), large.clone());
            thread::spawn(move || {
                for round in 0..50 {
                    let table = if round % 2 == 0 { &large } else { &small };
                    store.persist(table).unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..50 {
                        let seen = store.load_all().unwrap().len();
                        assert!(
                            seen == 1 || seen == 40,
                            "observed partially written table of {seen} rows"
                        );
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }

    #[test]
    fn json_backend_roundtrips_through_store() {
        let tmp = TempDir::new().unwrap();
        let store = TableStore::open(tmp.path(), &MOVIES, Box::new(JsonCodec)).unwrap();

        let mut r = draft("Inception");
        r.set("year", 2010_i64);
        store.create(r).unwrap();

        assert!(tmp.path().join("movies.json").exists());
        let table = store.load_all().unwrap();
        assert_eq!(table.rows()[0].int_field("year"), Some(2010));
    }

    #[test]
    fn malformed_rows_degrade_instead_of_failing_load() {
        let tmp = TempDir::new().unwrap();
        let store = movie_store(&tmp);
        std::fs::write(
            tmp.path().join("movies.csv"),
            "id,title,year,director,description,added_by\nnope,Alien,soon,,,bob\n",
        )
        .unwrap();

        let table = store.load_all().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].get("id"), &Value::Null);
        assert_eq!(table.rows()[0].str_field("title"), Some("Alien"));
    }
}
