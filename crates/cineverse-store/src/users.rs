//! Typed repository over the users table.

use std::path::Path;

use cineverse_types::User;
use tracing::info;

use crate::codec::TableCodec;
use crate::error::StoreResult;
use crate::table::{Record, TableSpec};
use crate::TableStore;

pub static USERS: TableSpec = TableSpec {
    name: "users",
    columns: &["id", "username", "password_hash"],
    int_columns: &["id"],
    search_columns: &[],
};

pub struct UserStore {
    inner: TableStore,
}

impl UserStore {
    pub fn open(dir: &Path) -> StoreResult<Self> {
        Ok(Self {
            inner: TableStore::open_tabular(dir, &USERS)?,
        })
    }

    pub fn open_with(dir: &Path, codec: Box<dyn TableCodec>) -> StoreResult<Self> {
        Ok(Self {
            inner: TableStore::open(dir, &USERS, codec)?,
        })
    }

    /// Create a user unless the username is already taken. The existence
    /// check and the insert run as one critical section, so two concurrent
    /// registrations for the same name cannot both succeed.
    ///
    /// Returns `None` on a duplicate; the existing row is left untouched.
    pub fn create_unique(
        &self,
        username: &str,
        password_hash: &str,
        ignore_case: bool,
    ) -> StoreResult<Option<User>> {
        let username = username.trim().to_string();
        let password_hash = password_hash.to_string();
        self.inner.update(move |table| {
            let taken = table
                .find_first(|row| username_matches(row, &username, ignore_case))
                .is_some();
            if taken {
                return Ok((None, false));
            }

            let user = User {
                id: table.next_id(),
                username,
                password_hash,
            };
            table.push(to_record(&user));
            info!(username = %user.username, id = user.id, "user created");
            Ok((Some(user), true))
        })
    }

    pub fn find_by_username(
        &self,
        username: &str,
        ignore_case: bool,
    ) -> StoreResult<Option<User>> {
        let username = username.trim();
        Ok(self
            .inner
            .find_first(|row| username_matches(row, username, ignore_case))?
            .as_ref()
            .and_then(from_record))
    }

    pub fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.inner.find_by_id(id)?.as_ref().and_then(from_record))
    }

    /// Update username and/or password hash; `None` leaves a field as is.
    pub fn update_user(
        &self,
        id: i64,
        username: Option<&str>,
        password_hash: Option<&str>,
    ) -> StoreResult<Option<User>> {
        let mut updates = Record::new();
        if let Some(username) = username {
            updates.set("username", username.trim());
        }
        if let Some(password_hash) = password_hash {
            updates.set("password_hash", password_hash);
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

    pub fn count(&self) -> StoreResult<usize> {
        Ok(self.inner.load_all()?.len())
    }
}

fn username_matches(row: &Record, username: &str, ignore_case: bool) -> bool {
    match row.str_field("username") {
        Some(existing) if ignore_case => existing.eq_ignore_ascii_case(username),
        Some(existing) => existing == username,
        None => false,
    }
}

fn to_record(user: &User) -> Record {
    let mut record = Record::new();
    record.set("id", user.id);
    record.set("username", user.username.as_str());
    record.set("password_hash", user.password_hash.as_str());
    record
}

/// Rows missing an id or username do not map to a usable user.
fn from_record(record: &Record) -> Option<User> {
    Some(User {
        id: record.int_field("id")?,
        username: record.str_field("username")?.to_string(),
        password_hash: record
            .str_field("password_hash")
            .unwrap_or_default()
            .to_string(),
    })
}
