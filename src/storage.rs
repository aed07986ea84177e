//! The storage module keeps the little bit of state the sync core owns itself:
//! when forms and cohorts were last synced. Everything else belongs to the
//! host's backend.

use ::std::sync::Mutex;

use ::rusqlite::{Connection, OptionalExtension};

use crate::error::{MError, MResult};
use crate::sync::backend::TimestampStore;
use crate::sync::request::SyncKind;

/// Holds our sqlite connection
pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    /// Make a Storage lol. `:memory:` gets you an in-memory db.
    pub fn new(location: &str) -> MResult<Storage> {
        let conn = if location == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(location)?
        };
        conn.execute("CREATE TABLE IF NOT EXISTS muzima_kv (key VARCHAR(64) PRIMARY KEY, value TEXT)", [])?;
        debug!("Storage::new() -- opened {}", location);
        Ok(Storage {
            conn: Mutex::new(conn),
        })
    }

    /// Set a value into the key/val store
    pub fn kv_set(&self, key: &str, val: &str) -> MResult<()> {
        let conn = lock!(self.conn);
        conn.execute("INSERT OR REPLACE INTO muzima_kv (key, value) VALUES (?1, ?2)", [key, val])?;
        Ok(())
    }

    /// Get a value from the key/val store
    pub fn kv_get(&self, key: &str) -> MResult<Option<String>> {
        let conn = lock!(self.conn);
        let val = conn.query_row("SELECT value FROM muzima_kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(val)
    }

    /// Remove a value from the key/val store
    pub fn kv_delete(&self, key: &str) -> MResult<()> {
        let conn = lock!(self.conn);
        conn.execute("DELETE FROM muzima_kv WHERE key = ?1", [key])?;
        Ok(())
    }
}

/// The kv key a sync kind's timestamp lives under. Only forms and cohorts are
/// tracked.
fn timestamp_key(kind: SyncKind) -> Option<&'static str> {
    match kind {
        SyncKind::Forms => Some("forms_metadata_last_synced_time"),
        SyncKind::Cohorts => Some("cohorts_last_synced_time"),
        _ => None,
    }
}

impl TimestampStore for Storage {
    fn last_synced(&self, kind: SyncKind) -> MResult<Option<i64>> {
        let key = match timestamp_key(kind) {
            Some(x) => x,
            None => return Ok(None),
        };
        match self.kv_get(key)? {
            Some(val) => {
                let millis = val.parse::<i64>()
                    .map_err(|_| MError::BadValue(format!("Storage::last_synced() -- {}: {}", key, val)))?;
                Ok(Some(millis))
            }
            None => Ok(None),
        }
    }

    fn mark_synced(&self, kind: SyncKind, at: i64) -> MResult<()> {
        match timestamp_key(kind) {
            Some(key) => self.kv_set(key, &at.to_string()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_set_get() {
        let storage = Storage::new(":memory:").unwrap();
        storage.kv_set("some_setting", "I AM ABOVE THE LAW").unwrap();
        assert_eq!(storage.kv_get("some_setting").unwrap(), Some(String::from("I AM ABOVE THE LAW")));
        storage.kv_set("some_setting", "i got no feelin'").unwrap();
        assert_eq!(storage.kv_get("some_setting").unwrap(), Some(String::from("i got no feelin'")));
        assert_eq!(storage.kv_get("doesnt_exist").unwrap(), None);
        storage.kv_delete("some_setting").unwrap();
        assert_eq!(storage.kv_get("some_setting").unwrap(), None);
    }

    #[test]
    fn tracks_forms_and_cohorts() {
        let storage = Storage::new(":memory:").unwrap();
        assert_eq!(storage.last_synced(SyncKind::Forms).unwrap(), None);
        storage.mark_synced(SyncKind::Forms, 1500000000000).unwrap();
        storage.mark_synced(SyncKind::Cohorts, 1500000000999).unwrap();
        assert_eq!(storage.last_synced(SyncKind::Forms).unwrap(), Some(1500000000000));
        assert_eq!(storage.last_synced(SyncKind::Cohorts).unwrap(), Some(1500000000999));
        assert_eq!(storage.kv_get("cohorts_last_synced_time").unwrap(), Some(String::from("1500000000999")));

        storage.mark_synced(SyncKind::UploadForms, 42).unwrap();
        assert_eq!(storage.last_synced(SyncKind::UploadForms).unwrap(), None);
    }

    #[test]
    fn garbage_timestamps_error() {
        let storage = Storage::new(":memory:").unwrap();
        storage.kv_set("forms_metadata_last_synced_time", "yesterday").unwrap();
        assert!(storage.last_synced(SyncKind::Forms).is_err());
    }
}
