//! Shared connection handling for `SQLite` backends.

use crate::{Error, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Acquires `mutex`, recovering the guard if a previous holder panicked.
///
/// The connection stays usable after a panic in another critical section,
/// so a poisoned lock is logged and counted instead of propagated.
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            metrics::counter!("sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Opens the database at `path`, creating its parent directory first.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the directory cannot be created or
/// the database cannot be opened.
pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
            operation: "create_database_dir".to_string(),
            cause: format!("{}: {e}", parent.display()),
        })?;
    }

    let conn = Connection::open(path).map_err(|e| Error::OperationFailed {
        operation: "open_database".to_string(),
        cause: e.to_string(),
    })?;
    configure_connection(&conn);
    Ok(conn)
}

/// Applies the pragmas every file-backed connection runs with.
///
/// - `journal_mode = WAL`: readers do not block the writer
/// - `synchronous = NORMAL`
/// - `busy_timeout = 5000`: wait for locks instead of failing with `SQLITE_BUSY`
///
/// Pragma failures are ignored; an in-memory database rejects WAL, for one.
pub fn configure_connection(conn: &Connection) {
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    let _ = conn.pragma_update(None, "busy_timeout", "5000");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_acquire_lock_recovers_from_poison() {
        let mutex = Arc::new(Mutex::new(7));
        let poisoner = Arc::clone(&mutex);
        let _ = thread::spawn(move || {
            let _guard = poisoner.lock().expect("lock");
            panic!("poison the mutex");
        })
        .join();

        assert!(mutex.is_poisoned());
        assert_eq!(*acquire_lock(&mutex), 7);
    }

    #[test]
    fn test_open_database_creates_parent_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("data").join("keywords.db");

        let conn = open_database(&path).expect("open");
        drop(conn);

        assert!(path.exists());
    }
}
