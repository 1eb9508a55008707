//! `SQLite` backend for keyword subscriptions.
//!
//! One table, `keywords`, keyed by `(user_id, keyword, channel_id, guild_id)`.
//! The keyword column uses `NOCASE` collation so uniqueness, lookups and
//! deletes all ignore ASCII case. `channel_id` holds either a channel id or
//! the literal `GLOBAL`.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension, params};

use crate::models::{Scope, ServerId, Subscription, UserId};
use crate::storage::connection::{acquire_lock, configure_connection, open_database};
use crate::{Error, Result};

use super::traits::SubscriptionBackend;

/// SQLite-based subscription backend.
pub struct SqliteSubscriptionBackend {
    conn: Mutex<Connection>,
}

impl SqliteSubscriptionBackend {
    /// Opens (or creates) the subscription database at `path`.
    ///
    /// The parent directory is created when missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = open_database(path.as_ref())?;
        let backend = Self {
            conn: Mutex::new(conn),
        };
        backend.initialize_schema()?;
        Ok(backend)
    }

    /// Creates an in-memory backend (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::OperationFailed {
            operation: "open_database_memory".to_string(),
            cause: e.to_string(),
        })?;
        configure_connection(&conn);

        let backend = Self {
            conn: Mutex::new(conn),
        };
        backend.initialize_schema()?;
        Ok(backend)
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS keywords (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                keyword TEXT NOT NULL COLLATE NOCASE,
                channel_id TEXT NOT NULL,
                guild_id INTEGER NOT NULL,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_keywords_unique
                ON keywords (user_id, keyword, channel_id, guild_id);

            CREATE INDEX IF NOT EXISTS idx_keywords_guild
                ON keywords (guild_id);
            ",
        )
        .map_err(|e| Error::OperationFailed {
            operation: "initialize_subscription_schema".to_string(),
            cause: e.to_string(),
        })
    }
}

fn query_failed(operation: &str) -> impl FnOnce(rusqlite::Error) -> Error + '_ {
    move |e| Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}

/// Converts a snowflake id into the signed integer `SQLite` stores.
fn sql_id(raw: u64, what: &str) -> Result<i64> {
    i64::try_from(raw)
        .map_err(|_| Error::InvalidInput(format!("{what} id {raw} is out of range for storage")))
}

/// Builds a subscription from a stored row, dropping rows whose scope key
/// is neither `GLOBAL` nor a channel id.
fn subscription_from_row(owner: UserId, keyword: String, scope_key: &str) -> Option<Subscription> {
    let Some(scope) = Scope::from_storage_key(scope_key) else {
        tracing::warn!(
            user_id = %owner,
            keyword = %keyword,
            channel_id = %scope_key,
            "Ignoring subscription with unreadable scope"
        );
        return None;
    };
    Some(Subscription::new(owner, keyword, scope))
}

impl SubscriptionBackend for SqliteSubscriptionBackend {
    fn add(&self, server: ServerId, subscription: &Subscription) -> Result<bool> {
        let owner = sql_id(subscription.owner.get(), "user")?;
        let guild = sql_id(server.get(), "server")?;
        let conn = acquire_lock(&self.conn);
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO keywords (user_id, keyword, channel_id, guild_id)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    owner,
                    subscription.keyword,
                    subscription.scope.storage_key(),
                    guild
                ],
            )
            .map_err(query_failed("add_keyword"))?;
        Ok(inserted > 0)
    }

    fn exists(&self, server: ServerId, owner: UserId, keyword: &str, scope: Scope) -> Result<bool> {
        let (user, guild) = (sql_id(owner.get(), "user")?, sql_id(server.get(), "server")?);
        let conn = acquire_lock(&self.conn);
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM keywords
                 WHERE user_id = ?1 AND keyword = ?2 AND channel_id = ?3 AND guild_id = ?4
                 LIMIT 1",
                params![user, keyword, scope.storage_key(), guild],
                |row| row.get(0),
            )
            .optional()
            .map_err(query_failed("keyword_exists"))?;
        Ok(found.is_some())
    }

    fn count_for_user(&self, server: ServerId, owner: UserId) -> Result<usize> {
        let (user, guild) = (sql_id(owner.get(), "user")?, sql_id(server.get(), "server")?);
        let conn = acquire_lock(&self.conn);
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM keywords WHERE user_id = ?1 AND guild_id = ?2",
                params![user, guild],
                |row| row.get(0),
            )
            .map_err(query_failed("count_keywords"))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn list_for_user(&self, server: ServerId, owner: UserId) -> Result<Vec<Subscription>> {
        let (user, guild) = (sql_id(owner.get(), "user")?, sql_id(server.get(), "server")?);
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn
            .prepare(
                "SELECT keyword, channel_id FROM keywords
                 WHERE user_id = ?1 AND guild_id = ?2
                 ORDER BY keyword, channel_id",
            )
            .map_err(query_failed("list_keywords"))?;

        let rows = stmt
            .query_map(params![user, guild], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(query_failed("list_keywords"))?;

        let mut subscriptions = Vec::new();
        for row in rows {
            let (keyword, scope_key) = row.map_err(query_failed("list_keywords"))?;
            subscriptions.extend(subscription_from_row(owner, keyword, &scope_key));
        }
        Ok(subscriptions)
    }

    fn remove(&self, server: ServerId, owner: UserId, keyword: &str) -> Result<usize> {
        let (user, guild) = (sql_id(owner.get(), "user")?, sql_id(server.get(), "server")?);
        let conn = acquire_lock(&self.conn);
        conn.execute(
            "DELETE FROM keywords WHERE user_id = ?1 AND guild_id = ?2 AND keyword = ?3",
            params![user, guild, keyword],
        )
        .map_err(query_failed("remove_keyword"))
    }

    fn list_for_server(&self, server: ServerId) -> Result<Vec<Subscription>> {
        let guild = sql_id(server.get(), "server")?;
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn
            .prepare(
                "SELECT user_id, keyword, channel_id FROM keywords
                 WHERE guild_id = ?1
                 ORDER BY id",
            )
            .map_err(query_failed("fetch_keywords_for_guild"))?;

        let rows = stmt
            .query_map(params![guild], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(query_failed("fetch_keywords_for_guild"))?;

        let mut subscriptions = Vec::new();
        for row in rows {
            let (owner, keyword, scope_key) =
                row.map_err(query_failed("fetch_keywords_for_guild"))?;
            let Ok(owner) = u64::try_from(owner) else {
                tracing::warn!(
                    user_id = owner,
                    keyword = %keyword,
                    "Ignoring subscription with negative user id"
                );
                continue;
            };
            subscriptions.extend(subscription_from_row(UserId::new(owner), keyword, &scope_key));
        }
        Ok(subscriptions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChannelId;

    const SERVER: ServerId = ServerId::new(10);
    const OTHER_SERVER: ServerId = ServerId::new(20);
    const ALICE: UserId = UserId::new(1);
    const BOB: UserId = UserId::new(2);
    const GENERAL: ChannelId = ChannelId::new(100);

    fn backend() -> SqliteSubscriptionBackend {
        SqliteSubscriptionBackend::in_memory().expect("in-memory backend")
    }

    #[test]
    fn test_add_is_idempotent() {
        let store = backend();
        let sub = Subscription::global(ALICE, "sale");

        assert!(store.add(SERVER, &sub).expect("add"));
        assert!(!store.add(SERVER, &sub).expect("add again"));
        assert_eq!(store.count_for_user(SERVER, ALICE).expect("count"), 1);
    }

    #[test]
    fn test_keywords_ignore_case() {
        let store = backend();
        store
            .add(SERVER, &Subscription::global(ALICE, "Sale"))
            .expect("add");

        assert!(!store.add(SERVER, &Subscription::global(ALICE, "SALE")).expect("add"));
        assert!(store.exists(SERVER, ALICE, "sale", Scope::Global).expect("exists"));
        assert_eq!(store.remove(SERVER, ALICE, "sAlE").expect("remove"), 1);
    }

    #[test]
    fn test_scopes_are_distinct_rows() {
        let store = backend();
        store.add(SERVER, &Subscription::global(ALICE, "sale")).expect("add");
        store
            .add(SERVER, &Subscription::in_channel(ALICE, "sale", GENERAL))
            .expect("add");

        assert!(store.exists(SERVER, ALICE, "sale", Scope::Channel(GENERAL)).expect("exists"));
        assert!(!store.exists(SERVER, ALICE, "sale", Scope::Channel(ChannelId::new(5))).expect("exists"));
        assert_eq!(store.count_for_user(SERVER, ALICE).expect("count"), 2);
        assert_eq!(store.remove(SERVER, ALICE, "sale").expect("remove"), 2);
        assert_eq!(store.count_for_user(SERVER, ALICE).expect("count"), 0);
    }

    #[test]
    fn test_servers_are_isolated() {
        let store = backend();
        store.add(SERVER, &Subscription::global(ALICE, "sale")).expect("add");
        store.add(OTHER_SERVER, &Subscription::global(BOB, "deal")).expect("add");

        let here = store.list_for_server(SERVER).expect("list");
        assert_eq!(here, vec![Subscription::global(ALICE, "sale")]);
        assert_eq!(store.count_for_user(OTHER_SERVER, ALICE).expect("count"), 0);
        assert_eq!(store.remove(OTHER_SERVER, ALICE, "sale").expect("remove"), 0);
    }

    #[test]
    fn test_list_for_user_orders_by_keyword_then_scope() {
        let store = backend();
        for sub in [
            Subscription::global(ALICE, "zebra"),
            Subscription::in_channel(ALICE, "apple", GENERAL),
            Subscription::global(ALICE, "apple"),
            Subscription::global(BOB, "apple"),
        ] {
            store.add(SERVER, &sub).expect("add");
        }

        let listed = store.list_for_user(SERVER, ALICE).expect("list");
        let keys: Vec<_> = listed
            .iter()
            .map(|s| (s.keyword.as_str(), s.scope.storage_key()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("apple", "100".to_string()),
                ("apple", "GLOBAL".to_string()),
                ("zebra", "GLOBAL".to_string()),
            ]
        );
    }

    #[test]
    fn test_rows_with_unreadable_scope_are_skipped() {
        let store = backend();
        store.add(SERVER, &Subscription::global(ALICE, "sale")).expect("add");
        acquire_lock(&store.conn)
            .execute(
                "INSERT INTO keywords (user_id, keyword, channel_id, guild_id) VALUES (1, 'x', 'bogus', 10)",
                [],
            )
            .expect("raw insert");

        assert_eq!(store.list_for_server(SERVER).expect("list").len(), 1);
        assert_eq!(store.list_for_user(SERVER, ALICE).expect("list").len(), 1);
    }

    #[test]
    fn test_snowflake_ids_round_trip() {
        let store = backend();
        let server = ServerId::new(1_187_284_117_418_942_464);
        let owner = UserId::new(987_654_321_098_765_432);
        let channel = ChannelId::new(1_201_334_556_778_990_112);
        let sub = Subscription::in_channel(owner, "세일", channel);

        assert!(store.add(server, &sub).expect("add"));
        assert!(store.exists(server, owner, "세일", Scope::Channel(channel)).expect("exists"));
        assert_eq!(store.count_for_user(server, owner).expect("count"), 1);
        assert_eq!(store.list_for_server(server).expect("list"), vec![sub.clone()]);
        assert_eq!(store.list_for_user(server, owner).expect("list"), vec![sub]);
        assert_eq!(store.remove(server, owner, "세일").expect("remove"), 1);
    }

    #[test]
    fn test_ids_beyond_sqlite_range_are_rejected() {
        let store = backend();
        let huge = UserId::new(u64::MAX);

        let err = store
            .add(SERVER, &Subscription::global(huge, "sale"))
            .expect_err("out of range");
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(matches!(
            store.list_for_server(ServerId::new(u64::MAX)),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_file_backend_persists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data").join("keywords.db");

        {
            let store = SqliteSubscriptionBackend::new(&path).expect("open");
            store.add(SERVER, &Subscription::global(ALICE, "세일")).expect("add");
        }

        let reopened = SqliteSubscriptionBackend::new(&path).expect("reopen");
        assert!(reopened.exists(SERVER, ALICE, "세일", Scope::Global).expect("exists"));
    }
}
