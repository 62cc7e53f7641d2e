//! Persistence of the active message id
//!
//! The store holds at most one record: the id of the announcement that is
//! currently representative of the monitored site's status.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;

use crate::config::StoreConfig;
use crate::notifier::MessageId;
use crate::HeartbeatError;

/// Trait for the single-record state store
#[async_trait]
pub trait StateStore: Send + Sync + std::fmt::Debug {
    /// Read the stored id, if any
    async fn get_active_message_id(&self) -> crate::Result<Option<MessageId>>;

    /// Upsert the singleton record
    async fn set_active_message_id(&self, message_id: &MessageId) -> crate::Result<()>;

    /// Remove the singleton record
    async fn clear_active_message_id(&self) -> crate::Result<()>;
}

/// Where the SQLite database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    InMemory,
    File(PathBuf),
}

impl DbLocation {
    /// Resolve `STORE_URI` + `STORE_DB_NAME` into a database location.
    ///
    /// The URI is a directory, optionally prefixed with `sqlite://`; the
    /// database is the file `<name>.sqlite3` inside it. `:memory:` keeps
    /// everything in process memory.
    pub fn resolve(uri: &str, database: &str) -> crate::Result<Self> {
        let uri = uri.trim();
        if uri == ":memory:" {
            return Ok(DbLocation::InMemory);
        }
        validate_identifier("database name", database)?;
        let dir = uri.strip_prefix("sqlite://").unwrap_or(uri);
        if dir.is_empty() {
            return Err(HeartbeatError::Config(
                "Store URI does not name a directory".to_string(),
            ));
        }
        Ok(DbLocation::File(
            PathBuf::from(dir).join(format!("{}.sqlite3", database)),
        ))
    }
}

/// Table names cannot be bound as parameters, so only plain identifiers are accepted
fn validate_identifier(what: &str, name: &str) -> crate::Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(HeartbeatError::Config(format!(
            "Invalid {} '{}': use letters, digits and underscores only",
            what, name
        )))
    }
}

fn store_error(context: &str) -> impl Fn(rusqlite::Error) -> HeartbeatError + '_ {
    move |e| HeartbeatError::Store(format!("{}: {}", context, e))
}

/// SQLite-backed store. The singleton key makes a second row impossible.
pub struct SqliteStateStore {
    conn: Arc<Mutex<Connection>>,
    table: String,
    location: DbLocation,
}

impl std::fmt::Debug for SqliteStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStateStore")
            .field("location", &self.location)
            .field("table", &self.table)
            .finish()
    }
}

impl SqliteStateStore {
    /// Open (or create) the store described by the configuration
    pub async fn open(config: &StoreConfig) -> crate::Result<Self> {
        let location = DbLocation::resolve(&config.uri, &config.database)?;
        Self::open_at(location, &config.collection).await
    }

    pub async fn open_at(location: DbLocation, collection: &str) -> crate::Result<Self> {
        validate_identifier("collection name", collection)?;

        if let DbLocation::File(path) = &location {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tracing::info!("Opening state store at {}", path.display());
        }

        let open_location = location.clone();
        let conn = tokio::task::spawn_blocking(move || match open_location {
            DbLocation::InMemory => Connection::open_in_memory(),
            DbLocation::File(path) => Connection::open(path),
        })
        .await
        .map_err(|e| HeartbeatError::Store(format!("Open task failed: {}", e)))?
        .map_err(store_error("Failed to open SQLite database"))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            table: collection.to_string(),
            location,
        };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn initialize_schema(&self) -> crate::Result<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (
                singleton INTEGER PRIMARY KEY CHECK (singleton = 0),
                message_id TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            self.table
        );
        self.execute(move |conn| {
            conn.execute(&sql, [])
                .map_err(store_error("Failed to create table"))?;
            Ok(())
        })
        .await
    }

    /// Number of records in the table; never more than one
    pub async fn record_count(&self) -> crate::Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM \"{}\"", self.table);
        self.execute(move |conn| {
            conn.query_row(&sql, [], |row| row.get::<_, i64>(0))
                .map_err(store_error("Failed to count records"))
        })
        .await
    }

    /// Run a closure against the connection on the blocking pool
    async fn execute<F, R>(&self, f: F) -> crate::Result<R>
    where
        F: FnOnce(&Connection) -> crate::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            f(&conn)
        })
        .await
        .map_err(|e| HeartbeatError::Store(format!("Store task failed: {}", e)))?
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn get_active_message_id(&self) -> crate::Result<Option<MessageId>> {
        let sql = format!("SELECT message_id FROM \"{}\" LIMIT 1", self.table);
        self.execute(move |conn| {
            conn.query_row(&sql, [], |row| row.get::<_, String>(0))
                .optional()
                .map(|id| id.map(MessageId::from))
                .map_err(store_error("Failed to read message id"))
        })
        .await
    }

    async fn set_active_message_id(&self, message_id: &MessageId) -> crate::Result<()> {
        let sql = format!(
            "INSERT INTO \"{}\" (singleton, message_id, updated_at) VALUES (0, ?1, ?2)
             ON CONFLICT(singleton) DO UPDATE SET
                message_id = excluded.message_id,
                updated_at = excluded.updated_at",
            self.table
        );
        let id = message_id.as_str().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.execute(move |conn| {
            conn.execute(&sql, params![id, now])
                .map_err(store_error("Failed to store message id"))?;
            Ok(())
        })
        .await
    }

    async fn clear_active_message_id(&self) -> crate::Result<()> {
        let sql = format!("DELETE FROM \"{}\"", self.table);
        self.execute(move |conn| {
            conn.execute(&sql, [])
                .map_err(store_error("Failed to clear message id"))?;
            Ok(())
        })
        .await
    }
}
