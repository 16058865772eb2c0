use rusqlite::config::DbConfig;
use rusqlite::{Connection, OpenFlags, OptionalExtension};

use crate::error::BatchError;
use crate::stream::DEFAULT_ROUGH_CUTOFF_SIZE;

/// Options for opening a batch connection.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub db_path: String,
    pub flags: OpenFlags,
    /// Encryption key applied with `PRAGMA key` right after open. Needs the `sqlcipher`
    /// feature; opening with a key against plain SQLite is rejected.
    pub key: Option<String>,
    /// Enable `SQLITE_DBCONFIG_DEFENSIVE`.
    pub defensive: bool,
    /// Rough cutoff used by streamed batches.
    pub rough_cutoff_size: usize,
}

impl BatchOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            flags: default_open_flags(),
            key: None,
            defensive: true,
            rough_cutoff_size: DEFAULT_ROUGH_CUTOFF_SIZE,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(":memory:")
    }

    #[must_use]
    pub fn builder(db_path: impl Into<String>) -> BatchOptionsBuilder {
        BatchOptionsBuilder::new(db_path)
    }

    /// Open the connection described by these options.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::ConnectionError` if the database cannot be opened or configured,
    /// and `BatchError::ConfigError` if the rough cutoff is zero, a key is set but the linked
    /// SQLite has no encryption support, or the key does not decrypt the database.
    pub fn open(&self) -> Result<Connection, BatchError> {
        if self.rough_cutoff_size == 0 {
            return Err(BatchError::ConfigError(
                "rough cutoff size must be greater than zero".to_string(),
            ));
        }

        tracing::info!(path = %self.db_path, "opening SQLite batch connection");
        let conn = Connection::open_with_flags(&self.db_path, self.flags).map_err(|e| {
            BatchError::ConnectionError(format!(
                "Failed to open SQLite database at '{}': {e}",
                self.db_path
            ))
        })?;

        if self.defensive {
            conn.set_db_config(DbConfig::SQLITE_DBCONFIG_DEFENSIVE, true)
                .map_err(|e| {
                    BatchError::ConnectionError(format!("Failed to enable defensive mode: {e}"))
                })?;
        }

        if let Some(key) = self.key.as_deref().filter(|key| !key.is_empty()) {
            apply_key(&conn, key)?;
        }

        Ok(conn)
    }
}

/// Key the connection and make sure the key is actually in effect.
fn apply_key(conn: &Connection, key: &str) -> Result<(), BatchError> {
    conn.pragma_update(None, "key", key)
        .map_err(|e| BatchError::ConfigError(format!("password key error: {e}")))?;

    // plain SQLite ignores unknown pragmas, so no row here means the key was dropped
    let cipher_version: Option<String> = conn
        .query_row("PRAGMA cipher_version", [], |row| row.get(0))
        .optional()
        .map_err(|e| BatchError::ConfigError(format!("password key error: {e}")))?;
    let Some(cipher_version) = cipher_version else {
        return Err(BatchError::ConfigError(
            "password key error: SQLite was built without encryption support".to_string(),
        ));
    };

    // the first read fails with "file is not a database" on a wrong key
    conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
        .map_err(|e| BatchError::ConfigError(format!("password key error: {e}")))?;

    tracing::debug!(%cipher_version, "encryption key applied");
    Ok(())
}

fn default_open_flags() -> OpenFlags {
    OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX
}

/// Fluent builder for [`BatchOptions`].
#[derive(Debug, Clone)]
pub struct BatchOptionsBuilder {
    opts: BatchOptions,
}

impl BatchOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: BatchOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn flags(mut self, flags: OpenFlags) -> Self {
        self.opts.flags = flags;
        self
    }

    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.opts.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn defensive(mut self, defensive: bool) -> Self {
        self.opts.defensive = defensive;
        self
    }

    #[must_use]
    pub fn rough_cutoff_size(mut self, rough_cutoff_size: usize) -> Self {
        self.opts.rough_cutoff_size = rough_cutoff_size;
        self
    }

    #[must_use]
    pub fn finish(self) -> BatchOptions {
        self.opts
    }
}
