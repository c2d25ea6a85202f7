pub mod models;
pub mod queries;
pub mod schema;

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info};

/// Failure reading the export. Fatal: the file is static, so a retry
/// cannot succeed.
#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("database file not found: {0}")]
    NotFound(PathBuf),
    #[error("schema mismatch: table `{0}` is missing")]
    MissingTable(&'static str),
    #[error("query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, DataSourceError>;

/// Read-only handle on a msgstore export.
///
/// No connection is held between calls: every load opens the file, runs
/// its query and closes it again.
#[derive(Debug, Clone)]
pub struct MsgStore {
    path: PathBuf,
}

impl MsgStore {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(DataSourceError::NotFound(path.to_path_buf()));
        }

        let store = Self {
            path: path.to_path_buf(),
        };
        store.with_conn(schema::verify)?;

        info!("Message store opened at {}", path.display());
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| DataSourceError::Open {
            path: self.path.clone(),
            source,
        })?;
        debug!("Connection opened on {}", self.path.display());

        let result = f(&conn);
        drop(conn);
        result
    }
}
