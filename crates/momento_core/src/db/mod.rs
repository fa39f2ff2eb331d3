//! Journal database file: opening, pragmas and schema upgrades.
//!
//! Everything above this module sees a ready `Connection` whose `items`
//! table matches the newest migration this build knows about.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`; there is no metadata table.
//! - A file written by a newer build is refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Storage failure below the repository layer.
#[derive(Debug)]
pub enum DbError {
    /// Driver or SQL error, including I/O on the database file.
    Sqlite(rusqlite::Error),
    /// The file's `user_version` is past the last migration in this build.
    UnsupportedSchemaVersion { db_version: u32, latest_supported: u32 },
    /// The shared connection mutex was poisoned by a panicking writer.
    LockPoisoned,
}

impl DbError {
    /// Stable `error_code` value for structured log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::UnsupportedSchemaVersion { .. } => "schema_too_new",
            Self::LockPoisoned => "lock_poisoned",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => Display::fmt(err, f),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "journal file has schema v{db_version}, this build reads up to v{latest_supported}"
            ),
            Self::LockPoisoned => f.write_str("journal connection lock poisoned"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        if let Self::Sqlite(err) = self {
            Some(err)
        } else {
            None
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
