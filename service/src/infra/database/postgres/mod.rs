//! Postgres [`Database`] implementation.
//!
//! Overlapping active sessions of the same participant are refused by the
//! `sessions_teacher_overlap` and `sessions_student_overlap` exclusion
//! constraints, so a write racing past the conflict detection surfaces as an
//! [`Error::is_overlap()`].

pub mod client;
pub mod connection;
mod impls;

use deadpool_postgres::Runtime;
use derive_more::{Deref, Display, Error as StdError, From};
use tokio_postgres::{error::SqlState, NoTls};
use tracerr::Traced;

use crate::infra::database;
#[cfg(doc)]
use crate::infra::Database;

pub use refinery::embed_migrations;

pub use self::{
    client::{NonTx, Tx},
    connection::Connection,
};

pub use deadpool_postgres::Config;

/// Names of the constraints refusing overlapping sessions.
const OVERLAP_CONSTRAINTS: [&str; 2] =
    ["sessions_teacher_overlap", "sessions_student_overlap"];

/// Postgres [`Database`] client.
#[derive(Clone, Debug, Deref)]
pub struct Postgres<T = NonTx>(T);

impl Postgres {
    /// Creates a new [`Postgres`] client with the provided [`Config`].
    ///
    /// # Errors
    ///
    /// If failed to create a new connection pool.
    pub fn new(conf: &Config) -> Result<Self, Traced<database::Error>> {
        let pool = conf
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;
        Ok(Self(NonTx::new(pool)))
    }
}

/// Postgres database [`Error`].
#[derive(Debug, Display, StdError, From)]
pub enum Error {
    /// [`Connection`] error.
    #[display("`Connection` error: {_0}")]
    Connection(connection::Error),

    /// Error of creating a new [`connection::Pool`].
    #[display("Failed to create a new `connection::Pool`: {_0}")]
    PoolCreationError(connection::PoolCreationError),

    /// [`connection::Pool`] error.
    #[display("`connection::Pool` error: {_0}")]
    PoolError(connection::PoolError),

    /// Stored value cannot be represented in the domain.
    #[display("Malformed `{_0}` column")]
    #[from(ignore)]
    Malformed(#[error(not(source))] &'static str),
}

impl Error {
    /// Returns the [`SqlState`] the database responded with, if any.
    fn code(&self) -> Option<&SqlState> {
        match self {
            Self::Connection(e) => e.code(),
            Self::PoolError(..)
            | Self::PoolCreationError(..)
            | Self::Malformed(..) => None,
        }
    }

    /// Indicates whether a write violated one of the constraints refusing
    /// overlapping sessions.
    #[must_use]
    pub fn is_overlap(&self) -> bool {
        let Self::Connection(e) = self else {
            return false;
        };
        e.code() == Some(&SqlState::EXCLUSION_VIOLATION)
            && e.as_db_error()
                .and_then(|e| e.constraint())
                .is_some_and(|c| OVERLAP_CONSTRAINTS.contains(&c))
    }

    /// Indicates whether the transaction was aborted because of concurrent
    /// transactions, so may succeed if simply retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        [
            SqlState::T_R_SERIALIZATION_FAILURE,
            SqlState::T_R_DEADLOCK_DETECTED,
        ]
        .iter()
        .any(|c| self.code() == Some(c))
    }
}
