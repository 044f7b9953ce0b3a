//! [`Database`]-related implementations.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

pub use self::memory::Memory;
#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// [`Memory`] error.
    Memory(memory::Error),

    #[cfg(feature = "postgres")]
    /// [`Postgres`] error.
    Postgres(postgres::Error),
}

impl Error {
    /// Indicates whether a write was refused because it would make sessions
    /// of the same participant overlap.
    #[must_use]
    pub fn is_overlap(&self) -> bool {
        match self {
            Self::Memory(e) => e.is_overlap(),
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.is_overlap(),
        }
    }

    /// Indicates whether the failed operation may succeed if simply retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Memory(_) => false,
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.is_transient(),
        }
    }
}
