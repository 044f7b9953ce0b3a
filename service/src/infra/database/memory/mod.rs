//! In-memory [`Database`] implementation.
//!
//! The whole store is guarded by a single lock, which a transaction holds
//! from [`Transact`] until [`Commit`] (or until dropped, discarding its
//! changes). Non-transactional operations issued while a transaction is open
//! wait for it to finish.
//!
//! [`Commit`]: common::operations::Commit
//! [`Database`]: crate::infra::Database
//! [`Transact`]: common::operations::Transact

mod impls;

use std::{collections::HashMap, future::Future, sync::Arc};

use common::Date;
use derive_more::{Deref, Display, Error as StdError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracerr::Traced;

use crate::{
    domain::{enrollment, session, Enrollment, Holiday, Session},
    infra::database,
};

/// In-memory [`Database`] client.
///
/// [`Database`]: crate::infra::Database
#[derive(Clone, Debug, Default, Deref)]
pub struct Memory<C = NonTx>(C);

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Non-transactional [`Memory`] client.
#[derive(Clone, Debug, Default)]
pub struct NonTx {
    /// Shared [`Store`].
    store: Arc<Mutex<Store>>,
}

/// Transactional [`Memory`] client.
#[derive(Clone, Debug)]
pub struct Tx {
    /// Changes staged by this transaction, until committed.
    staged: Arc<Mutex<Option<Staged>>>,
}

/// Changes staged by a [`Tx`].
#[derive(Debug)]
struct Staged {
    /// Exclusive access to the shared [`Store`].
    guard: OwnedMutexGuard<Store>,

    /// Modified copy of the shared [`Store`].
    store: Store,
}

impl Tx {
    /// Begins a new [`Tx`] over the [`Store`] of the provided [`NonTx`]
    /// client.
    async fn begin(client: &NonTx) -> Self {
        let guard = Arc::clone(&client.store).lock_owned().await;
        let store = guard.clone();
        Self {
            staged: Arc::new(Mutex::new(Some(Staged { guard, store }))),
        }
    }

    /// Commits this [`Tx`], publishing its changes.
    ///
    /// Committing an already committed [`Tx`] does nothing.
    async fn commit(&self) {
        if let Some(Staged { mut guard, store }) =
            self.staged.lock().await.take()
        {
            *guard = store;
        }
    }
}

/// Data kept by [`Memory`].
#[derive(Clone, Debug, Default)]
pub struct Store {
    /// Stored [`Session`]s.
    sessions: HashMap<session::Id, Session>,

    /// Stored [`Enrollment`]s.
    enrollments: HashMap<enrollment::Id, Enrollment>,

    /// Stored [`Holiday`]s.
    holidays: HashMap<Date, Holiday>,
}

impl Store {
    /// Stores the provided [`Session`] unless it makes active [`Session`]s of
    /// the same participant overlap.
    fn put_session(&mut self, session: Session) -> Result<(), Error> {
        if session.is_active() {
            let overlapping = self.sessions.values().find(|s| {
                s.id != session.id
                    && s.is_active()
                    && s.interval.overlaps(&session.interval)
                    && (s.teacher_id == session.teacher_id
                        || s.student_id == session.student_id)
            });
            if let Some(existing) = overlapping {
                return Err(Error::Overlap {
                    session: session.id,
                    existing: existing.id,
                });
            }
        }
        drop(self.sessions.insert(session.id, session));
        Ok(())
    }
}

/// Storage backing a [`Memory`] client.
pub trait Storage {
    /// Reads the [`Store`] with the provided function.
    ///
    /// # Errors
    ///
    /// If the [`Store`] is not accessible anymore.
    fn read<R>(
        &self,
        f: impl FnOnce(&Store) -> R,
    ) -> impl Future<Output = Result<R, Traced<database::Error>>>;

    /// Modifies the [`Store`] with the provided function.
    ///
    /// # Errors
    ///
    /// If the [`Store`] is not accessible anymore, or the function fails.
    fn write<R>(
        &self,
        f: impl FnOnce(&mut Store) -> Result<R, Error>,
    ) -> impl Future<Output = Result<R, Traced<database::Error>>>;
}

impl Storage for NonTx {
    async fn read<R>(
        &self,
        f: impl FnOnce(&Store) -> R,
    ) -> Result<R, Traced<database::Error>> {
        Ok(f(&*self.store.lock().await))
    }

    async fn write<R>(
        &self,
        f: impl FnOnce(&mut Store) -> Result<R, Error>,
    ) -> Result<R, Traced<database::Error>> {
        f(&mut *self.store.lock().await)
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)
    }
}

impl Storage for Tx {
    async fn read<R>(
        &self,
        f: impl FnOnce(&Store) -> R,
    ) -> Result<R, Traced<database::Error>> {
        let staged = self.staged.lock().await;
        let staged = staged
            .as_ref()
            .ok_or(Error::Committed)
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;
        Ok(f(&staged.store))
    }

    async fn write<R>(
        &self,
        f: impl FnOnce(&mut Store) -> Result<R, Error>,
    ) -> Result<R, Traced<database::Error>> {
        let mut staged = self.staged.lock().await;
        staged
            .as_mut()
            .ok_or(Error::Committed)
            .and_then(|s| f(&mut s.store))
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)
    }
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Write would make active sessions of the same participant overlap.
    #[display("`Session(id: {session})` overlaps `Session(id: {existing})`")]
    Overlap {
        /// ID of the written session.
        session: session::Id,

        /// ID of the already stored overlapping session.
        existing: session::Id,
    },

    /// Inserted entity is already stored.
    #[display("entity is already stored")]
    AlreadyExists,

    /// Transaction was already committed.
    #[display("transaction is already committed")]
    Committed,
}

impl Error {
    /// Indicates whether this is an [`Error::Overlap`].
    #[must_use]
    pub fn is_overlap(&self) -> bool {
        matches!(self, Self::Overlap { .. })
    }
}
