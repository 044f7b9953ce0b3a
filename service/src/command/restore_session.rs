//! [`Command`] for restoring a deleted [`Session`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        session::{
            self,
            access::{self, Action},
            Participant,
        },
        user::Actor,
        Session,
    },
    infra::{database, Database},
    read, Service,
};

use super::{
    find_conflict, refine_write, retry_on_contention, Command, Transient,
};

/// [`Command`] for an administrator to restore a deleted [`Session`].
///
/// Restored active [`Session`] blocks its participants' time again, so it
/// must not overlap any [`Session`] booked meanwhile.
#[derive(Clone, Debug)]
pub struct RestoreSession {
    /// [`Actor`] restoring the [`Session`].
    pub actor: Actor,

    /// ID of the [`Session`] to restore.
    pub session_id: session::Id,
}

impl<Db, Nt> Command<RestoreSession> for Service<Db, Nt>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Session>, session::Id>>,
            Ok = Option<Session>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Session, Participant>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Session>, read::session::Busy>>,
            Ok = Vec<Session>,
            Err = Traced<database::Error>,
        > + Database<Update<Session>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RestoreSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RestoreSession { actor, session_id: id } = &cmd;
        let id = *id;

        let session = retry_on_contention(move || async move {
            let tx = self
                .database()
                .execute(Transact)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;

            let mut session = tx
                .execute(Select(By::new(id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::SessionNotExists(id))
                .map_err(tracerr::wrap!())?;
            access::authorize(actor, Action::Restore, &session)
                .map_err(tracerr::from_and_wrap!(=> E))?;
            if !session.is_deleted() {
                return Err(tracerr::new!(E::NotDeleted(id)));
            }

            if session.status.is_active() {
                if let Some(other) = find_conflict(
                    &tx,
                    &session.interval,
                    session.participants(),
                    Some(id),
                )
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                {
                    return Err(tracerr::new!(E::Conflict(other)));
                }
            }

            session.deleted_at = None;
            session.updated_at = self.clock.now();

            refine_write(
                tx.execute(Update(session.clone())).await,
                E::Overlap,
            )
            .map(drop)?;
            tx.execute(Commit)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;

            Ok(session)
        })
        .await?;

        log::info!(
            "`Session(id: {id})` restored by `User(id: {})`",
            actor.id,
        );

        Ok(session)
    }
}

/// Error of [`RestoreSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Session`] does not exist.
    #[display("`Session(id: {_0})` does not exist")]
    #[from(ignore)]
    SessionNotExists(#[error(not(source))] session::Id),

    /// [`Actor`] is not allowed to restore [`Session`]s.
    #[display("{_0}")]
    Forbidden(access::Forbidden),

    /// [`Session`] is not deleted.
    #[display("`Session(id: {_0})` is not deleted")]
    #[from(ignore)]
    NotDeleted(#[error(not(source))] session::Id),

    /// [`Session`] overlaps an active one booked while it was deleted.
    #[display("`Session` conflicts with `Session(id: {_0})`")]
    #[from(ignore)]
    Conflict(#[error(not(source))] session::Id),

    /// Concurrent write booked an overlapping [`Session`] first.
    #[display("`Session` overlaps a concurrently booked one")]
    #[from(ignore)]
    Overlap,
}

impl Transient for ExecutionError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Db(e) if e.is_transient())
    }
}
