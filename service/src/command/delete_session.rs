//! [`Command`] for deleting a [`Session`].

use common::operations::{By, Commit, Select, Transact, Transacted, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        session::{
            self,
            access::{self, Action},
        },
        user::Actor,
        Session,
    },
    infra::{database, Database},
    Service,
};

use super::{retry_on_contention, Command, Transient};

/// [`Command`] for an administrator to softly delete a [`Session`].
///
/// Deleted [`Session`] keeps its status, but stops blocking its
/// participants' time and is hidden from everyone except administrators.
#[derive(Clone, Debug)]
pub struct DeleteSession {
    /// [`Actor`] deleting the [`Session`].
    pub actor: Actor,

    /// ID of the [`Session`] to delete.
    pub session_id: session::Id,
}

impl<Db, Nt> Command<DeleteSession> for Service<Db, Nt>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Session>, session::Id>>,
            Ok = Option<Session>,
            Err = Traced<database::Error>,
        > + Database<Update<Session>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteSession { actor, session_id: id } = &cmd;
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
            access::authorize(actor, Action::Delete, &session)
                .map_err(tracerr::from_and_wrap!(=> E))?;
            if session.is_deleted() {
                return Err(tracerr::new!(E::AlreadyDeleted(id)));
            }

            let now = self.clock.now();
            session.deleted_at = Some(now);
            session.updated_at = now.coerce();

            tx.execute(Update(session.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
            tx.execute(Commit)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;

            Ok(session)
        })
        .await?;

        log::info!(
            "`Session(id: {id})` deleted by `User(id: {})`",
            actor.id,
        );

        Ok(session)
    }
}

/// Error of [`DeleteSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Session`] does not exist.
    #[display("`Session(id: {_0})` does not exist")]
    #[from(ignore)]
    SessionNotExists(#[error(not(source))] session::Id),

    /// [`Actor`] is not allowed to delete [`Session`]s.
    #[display("{_0}")]
    Forbidden(access::Forbidden),

    /// [`Session`] is deleted already.
    #[display("`Session(id: {_0})` is deleted already")]
    #[from(ignore)]
    AlreadyDeleted(#[error(not(source))] session::Id),
}

impl Transient for ExecutionError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Db(e) if e.is_transient())
    }
}
