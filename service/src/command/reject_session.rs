//! [`Command`] for rejecting a [`Session`].

use std::fmt;

use common::operations::{By, Commit, Notify, Select, Transact, Transacted, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        session::{
            self,
            access::{self, Action},
            Reason, Resolution, Transition,
        },
        user::Actor,
        Session,
    },
    infra::{database, Database, Notifier},
    Service,
};

use super::{retry_on_contention, Command, Transient};

/// [`Command`] for the assigned teacher to reject a requested [`Session`].
#[derive(Clone, Debug)]
pub struct RejectSession {
    /// [`Actor`] rejecting the [`Session`].
    pub actor: Actor,

    /// ID of the [`Session`] to reject.
    pub session_id: session::Id,

    /// [`Reason`] of rejecting the [`Session`].
    pub reason: Reason,
}

impl<Db, Nt> Command<RejectSession> for Service<Db, Nt>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Session>, session::Id>>,
            Ok = Option<Session>,
            Err = Traced<database::Error>,
        > + Database<Update<Session>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Nt: Notifier<Notify<session::Event>, Err: fmt::Display>,
{
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RejectSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let cmd = &cmd;
        let session = retry_on_contention(move || async move {
            let RejectSession {
                actor,
                session_id: id,
                reason,
            } = cmd;

            let tx = self
                .database()
                .execute(Transact)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;

            let mut session = tx
                .execute(Select(By::new(*id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .filter(|s| !s.is_deleted())
                .ok_or(E::SessionNotExists(*id))
                .map_err(tracerr::wrap!())?;
            access::authorize(actor, Action::Reject, &session)
                .map_err(tracerr::from_and_wrap!(=> E))?;

            session
                .apply(Transition::Reject, self.clock.now())
                .map_err(tracerr::from_and_wrap!(=> E))?;
            session.rejection = Some(Resolution {
                by: actor.id,
                reason: reason.clone(),
            });

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
            "`Session(id: {})` rejected by `User(id: {})`",
            session.id,
            cmd.actor.id,
        );
        self.notify(session::Event::Rejected(session.clone())).await;

        Ok(session)
    }
}

/// Error of [`RejectSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Session`] does not exist.
    #[display("`Session(id: {_0})` does not exist")]
    #[from(ignore)]
    SessionNotExists(#[error(not(source))] session::Id),

    /// [`Actor`] is not allowed to reject the [`Session`].
    #[display("{_0}")]
    Forbidden(access::Forbidden),

    /// [`Session`] cannot be rejected in its current status.
    #[display("{_0}")]
    Transition(session::IllegalTransition),
}

impl Transient for ExecutionError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Db(e) if e.is_transient())
    }
}
