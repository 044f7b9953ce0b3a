//! [`Command`] for moving a [`Session`] to another time.

use std::fmt;

use common::{
    operations::{
        By, Commit, Lock, Notify, Select, Transact, Transacted, Update,
    },
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        calendar,
        session::{
            self,
            access::{self, Action},
            Participant,
        },
        user::Actor,
        Holiday, Interval, Session,
    },
    infra::{database, Database, Notifier},
    read, Service,
};

use super::{
    find_conflict, is_holiday, refine_write, retry_on_contention, Command,
    Transient,
};

/// [`Command`] for a participant to move a [`Session`] to another
/// [`Interval`].
///
/// The [`Session`] keeps its status, and its previous [`Interval`] is
/// appended to its history.
#[derive(Clone, Debug)]
pub struct RescheduleSession {
    /// [`Actor`] moving the [`Session`].
    pub actor: Actor,

    /// ID of the [`Session`] to move.
    pub session_id: session::Id,

    /// New [`Interval`] of the [`Session`].
    pub interval: Interval,
}

impl<Db, Nt> Command<RescheduleSession> for Service<Db, Nt>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Session>, session::Id>>,
            Ok = Option<Session>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Holiday>, Date>>,
            Ok = Option<Holiday>,
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
    Nt: Notifier<Notify<session::Event>, Err: fmt::Display>,
{
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RescheduleSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let cmd = &cmd;
        let (session, previous) = retry_on_contention(move || async move {
            let RescheduleSession {
                actor,
                session_id: id,
                interval,
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
            access::authorize(actor, Action::Reschedule, &session)
                .map_err(tracerr::from_and_wrap!(=> E))?;

            let previous = session.interval;
            session
                .reschedule(*interval, actor.id, self.clock.now())
                .map_err(tracerr::from_and_wrap!(=> E))?;

            let policy = &self.config.calendar;
            let is_holiday = is_holiday(&tx, policy, interval)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            policy
                .check(interval, is_holiday)
                .map_err(E::Calendar)
                .map_err(tracerr::wrap!())?;
            if let Some(other) = find_conflict(
                &tx,
                interval,
                session.participants(),
                Some(session.id),
            )
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            {
                return Err(tracerr::new!(E::Conflict(other)));
            }

            refine_write(
                tx.execute(Update(session.clone())).await,
                E::Overlap,
            )
            .map(drop)?;
            tx.execute(Commit)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;

            Ok((session, previous))
        })
        .await?;

        log::info!(
            "`Session(id: {})` moved from {} to {} by `User(id: {})`",
            session.id,
            previous.start().to_rfc3339(),
            session.interval.start().to_rfc3339(),
            cmd.actor.id,
        );
        self.notify(session::Event::Rescheduled {
            session: session.clone(),
            previous,
        })
        .await;

        Ok(session)
    }
}

/// Error of [`RescheduleSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Session`] does not exist.
    #[display("`Session(id: {_0})` does not exist")]
    #[from(ignore)]
    SessionNotExists(#[error(not(source))] session::Id),

    /// [`Actor`] is not allowed to move the [`Session`].
    #[display("{_0}")]
    Forbidden(access::Forbidden),

    /// [`Session`] cannot be moved in its current status.
    #[display("{_0}")]
    Transition(session::IllegalTransition),

    /// New [`Interval`] is outside the bookable hours.
    #[display("`Session` cannot take place then: {_0}")]
    #[from(ignore)]
    Calendar(calendar::Violation),

    /// New [`Interval`] overlaps an active [`Session`] of a participant.
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
