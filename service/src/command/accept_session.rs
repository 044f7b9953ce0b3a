//! [`Command`] for accepting a requested [`Session`].

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
            Meeting, MeetingLink, MeetingPlatform, Participant, Transition,
        },
        user::Actor,
        Holiday, Session,
    },
    infra::{database, Database, Notifier},
    read, Service,
};

use super::{
    find_conflict, is_holiday, refine_write, retry_on_contention, Command,
    Transient,
};

/// [`Command`] for the assigned teacher to accept a requested [`Session`].
///
/// Accepted [`Session`] is scheduled right away, bound to a [`Meeting`].
#[derive(Clone, Debug)]
pub struct AcceptSession {
    /// [`Actor`] accepting the [`Session`].
    pub actor: Actor,

    /// ID of the [`Session`] to accept.
    pub session_id: session::Id,

    /// [`MeetingLink`] to bind.
    ///
    /// Generated if omitted.
    pub meeting_link: Option<MeetingLink>,

    /// [`MeetingPlatform`] hosting the [`Meeting`].
    pub meeting_platform: Option<MeetingPlatform>,
}

impl<Db, Nt> Command<AcceptSession> for Service<Db, Nt>
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
        cmd: AcceptSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let cmd = &cmd;
        let session = retry_on_contention(move || async move {
            let AcceptSession {
                actor,
                session_id: id,
                meeting_link,
                meeting_platform,
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
            access::authorize(actor, Action::Accept, &session)
                .map_err(tracerr::from_and_wrap!(=> E))?;

            let now = self.clock.now();
            session
                .apply(Transition::Accept, now)
                .map_err(tracerr::from_and_wrap!(=> E))?;

            let policy = &self.config.calendar;
            let is_holiday = is_holiday(&tx, policy, &session.interval)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            policy
                .check(&session.interval, is_holiday)
                .map_err(E::Calendar)
                .map_err(tracerr::wrap!())?;
            if let Some(other) = find_conflict(
                &tx,
                &session.interval,
                session.participants(),
                Some(session.id),
            )
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            {
                return Err(tracerr::new!(E::Conflict(other)));
            }

            session
                .apply(Transition::Schedule, now)
                .map_err(tracerr::from_and_wrap!(=> E))?;
            session.meeting = Some(Meeting {
                link: meeting_link.clone().unwrap_or_else(|| {
                    MeetingLink::generate(
                        &self.config.meeting_base_url,
                        session.id,
                    )
                }),
                platform: meeting_platform.unwrap_or_default(),
            });
            session.accepted_by = Some(actor.id);

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
            "`Session(id: {})` accepted by `User(id: {})`",
            session.id,
            cmd.actor.id,
        );
        self.notify(session::Event::Accepted(session.clone())).await;

        Ok(session)
    }
}

/// Error of [`AcceptSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Session`] does not exist.
    #[display("`Session(id: {_0})` does not exist")]
    #[from(ignore)]
    SessionNotExists(#[error(not(source))] session::Id),

    /// [`Actor`] is not allowed to accept the [`Session`].
    #[display("{_0}")]
    Forbidden(access::Forbidden),

    /// [`Session`] cannot be accepted in its current status.
    #[display("{_0}")]
    Transition(session::IllegalTransition),

    /// [`Session`] time is not bookable anymore.
    #[display("`Session` cannot take place then: {_0}")]
    #[from(ignore)]
    Calendar(calendar::Violation),

    /// [`Session`] overlaps another active one of a participant.
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
