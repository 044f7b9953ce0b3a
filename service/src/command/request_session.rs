//! [`Command`] for requesting a new [`Session`].

use std::fmt;

use common::{
    operations::{By, Commit, Insert, Lock, Notify, Select, Transact, Transacted},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        calendar, program,
        session::{
            self,
            access::{self, Action, Parties},
            Participant, Status,
        },
        subject,
        user::{self, Actor, Role},
        Enrollment, Holiday, Interval, Program, Session,
    },
    infra::{database, Database, Notifier},
    read, Service,
};

use super::{
    find_conflict, is_holiday, refine_write, retry_on_contention, Command,
    Transient,
};

/// [`Command`] for a student to request a new [`Session`] with the teacher
/// assigned to a subject of their [`Enrollment`].
#[derive(Clone, Debug)]
pub struct RequestSession {
    /// [`Actor`] requesting the [`Session`].
    pub actor: Actor,

    /// [`session::Title`] of the [`Session`].
    pub title: Option<session::Title>,

    /// [`session::Description`] of the [`Session`].
    pub description: Option<session::Description>,

    /// [`Interval`] the [`Session`] should take place in.
    pub interval: Interval,

    /// [`Program`] the student is enrolled into.
    pub program: Program,

    /// ID of the subject to study.
    pub subject_id: subject::Id,
}

impl<Db, Nt> Command<RequestSession> for Service<Db, Nt>
where
    Db: Database<
            Select<By<Option<Enrollment>, read::enrollment::OfStudent>>,
            Ok = Option<Enrollment>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Holiday>, Date>>,
            Ok = Option<Holiday>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Session, Participant>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Session>, read::session::Busy>>,
            Ok = Vec<Session>,
            Err = Traced<database::Error>,
        > + Database<Insert<Session>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Nt: Notifier<Notify<session::Event>, Err: fmt::Display>,
{
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RequestSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RequestSession {
            actor,
            title,
            description,
            interval,
            program,
            subject_id,
        } = cmd;

        if !actor.has(Role::Student) {
            return Err(tracerr::new!(E::Forbidden(access::Forbidden {
                actor: actor.id,
                action: Action::Request,
            })));
        }

        let enrollment = self
            .database()
            .execute(Select(By::new(read::enrollment::OfStudent(actor.id))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::EnrollmentNotExists(actor.id))
            .map_err(tracerr::wrap!())?;
        if enrollment.program != program {
            return Err(tracerr::new!(E::EnrollmentMismatch(program.id())));
        }
        let teacher_id = enrollment
            .teacher_for(subject_id)
            .ok_or(E::SubjectNotAssigned(subject_id))
            .map_err(tracerr::wrap!())?;
        access::authorize(
            &actor,
            Action::Request,
            Parties {
                teacher_id,
                student_id: actor.id,
            },
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        let policy = &self.config.calendar;
        let now = self.clock.now();
        policy
            .check_booking_window(&interval, now)
            .map_err(E::BookingWindow)
            .map_err(tracerr::wrap!())?;
        let is_holiday = is_holiday(self.database(), policy, &interval)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        policy
            .check(&interval, is_holiday)
            .map_err(E::Calendar)
            .map_err(tracerr::wrap!())?;

        let session = Session {
            id: session::Id::new(),
            title: title.unwrap_or_default(),
            description,
            interval,
            teacher_id,
            student_id: actor.id,
            subject_id: Some(subject_id),
            program: Some(program),
            status: Status::Requested,
            meeting: None,
            requested_by: Some(actor.id),
            accepted_by: None,
            rejection: None,
            cancellation: None,
            reschedules: vec![],
            created_at: now.coerce(),
            updated_at: now.coerce(),
            deleted_at: None,
        };

        let new = &session;
        retry_on_contention(move || async move {
            let tx = self
                .database()
                .execute(Transact)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;

            if let Some(id) =
                find_conflict(&tx, &new.interval, new.participants(), None)
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
            {
                return Err(tracerr::new!(E::Conflict(id)));
            }

            refine_write(tx.execute(Insert(new.clone())).await, E::Overlap)
                .map(drop)?;
            tx.execute(Commit)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)
        })
        .await?;

        log::info!(
            "`Session(id: {})` requested by `User(id: {})`",
            session.id,
            actor.id,
        );
        self.notify(session::Event::Requested(session.clone())).await;

        Ok(session)
    }
}

/// Error of [`RequestSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Actor`] is not allowed to request the [`Session`].
    #[display("{_0}")]
    Forbidden(access::Forbidden),

    /// Student has no active [`Enrollment`].
    #[display("`User(id: {_0})` has no active enrollment")]
    #[from(ignore)]
    EnrollmentNotExists(#[error(not(source))] user::Id),

    /// Student's active [`Enrollment`] is into another [`Program`].
    #[display("no active enrollment into `Program(id: {_0})`")]
    #[from(ignore)]
    EnrollmentMismatch(#[error(not(source))] program::Id),

    /// No teacher is assigned to the subject.
    #[display("no teacher is assigned to `Subject(id: {_0})`")]
    #[from(ignore)]
    SubjectNotAssigned(#[error(not(source))] subject::Id),

    /// [`Interval`] is outside the allowed booking window.
    #[display("`Session` cannot be requested: {_0}")]
    #[from(ignore)]
    BookingWindow(calendar::Violation),

    /// [`Interval`] is outside the bookable hours.
    #[display("`Session` cannot take place then: {_0}")]
    #[from(ignore)]
    Calendar(calendar::Violation),

    /// [`Interval`] overlaps an active [`Session`] of a participant.
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
