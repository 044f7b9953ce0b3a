//! [`Command`] for scheduling a new [`Session`] directly.

use std::fmt;

use common::{
    operations::{By, Commit, Insert, Lock, Notify, Select, Transact, Transacted},
    Date,
};
use derive_more::{Display, Error, From};
use itertools::Itertools as _;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        calendar, program,
        session::{
            self,
            access::{self, Action, Parties},
            Meeting, MeetingLink, MeetingPlatform, Participant, Status,
        },
        subject,
        user::{self, Actor},
        Enrollment, Holiday, Interval, Program, Session,
    },
    infra::{database, Database, Notifier},
    read, Service,
};

use super::{
    find_conflict, is_holiday, refine_write, retry_on_contention, Command,
    Transient,
};

/// [`Command`] for a teacher or an administrator to schedule a new
/// [`Session`], bypassing the request flow.
#[derive(Clone, Debug)]
pub struct ScheduleSession {
    /// [`Actor`] scheduling the [`Session`].
    pub actor: Actor,

    /// [`session::Title`] of the [`Session`].
    pub title: session::Title,

    /// [`session::Description`] of the [`Session`].
    pub description: Option<session::Description>,

    /// [`Interval`] the [`Session`] takes place in.
    pub interval: Interval,

    /// [`Program`] the [`Session`] belongs to.
    pub program: Program,

    /// ID of the student attending the [`Session`].
    ///
    /// May be omitted if the [`Program`] has a single enrolled student.
    pub student_id: Option<user::Id>,

    /// ID of the subject taught in the [`Session`].
    pub subject_id: Option<subject::Id>,

    /// ID of the teacher giving the [`Session`].
    ///
    /// Defaults to the one assigned to the subject, or to the [`Actor`]
    /// otherwise.
    pub teacher_id: Option<user::Id>,
}

impl<Db, Nt> Command<ScheduleSession> for Service<Db, Nt>
where
    Db: Database<
            Select<By<Option<Enrollment>, read::enrollment::OfStudent>>,
            Ok = Option<Enrollment>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Enrollment>, read::enrollment::InProgram>>,
            Ok = Vec<Enrollment>,
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
        cmd: ScheduleSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ScheduleSession {
            actor,
            title,
            description,
            interval,
            program,
            student_id,
            subject_id,
            teacher_id,
        } = cmd;

        let enrollment = if let Some(student_id) = student_id {
            self.database()
                .execute(Select(By::new(read::enrollment::OfStudent(
                    student_id,
                ))))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::EnrollmentNotExists(student_id))
                .map_err(tracerr::wrap!())?
        } else {
            self.database()
                .execute(Select(By::new(read::enrollment::InProgram(program))))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .into_iter()
                .exactly_one()
                .map_err(|mut many| {
                    if many.next().is_some() {
                        E::StudentRequired(program.id())
                    } else {
                        E::ProgramEmpty(program.id())
                    }
                })
                .map_err(tracerr::wrap!())?
        };
        if enrollment.program != program {
            return Err(tracerr::new!(E::EnrollmentMismatch(program.id())));
        }

        let teacher_id = if let Some(subject_id) = subject_id {
            let assigned = enrollment
                .teacher_for(subject_id)
                .ok_or(E::SubjectNotAssigned(subject_id))
                .map_err(tracerr::wrap!())?;
            if let Some(other) = teacher_id.filter(|t| *t != assigned) {
                return Err(tracerr::new!(E::TeacherNotAssigned(other)));
            }
            assigned
        } else {
            let teacher_id = teacher_id.unwrap_or(actor.id);
            if !enrollment.is_taught_by(teacher_id) {
                return Err(tracerr::new!(E::TeacherNotAssigned(teacher_id)));
            }
            teacher_id
        };
        access::authorize(
            &actor,
            Action::Schedule,
            Parties {
                teacher_id,
                student_id: enrollment.student_id,
            },
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        let policy = &self.config.calendar;
        let is_holiday = is_holiday(self.database(), policy, &interval)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        policy
            .check(&interval, is_holiday)
            .map_err(E::Calendar)
            .map_err(tracerr::wrap!())?;

        let now = self.clock.now::<()>();
        let id = session::Id::new();
        let session = Session {
            id,
            title,
            description,
            interval,
            teacher_id,
            student_id: enrollment.student_id,
            subject_id,
            program: Some(program),
            status: Status::Scheduled,
            meeting: Some(Meeting {
                link: MeetingLink::generate(&self.config.meeting_base_url, id),
                platform: MeetingPlatform::default(),
            }),
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
            "`Session(id: {})` scheduled by `User(id: {})`",
            session.id,
            actor.id,
        );
        self.notify(session::Event::Scheduled(session.clone())).await;

        Ok(session)
    }
}

/// Error of [`ScheduleSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Actor`] is not allowed to schedule the [`Session`].
    #[display("{_0}")]
    Forbidden(access::Forbidden),

    /// Student has no active [`Enrollment`].
    #[display("`User(id: {_0})` has no active enrollment")]
    #[from(ignore)]
    EnrollmentNotExists(#[error(not(source))] user::Id),

    /// Nobody is enrolled into the [`Program`].
    #[display("nobody is enrolled into `Program(id: {_0})`")]
    #[from(ignore)]
    ProgramEmpty(#[error(not(source))] program::Id),

    /// [`Program`] has several students, so one must be chosen.
    #[display("`Program(id: {_0})` has several students, specify one")]
    #[from(ignore)]
    StudentRequired(#[error(not(source))] program::Id),

    /// Student's active [`Enrollment`] is into another [`Program`].
    #[display("no active enrollment into `Program(id: {_0})`")]
    #[from(ignore)]
    EnrollmentMismatch(#[error(not(source))] program::Id),

    /// No teacher is assigned to the subject.
    #[display("no teacher is assigned to `Subject(id: {_0})`")]
    #[from(ignore)]
    SubjectNotAssigned(#[error(not(source))] subject::Id),

    /// Teacher doesn't teach the student's [`Program`].
    #[display("`User(id: {_0})` does not teach the enrollment")]
    #[from(ignore)]
    TeacherNotAssigned(#[error(not(source))] user::Id),

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
