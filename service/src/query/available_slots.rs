//! [`AvailableSlots`] [`Query`].

use std::time::Duration;

use common::{
    operations::{By, Select},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        program,
        session::{
            access::{self, Action, Parties},
            slot::Slots,
            Participant,
        },
        subject,
        user::Actor,
        Enrollment, Holiday, Interval, Program, Session,
    },
    infra::{database, Database},
    read, Service,
};

use super::Query;

/// [`Query`] listing bookable slots of a subject's teacher on a [`Date`].
#[derive(Clone, Debug)]
pub struct AvailableSlots {
    /// [`Actor`] looking for the slots.
    pub actor: Actor,

    /// [`Program`] the [`Session`] is going to belong to.
    pub program: Program,

    /// ID of the subject whose teacher's time is looked up.
    pub subject_id: subject::Id,

    /// [`Date`] of the operating time zone to look on.
    pub date: Date,

    /// Desired duration of a slot.
    ///
    /// The default one of the calendar policy is used if omitted.
    pub duration: Option<Duration>,
}

impl<Db, Nt> Query<AvailableSlots> for Service<Db, Nt>
where
    Db: Database<
            Select<By<Vec<Enrollment>, read::enrollment::InProgram>>,
            Ok = Vec<Enrollment>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Holiday>, Date>>,
            Ok = Option<Holiday>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Session>, read::session::Busy>>,
            Ok = Vec<Session>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Vec<Interval>;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        query: AvailableSlots,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AvailableSlots {
            actor,
            program,
            subject_id,
            date,
            duration,
        } = query;

        let policy = &self.config().calendar;
        let duration = duration.unwrap_or(policy.default_duration);
        if duration < policy.min_duration {
            return Err(tracerr::new!(E::InvalidDuration(policy.min_duration)));
        }

        let enrollments = self
            .database()
            .execute(Select(By::new(read::enrollment::InProgram(program))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let enrollment = enrollments
            .iter()
            .find(|e| e.student_id == actor.id)
            .or_else(|| enrollments.first())
            .ok_or(E::ProgramEmpty(program.id()))
            .map_err(tracerr::wrap!())?;
        let teacher_id = enrollment
            .teacher_for(subject_id)
            .ok_or(E::SubjectNotAssigned(subject_id))
            .map_err(tracerr::wrap!())?;
        access::authorize(
            &actor,
            Action::View,
            Parties {
                teacher_id,
                student_id: enrollment.student_id,
            },
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        let is_holiday = self
            .database()
            .execute(Select(By::new(date)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .is_some();
        let Some(opening) = policy.opening(date, is_holiday) else {
            return Ok(vec![]);
        };

        let busy = self
            .database()
            .execute(Select(By::new(read::session::Busy {
                participants: vec![Participant::Teacher(teacher_id)],
                period: opening.interval,
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(Slots::new(opening, busy.iter().map(|s| s.interval), duration)
            .map(Iterator::collect)
            .unwrap_or_default())
    }
}

/// Error of [`AvailableSlots`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Requested duration is too short.
    #[display("Slot must last at least {} minutes", _0.as_secs() / 60)]
    #[from(ignore)]
    InvalidDuration(#[error(not(source))] Duration),

    /// [`Program`] has no active enrollments.
    #[display("`Program(id: {_0})` has no active enrollments")]
    #[from(ignore)]
    ProgramEmpty(#[error(not(source))] program::Id),

    /// Subject is not assigned to any teacher in the [`Program`].
    #[display("`Subject(id: {_0})` is not assigned to a teacher")]
    #[from(ignore)]
    SubjectNotAssigned(#[error(not(source))] subject::Id),

    /// [`Actor`] is not allowed to look at the teacher's time.
    #[display("{_0}")]
    Forbidden(access::Forbidden),
}
