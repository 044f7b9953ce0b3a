//! GraphQL [`Mutation`]s definitions.

use common::DateTime;
use juniper::graphql_object;
use service::{command, domain::Interval, Command as _};

use crate::{api, define_error, error, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Requests a new `Session` with the teacher assigned to the specified
    /// subject of the current student's `Program`.
    ///
    /// The `Session` awaits the teacher's decision in the `REQUESTED`
    /// status.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_INTERVAL` - `endTime` is not after `startTime`;
    /// - `NOT_BOOKABLE` - the time violates the calendar policy or the
    ///                    booking window;
    /// - `ENROLLMENT_NOT_EXISTS` - the current user is not enrolled;
    /// - `ENROLLMENT_MISMATCH` - the current user is enrolled into another
    ///                           `Program`;
    /// - `SUBJECT_NOT_ASSIGNED` - the subject has no teacher in the
    ///                            `Program`;
    /// - `SESSION_CONFLICT` - the time is already taken;
    /// - `FORBIDDEN` - the current user is not a student.
    #[tracing::instrument(
        skip_all,
        fields(
            end_time = %end_time.to_rfc3339(),
            gql.name = "requestSession",
            otel.name = Self::SPAN_NAME,
            program = %program.id,
            start_time = %start_time.to_rfc3339(),
            subject = %subject_id,
        ),
    )]
    pub async fn request_session(
        title: Option<api::session::Title>,
        description: Option<api::session::Description>,
        start_time: DateTime,
        end_time: DateTime,
        program: api::program::Input,
        subject_id: api::user::SubjectId,
        ctx: &Context,
    ) -> Result<api::Session, Error> {
        let interval = interval(start_time, end_time).map_err(ctx.error())?;
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(command::RequestSession {
                actor,
                title: title.map(Into::into),
                description: description.map(Into::into),
                interval,
                program: program.into(),
                subject_id: subject_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Schedules a new `Session` directly, bypassing the request step.
    ///
    /// Only teachers and administrators may schedule `Session`s.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_INTERVAL` - `endTime` is not after `startTime`;
    /// - `NOT_BOOKABLE` - the time violates the calendar policy;
    /// - `PROGRAM_EMPTY` - nobody is enrolled into the `Program`;
    /// - `STUDENT_REQUIRED` - the `Program` has several students;
    /// - `ENROLLMENT_NOT_EXISTS` - the student is not enrolled;
    /// - `ENROLLMENT_MISMATCH` - the student is enrolled into another
    ///                           `Program`;
    /// - `SUBJECT_NOT_ASSIGNED` - the subject has no teacher in the
    ///                            `Program`;
    /// - `TEACHER_NOT_ASSIGNED` - the teacher doesn't teach in the
    ///                            `Program`;
    /// - `SESSION_CONFLICT` - the time is already taken;
    /// - `FORBIDDEN` - the current user may not schedule the `Session`.
    #[tracing::instrument(
        skip_all,
        fields(
            end_time = %end_time.to_rfc3339(),
            gql.name = "scheduleSession",
            otel.name = Self::SPAN_NAME,
            program = %program.id,
            start_time = %start_time.to_rfc3339(),
            student = ?student_id.map(|id| id.to_string()),
            subject = ?subject_id.map(|id| id.to_string()),
            teacher = ?teacher_id.map(|id| id.to_string()),
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "GraphQL arguments")]
    pub async fn schedule_session(
        title: api::session::Title,
        description: Option<api::session::Description>,
        start_time: DateTime,
        end_time: DateTime,
        program: api::program::Input,
        student_id: Option<api::user::Id>,
        subject_id: Option<api::user::SubjectId>,
        teacher_id: Option<api::user::Id>,
        ctx: &Context,
    ) -> Result<api::Session, Error> {
        let interval = interval(start_time, end_time).map_err(ctx.error())?;
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(command::ScheduleSession {
                actor,
                title: title.into(),
                description: description.map(Into::into),
                interval,
                program: program.into(),
                student_id: student_id.map(Into::into),
                subject_id: subject_id.map(Into::into),
                teacher_id: teacher_id.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Accepts the requested `Session`, binding a meeting to it.
    ///
    /// A `MeetingLink` is generated if none is specified.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `SESSION_NOT_EXISTS` - the `Session` does not exist;
    /// - `ILLEGAL_TRANSITION` - the `Session` is not `REQUESTED`;
    /// - `NOT_BOOKABLE` - the time is no longer bookable;
    /// - `SESSION_CONFLICT` - the time was taken meanwhile;
    /// - `FORBIDDEN` - the current user is not the `Session`'s teacher.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "acceptSession",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn accept_session(
        id: api::session::Id,
        meeting_link: Option<api::session::MeetingLink>,
        meeting_platform: Option<api::session::MeetingPlatform>,
        ctx: &Context,
    ) -> Result<api::Session, Error> {
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(command::AcceptSession {
                actor,
                session_id: id.into(),
                meeting_link: meeting_link.map(Into::into),
                meeting_platform: meeting_platform.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Rejects the requested `Session` with the specified reason.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `SESSION_NOT_EXISTS` - the `Session` does not exist;
    /// - `ILLEGAL_TRANSITION` - the `Session` is not `REQUESTED`;
    /// - `FORBIDDEN` - the current user is not the `Session`'s teacher.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "rejectSession",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn reject_session(
        id: api::session::Id,
        reason: api::session::Reason,
        ctx: &Context,
    ) -> Result<api::Session, Error> {
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(command::RejectSession {
                actor,
                session_id: id.into(),
                reason: reason.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Cancels the `Session` with the specified reason.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `SESSION_NOT_EXISTS` - the `Session` does not exist;
    /// - `ILLEGAL_TRANSITION` - the `Session` cannot be cancelled anymore;
    /// - `FORBIDDEN` - the current user takes no part in the `Session`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "cancelSession",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn cancel_session(
        id: api::session::Id,
        reason: api::session::Reason,
        ctx: &Context,
    ) -> Result<api::Session, Error> {
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(command::CancelSession {
                actor,
                session_id: id.into(),
                reason: reason.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Moves the `Session` to another time, keeping its history.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_INTERVAL` - `endTime` is not after `startTime`;
    /// - `SESSION_NOT_EXISTS` - the `Session` does not exist;
    /// - `ILLEGAL_TRANSITION` - the `Session` cannot be moved anymore;
    /// - `NOT_BOOKABLE` - the time violates the calendar policy;
    /// - `SESSION_CONFLICT` - the time is already taken;
    /// - `FORBIDDEN` - the current user may not move the `Session`.
    #[tracing::instrument(
        skip_all,
        fields(
            end_time = %end_time.to_rfc3339(),
            gql.name = "rescheduleSession",
            id = %id,
            otel.name = Self::SPAN_NAME,
            start_time = %start_time.to_rfc3339(),
        ),
    )]
    pub async fn reschedule_session(
        id: api::session::Id,
        start_time: DateTime,
        end_time: DateTime,
        ctx: &Context,
    ) -> Result<api::Session, Error> {
        let interval = interval(start_time, end_time).map_err(ctx.error())?;
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(command::RescheduleSession {
                actor,
                session_id: id.into(),
                interval,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Soft-deletes the `Session`.
    ///
    /// Only administrators may delete `Session`s.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `SESSION_NOT_EXISTS` - the `Session` does not exist;
    /// - `SESSION_ALREADY_DELETED` - the `Session` is deleted already;
    /// - `FORBIDDEN` - the current user is not an administrator.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteSession",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_session(
        id: api::session::Id,
        ctx: &Context,
    ) -> Result<api::Session, Error> {
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(command::DeleteSession {
                actor,
                session_id: id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Restores the soft-deleted `Session`.
    ///
    /// Only administrators may restore `Session`s.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `SESSION_NOT_EXISTS` - the `Session` does not exist;
    /// - `SESSION_NOT_DELETED` - the `Session` is not deleted;
    /// - `SESSION_CONFLICT` - the time was taken meanwhile;
    /// - `FORBIDDEN` - the current user is not an administrator.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "restoreSession",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn restore_session(
        id: api::session::Id,
        ctx: &Context,
    ) -> Result<api::Session, Error> {
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(command::RestoreSession {
                actor,
                session_id: id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

/// Creates a new [`Interval`] out of the provided bounds.
///
/// # Errors
///
/// If `end` is not after `start`.
fn interval(start: DateTime, end: DateTime) -> Result<Interval, Error> {
    Interval::new(start, end).ok_or_else(|| IntervalError::Invalid.into())
}

define_error! {
    enum IntervalError {
        #[code = "INVALID_INTERVAL"]
        #[status = BAD_REQUEST]
        #[message = "`endTime` must be after `startTime`"]
        Invalid,
    }
}

define_error! {
    enum BookingError {
        #[code = "SESSION_CONFLICT"]
        #[status = CONFLICT]
        #[message = "Session overlaps another one of the same participant"]
        Overlap,

        #[code = "ENROLLMENT_MISMATCH"]
        #[status = BAD_REQUEST]
        #[message = "Student is not enrolled into the `Program`"]
        EnrollmentMismatch,

        #[code = "SESSION_ALREADY_DELETED"]
        #[status = CONFLICT]
        #[message = "`Session` is deleted already"]
        AlreadyDeleted,

        #[code = "SESSION_NOT_DELETED"]
        #[status = CONFLICT]
        #[message = "`Session` is not deleted"]
        NotDeleted,
    }
}

/// Returns a NotFound-kind [`Error`] described by the provided `err`.
fn not_found(code: error::Code, err: &impl ToString) -> Error {
    Error::new(code, http::StatusCode::NOT_FOUND, err)
}

impl AsError for command::request_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Forbidden(e) => e.try_as_error(),
            Self::EnrollmentNotExists(_) => {
                Some(not_found("ENROLLMENT_NOT_EXISTS", self))
            }
            Self::EnrollmentMismatch(_) => {
                Some(BookingError::EnrollmentMismatch.into())
            }
            Self::SubjectNotAssigned(_) => {
                Some(not_found("SUBJECT_NOT_ASSIGNED", self))
            }
            Self::BookingWindow(v) | Self::Calendar(v) => v.try_as_error(),
            Self::Conflict(id) => Some(error::session_conflict(*id)),
            Self::Overlap => Some(BookingError::Overlap.into()),
        }
    }
}

impl AsError for command::schedule_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Forbidden(e) => e.try_as_error(),
            Self::EnrollmentNotExists(_) => {
                Some(not_found("ENROLLMENT_NOT_EXISTS", self))
            }
            Self::ProgramEmpty(_) => Some(not_found("PROGRAM_EMPTY", self)),
            Self::StudentRequired(_) => Some(Error::new(
                "STUDENT_REQUIRED",
                http::StatusCode::BAD_REQUEST,
                self,
            )),
            Self::EnrollmentMismatch(_) => {
                Some(BookingError::EnrollmentMismatch.into())
            }
            Self::SubjectNotAssigned(_) => {
                Some(not_found("SUBJECT_NOT_ASSIGNED", self))
            }
            Self::TeacherNotAssigned(_) => {
                Some(not_found("TEACHER_NOT_ASSIGNED", self))
            }
            Self::Calendar(v) => v.try_as_error(),
            Self::Conflict(id) => Some(error::session_conflict(*id)),
            Self::Overlap => Some(BookingError::Overlap.into()),
        }
    }
}

impl AsError for command::accept_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::SessionNotExists(id) => Some(error::session_not_exists(*id)),
            Self::Forbidden(e) => e.try_as_error(),
            Self::Transition(e) => e.try_as_error(),
            Self::Calendar(v) => v.try_as_error(),
            Self::Conflict(id) => Some(error::session_conflict(*id)),
            Self::Overlap => Some(BookingError::Overlap.into()),
        }
    }
}

impl AsError for command::reject_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::SessionNotExists(id) => Some(error::session_not_exists(*id)),
            Self::Forbidden(e) => e.try_as_error(),
            Self::Transition(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::cancel_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::SessionNotExists(id) => Some(error::session_not_exists(*id)),
            Self::Forbidden(e) => e.try_as_error(),
            Self::Transition(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::reschedule_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::SessionNotExists(id) => Some(error::session_not_exists(*id)),
            Self::Forbidden(e) => e.try_as_error(),
            Self::Transition(e) => e.try_as_error(),
            Self::Calendar(v) => v.try_as_error(),
            Self::Conflict(id) => Some(error::session_conflict(*id)),
            Self::Overlap => Some(BookingError::Overlap.into()),
        }
    }
}

impl AsError for command::delete_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::SessionNotExists(id) => Some(error::session_not_exists(*id)),
            Self::Forbidden(e) => e.try_as_error(),
            Self::AlreadyDeleted(_) => Some(BookingError::AlreadyDeleted.into()),
        }
    }
}

impl AsError for command::restore_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::SessionNotExists(id) => Some(error::session_not_exists(*id)),
            Self::Forbidden(e) => e.try_as_error(),
            Self::NotDeleted(_) => Some(BookingError::NotDeleted.into()),
            Self::Conflict(id) => Some(error::session_conflict(*id)),
            Self::Overlap => Some(BookingError::Overlap.into()),
        }
    }
}
