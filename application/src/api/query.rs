//! GraphQL [`Query`]s definitions.

use std::time::Duration;

use common::Date;
use juniper::graphql_object;
use service::{query, Query as _};

use crate::{api, define_error, error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the `Session` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `SESSION_NOT_EXISTS` - the `Session` with the specified ID does not
    ///                          exist;
    /// - `FORBIDDEN` - the current user takes no part in the `Session`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "session",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn session(
        id: api::session::Id,
        ctx: &Context,
    ) -> Result<api::Session, Error> {
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(query::session::ById {
                actor,
                session_id: id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Session`s of the current user on the specified `Date`,
    /// in chronological order.
    #[tracing::instrument(
        skip_all,
        fields(
            date = %date.to_iso8601(),
            gql.name = "mySessions",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_sessions(
        date: Date,
        ctx: &Context,
    ) -> Result<Vec<api::Session>, Error> {
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(query::session::Agenda { actor, date })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|s| s.into_iter().map(Into::into).collect())
    }

    /// Lists the `Slot`s the teacher of the specified subject is free in on
    /// the specified `Date`, in chronological order.
    ///
    /// `durationMinutes` defaults to the standard `Session` duration.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_DURATION` - the requested duration is too short;
    /// - `PROGRAM_EMPTY` - nobody is enrolled into the `Program`;
    /// - `SUBJECT_NOT_ASSIGNED` - the subject has no teacher in the
    ///                            `Program`;
    /// - `FORBIDDEN` - the current user takes no part in the `Program`.
    #[tracing::instrument(
        skip_all,
        fields(
            date = %date.to_iso8601(),
            duration = ?duration_minutes,
            gql.name = "availableSlots",
            otel.name = Self::SPAN_NAME,
            program = %program.id,
            subject = %subject_id,
        ),
    )]
    pub async fn available_slots(
        program: api::program::Input,
        subject_id: api::user::SubjectId,
        date: Date,
        duration_minutes: Option<i32>,
        ctx: &Context,
    ) -> Result<Vec<api::Slot>, Error> {
        let duration = duration_minutes
            .map(|m| {
                u64::try_from(m)
                    .map(|m| Duration::from_secs(m * 60))
                    .map_err(|_| Error::from(SlotError::NegativeDuration))
                    .map_err(ctx.error())
            })
            .transpose()?;

        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(query::AvailableSlots {
                actor,
                program: program.into(),
                subject_id: subject_id.into(),
                date,
                duration,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|slots| slots.into_iter().map(Into::into).collect())
    }
}

define_error! {
    enum SlotError {
        #[code = "INVALID_DURATION"]
        #[status = BAD_REQUEST]
        #[message = "Duration cannot be negative"]
        NegativeDuration,
    }
}

impl AsError for query::session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::SessionNotExists(id) => Some(error::session_not_exists(*id)),
            Self::Forbidden(e) => e.try_as_error(),
        }
    }
}

impl AsError for query::available_slots::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use http::StatusCode as S;

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidDuration(_) => {
                Some(Error::new("INVALID_DURATION", S::BAD_REQUEST, self))
            }
            Self::ProgramEmpty(_) => {
                Some(Error::new("PROGRAM_EMPTY", S::NOT_FOUND, self))
            }
            Self::SubjectNotAssigned(_) => {
                Some(Error::new("SUBJECT_NOT_ASSIGNED", S::NOT_FOUND, self))
            }
            Self::Forbidden(e) => e.try_as_error(),
        }
    }
}
