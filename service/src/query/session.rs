//! [`Query`] collection related to [`Session`]s.

use common::{
    operations::{By, Select},
    Date, DateTime,
};
use derive_more::{Display, Error, From};
use time::Time;
use tracerr::Traced;

use crate::{
    domain::{
        session::{
            self,
            access::{self, Action},
        },
        user::Actor,
        Interval, Session,
    },
    infra::{database, Database},
    read, Service,
};

use super::Query;

/// Queries a [`Session`] by its [`session::Id`] on behalf of an [`Actor`].
///
/// Deleted [`Session`]s are visible to privileged [`Actor`]s only.
#[derive(Clone, Debug)]
pub struct ById {
    /// [`Actor`] querying the [`Session`].
    pub actor: Actor,

    /// ID of the [`Session`] to query.
    pub session_id: session::Id,
}

impl<Db, Nt> Query<ById> for Service<Db, Nt>
where
    Db: Database<
        Select<By<Option<Session>, session::Id>>,
        Ok = Option<Session>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        ById { actor, session_id }: ById,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let session = self
            .database()
            .execute(Select(By::new(session_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|s| !s.is_deleted() || actor.is_privileged())
            .ok_or(E::SessionNotExists(session_id))
            .map_err(tracerr::wrap!())?;
        access::authorize(&actor, Action::View, &session)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        Ok(session)
    }
}

/// Queries [`Session`]s of an [`Actor`] taking place on a [`Date`] of the
/// operating time zone, ordered by their start.
#[derive(Clone, Debug)]
pub struct Agenda {
    /// [`Actor`] whose [`Session`]s are queried.
    pub actor: Actor,

    /// [`Date`] to query [`Session`]s on.
    pub date: Date,
}

impl<Db, Nt> Query<Agenda> for Service<Db, Nt>
where
    Db: Database<
        Select<By<Vec<Session>, read::session::Agenda>>,
        Ok = Vec<Session>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<Session>;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        Agenda { actor, date }: Agenda,
    ) -> Result<Self::Ok, Self::Err> {
        let offset = self.config().calendar.utc_offset;
        let day = date.next().and_then(|next| {
            Interval::new(
                DateTime::from_local(date, Time::MIDNIGHT, offset),
                DateTime::from_local(next, Time::MIDNIGHT, offset),
            )
        });
        let Some(period) = day else {
            return Ok(vec![]);
        };

        self.database()
            .execute(Select(By::new(read::session::Agenda {
                user_id: actor.id,
                period,
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!())
    }
}

/// Error of [`Session`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Session`] does not exist.
    #[display("`Session(id: {_0})` does not exist")]
    #[from(ignore)]
    SessionNotExists(#[error(not(source))] session::Id),

    /// [`Actor`] is not allowed to view the [`Session`].
    #[display("{_0}")]
    Forbidden(access::Forbidden),
}
