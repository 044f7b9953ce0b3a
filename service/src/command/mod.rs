//! [`Command`] definition.

pub mod accept_session;
pub mod authorize_actor;
pub mod cancel_session;
pub mod delete_session;
pub mod reject_session;
pub mod request_session;
pub mod reschedule_session;
pub mod restore_session;
pub mod schedule_session;

use std::future::Future;

use common::{
    operations::{By, Lock, Select},
    Date,
};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        calendar,
        session::{self, conflict, Participant},
        Holiday, Interval, Session,
    },
    infra::{database, Database},
    read,
};

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    accept_session::AcceptSession, authorize_actor::AuthorizeActor,
    cancel_session::CancelSession, delete_session::DeleteSession,
    reject_session::RejectSession, request_session::RequestSession,
    reschedule_session::RescheduleSession, restore_session::RestoreSession,
    schedule_session::ScheduleSession,
};

/// Maximal number of attempts to execute a [`Command`] failing because of
/// transient contention.
const MAX_ATTEMPTS: usize = 3;

/// Error which may go away by simply retrying.
trait Transient {
    /// Indicates whether this error is a transient one.
    fn is_transient(&self) -> bool;
}

/// Executes the provided `attempt` until it succeeds, fails with a
/// non-[`Transient`] error, or [`MAX_ATTEMPTS`] are exhausted.
async fn retry_on_contention<T, E, F, Fut>(
    mut attempt: F,
) -> Result<T, Traced<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Traced<E>>>,
    E: Transient,
{
    let mut n = 1;
    loop {
        match attempt().await {
            Err(e) if n < MAX_ATTEMPTS && e.as_ref().is_transient() => {
                log::debug!("retrying after transient failure, attempt {n}");
                n += 1;
            }
            res => return res,
        }
    }
}

/// Indicates whether the day of the provided [`Interval`] is a [`Holiday`].
pub(crate) async fn is_holiday<Db>(
    db: &Db,
    policy: &calendar::Policy,
    interval: &Interval,
) -> Result<bool, Traced<database::Error>>
where
    Db: Database<
        Select<By<Option<Holiday>, Date>>,
        Ok = Option<Holiday>,
        Err = Traced<database::Error>,
    >,
{
    db.execute(Select(By::new(policy.date_of(interval.start()))))
        .await
        .map(|h| h.is_some())
        .map_err(tracerr::wrap!())
}

/// Locks the provided [`Participant`]s and looks for an active [`Session`]
/// of theirs overlapping the provided [`Interval`].
///
/// Must be called inside a transaction, so that the locks are held until it
/// ends.
async fn find_conflict<Tx>(
    tx: &Tx,
    interval: &Interval,
    mut participants: [Participant; 2],
    except: Option<session::Id>,
) -> Result<Option<session::Id>, Traced<database::Error>>
where
    Tx: Database<
            Lock<By<Session, Participant>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Session>, read::session::Busy>>,
            Ok = Vec<Session>,
            Err = Traced<database::Error>,
        >,
{
    // Same order everywhere to not deadlock.
    participants.sort_unstable_by_key(Participant::id);
    for p in participants {
        tx.execute(Lock(By::new(p)))
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;
    }

    let busy = tx
        .execute(Select(By::new(read::session::Busy {
            participants: participants.to_vec(),
            period: *interval,
        })))
        .await
        .map_err(tracerr::wrap!())?;
    Ok(conflict::detect(interval, &participants, &busy, except).map(|s| s.id))
}

/// Converts the result of a conditional [`Session`] write, telling a refused
/// overlap apart from other failures.
fn refine_write<T, E>(
    res: Result<T, Traced<database::Error>>,
    overlap: E,
) -> Result<T, Traced<E>>
where
    E: From<database::Error>,
{
    match res {
        Err(e) if e.as_ref().is_overlap() => Err(tracerr::new!(overlap)),
        res => res.map_err(tracerr::map_from_and_wrap!(=> E)),
    }
}
