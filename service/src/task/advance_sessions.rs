//! [`AdvanceSessions`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::operations::{
    By, Commit, Perform, Select, Start, Transact, Transacted, Update,
};
use smart_default::SmartDefault;
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        session::{
            ModificationDateTime, Reason, Resolution, Status, Transition,
        },
        Session,
    },
    infra::{database, Database},
    read, Service,
};

use super::Task;

/// Configuration for [`AdvanceSessions`] [`Task`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Interval between sweeps.
    #[default(time::Duration::from_secs(60))]
    pub interval: time::Duration,
}

/// [`Task`] moving [`Session`]s through their time-triggered statuses.
///
/// Scheduled [`Session`] becomes ongoing once it starts, and ongoing one
/// becomes completed once it ends. Requested or accepted [`Session`] which
/// starts before being scheduled is closed on behalf of its teacher.
#[derive(Clone, Copy, Debug)]
pub struct AdvanceSessions<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db, Nt> Task<Start<By<AdvanceSessions<Self>, Config>>>
    for Service<Db, Nt>
where
    AdvanceSessions<Self>:
        Task<Perform<()>, Ok = usize, Err: Error> + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<AdvanceSessions<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = AdvanceSessions {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            match task.execute(Perform(())).await {
                Ok(0) => {}
                Ok(n) => log::debug!("{n} `Session`s advanced"),
                Err(e) => log::error!("`task::AdvanceSessions` failed: {e}"),
            }
        }
    }
}

impl<Db, Nt> Task<Perform<()>> for AdvanceSessions<Service<Db, Nt>>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Vec<Session>, read::session::Due>>,
            Ok = Vec<Session>,
            Err = Traced<database::Error>,
        > + Database<Update<Session>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = usize;
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let now = self.service.clock().now();

        let tx = self
            .service
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::wrap!())?;

        let due = tx
            .execute(Select(By::new(read::session::Due { now })))
            .await
            .map_err(tracerr::wrap!())?;
        let count = due.len();
        for mut session in due {
            match session.status {
                Status::Requested | Status::Accepted => {
                    expire(&mut session, now.coerce());
                }
                Status::Scheduled => {
                    advance(&mut session, Transition::Start, now.coerce());
                }
                Status::Ongoing
                | Status::Rejected
                | Status::Completed
                | Status::Cancelled => {}
            }
            if session.status == Status::Ongoing
                && session.interval.end() <= now
            {
                advance(&mut session, Transition::Complete, now.coerce());
            }
            tx.execute(Update(session))
                .await
                .map_err(tracerr::wrap!())
                .map(drop)?;
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;
        Ok(count)
    }
}

/// Applies the provided time-triggered [`Transition`] to the [`Session`],
/// logging it.
fn advance(
    session: &mut Session,
    transition: Transition,
    at: ModificationDateTime,
) {
    let from = session.status;
    match session.apply(transition, at) {
        Ok(()) => log::info!(
            "`Session(id: {})` is `{}` now, was `{from}`",
            session.id,
            session.status,
        ),
        Err(e) => log::warn!("`Session(id: {})`: {e}", session.id),
    }
}

/// Closes the requested or accepted [`Session`] which started without being
/// scheduled.
///
/// Requests are rejected and accepted ones are cancelled.
fn expire(session: &mut Session, at: ModificationDateTime) {
    let resolution = Some(Resolution {
        by: session.teacher_id,
        reason: Reason::expired(),
    });
    if session.status == Status::Requested {
        advance(session, Transition::Reject, at);
        session.rejection = resolution;
    } else {
        advance(session, Transition::Cancel, at);
        session.cancellation = resolution;
    }
}

/// Error of [`AdvanceSessions`] execution.
pub type ExecutionError = Traced<database::Error>;
