//! Service contains the session booking logic of the platform.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;
pub mod task;

#[cfg(test)]
mod spec;

use std::{error::Error, fmt::Display};

use common::{
    operations::{By, Notify, Start},
    Clock,
};
use derive_more::Debug;
use tracing as log;

use crate::{
    domain::{calendar, session},
    infra::{notifier, Notifier},
};
#[cfg(doc)]
use crate::infra::Database;

pub use self::{command::Command, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [JWT] decoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_decoding_key: jsonwebtoken::DecodingKey,

    /// [`calendar::Policy`] sessions are booked under.
    pub calendar: calendar::Policy,

    /// Base of generated [`session::MeetingLink`]s.
    pub meeting_base_url: session::MeetingLink,

    /// [`task::AdvanceSessions`] configuration.
    pub advance_sessions: task::advance_sessions::Config,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db, Nt = notifier::Log> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`Notifier`] of this [`Service`].
    notifier: Nt,

    /// [`Clock`] of this [`Service`].
    clock: Clock,
}

impl<Db, Nt> Service<Db, Nt> {
    /// Creates a new [`Service`] with the provided parameters.
    pub fn new(
        config: Config,
        database: Db,
        notifier: Nt,
        clock: Clock,
    ) -> (Self, task::Background)
    where
        Self: Task<
                Start<
                    By<
                        task::AdvanceSessions<Self>,
                        task::advance_sessions::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Clone
            + 'static,
    {
        let this = Service {
            config,
            database,
            notifier,
            clock,
        };

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn("advance_sessions", async move {
            svc.execute(Start(By::new(svc.config().advance_sessions)))
                .await
        });

        (this, bg)
    }

    /// Returns [`Config`] of this [`Service`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns [`Clock`] of this [`Service`].
    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Notifies about the provided [`session::Event`].
    ///
    /// The operation causing the [`session::Event`] is already committed at
    /// this point, so failures are only logged.
    async fn notify(&self, event: session::Event)
    where
        Nt: Notifier<Notify<session::Event>, Err: Display>,
    {
        let (name, id) = (event.name(), event.session().id);
        if let Err(e) = self.notifier.execute(Notify(event)).await {
            log::warn!("failed to notify about `Session(id: {id})` {name}: {e}");
        }
    }
}
