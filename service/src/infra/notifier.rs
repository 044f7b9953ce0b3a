//! [`Notifier`]-related implementations.

use std::convert::Infallible;

use common::operations::Notify;
use tracing as log;

use crate::domain::session;

/// Notification dispatch.
pub use common::Handler as Notifier;

/// [`Notifier`] writing [`session::Event`]s into the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct Log;

impl Notifier<Notify<session::Event>> for Log {
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Notify(event): Notify<session::Event>,
    ) -> Result<Self::Ok, Self::Err> {
        let session = event.session();
        log::info!(
            session.id = %session.id,
            teacher.id = %session.teacher_id,
            student.id = %session.student_id,
            start = %session.interval.start().to_rfc3339(),
            "`Session` {}",
            event.name(),
        );
        Ok(())
    }
}
