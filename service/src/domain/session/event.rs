//! [`Session`] events.

use crate::domain::{Interval, Session};

/// Notable change of a [`Session`] participants should be told about.
#[derive(Clone, Debug)]
pub enum Event {
    /// Student requested a new [`Session`].
    Requested(Session),

    /// New [`Session`] was scheduled directly.
    Scheduled(Session),

    /// Teacher accepted a requested [`Session`].
    Accepted(Session),

    /// Teacher rejected a requested [`Session`].
    Rejected(Session),

    /// [`Session`] was cancelled.
    Cancelled(Session),

    /// [`Session`] was moved to another time.
    Rescheduled {
        /// Moved [`Session`].
        session: Session,

        /// [`Interval`] the [`Session`] occupied before.
        previous: Interval,
    },
}

impl Event {
    /// Returns the [`Session`] this [`Event`] is about.
    #[must_use]
    pub fn session(&self) -> &Session {
        match self {
            Self::Requested(s)
            | Self::Scheduled(s)
            | Self::Accepted(s)
            | Self::Rejected(s)
            | Self::Cancelled(s)
            | Self::Rescheduled { session: s, .. } => s,
        }
    }

    /// Returns a short name of this [`Event`].
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Requested(_) => "requested",
            Self::Scheduled(_) => "scheduled",
            Self::Accepted(_) => "accepted",
            Self::Rejected(_) => "rejected",
            Self::Cancelled(_) => "cancelled",
            Self::Rescheduled { .. } => "rescheduled",
        }
    }
}
