//! [`Session`]-related read definitions.

use common::DateTime;

#[cfg(doc)]
use crate::domain::Session;
use crate::domain::{session::Participant, user, Interval};

/// Selector of active [`Session`]s occupying time of any of the
/// [`Participant`]s within a period.
///
/// Soft-deleted and terminal [`Session`]s are never selected.
#[derive(Clone, Debug)]
pub struct Busy {
    /// [`Participant`]s whose [`Session`]s are selected.
    pub participants: Vec<Participant>,

    /// Period the selected [`Session`]s overlap.
    pub period: Interval,
}

/// Selector of a user's [`Session`]s (as either side) within a period,
/// ordered by their start.
///
/// Soft-deleted [`Session`]s are never selected.
#[derive(Clone, Copy, Debug)]
pub struct Agenda {
    /// ID of the user whose [`Session`]s are selected.
    pub user_id: user::Id,

    /// Period the selected [`Session`]s overlap.
    pub period: Interval,
}

/// Selector of [`Session`]s whose status is behind the time.
///
/// These are requested, accepted and scheduled [`Session`]s which already
/// started and ongoing ones which already ended, excluding soft-deleted ones.
#[derive(Clone, Copy, Debug)]
pub struct Due {
    /// Current [`DateTime`].
    pub now: DateTime,
}
