//! [`Slot`]-related definitions.

use common::DateTime;
use juniper::GraphQLObject;
use service::domain::Interval;

/// Free time a `Session` may be booked in.
#[derive(Clone, Copy, Debug, GraphQLObject)]
pub struct Slot {
    /// `DateTime` this `Slot` starts at.
    pub start: DateTime,

    /// `DateTime` this `Slot` ends at.
    pub end: DateTime,
}

impl From<Interval> for Slot {
    fn from(interval: Interval) -> Self {
        Self {
            start: interval.start(),
            end: interval.end(),
        }
    }
}
