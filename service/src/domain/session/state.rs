//! [`Session`] lifecycle.
//!
//! ```text
//! requested ──accept──► accepted ──schedule──► scheduled ──start──► ongoing
//!     │                    │                      │                   │
//!     └─reject─► rejected  │                      └──────complete─────┤
//!                          │                                          ▼
//!  cancel: requested | accepted | scheduled | ongoing ─► cancelled  completed
//! ```
//!
//! [`Session`]: super::Session

use common::define_kind;
use derive_more::{Display, Error};

define_kind! {
    #[doc = "Status of a [`Session`](super::Session)."]
    enum Status {
        #[doc = "Requested by a student and awaiting the teacher's decision."]
        Requested = 1,

        #[doc = "Accepted by the teacher."]
        Accepted = 2,

        #[doc = "Rejected by the teacher."]
        Rejected = 3,

        #[doc = "Scheduled to take place."]
        Scheduled = 4,

        #[doc = "Taking place right now."]
        Ongoing = 5,

        #[doc = "Took place."]
        Completed = 6,

        #[doc = "Cancelled by a participant or an administrator."]
        Cancelled = 7,
    }
}

impl Status {
    /// Indicates whether no [`Transition`] is possible from this [`Status`].
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Completed | Self::Cancelled)
    }

    /// Indicates whether a session in this [`Status`] occupies its
    /// participants' time.
    #[must_use]
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// Applies the provided [`Transition`] to this [`Status`].
    ///
    /// # Errors
    ///
    /// If the [`Transition`] is not allowed from this [`Status`].
    pub fn apply(self, transition: Transition) -> Result<Self, IllegalTransition> {
        use Status as S;
        use Transition as T;

        Ok(match (self, transition) {
            (S::Requested, T::Accept) => S::Accepted,
            (S::Requested, T::Reject) => S::Rejected,
            (S::Accepted, T::Schedule) => S::Scheduled,
            (S::Scheduled, T::Start) => S::Ongoing,
            (S::Ongoing, T::Complete) => S::Completed,
            (S::Requested | S::Accepted | S::Scheduled | S::Ongoing, T::Cancel) => {
                S::Cancelled
            }
            (s @ (S::Requested | S::Accepted | S::Scheduled), T::Reschedule) => s,
            (from, transition) => {
                return Err(IllegalTransition { from, transition })
            }
        })
    }
}

/// Change of a [`Status`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Transition {
    /// Teacher accepts a requested session.
    #[display("accept")]
    Accept,

    /// Teacher rejects a requested session.
    #[display("reject")]
    Reject,

    /// Accepted session gets a meeting and is scheduled.
    #[display("schedule")]
    Schedule,

    /// Scheduled session begins.
    #[display("start")]
    Start,

    /// Ongoing session ends.
    #[display("complete")]
    Complete,

    /// Session is called off.
    #[display("cancel")]
    Cancel,

    /// Session is moved to another time, keeping its [`Status`].
    #[display("reschedule")]
    Reschedule,
}

/// Error of applying a [`Transition`] not allowed from a [`Status`].
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
#[display("cannot {transition} a `{from}` session")]
pub struct IllegalTransition {
    /// [`Status`] the [`Transition`] was attempted from.
    pub from: Status,

    /// Attempted [`Transition`].
    pub transition: Transition,
}

#[cfg(test)]
mod spec {
    use super::{IllegalTransition, Status, Transition};

    #[test]
    fn request_flow() {
        let accepted = Status::Requested.apply(Transition::Accept).unwrap();
        let scheduled = accepted.apply(Transition::Schedule).unwrap();
        let ongoing = scheduled.apply(Transition::Start).unwrap();

        assert_eq!(scheduled, Status::Scheduled);
        assert_eq!(ongoing.apply(Transition::Complete), Ok(Status::Completed));
        assert_eq!(
            Status::Requested.apply(Transition::Reject),
            Ok(Status::Rejected),
        );
    }

    #[test]
    fn only_requested_may_be_rejected() {
        for status in Status::ALL.iter().copied().filter(|s| *s != Status::Requested) {
            assert_eq!(
                status.apply(Transition::Reject),
                Err(IllegalTransition {
                    from: status,
                    transition: Transition::Reject,
                }),
            );
        }
    }

    #[test]
    fn accepting_twice_is_illegal() {
        assert!(Status::Accepted.apply(Transition::Accept).is_err());
        assert!(Status::Scheduled.apply(Transition::Accept).is_err());
    }

    #[test]
    fn cancel_from_non_terminal_only() {
        for status in Status::ALL.iter().copied() {
            let res = status.apply(Transition::Cancel);
            if status.is_terminal() {
                assert!(res.is_err(), "{status} must not be cancellable");
            } else {
                assert_eq!(res, Ok(Status::Cancelled));
            }
        }
    }

    #[test]
    fn terminal_states_accept_nothing() {
        let transitions = [
            Transition::Accept,
            Transition::Reject,
            Transition::Schedule,
            Transition::Start,
            Transition::Complete,
            Transition::Cancel,
            Transition::Reschedule,
        ];
        for status in [Status::Rejected, Status::Completed, Status::Cancelled] {
            for t in transitions {
                assert!(status.apply(t).is_err(), "{status} -> {t}");
            }
        }
    }

    #[test]
    fn reschedule_keeps_status() {
        for status in [Status::Requested, Status::Accepted, Status::Scheduled] {
            assert_eq!(status.apply(Transition::Reschedule), Ok(status));
        }
        assert!(Status::Ongoing.apply(Transition::Reschedule).is_err());
    }

    #[test]
    fn explains_illegal_transition() {
        let err = Status::Scheduled.apply(Transition::Reject).unwrap_err();

        assert_eq!(err.to_string(), "cannot reject a `SCHEDULED` session");
    }
}
