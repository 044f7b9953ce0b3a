//! [`Session`]-related definitions.

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLObject, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::{
    api::{program::Program, scalar, user},
    Context,
};

/// A teaching session.
#[derive(Clone, Debug, From, Into)]
pub struct Session(domain::Session);

/// A teaching session between a teacher and a student.
#[graphql_object(context = Context)]
impl Session {
    /// Unique identifier of this `Session`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Title of this `Session`.
    #[must_use]
    pub fn title(&self) -> Title {
        self.0.title.clone().into()
    }

    /// Description of this `Session`.
    #[must_use]
    pub fn description(&self) -> Option<Description> {
        self.0.description.clone().map(Into::into)
    }

    /// `DateTime` this `Session` starts at.
    #[must_use]
    pub fn start_time(&self) -> DateTime {
        self.0.interval.start()
    }

    /// `DateTime` this `Session` ends at.
    #[must_use]
    pub fn end_time(&self) -> DateTime {
        self.0.interval.end()
    }

    /// ID of the teacher giving this `Session`.
    #[must_use]
    pub fn teacher_id(&self) -> user::Id {
        self.0.teacher_id.into()
    }

    /// ID of the student attending this `Session`.
    #[must_use]
    pub fn student_id(&self) -> user::Id {
        self.0.student_id.into()
    }

    /// ID of the subject taught in this `Session`.
    #[must_use]
    pub fn subject_id(&self) -> Option<user::SubjectId> {
        self.0.subject_id.map(Into::into)
    }

    /// `Program` this `Session` belongs to.
    #[must_use]
    pub fn program(&self) -> Option<Program> {
        self.0.program.map(Into::into)
    }

    /// Current status of this `Session`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// Link to join the meeting of this `Session`.
    #[must_use]
    pub fn meeting_link(&self) -> Option<MeetingLink> {
        self.0.meeting.as_ref().map(|m| m.link.clone().into())
    }

    /// Platform hosting the meeting of this `Session`.
    #[must_use]
    pub fn meeting_platform(&self) -> Option<MeetingPlatform> {
        self.0.meeting.as_ref().map(|m| m.platform.into())
    }

    /// ID of the user who requested this `Session`.
    #[must_use]
    pub fn requested_by(&self) -> Option<user::Id> {
        self.0.requested_by.map(Into::into)
    }

    /// ID of the user who accepted this `Session`.
    #[must_use]
    pub fn accepted_by(&self) -> Option<user::Id> {
        self.0.accepted_by.map(Into::into)
    }

    /// Resolution this `Session` was rejected with.
    #[must_use]
    pub fn rejection(&self) -> Option<Resolution> {
        self.0.rejection.clone().map(Into::into)
    }

    /// Resolution this `Session` was cancelled with.
    #[must_use]
    pub fn cancellation(&self) -> Option<Resolution> {
        self.0.cancellation.clone().map(Into::into)
    }

    /// History of this `Session` being moved, oldest first.
    #[must_use]
    pub fn reschedules(&self) -> Vec<Reschedule> {
        self.0.reschedules.iter().cloned().map(Into::into).collect()
    }

    /// `DateTime` when this `Session` was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }

    /// `DateTime` when this `Session` was last modified.
    #[must_use]
    pub fn updated_at(&self) -> DateTime {
        self.0.updated_at.coerce()
    }

    /// `DateTime` when this `Session` was deleted.
    ///
    /// Only administrators see deleted `Session`s.
    #[must_use]
    pub fn deleted_at(&self) -> Option<DateTime> {
        self.0.deleted_at.map(|at| at.coerce())
    }
}

/// Resolution of a `Session` made by some user.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "SessionResolution")]
pub struct Resolution {
    /// ID of the user who made this `SessionResolution`.
    pub by: user::Id,

    /// Reason of this `SessionResolution`.
    pub reason: Reason,
}

impl From<domain::session::Resolution> for Resolution {
    fn from(r: domain::session::Resolution) -> Self {
        Self {
            by: r.by.into(),
            reason: r.reason.into(),
        }
    }
}

/// Record of a `Session` being moved to another time.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "SessionReschedule")]
pub struct Reschedule {
    /// `DateTime` the `Session` started at before.
    pub previous_start_time: DateTime,

    /// `DateTime` the `Session` ended at before.
    pub previous_end_time: DateTime,

    /// ID of the user who moved the `Session`.
    pub by: user::Id,

    /// `DateTime` when the `Session` was moved.
    pub at: DateTime,
}

impl From<domain::session::Reschedule> for Reschedule {
    fn from(r: domain::session::Reschedule) -> Self {
        Self {
            previous_start_time: r.previous.start(),
            previous_end_time: r.previous.end(),
            by: r.by.into(),
            at: r.at.coerce(),
        }
    }
}

/// Unique identifier of a `Session`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::session::Id)]
#[into(domain::session::Id)]
#[graphql(name = "SessionId", transparent)]
pub struct Id(Uuid);

/// Title of a `Session`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "SessionTitle",
    with = scalar::Via::<domain::session::Title>,
)]
pub struct Title(domain::session::Title);

/// Description of a `Session`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "SessionDescription",
    with = scalar::Via::<domain::session::Description>,
)]
pub struct Description(domain::session::Description);

/// Reason of rejecting or cancelling a `Session`, 10 to 500 characters long.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "SessionReason",
    with = scalar::Via::<domain::session::Reason>,
)]
pub struct Reason(domain::session::Reason);

/// Link to join the meeting of a `Session`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "MeetingLink",
    with = scalar::Via::<domain::session::MeetingLink>,
)]
pub struct MeetingLink(domain::session::MeetingLink);

/// Status of a `Session`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "SessionStatus")]
pub enum Status {
    /// Requested by a student and awaiting the teacher's decision.
    Requested,

    /// Accepted by the teacher.
    Accepted,

    /// Rejected by the teacher.
    Rejected,

    /// Scheduled to take place.
    Scheduled,

    /// Taking place right now.
    Ongoing,

    /// Took place.
    Completed,

    /// Cancelled by a participant or an administrator.
    Cancelled,
}

impl From<domain::session::Status> for Status {
    fn from(status: domain::session::Status) -> Self {
        use domain::session::Status as S;
        match status {
            S::Requested => Self::Requested,
            S::Accepted => Self::Accepted,
            S::Rejected => Self::Rejected,
            S::Scheduled => Self::Scheduled,
            S::Ongoing => Self::Ongoing,
            S::Completed => Self::Completed,
            S::Cancelled => Self::Cancelled,
        }
    }
}

/// Platform hosting the meeting of a `Session`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
pub enum MeetingPlatform {
    /// Jitsi Meet.
    Jitsi,
}

impl From<domain::session::MeetingPlatform> for MeetingPlatform {
    fn from(platform: domain::session::MeetingPlatform) -> Self {
        use domain::session::MeetingPlatform as P;
        match platform {
            P::Jitsi => Self::Jitsi,
        }
    }
}

impl From<MeetingPlatform> for domain::session::MeetingPlatform {
    fn from(platform: MeetingPlatform) -> Self {
        match platform {
            MeetingPlatform::Jitsi => Self::Jitsi,
        }
    }
}
