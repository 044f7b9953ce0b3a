//! [`Session`] definitions.

pub mod access;
pub mod conflict;
pub mod event;
pub mod slot;
pub mod state;

use std::sync::LazyLock;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{subject, user, Interval, Program};

pub use self::{
    event::Event,
    state::{IllegalTransition, Status, Transition},
};

/// Teaching session between a teacher and a student.
#[derive(Clone, Debug)]
pub struct Session {
    /// ID of this [`Session`].
    pub id: Id,

    /// [`Title`] of this [`Session`].
    pub title: Title,

    /// [`Description`] of this [`Session`].
    pub description: Option<Description>,

    /// [`Interval`] this [`Session`] takes place in.
    pub interval: Interval,

    /// ID of the teacher of this [`Session`].
    pub teacher_id: user::Id,

    /// ID of the student of this [`Session`].
    pub student_id: user::Id,

    /// ID of the subject taught in this [`Session`].
    pub subject_id: Option<subject::Id>,

    /// [`Program`] this [`Session`] belongs to.
    pub program: Option<Program>,

    /// Current [`Status`] of this [`Session`].
    pub status: Status,

    /// [`Meeting`] this [`Session`] is held in.
    pub meeting: Option<Meeting>,

    /// ID of the user who requested this [`Session`].
    pub requested_by: Option<user::Id>,

    /// ID of the user who accepted this [`Session`].
    pub accepted_by: Option<user::Id>,

    /// [`Resolution`] this [`Session`] was rejected with.
    pub rejection: Option<Resolution>,

    /// [`Resolution`] this [`Session`] was cancelled with.
    pub cancellation: Option<Resolution>,

    /// History of this [`Session`] being moved, oldest first.
    pub reschedules: Vec<Reschedule>,

    /// [`DateTime`] when this [`Session`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Session`] was last modified.
    pub updated_at: ModificationDateTime,

    /// [`DateTime`] when this [`Session`] was soft-deleted.
    pub deleted_at: Option<DeletionDateTime>,
}

impl Session {
    /// Indicates whether this [`Session`] is soft-deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Indicates whether this [`Session`] occupies its participants' time.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.is_deleted() && self.status.is_active()
    }

    /// Returns both [`Participant`]s of this [`Session`].
    #[must_use]
    pub fn participants(&self) -> [Participant; 2] {
        [
            Participant::Teacher(self.teacher_id),
            Participant::Student(self.student_id),
        ]
    }

    /// Indicates whether the provided [`Participant`] takes part in this
    /// [`Session`].
    #[must_use]
    pub fn involves(&self, participant: Participant) -> bool {
        self.participants().contains(&participant)
    }

    /// Applies the provided [`Transition`] to this [`Session`].
    ///
    /// # Errors
    ///
    /// If the [`Transition`] is not allowed from the current [`Status`].
    pub fn apply(
        &mut self,
        transition: Transition,
        at: ModificationDateTime,
    ) -> Result<(), IllegalTransition> {
        self.status = self.status.apply(transition)?;
        self.updated_at = at;
        Ok(())
    }

    /// Moves this [`Session`] to the provided [`Interval`], retaining the
    /// previous one in its history.
    ///
    /// # Errors
    ///
    /// If this [`Session`] cannot be rescheduled in its current [`Status`].
    pub fn reschedule(
        &mut self,
        interval: Interval,
        by: user::Id,
        at: ModificationDateTime,
    ) -> Result<(), IllegalTransition> {
        self.apply(Transition::Reschedule, at)?;
        self.reschedules.push(Reschedule {
            previous: self.interval,
            by,
            at: at.coerce(),
        });
        self.interval = interval;
        Ok(())
    }
}

/// Side taken by a user in a [`Session`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Participant {
    /// User teaching the [`Session`].
    #[display("teacher `{_0}`")]
    Teacher(user::Id),

    /// User attending the [`Session`].
    #[display("student `{_0}`")]
    Student(user::Id),
}

impl Participant {
    /// Returns the ID of the user behind this [`Participant`].
    #[must_use]
    pub fn id(&self) -> user::Id {
        match self {
            Self::Teacher(id) | Self::Student(id) => *id,
        }
    }
}

/// ID of a [`Session`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Title of a [`Session`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Title(String);

impl Title {
    /// Creates a new [`Title`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `title` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(title: impl Into<String>) -> Self {
        Self(title.into())
    }

    /// Creates a new [`Title`] if the given `title` is valid.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Option<Self> {
        let title = title.into();
        Self::check(&title).then_some(Self(title))
    }

    /// Checks whether the given `title` is a valid [`Title`].
    fn check(title: impl AsRef<str>) -> bool {
        let title = title.as_ref();
        title.trim() == title
            && !title.is_empty()
            && title.chars().count() <= 256
    }
}

impl Default for Title {
    fn default() -> Self {
        Self("Session".to_owned())
    }
}

impl FromStr for Title {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Title`")
    }
}

/// Free-text description of a [`Session`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Description(String);

impl Description {
    /// Creates a new [`Description`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        (!text.trim().is_empty() && text.chars().count() <= 4096)
            .then_some(Self(text))
    }
}

impl FromStr for Description {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Description`")
    }
}

/// Reason of rejecting or cancelling a [`Session`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Reason(String);

impl Reason {
    /// Minimal number of characters in a [`Reason`].
    pub const MIN_LEN: usize = 10;

    /// Maximal number of characters in a [`Reason`].
    pub const MAX_LEN: usize = 500;

    /// Creates a new [`Reason`] if the given `reason` is valid.
    ///
    /// Surrounding whitespace is not counted and is stripped.
    #[must_use]
    pub fn new(reason: impl AsRef<str>) -> Option<Self> {
        let reason = reason.as_ref().trim();
        Self::check(reason).then(|| Self(reason.to_owned()))
    }

    /// Returns the [`Reason`] a [`Session`] is closed with when it starts
    /// without ever being scheduled.
    #[must_use]
    pub fn expired() -> Self {
        Self("not scheduled before its start time".to_owned())
    }

    /// Checks whether the given `reason` is a valid [`Reason`].
    fn check(reason: &str) -> bool {
        (Self::MIN_LEN..=Self::MAX_LEN).contains(&reason.chars().count())
    }
}

impl FromStr for Reason {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("`Reason` must be 10 to 500 characters long")
    }
}

/// Online meeting a [`Session`] is held in.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Meeting {
    /// [`MeetingLink`] to join the meeting.
    pub link: MeetingLink,

    /// [`MeetingPlatform`] hosting the meeting.
    pub platform: MeetingPlatform,
}

/// Link to join a [`Meeting`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct MeetingLink(String);

impl MeetingLink {
    /// Creates a new [`MeetingLink`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `link` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(link: impl Into<String>) -> Self {
        Self(link.into())
    }

    /// Creates a new [`MeetingLink`] if the given `link` is valid.
    #[must_use]
    pub fn new(link: impl Into<String>) -> Option<Self> {
        let link = link.into();
        Self::check(&link).then_some(Self(link))
    }

    /// Generates a new [`MeetingLink`] of the [`Session`] with the provided
    /// ID under the provided `base` one.
    #[expect(unsafe_code, reason = "appending a path keeps it valid")]
    #[must_use]
    pub fn generate(base: &Self, id: Id) -> Self {
        let link = format!("{}/{id}", base.0.trim_end_matches('/'));
        unsafe { Self::new_unchecked(link) }
    }

    /// Checks whether the given `link` is a valid [`MeetingLink`].
    fn check(link: impl AsRef<str>) -> bool {
        /// Regular expression checking [`MeetingLink`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("valid regex")
        });

        let link = link.as_ref();
        link.len() <= 2048 && REGEX.is_match(link)
    }
}

impl FromStr for MeetingLink {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `MeetingLink`")
    }
}

define_kind! {
    #[doc = "Platform hosting a [`Meeting`]."]
    enum MeetingPlatform {
        #[doc = "[Jitsi Meet](https://jitsi.org/jitsi-meet)."]
        Jitsi = 1,
    }
}

impl Default for MeetingPlatform {
    fn default() -> Self {
        Self::Jitsi
    }
}

/// Resolution of a [`Session`] made by some user.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Resolution {
    /// ID of the user who made this [`Resolution`].
    pub by: user::Id,

    /// [`Reason`] of this [`Resolution`].
    pub reason: Reason,
}

/// Record of a [`Session`] being moved to another [`Interval`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Reschedule {
    /// [`Interval`] the [`Session`] occupied before.
    pub previous: Interval,

    /// ID of the user who moved the [`Session`].
    pub by: user::Id,

    /// [`DateTime`] when the [`Session`] was moved.
    pub at: RescheduleDateTime,
}

/// [`DateTime`] when a [`Session`] was created.
pub type CreationDateTime = DateTimeOf<(Session, unit::Creation)>;

/// [`DateTime`] when a [`Session`] was modified.
pub type ModificationDateTime = DateTimeOf<(Session, unit::Modification)>;

/// [`DateTime`] when a [`Session`] was deleted.
pub type DeletionDateTime = DateTimeOf<(Session, unit::Deletion)>;

/// [`DateTime`] when a [`Session`] was rescheduled.
pub type RescheduleDateTime = DateTimeOf<Reschedule>;

#[cfg(test)]
pub(crate) mod spec {
    use common::DateTime;
    use time::macros::datetime;

    use crate::domain::{user, Interval};

    use super::{
        Id, MeetingLink, Reason, Session, Status, Title, Transition,
    };

    /// Creates a new [`Session`] for tests.
    pub(crate) fn session(
        teacher_id: user::Id,
        student_id: user::Id,
        interval: Interval,
        status: Status,
    ) -> Session {
        let now = DateTime::UNIX_EPOCH;
        Session {
            id: Id::new(),
            title: Title::default(),
            description: None,
            interval,
            teacher_id,
            student_id,
            subject_id: None,
            program: None,
            status,
            meeting: None,
            requested_by: None,
            accepted_by: None,
            rejection: None,
            cancellation: None,
            reschedules: vec![],
            created_at: now.coerce(),
            updated_at: now.coerce(),
            deleted_at: None,
        }
    }

    /// Creates a new [`Interval`] out of the provided UTC bounds.
    pub(crate) fn interval(
        start: time::OffsetDateTime,
        end: time::OffsetDateTime,
    ) -> Interval {
        Interval::new(start.try_into().unwrap(), end.try_into().unwrap())
            .unwrap()
    }

    #[test]
    fn reason_length_is_bounded() {
        assert!(Reason::new("too short").is_none());
        assert!(Reason::new("   padded    ").is_none());
        assert!(Reason::new("x".repeat(501)).is_none());
        assert!(Reason::new("x".repeat(500)).is_some());
        assert_eq!(
            Reason::new(Reason::expired().to_string()),
            Some(Reason::expired()),
        );
        assert_eq!(
            Reason::new("  student is sick  ").map(|r| r.to_string()),
            Some("student is sick".to_owned()),
        );
        assert!("sorry".parse::<Reason>().is_err());
    }

    #[test]
    fn validates_titles() {
        assert!(Title::new("Algebra").is_some());
        assert!(Title::new("").is_none());
        assert!(Title::new(" Algebra").is_none());
    }

    #[test]
    fn generates_meeting_links() {
        let base = MeetingLink::new("https://meet.jit.si/").unwrap();
        let id = Id::new();

        let link = MeetingLink::generate(&base, id);

        assert_eq!(link.to_string(), format!("https://meet.jit.si/{id}"));
        assert!(MeetingLink::new(link.to_string()).is_some());
        assert!(MeetingLink::new("ftp://meet").is_none());
        assert!(MeetingLink::new("https://meet here").is_none());
    }

    #[test]
    fn reschedule_retains_history() {
        let original = interval(
            datetime!(2024-06-10 10:00 UTC),
            datetime!(2024-06-10 11:15 UTC),
        );
        let moved = interval(
            datetime!(2024-06-11 10:00 UTC),
            datetime!(2024-06-11 11:15 UTC),
        );
        let teacher = user::Id::new();
        let mut s =
            session(teacher, user::Id::new(), original, Status::Scheduled);

        s.reschedule(moved, teacher, DateTime::UNIX_EPOCH.coerce())
            .unwrap();

        assert_eq!(s.interval, moved);
        assert_eq!(s.status, Status::Scheduled);
        assert_eq!(s.reschedules.len(), 1);
        assert_eq!(s.reschedules[0].previous, original);
        assert_eq!(s.reschedules[0].by, teacher);
    }

    #[test]
    fn terminal_session_cannot_be_rescheduled() {
        let original = interval(
            datetime!(2024-06-10 10:00 UTC),
            datetime!(2024-06-10 11:15 UTC),
        );
        let mut s =
            session(user::Id::new(), user::Id::new(), original, Status::Rejected);

        assert!(s
            .reschedule(original, user::Id::new(), DateTime::UNIX_EPOCH.coerce())
            .is_err());
        assert!(s.reschedules.is_empty());
        assert_eq!(s.status, Status::Rejected);
        assert!(s.apply(Transition::Cancel, DateTime::UNIX_EPOCH.coerce()).is_err());
    }
}
