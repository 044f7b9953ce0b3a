//! [`Enrollment`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{subject, user, Program};

/// Enrollment of a student into a [`Program`].
#[derive(Clone, Debug)]
pub struct Enrollment {
    /// ID of this [`Enrollment`].
    pub id: Id,

    /// ID of the enrolled student.
    pub student_id: user::Id,

    /// [`Program`] the student is enrolled into.
    pub program: Program,

    /// Teachers assigned to the [`Program`]'s subjects.
    pub assignments: Vec<Assignment>,

    /// [`DateTime`] when this [`Enrollment`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Enrollment`] ended.
    pub ended_at: Option<EndDateTime>,
}

impl Enrollment {
    /// Indicates whether this [`Enrollment`] hasn't ended yet.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Returns the ID of the teacher assigned to the provided subject.
    #[must_use]
    pub fn teacher_for(&self, subject_id: subject::Id) -> Option<user::Id> {
        self.assignments
            .iter()
            .find(|a| a.subject_id == subject_id)
            .map(|a| a.teacher_id)
    }

    /// Indicates whether the provided teacher teaches any subject of this
    /// [`Enrollment`].
    #[must_use]
    pub fn is_taught_by(&self, teacher_id: user::Id) -> bool {
        self.assignments.iter().any(|a| a.teacher_id == teacher_id)
    }
}

/// Assignment of a teacher to a subject.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Assignment {
    /// ID of the taught subject.
    pub subject_id: subject::Id,

    /// ID of the teacher.
    pub teacher_id: user::Id,
}

/// ID of an [`Enrollment`].
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
    PartialEq,
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

/// [`DateTime`] when an [`Enrollment`] was created.
pub type CreationDateTime = DateTimeOf<(Enrollment, unit::Creation)>;

/// [`DateTime`] when an [`Enrollment`] ended.
pub type EndDateTime = DateTimeOf<(Enrollment, unit::End)>;
