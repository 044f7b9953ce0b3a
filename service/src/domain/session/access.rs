//! Access control over [`Session`]s.

use derive_more::{Display, Error};

use crate::domain::{
    user::{self, Actor, Role},
    Session,
};

/// Action an [`Actor`] may perform on a [`Session`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Action {
    /// Request a new [`Session`] as a student.
    #[display("request")]
    Request,

    /// Schedule a new [`Session`] directly.
    #[display("schedule")]
    Schedule,

    /// Accept a requested [`Session`].
    #[display("accept")]
    Accept,

    /// Reject a requested [`Session`].
    #[display("reject")]
    Reject,

    /// Cancel a [`Session`].
    #[display("cancel")]
    Cancel,

    /// Move a [`Session`] to another time.
    #[display("reschedule")]
    Reschedule,

    /// Soft-delete a [`Session`].
    #[display("delete")]
    Delete,

    /// Restore a soft-deleted [`Session`].
    #[display("restore")]
    Restore,

    /// Read a [`Session`].
    #[display("view")]
    View,
}

/// Teacher and student a [`Session`] is (or is going to be) held between.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Parties {
    /// ID of the teacher.
    pub teacher_id: user::Id,

    /// ID of the student.
    pub student_id: user::Id,
}

impl From<&Session> for Parties {
    fn from(session: &Session) -> Self {
        Self {
            teacher_id: session.teacher_id,
            student_id: session.student_id,
        }
    }
}

/// Error of an [`Actor`] not being allowed to perform an [`Action`].
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
#[display("`User(id: {actor})` is not allowed to {action} the session")]
pub struct Forbidden {
    /// ID of the rejected [`Actor`].
    pub actor: user::Id,

    /// Rejected [`Action`].
    pub action: Action,
}

/// Checks whether the provided [`Actor`] may perform the provided [`Action`]
/// on a [`Session`] between the provided [`Parties`].
///
/// # Errors
///
/// With [`Forbidden`] if the [`Action`] is not allowed.
pub fn authorize(
    actor: &Actor,
    action: Action,
    parties: impl Into<Parties>,
) -> Result<(), Forbidden> {
    let Parties {
        teacher_id,
        student_id,
    } = parties.into();
    let is_teacher = actor.is(teacher_id, Role::Teacher);
    let is_student = actor.is(student_id, Role::Student);
    let is_admin = actor.is_privileged();

    let allowed = match action {
        Action::Request => is_student,
        Action::Schedule => is_admin || is_teacher,
        Action::Accept | Action::Reject => is_teacher,
        Action::Cancel | Action::View => is_admin || is_teacher || is_student,
        Action::Reschedule => is_teacher || is_student,
        Action::Delete | Action::Restore => is_admin,
    };
    allowed.then_some(()).ok_or(Forbidden {
        actor: actor.id,
        action,
    })
}
