//! [`Enrollment`]-related read definitions.

#[cfg(doc)]
use crate::domain::Enrollment;
use crate::domain::{user, Program};

/// Selector of the active [`Enrollment`] of a student.
///
/// A student has at most one active [`Enrollment`].
#[derive(Clone, Copy, Debug)]
pub struct OfStudent(pub user::Id);

/// Selector of the active [`Enrollment`]s into a [`Program`].
#[derive(Clone, Copy, Debug)]
pub struct InProgram(pub Program);
