//! [`User`]-related definitions.
//!
//! Users themselves are owned by the identity provider: this service only
//! knows their IDs and the [`Role`]s they authenticate with.
//!
//! [`User`]: Actor

pub mod claims;

use common::define_kind;
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use self::claims::Claims;

/// ID of a platform user.
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

    /// Returns the raw bytes of this [`Id`].
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

define_kind! {
    #[doc = "Role of an authenticated user."]
    enum Role {
        #[doc = "Student enrolled into a program."]
        Student = 1,

        #[doc = "Teacher assigned to programs' subjects."]
        Teacher = 2,

        #[doc = "Privileged platform administrator."]
        Admin = 3,
    }
}

/// Authenticated user performing an operation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Actor {
    /// ID of the user.
    pub id: Id,

    /// [`Role`]s the user is granted.
    pub roles: Vec<Role>,
}

impl Actor {
    /// Creates a new [`Actor`] with the provided [`Role`]s.
    #[must_use]
    pub fn new(id: Id, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            id,
            roles: roles.into_iter().collect(),
        }
    }

    /// Indicates whether this [`Actor`] is granted the provided [`Role`].
    #[must_use]
    pub fn has(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Indicates whether this [`Actor`] is a privileged one.
    #[must_use]
    pub fn is_privileged(&self) -> bool {
        self.has(Role::Admin)
    }

    /// Indicates whether this [`Actor`] is the user with the provided ID
    /// acting in the provided [`Role`].
    #[must_use]
    pub fn is(&self, id: Id, role: Role) -> bool {
        self.id == id && self.has(role)
    }
}
