//! [`Program`] definitions.

use common::define_kind;
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Educational program a student may be enrolled into.
///
/// Kinds of programs are mutually exclusive: an enrollment or a session
/// references exactly one of them.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Program {
    /// One-to-one program with a single student.
    #[display("FocusOne({_0})")]
    FocusOne(Id),

    /// Group program with multiple students.
    #[display("Cohort({_0})")]
    Cohort(Id),
}

impl Program {
    /// Creates a new [`Program`] out of its stored parts.
    #[must_use]
    pub fn from_parts(kind: Kind, id: Id) -> Self {
        match kind {
            Kind::FocusOne => Self::FocusOne(id),
            Kind::Cohort => Self::Cohort(id),
        }
    }

    /// Returns the [`Kind`] of this [`Program`].
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Self::FocusOne(_) => Kind::FocusOne,
            Self::Cohort(_) => Kind::Cohort,
        }
    }

    /// Returns the [`Id`] of this [`Program`].
    #[must_use]
    pub fn id(&self) -> Id {
        match self {
            Self::FocusOne(id) | Self::Cohort(id) => *id,
        }
    }
}

/// ID of a [`Program`].
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

define_kind! {
    #[doc = "Kind of a [`Program`]."]
    enum Kind {
        #[doc = "One-to-one program."]
        FocusOne = 1,

        #[doc = "Group program."]
        Cohort = 2,
    }
}

#[cfg(test)]
mod spec {
    use super::{Id, Kind, Program};

    #[test]
    fn restores_from_parts() {
        let id = Id::new();

        for p in [Program::FocusOne(id), Program::Cohort(id)] {
            assert_eq!(Program::from_parts(p.kind(), p.id()), p);
        }
        assert_eq!(Program::Cohort(id).kind(), Kind::Cohort);
    }
}
