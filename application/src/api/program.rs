//! [`Program`]-related definitions.

use derive_more::{Display, From, Into};
use juniper::{GraphQLEnum, GraphQLInputObject, GraphQLObject, GraphQLScalar};
use service::domain;
use uuid::Uuid;

/// Educational program a student is enrolled into.
#[derive(Clone, Copy, Debug, GraphQLObject)]
pub struct Program {
    /// Kind of this `Program`.
    pub kind: Kind,

    /// Unique identifier of this `Program`.
    pub id: Id,
}

impl From<domain::Program> for Program {
    fn from(program: domain::Program) -> Self {
        Self {
            kind: program.kind().into(),
            id: program.id().into(),
        }
    }
}

/// Reference to an educational program.
#[derive(Clone, Copy, Debug, GraphQLInputObject)]
#[graphql(name = "ProgramInput")]
pub struct Input {
    /// Kind of the `Program`.
    pub kind: Kind,

    /// Unique identifier of the `Program`.
    pub id: Id,
}

impl From<Input> for domain::Program {
    fn from(input: Input) -> Self {
        Self::from_parts(input.kind.into(), input.id.into())
    }
}

/// Unique identifier of a `Program`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::program::Id)]
#[into(domain::program::Id)]
#[graphql(name = "ProgramId", transparent)]
pub struct Id(Uuid);

/// Kind of a `Program`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "ProgramKind")]
pub enum Kind {
    /// One-to-one program with a single student.
    FocusOne,

    /// Group program with multiple students.
    Cohort,
}

impl From<domain::program::Kind> for Kind {
    fn from(kind: domain::program::Kind) -> Self {
        use domain::program::Kind as K;
        match kind {
            K::FocusOne => Self::FocusOne,
            K::Cohort => Self::Cohort,
        }
    }
}

impl From<Kind> for domain::program::Kind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::FocusOne => Self::FocusOne,
            Kind::Cohort => Self::Cohort,
        }
    }
}
