//! User-related definitions.
//!
//! Users are owned by the identity provider, so only their IDs are exposed.

use derive_more::{Display, From, Into};
use juniper::GraphQLScalar;
use service::domain;
use uuid::Uuid;

/// Unique identifier of a `User`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::user::Id)]
#[into(domain::user::Id)]
#[graphql(name = "UserId", transparent)]
pub struct Id(Uuid);

/// Unique identifier of a taught subject.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::subject::Id)]
#[into(domain::subject::Id)]
#[graphql(name = "SubjectId", transparent)]
pub struct SubjectId(Uuid);
