//! GraphQL API definitions.

mod mutation;
pub mod program;
mod query;
pub mod scalar;
pub mod session;
pub mod slot;
pub mod user;

use juniper::EmptySubscription;

use crate::Context;

pub use self::{
    mutation::Mutation, query::Query, session::Session, slot::Slot,
};

/// GraphQL schema.
pub type Schema =
    juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;
