//! [`Command`] for authorizing an [`Actor`].

use derive_more::{Display, Error, From};
use jsonwebtoken::Validation;
use tracerr::Traced;

use crate::{
    domain::user::{
        claims::{Claims, Token},
        Actor,
    },
    Service,
};

use super::Command;

/// [`Command`] for authorizing an [`Actor`] by its access [`Token`].
#[derive(Clone, Debug, From)]
pub struct AuthorizeActor {
    /// Access [`Token`] to authorize.
    pub token: Token,
}

impl<Db, Nt> Command<AuthorizeActor> for Service<Db, Nt> {
    type Ok = Actor;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeActor,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeActor { token } = cmd;

        let claims = jsonwebtoken::decode::<Claims>(
            token.as_ref(),
            &self.config.jwt_decoding_key,
            &Validation::default(),
        )
        .map_err(tracerr::from_and_wrap!(=> E))?
        .claims;

        let actor = Actor::from(claims);
        if actor.roles.is_empty() {
            return Err(tracerr::new!(E::NoRoles));
        }
        Ok(actor)
    }
}

/// Error of [`AuthorizeActor`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`jsonwebtoken`] decoding error.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),

    /// [`Token`] grants no roles.
    #[display("Access token grants no roles")]
    #[from(ignore)]
    NoRoles,
}
