//! [`Claims`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::DateTimeOf;
use derive_more::{AsRef, Display, FromStr};
use serde::{Deserialize, Serialize};

use crate::domain::user::{self, Actor, Role};

/// Claims of an access token issued by the identity provider.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Claims {
    /// ID of the user the token is issued for.
    #[serde(rename = "sub")]
    pub user_id: user::Id,

    /// [`Role`]s granted to the user.
    #[serde(default, with = "roles")]
    pub roles: Vec<Role>,

    /// [`DateTime`] when the token expires.
    #[serde(rename = "exp", with = "common::datetime::serde::unix_timestamp")]
    pub expires_at: ExpirationDateTime,
}

impl From<Claims> for Actor {
    fn from(claims: Claims) -> Self {
        Self::new(claims.user_id, claims.roles)
    }
}

/// Bearer access token carrying [`Claims`].
#[derive(AsRef, Clone, Debug, Display, FromStr)]
#[as_ref(str)]
pub struct Token(String);

impl Token {
    /// Creates a new [`Token`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `token` is a well-formed
    /// [JWT].
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

/// Marker type indicating [`Claims`] expiration.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;

/// [`DateTime`] when [`Claims`] expire.
pub type ExpirationDateTime = DateTimeOf<(Claims, Expiration)>;

mod roles {
    //! [`Role`]s representation in [`Claims`] as a list of strings.
    //!
    //! [`Claims`]: super::Claims

    use serde::{
        de::Error as _, ser::SerializeSeq as _, Deserialize, Deserializer,
        Serializer,
    };

    use crate::domain::user::Role;

    pub(super) fn serialize<S: Serializer>(
        roles: &[Role],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(roles.len()))?;
        for role in roles {
            seq.serialize_element(&role.to_string())?;
        }
        seq.end()
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Role>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .into_iter()
            .map(|r| {
                r.parse()
                    .map_err(|_| D::Error::custom(format!("unknown role: {r}")))
            })
            .collect()
    }
}
