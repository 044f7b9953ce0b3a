//! GraphQL scalar helpers for validated strings.

use std::{fmt, marker::PhantomData, str::FromStr};

use juniper::{
    GraphQLType, InputValue, ParseScalarResult, ParseScalarValue, ScalarToken,
    ScalarValue, Value,
};

/// Helper for `#[graphql(with = ..)]` attribute of scalars wrapping a
/// validated domain string `V`, like a `Session` title or reason.
///
/// Output is the [`Display`] of `V`, and input goes through the [`FromStr`]
/// validation of `V`, so GraphQL never accepts a string the domain would
/// refuse.
///
/// [`Display`]: fmt::Display
#[derive(Debug)]
pub struct Via<V>(PhantomData<V>);

impl<V> Via<V> {
    /// Renders the wrapped `V` as a string [`Value`].
    pub fn to_output<T, S>(value: &T) -> Value<S>
    where
        V: fmt::Display,
        T: AsRef<V>,
        S: ScalarValue,
    {
        Value::from(value.as_ref().to_string())
    }

    /// Validates the provided string [`InputValue`] as `V` and wraps it.
    ///
    /// # Errors
    ///
    /// If the input is not a string or `V` refuses it.
    pub fn from_input<T, S>(input: &InputValue<S>) -> Result<T, String>
    where
        V: FromStr<Err: fmt::Display>,
        T: From<V> + GraphQLType<S, TypeInfo = ()>,
        S: ScalarValue,
    {
        let name = T::name(&()).unwrap_or("String");
        let s = input.as_string_value().ok_or_else(|| {
            format!("`{name}` must be a string, found: {input}")
        })?;
        s.parse::<V>()
            .map(T::from)
            .map_err(|e| format!("Invalid `{name}` \"{s}\": {e}"))
    }

    /// Parses the provided [`ScalarToken`] as a plain string.
    ///
    /// # Errors
    ///
    /// If the token is not a string.
    pub fn parse_token<S: ScalarValue>(
        value: ScalarToken<'_>,
    ) -> ParseScalarResult<S> {
        <String as ParseScalarValue<S>>::from_str(value)
    }
}
