//! [`Holiday`] definitions.

use common::Date;

/// Public holiday on which no session may take place.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Holiday {
    /// [`Date`] of this [`Holiday`] in the operating time zone.
    pub date: Date,

    /// Human-readable name of this [`Holiday`].
    pub name: String,
}
