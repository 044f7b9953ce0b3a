//! [`Query`] definition.

pub mod available_slots;
pub mod session;

/// [`Query`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Query;

pub use self::available_slots::AvailableSlots;
