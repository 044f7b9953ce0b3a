//! Read entities definitions.

pub mod enrollment;
pub mod session;
