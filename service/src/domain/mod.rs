//! Domain definitions.

pub mod calendar;
pub mod enrollment;
pub mod holiday;
pub mod interval;
pub mod program;
pub mod session;
pub mod subject;
pub mod user;

pub use self::{
    enrollment::Enrollment, holiday::Holiday, interval::Interval,
    program::Program, session::Session,
};
