//! Background [`Task`]s definitions.

pub mod advance_sessions;
mod background;

pub use common::Handler as Task;

pub use self::{advance_sessions::AdvanceSessions, background::Background};
