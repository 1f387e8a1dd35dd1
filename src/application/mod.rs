//! Application layer - the run orchestration and message synthesis.

pub mod dispatcher;
pub mod generator;

pub use dispatcher::{DispatchError, NotificationDispatcher, RunReport};
pub use generator::{MessageCache, PersonaTextGenerator};
