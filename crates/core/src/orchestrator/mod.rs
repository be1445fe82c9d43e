mod core;
mod phase;
pub mod result;

pub use self::core::Orchestrator;
pub use result::{Completion, Outcome};
