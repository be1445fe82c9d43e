pub mod error;
pub mod merge;
pub mod orchestrator;
pub mod task;

pub use error::*;
pub use merge::*;
pub use orchestrator::*;
pub use task::*;
