pub mod closure;
pub mod traits;

pub use traits::{ContextTask, SharedContextTask, SharedTask, Task};
