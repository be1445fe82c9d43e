use std::{fmt, sync::Arc};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Context,
    Serial,
    Parallel,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Context => "context",
            Phase::Serial => "serial",
            Phase::Parallel => "parallel",
        };
        f.write_str(name)
    }
}

/// A task failure, tagged with the phase it came from and the task's
/// registration index within that phase.
///
/// The original error is kept behind an `Arc` so a failed context phase can
/// report the same fault on every `finish` call.
#[derive(Debug, Error)]
#[error("{phase} task #{index} failed: {error}")]
pub struct Fault<E>
where
    E: std::error::Error + 'static,
{
    phase: Phase,
    index: usize,
    #[source]
    error: Arc<E>,
}

impl<E> Fault<E>
where
    E: std::error::Error + 'static,
{
    pub fn new(phase: Phase, index: usize, error: E) -> Self {
        Self {
            phase,
            index,
            error: Arc::new(error),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn error(&self) -> &E {
        &self.error
    }

    pub fn shared_error(&self) -> Arc<E> {
        Arc::clone(&self.error)
    }

    /// Unwraps the original error, or gives the fault back if another handle
    /// to it is still alive (e.g. the orchestrator's cached context outcome).
    pub fn try_into_error(self) -> Result<E, Self> {
        let Self {
            phase,
            index,
            error,
        } = self;
        Arc::try_unwrap(error).map_err(|error| Self {
            phase,
            index,
            error,
        })
    }
}

impl<E> Clone for Fault<E>
where
    E: std::error::Error + 'static,
{
    fn clone(&self) -> Self {
        Self {
            phase: self.phase,
            index: self.index,
            error: Arc::clone(&self.error),
        }
    }
}
