use crate::error::Fault;

pub type Outcome<T, E> = Result<Completion<T>, Fault<E>>;

/// Results of a successful `finish`, each phase in registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion<T> {
    pub parallel: Vec<T>,
    pub serial: Vec<T>,
}

impl<T> Completion<T> {
    pub fn new(parallel: Vec<T>, serial: Vec<T>) -> Self {
        Self { parallel, serial }
    }

    /// `(parallel, serial)`, in that positional order.
    pub fn into_parts(self) -> (Vec<T>, Vec<T>) {
        (self.parallel, self.serial)
    }
}

impl<T> Default for Completion<T> {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}
