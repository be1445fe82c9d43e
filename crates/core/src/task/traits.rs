use std::sync::Arc;

use async_trait::async_trait;

/// Produces a partial context from the ingress.
///
/// Every registered context task runs concurrently; their outputs are merged
/// into the shared context before any serial or parallel task starts.
#[async_trait]
pub trait ContextTask<I, C, E>: Send + Sync {
    async fn run(&self, ingress: Arc<I>) -> Result<C, E>;
}

/// A serial or parallel unit of work. Receives the ingress and the settled
/// context; the same `Arc<C>` is handed to every task of a `finish` call.
#[async_trait]
pub trait Task<I, C, T, E>: Send + Sync {
    async fn run(&self, ingress: Arc<I>, context: Arc<C>) -> Result<T, E>;
}

pub type SharedContextTask<I, C, E> = Arc<dyn ContextTask<I, C, E>>;
pub type SharedTask<I, C, T, E> = Arc<dyn Task<I, C, T, E>>;
