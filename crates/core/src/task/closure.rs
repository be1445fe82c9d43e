use std::{future::Future, sync::Arc};

use async_trait::async_trait;

use super::traits::{ContextTask, Task};

#[async_trait]
impl<I, C, E, F, Fut> ContextTask<I, C, E> for F
where
    I: Send + Sync + 'static,
    C: Send + 'static,
    E: Send + 'static,
    F: Fn(Arc<I>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<C, E>> + Send + 'static,
{
    async fn run(&self, ingress: Arc<I>) -> Result<C, E> {
        (self)(ingress).await
    }
}

#[async_trait]
impl<I, C, T, E, F, Fut> Task<I, C, T, E> for F
where
    I: Send + Sync + 'static,
    C: Send + Sync + 'static,
    T: Send + 'static,
    E: Send + 'static,
    F: Fn(Arc<I>, Arc<C>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    async fn run(&self, ingress: Arc<I>, context: Arc<C>) -> Result<T, E> {
        (self)(ingress, context).await
    }
}
