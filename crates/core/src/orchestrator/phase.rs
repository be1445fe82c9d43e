use std::{future::Future, sync::Arc};

use futures::{
    StreamExt,
    future::{BoxFuture, Shared},
    stream::FuturesUnordered,
};
use tracing::{debug, warn};

use crate::error::{Fault, Phase};

pub(crate) type ContextOutcome<C, E> = Result<Arc<C>, Fault<E>>;
pub(crate) type ContextHandle<C, E> = Shared<BoxFuture<'static, ContextOutcome<C, E>>>;

/// Lifecycle of the context phase. It moves forward only; once `Settled` the
/// outcome is reused by every later `finish`.
pub(crate) enum ContextPhase<C, E>
where
    E: std::error::Error + 'static,
{
    Unstarted,
    Running(ContextHandle<C, E>),
    Settled(ContextOutcome<C, E>),
}

impl<C, E> ContextPhase<C, E>
where
    E: std::error::Error + 'static,
{
    pub(crate) fn is_started(&self) -> bool {
        !matches!(self, ContextPhase::Unstarted)
    }

    pub(crate) fn settled_context(&self) -> Option<Arc<C>> {
        match self {
            ContextPhase::Settled(Ok(context)) => Some(Arc::clone(context)),
            _ => None,
        }
    }
}

/// Polls every future concurrently and returns their values in input order.
///
/// The first error to occur becomes the phase fault and is returned at once;
/// futures still pending are dropped without being reported.
pub(crate) async fn settle_all<T, E, F>(
    phase: Phase,
    futures: impl IntoIterator<Item = F>,
) -> Result<Vec<T>, Fault<E>>
where
    E: std::error::Error + 'static,
    F: Future<Output = Result<T, E>>,
{
    let mut pending: FuturesUnordered<_> = futures
        .into_iter()
        .enumerate()
        .map(|(index, future)| async move { (index, future.await) })
        .collect();

    let mut slots: Vec<Option<T>> = (0..pending.len()).map(|_| None).collect();

    while let Some((index, result)) = pending.next().await {
        match result {
            Ok(value) => slots[index] = Some(value),
            Err(error) => {
                warn!(%phase, index, %error, unsettled = pending.len(), "task failed");
                return Err(Fault::new(phase, index, error));
            }
        }
    }

    debug!(%phase, tasks = slots.len(), "phase settled");
    Ok(slots.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use thiserror::Error;
    use tokio::time::sleep;

    use super::*;

    #[derive(Debug, Error, PartialEq)]
    #[error("failed: {0}")]
    struct Failed(&'static str);

    async fn after(ms: u64, result: Result<u32, Failed>) -> Result<u32, Failed> {
        sleep(Duration::from_millis(ms)).await;
        result
    }

    #[tokio::test]
    async fn keeps_input_order_regardless_of_completion() {
        let values = settle_all(
            Phase::Parallel,
            vec![after(30, Ok(1)), after(0, Ok(2)), after(10, Ok(3))],
        )
        .await
        .expect("all succeed");

        assert_eq!(values, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn reports_first_fault_to_occur() {
        let fault = settle_all(
            Phase::Parallel,
            vec![
                after(30, Err(Failed("slow"))),
                after(5, Err(Failed("fast"))),
                after(0, Ok(3)),
            ],
        )
        .await
        .expect_err("two tasks fail");

        assert_eq!(fault.index(), 1);
        assert_eq!(fault.error(), &Failed("fast"));
    }

    #[tokio::test]
    async fn fault_does_not_wait_for_unsettled_siblings() {
        let stuck = async { futures::future::pending::<Result<u32, Failed>>().await };
        let futures: Vec<futures::future::BoxFuture<'static, Result<u32, Failed>>> = vec![
            Box::pin(stuck),
            Box::pin(after(0, Err(Failed("fast")))),
        ];

        let settled = settle_all(Phase::Parallel, futures);
        let fault = tokio::time::timeout(Duration::from_millis(500), settled)
            .await
            .expect("fault should surface without the stuck sibling")
            .expect_err("second task fails");

        assert_eq!(fault.index(), 1);
        assert_eq!(fault.error(), &Failed("fast"));
    }

    #[tokio::test]
    async fn empty_input_settles_to_empty_output() {
        let values = settle_all(Phase::Context, Vec::<std::future::Ready<Result<u32, Failed>>>::new())
            .await
            .expect("nothing to fail");
        assert!(values.is_empty());
    }
}
