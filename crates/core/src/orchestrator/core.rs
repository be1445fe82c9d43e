use std::{future::Future, mem, sync::Arc};

use futures::{FutureExt, future};
use tracing::{debug, instrument, warn};

use crate::{
    error::{Fault, Phase},
    merge::{Merge, merge_all},
    orchestrator::{
        Completion, Outcome,
        phase::{ContextHandle, ContextOutcome, ContextPhase, settle_all},
    },
    task::{ContextTask, SharedContextTask, SharedTask, Task},
};

/// Coordinates the context, serial and parallel phases for one ingress value.
///
/// `I` is the ingress, `C` the merged context, `T` the result of serial and
/// parallel tasks, `E` the task error.
pub struct Orchestrator<I, C, T, E>
where
    E: std::error::Error + 'static,
{
    ingress: Arc<I>,
    context_tasks: Vec<SharedContextTask<I, C, E>>,
    serial_tasks: Vec<SharedTask<I, C, T, E>>,
    parallel_tasks: Vec<SharedTask<I, C, T, E>>,
    context: ContextPhase<C, E>,
}

impl<I, C, T, E> Orchestrator<I, C, T, E>
where
    I: Send + Sync + 'static,
    C: Merge + Send + Sync + 'static,
    T: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    pub fn new(ingress: I) -> Self {
        Self::from_shared(Arc::new(ingress))
    }

    pub fn from_shared(ingress: Arc<I>) -> Self {
        Self {
            ingress,
            context_tasks: Vec::new(),
            serial_tasks: Vec::new(),
            parallel_tasks: Vec::new(),
            context: ContextPhase::Unstarted,
        }
    }

    pub fn ingress(&self) -> &Arc<I> {
        &self.ingress
    }

    /// The merged context, once the context phase has settled successfully.
    pub fn settled_context(&self) -> Option<Arc<C>> {
        self.context.settled_context()
    }

    pub fn context<F, Fut>(self, task: F) -> Self
    where
        F: Fn(Arc<I>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<C, E>> + Send + 'static,
    {
        self.context_task(task)
    }

    pub fn context_task(self, task: impl ContextTask<I, C, E> + 'static) -> Self {
        self.context_all([Arc::new(task) as SharedContextTask<I, C, E>])
    }

    /// Appends context tasks. Tasks added after the context phase has
    /// started are kept but never run.
    pub fn context_all(
        mut self,
        tasks: impl IntoIterator<Item = SharedContextTask<I, C, E>>,
    ) -> Self {
        let before = self.context_tasks.len();
        self.context_tasks.extend(tasks);
        let added = self.context_tasks.len() - before;

        if added > 0 && self.context.is_started() {
            warn!(added, "context phase already started, late context tasks will not run");
        }
        self
    }

    pub fn serial<F, Fut>(self, task: F) -> Self
    where
        F: Fn(Arc<I>, Arc<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.serial_task(task)
    }

    pub fn serial_task(self, task: impl Task<I, C, T, E> + 'static) -> Self {
        self.serial_all([Arc::new(task) as SharedTask<I, C, T, E>])
    }

    /// Appends serial tasks; registration order is execution order.
    pub fn serial_all(mut self, tasks: impl IntoIterator<Item = SharedTask<I, C, T, E>>) -> Self {
        self.serial_tasks.extend(tasks);
        self
    }

    pub fn parallel<F, Fut>(self, task: F) -> Self
    where
        F: Fn(Arc<I>, Arc<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.parallel_task(task)
    }

    pub fn parallel_task(self, task: impl Task<I, C, T, E> + 'static) -> Self {
        self.parallel_all([Arc::new(task) as SharedTask<I, C, T, E>])
    }

    pub fn parallel_all(
        mut self,
        tasks: impl IntoIterator<Item = SharedTask<I, C, T, E>>,
    ) -> Self {
        self.parallel_tasks.extend(tasks);
        self
    }

    /// Runs the chain and resolves to `(parallel, serial)` results or the
    /// first fault.
    ///
    /// The context phase runs at most once per orchestrator; a later call
    /// reuses its outcome but runs the serial and parallel phases again.
    #[instrument(
        skip_all,
        fields(
            context = self.context_tasks.len(),
            serial = self.serial_tasks.len(),
            parallel = self.parallel_tasks.len(),
        )
    )]
    pub async fn finish(&mut self) -> Outcome<T, E> {
        let context = self.settle_context().await?;

        // The first phase fault settles the chain; the other phase is dropped.
        let (parallel, serial) =
            future::try_join(self.run_parallel(&context), self.run_serial(&context)).await?;
        let completion = Completion::new(parallel, serial);

        debug!(
            parallel = completion.parallel.len(),
            serial = completion.serial.len(),
            "chain finished"
        );
        Ok(completion)
    }

    /// Callback form of [`finish`](Self::finish): the outcome is handed to
    /// `callback` exactly once and its return value passed through.
    pub async fn finish_with<F, R>(&mut self, callback: F) -> R
    where
        F: FnOnce(Outcome<T, E>) -> R,
    {
        let outcome = self.finish().await;
        callback(outcome)
    }

    async fn settle_context(&mut self) -> ContextOutcome<C, E> {
        let handle = match mem::replace(&mut self.context, ContextPhase::Unstarted) {
            ContextPhase::Settled(outcome) => {
                debug!("reusing settled context");
                self.context = ContextPhase::Settled(outcome.clone());
                return outcome;
            }
            ContextPhase::Running(handle) => {
                debug!("awaiting in-flight context phase");
                handle
            }
            ContextPhase::Unstarted => self.launch_context(),
        };

        self.context = ContextPhase::Running(handle.clone());
        let outcome = handle.await;
        self.context = ContextPhase::Settled(outcome.clone());
        outcome
    }

    fn launch_context(&self) -> ContextHandle<C, E> {
        let tasks = self.context_tasks.clone();
        let ingress = Arc::clone(&self.ingress);
        debug!(tasks = tasks.len(), "starting context phase");

        async move {
            settle_all(
                Phase::Context,
                tasks.iter().map(|task| task.run(Arc::clone(&ingress))),
            )
            .await
            .map(|partials| Arc::new(merge_all(partials)))
        }
        .boxed()
        .shared()
    }

    async fn run_serial(&self, context: &Arc<C>) -> Result<Vec<T>, Fault<E>> {
        let mut results = Vec::with_capacity(self.serial_tasks.len());

        for (index, task) in self.serial_tasks.iter().enumerate() {
            let result = task
                .run(Arc::clone(&self.ingress), Arc::clone(context))
                .await;

            match result {
                Ok(value) => results.push(value),
                Err(error) => {
                    let skipped = self.serial_tasks.len() - index - 1;
                    warn!(index, skipped, %error, "serial task failed, abandoning the rest");
                    return Err(Fault::new(Phase::Serial, index, error));
                }
            }
        }

        Ok(results)
    }

    async fn run_parallel(&self, context: &Arc<C>) -> Result<Vec<T>, Fault<E>> {
        settle_all(
            Phase::Parallel,
            self.parallel_tasks
                .iter()
                .map(|task| task.run(Arc::clone(&self.ingress), Arc::clone(context))),
        )
        .await
    }
}
