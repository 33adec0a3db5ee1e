//! The `Sequence` pipeline: ordered composition of asynchronous tasks.
//!
//! A `Sequence<T>` holds an ordered list of tasks, each taking the previous
//! task's output and producing the next. Pipelines are built from plain task
//! lists (`chain`), spliced together (`of`), or wrapped into single-task
//! aggregates (`parallel`, `race`, `retry`). Execution folds a seed value
//! through the tasks, caches the settled result, and routes any task failure
//! through the configured error handler exactly once per run.

use futures::future::{self, BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// The error type carried by failing tasks.
pub type TaskError = Box<dyn std::error::Error + Send + Sync>;

/// A pipeline stage: consumes the previous stage's output, produces the next.
pub type Task<T> = Box<dyn FnMut(T) -> BoxFuture<'static, Result<T, TaskError>> + Send>;

/// A no-input task, consumed by the `parallel`, `race`, and `retry` wrappers.
pub type Source<T> = Box<dyn FnMut() -> BoxFuture<'static, Result<T, TaskError>> + Send>;

/// The pluggable per-sequence failure handler.
pub type ErrorHandler<T> = Box<dyn FnMut(TaskError) -> Result<T, TaskError> + Send>;

/// Errors raised by sequence composition itself, as opposed to task failures.
#[derive(Debug, Error)]
pub enum SequenceError {
    /// `race` was given no sources, so nothing can ever settle.
    #[error("race requires at least one source")]
    NoSources,
}

/// Boxes a plain async closure into a pipeline [`Task`].
pub fn task<T, F, Fut>(mut f: F) -> Task<T>
where
    F: FnMut(T) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
{
    Box::new(move |input| f(input).boxed())
}

/// Boxes a plain no-input async closure into a [`Source`].
pub fn source<T, F, Fut>(mut f: F) -> Source<T>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
{
    Box::new(move || f().boxed())
}

/// One part of a [`Sequence::of`] composition: either a bare task or a whole
/// sequence whose task list gets spliced in.
pub enum Step<T> {
    Task(Task<T>),
    Sequence(Sequence<T>),
}

impl<T> From<Task<T>> for Step<T> {
    fn from(t: Task<T>) -> Self {
        Step::Task(t)
    }
}

impl<T> From<Sequence<T>> for Step<T> {
    fn from(s: Sequence<T>) -> Self {
        Step::Sequence(s)
    }
}

/// An ordered, re-runnable pipeline of asynchronous tasks.
///
/// State is private to each instance: the task list, the error handler, and
/// the last settled result. Re-invoking [`execute`](Self::execute) starts a
/// fresh run from the first task; the cached result is the only cross-run
/// memory.
pub struct Sequence<T> {
    tasks: Vec<Task<T>>,
    error_handler: Option<ErrorHandler<T>>,
    last_result: Option<T>,
}

impl<T: Clone + Send + 'static> Default for Sequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> Sequence<T> {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            error_handler: None,
            last_result: None,
        }
    }

    /// Creates a pipeline from an ordered task list. Each task receives the
    /// output of its predecessor; the first receives the `execute` seed.
    pub fn chain(tasks: Vec<Task<T>>) -> Self {
        Self {
            tasks,
            error_handler: None,
            last_result: None,
        }
    }

    /// Flattens a mix of bare tasks and existing sequences into one pipeline.
    ///
    /// Sequence parts contribute their task lists in place, in order. The
    /// parts' error handlers and cached results are not carried over.
    pub fn of(parts: Vec<Step<T>>) -> Self {
        let mut tasks = Vec::new();
        for part in parts {
            match part {
                Step::Task(t) => tasks.push(t),
                Step::Sequence(seq) => tasks.extend(seq.tasks),
            }
        }
        Self::chain(tasks)
    }

    /// Wraps the given sources into a single-task pipeline that starts all of
    /// them, waits for every one to finish, and yields their results in input
    /// order. The first failure fails the whole aggregate immediately.
    pub fn parallel(mut sources: Vec<Source<T>>) -> Sequence<Vec<T>> {
        let join: Task<Vec<T>> = Box::new(move |_seed| {
            // Start every source before awaiting any of them.
            let futs: Vec<_> = sources.iter_mut().map(|s| s()).collect();
            future::try_join_all(futs).boxed()
        });
        Sequence::chain(vec![join])
    }

    /// Wraps the given sources into a single-task pipeline that settles with
    /// whichever source settles first, success or failure.
    pub fn race(mut sources: Vec<Source<T>>) -> Self {
        let race: Task<T> = Box::new(move |_seed| {
            if sources.is_empty() {
                return future::err(Box::new(SequenceError::NoSources) as TaskError).boxed();
            }
            let futs: Vec<_> = sources.iter_mut().map(|s| s()).collect();
            async move {
                let (settled, _index, _rest) = future::select_all(futs).await;
                settled
            }
            .boxed()
        });
        Self::chain(vec![race])
    }

    /// Wraps a source into a single-task pipeline that retries on failure.
    ///
    /// The source is invoked once, then up to `retries` additional times,
    /// sleeping `delay` between attempts (no backoff growth). Exhausting the
    /// retries propagates the last failure.
    pub fn retry(retries: u32, source: Source<T>, delay: Duration) -> Self {
        let source = Arc::new(Mutex::new(source));
        let attempt_loop: Task<T> = Box::new(move |_seed| {
            let source = source.clone();
            async move {
                let mut attempt = 0u32;
                loop {
                    let fut = {
                        let mut source = source.lock().await;
                        (*source)()
                    };
                    match fut.await {
                        Ok(value) => return Ok(value),
                        Err(err) if attempt < retries => {
                            attempt += 1;
                            debug!(attempt, retries, "task failed, retrying: {err}");
                            if !delay.is_zero() {
                                tokio::time::sleep(delay).await;
                            }
                        }
                        Err(err) => return Err(err),
                    }
                }
            }
            .boxed()
        });
        Self::chain(vec![attempt_loop])
    }

    /// Appends tasks to the pipeline, returning `self` for chaining.
    pub fn add(mut self, tasks: impl IntoIterator<Item = Task<T>>) -> Self {
        self.tasks.extend(tasks);
        self
    }

    /// Appends a plain async closure as the next pipeline stage.
    pub fn then<F, Fut>(mut self, f: F) -> Self
    where
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        self.tasks.push(task(f));
        self
    }

    /// Replaces the error handler, returning `self` for chaining.
    ///
    /// The handler runs at most once per `execute` call, on the first task
    /// failure. Its `Ok` becomes the run's settled outcome; its `Err`
    /// propagates. Without a handler, failures re-raise unchanged.
    pub fn error(
        mut self,
        handler: impl FnMut(TaskError) -> Result<T, TaskError> + Send + 'static,
    ) -> Self {
        self.error_handler = Some(Box::new(handler));
        self
    }

    /// Number of tasks in the pipeline.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True if the pipeline has no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Runs the pipeline: folds `seed` through the tasks in order, awaiting
    /// each, and caches the settled success value.
    ///
    /// On the first failure the remaining tasks are skipped and the error
    /// handler decides the outcome. An empty pipeline settles with the seed.
    pub async fn execute(&mut self, seed: T) -> Result<T, TaskError> {
        let mut current = seed;
        for (index, stage) in self.tasks.iter_mut().enumerate() {
            match stage(current).await {
                Ok(next) => {
                    trace!(stage = index, "pipeline stage settled");
                    current = next;
                }
                Err(err) => {
                    debug!(stage = index, "pipeline stage failed: {err}");
                    let outcome = match self.error_handler.as_mut() {
                        Some(handler) => handler(err),
                        None => Err(err),
                    };
                    if let Ok(recovered) = &outcome {
                        self.last_result = Some(recovered.clone());
                    }
                    return outcome;
                }
            }
        }
        self.last_result = Some(current.clone());
        Ok(current)
    }

    /// The result of the last completed run, if any.
    pub fn result(&self) -> Option<T> {
        self.last_result.clone()
    }

    /// The result of the last completed run, passed through `f`.
    pub fn result_with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.last_result.as_ref().map(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn failing(msg: &str) -> TaskError {
        msg.to_string().into()
    }

    #[tokio::test]
    async fn chain_threads_each_result_into_the_next_task() {
        let mut seq = Sequence::chain(vec![
            task(|x: i32| async move { Ok(x + 1) }),
            task(|x: i32| async move { Ok(x * 2) }),
        ]);
        assert_eq!(seq.execute(3).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn of_splices_sequences_in_order() {
        let inner: Sequence<String> = Sequence::new()
            .then(|s: String| async move { Ok(s + "a") })
            .then(|s: String| async move { Ok(s + "b") });
        assert_eq!(inner.len(), 2);

        let mut seq = Sequence::of(vec![
            Step::Sequence(inner),
            Step::Task(task(|s: String| async move { Ok(s + "c") })),
        ]);
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.execute(String::new()).await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn parallel_preserves_input_order() {
        let mut seq = Sequence::parallel(vec![
            source(|| async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok("a".to_string())
            }),
            source(|| async { Ok("b".to_string()) }),
        ]);
        assert_eq!(seq.execute(Vec::new()).await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn parallel_fails_fast_on_first_error() {
        let mut seq = Sequence::parallel(vec![
            source(|| async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(1)
            }),
            source(|| async { Err::<i32, _>(failing("boom")) }),
        ]);
        let err = seq.execute(Vec::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[tokio::test]
    async fn race_settles_with_the_fastest_source() {
        let mut seq = Sequence::race(vec![
            source(|| async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok("slow")
            }),
            source(|| async { Ok("fast") }),
        ]);
        assert_eq!(seq.execute("").await.unwrap(), "fast");
    }

    #[tokio::test]
    async fn race_over_no_sources_is_an_error() {
        let mut seq: Sequence<i32> = Sequence::race(Vec::new());
        let err = seq.execute(0).await.unwrap_err();
        assert!(err.downcast_ref::<SequenceError>().is_some());
    }

    #[tokio::test]
    async fn retry_invokes_the_source_until_it_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let mut seq = Sequence::retry(
            2,
            source(move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(failing("not yet"))
                    } else {
                        Ok(n)
                    }
                }
            }),
            Duration::ZERO,
        );
        assert_eq!(seq.execute(0).await.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_propagates_the_last_failure_when_exhausted() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let mut seq: Sequence<i32> = Sequence::retry(
            1,
            source(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(failing("still broken")) }
            }),
            Duration::ZERO,
        );
        let err = seq.execute(0).await.unwrap_err();
        assert_eq!(err.to_string(), "still broken");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn error_handler_substitutes_the_outcome() {
        let mut seq = Sequence::new()
            .then(|_: &'static str| async { Err(failing("x")) })
            .error(|_| Ok("recovered"));
        assert_eq!(seq.execute("seed").await.unwrap(), "recovered");
        // Recovery counts as a settled value.
        assert_eq!(seq.result(), Some("recovered"));
    }

    #[tokio::test]
    async fn default_handler_re_raises() {
        let mut seq: Sequence<i32> = Sequence::new().then(|_| async { Err(failing("x")) });
        assert!(seq.execute(1).await.is_err());
        assert_eq!(seq.result(), None);
    }

    #[tokio::test]
    async fn failure_short_circuits_remaining_tasks() {
        let later_ran = Arc::new(AtomicU32::new(0));
        let flag = later_ran.clone();
        let mut seq: Sequence<i32> = Sequence::new()
            .then(|_| async { Err(failing("early")) })
            .then(move |x| {
                flag.fetch_add(1, Ordering::SeqCst);
                async move { Ok(x) }
            });
        assert!(seq.execute(0).await.is_err());
        assert_eq!(later_ran.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn result_is_cached_across_runs() {
        let mut seq = Sequence::new().then(|x: i32| async move { Ok(x * 10) });
        assert_eq!(seq.result(), None);
        seq.execute(1).await.unwrap();
        assert_eq!(seq.result(), Some(10));
        assert_eq!(seq.result_with(|v| v + 1), Some(11));
        // A fresh run replaces the cached value.
        seq.execute(2).await.unwrap();
        assert_eq!(seq.result(), Some(20));
    }

    #[tokio::test]
    async fn add_appends_tasks_in_place() {
        let mut seq = Sequence::chain(vec![task(|x: i32| async move { Ok(x + 1) })])
            .add(vec![task(|x: i32| async move { Ok(x * 3) })]);
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.execute(1).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn empty_pipeline_settles_with_the_seed() {
        let mut seq: Sequence<i32> = Sequence::new();
        assert!(seq.is_empty());
        assert_eq!(seq.execute(7).await.unwrap(), 7);
        assert_eq!(seq.result(), Some(7));
    }
}
