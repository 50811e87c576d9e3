use crate::work::{Work, WorkInner};
use futures::future::BoxFuture;
use futures::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

/// Delivers job output into the loop's event queue.
///
/// Once the owning registry is shut down every delivery is refused, so a job
/// that resolves during teardown writes nothing.
pub(crate) struct JobSender<Event> {
    tx: mpsc::UnboundedSender<Event>,
    open: Arc<AtomicBool>,
}

impl<Event> Clone for JobSender<Event> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            open: self.open.clone(),
        }
    }
}

impl<Event: Send + 'static> JobSender<Event> {
    pub fn new(tx: mpsc::UnboundedSender<Event>) -> Self {
        Self {
            tx,
            open: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Returns `false` if the event was refused.
    pub fn deliver(&self, event: Event) -> bool {
        if !self.open.load(Ordering::SeqCst) {
            return false;
        }
        self.tx.send(event).is_ok()
    }

    fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }
}

/// Every in-flight job of one loop instance.
///
/// All handler work is spawned here; [`shutdown`](JobRegistry::shutdown)
/// cancels it in one call.  Dropping the registry shuts it down as well.
pub(crate) struct JobRegistry<Event: Send + 'static> {
    jobs: JoinSet<()>,
    sender: JobSender<Event>,
}

impl<Event: Send + 'static> JobRegistry<Event> {
    pub fn new(tx: mpsc::UnboundedSender<Event>) -> Self {
        Self {
            jobs: JoinSet::new(),
            sender: JobSender::new(tx),
        }
    }

    /// Start executing `work`.  Immediate events are queued right away;
    /// futures and streams become jobs.
    pub fn run(&mut self, work: Work<Event>) {
        match work.inner {
            WorkInner::None => {}
            WorkInner::Event(event) => {
                self.sender.deliver(event);
            }
            WorkInner::Future(fut) => {
                let sender = self.sender.clone();
                self.jobs.spawn(async move {
                    if let Some(event) = fut.await {
                        sender.deliver(event);
                    }
                });
            }
            WorkInner::Stream(mut stream) => {
                let sender = self.sender.clone();
                self.jobs.spawn(async move {
                    while let Some(event) = stream.next().await {
                        if !sender.deliver(event) {
                            break;
                        }
                    }
                });
            }
            WorkInner::Batch(works) => {
                for work in works {
                    self.run(work);
                }
            }
            WorkInner::Sequence(works) => {
                let sender = self.sender.clone();
                self.jobs.spawn(async move {
                    for work in works {
                        drive(work, &sender).await;
                    }
                });
            }
        }
    }

    /// Wait for the next job to finish.  Returns `None` when nothing is in
    /// flight.
    pub async fn join_next(&mut self) -> Option<Result<(), JoinError>> {
        self.jobs.join_next().await
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Number of jobs in flight (for testing).
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Refuse further deliveries and abort every job.
    pub fn shutdown(&mut self) {
        self.sender.close();
        self.jobs.abort_all();
    }
}

impl<Event: Send + 'static> Drop for JobRegistry<Event> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Execute `work` inside the current task, delivering events as they appear.
///
/// Used for [`Work::sequence`] and by the test harness.  Batches nested in a
/// sequence run concurrently with each other but stay inside the current
/// task, so aborting the task cancels them too.
pub(crate) fn drive<'a, Event: Send + 'static>(
    work: Work<Event>,
    sender: &'a JobSender<Event>,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        match work.inner {
            WorkInner::None => {}
            WorkInner::Event(event) => {
                sender.deliver(event);
            }
            WorkInner::Future(fut) => {
                if let Some(event) = fut.await {
                    sender.deliver(event);
                }
            }
            WorkInner::Stream(mut stream) => {
                while let Some(event) = stream.next().await {
                    if !sender.deliver(event) {
                        break;
                    }
                }
            }
            WorkInner::Batch(works) => {
                futures::future::join_all(works.into_iter().map(|work| drive(work, sender))).await;
            }
            WorkInner::Sequence(works) => {
                for work in works {
                    drive(work, sender).await;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn immediate_event_is_queued() {
        let (tx, mut rx) = mpsc::unbounded_channel::<i32>();
        let mut registry = JobRegistry::new(tx);

        registry.run(Work::event(7));
        assert!(registry.is_empty());
        assert_eq!(rx.recv().await, Some(7));
    }

    #[tokio::test]
    async fn future_becomes_job() {
        let (tx, mut rx) = mpsc::unbounded_channel::<i32>();
        let mut registry = JobRegistry::new(tx);

        registry.run(Work::perform(async { 1 }, |n| n + 1));
        assert_eq!(registry.len(), 1);
        assert_eq!(rx.recv().await, Some(2));
        assert!(matches!(registry.join_next().await, Some(Ok(()))));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn batch_spawns_each_piece() {
        let (tx, _rx) = mpsc::unbounded_channel::<i32>();
        let mut registry = JobRegistry::new(tx);

        registry.run(Work::batch(vec![
            Work::perform(futures::future::pending::<()>(), |_| 1),
            Work::perform(futures::future::pending::<()>(), |_| 2),
        ]));
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn sequence_preserves_order() {
        let (tx, mut rx) = mpsc::unbounded_channel::<i32>();
        let mut registry = JobRegistry::new(tx);

        registry.run(Work::sequence(vec![
            Work::after(Duration::from_millis(50), 1),
            Work::after(Duration::from_millis(10), 2),
            Work::event(3),
        ]));
        assert_eq!(registry.len(), 1);

        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
        assert_eq!(rx.recv().await, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_and_refuses() {
        let (tx, mut rx) = mpsc::unbounded_channel::<i32>();
        let mut registry = JobRegistry::new(tx);

        registry.run(Work::after(Duration::from_millis(10), 1));
        registry.shutdown();
        registry.run(Work::event(2));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
        while let Some(result) = registry.join_next().await {
            assert!(result.is_err_and(|e| e.is_cancelled()));
        }
    }

    #[tokio::test]
    async fn drive_collects_stream() {
        let (tx, mut rx) = mpsc::unbounded_channel::<i32>();
        let sender = JobSender::new(tx);

        drive(Work::stream(Box::pin(futures::stream::iter(vec![1, 2, 3]))), &sender).await;
        drop(sender);

        let mut seen = Vec::new();
        while let Some(n) = rx.recv().await {
            seen.push(n);
        }
        assert_eq!(seen, vec![1, 2, 3]);
    }
}
