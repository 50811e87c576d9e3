use futures::future::BoxFuture;
use futures::stream::BoxStream;
use std::future::Future;
use std::time::Duration;

/// The work an [`EffectHandler`](crate::EffectHandler) asks the runtime to
/// carry out for a single effect.
///
/// A `Work` value is inert: building one performs no I/O.  The loop controller
/// spawns every future and stream it contains under the feature instance's
/// job registry, so tearing the instance down cancels all of them at once.
/// Whatever events the work produces are funneled back through the loop's
/// serialized queue.
///
/// # Examples
///
/// ```rust,ignore
/// // Nothing to do:
/// let work = Work::none();
///
/// // Call a repository and map the outcome to an event:
/// let work = Work::perform(
///     async move { repo.course(id).await },
///     Event::CourseLoaded,
/// );
///
/// // Delay, then continue:
/// let work = Work::after(Duration::from_millis(300), Event::DebounceElapsed);
/// ```
pub struct Work<Event: Send + 'static> {
    pub(crate) inner: WorkInner<Event>,
}

pub(crate) enum WorkInner<Event: Send + 'static> {
    None,
    Event(Event),
    Future(BoxFuture<'static, Option<Event>>),
    Stream(BoxStream<'static, Event>),
    Batch(Vec<Work<Event>>),
    Sequence(Vec<Work<Event>>),
}

impl<Event: Send + 'static> Work<Event> {
    /// No-op work.
    pub fn none() -> Self {
        Work {
            inner: WorkInner::None,
        }
    }

    /// Emit an event without suspending.
    pub fn event(event: Event) -> Self {
        Work {
            inner: WorkInner::Event(event),
        }
    }

    /// Run an async future and map its output to an event.
    ///
    /// Collaborator failures belong in `T` (usually a `Result`) so that `map`
    /// turns them into failure events; nothing raw escapes the handler.
    pub fn perform<F, T>(future: F, map: impl FnOnce(T) -> Event + Send + 'static) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Work {
            inner: WorkInner::Future(Box::pin(async move { Some(map(future.await)) })),
        }
    }

    /// Run an async future that emits no event (fire-and-forget hand-offs).
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Work {
            inner: WorkInner::Future(Box::pin(async move {
                future.await;
                None
            })),
        }
    }

    /// Forward every item of a stream as an event.
    pub fn stream(stream: BoxStream<'static, Event>) -> Self {
        Work {
            inner: WorkInner::Stream(stream),
        }
    }

    /// One-shot delay: emits `event` once `duration` has elapsed.
    pub fn after(duration: Duration, event: Event) -> Self {
        Work {
            inner: WorkInner::Future(Box::pin(async move {
                tokio::time::sleep(duration).await;
                Some(event)
            })),
        }
    }

    /// Run several pieces of work concurrently.
    pub fn batch(works: impl IntoIterator<Item = Work<Event>>) -> Self {
        let mut works: Vec<_> = works.into_iter().filter(|w| !w.is_none()).collect();
        match works.len() {
            0 => Work::none(),
            1 => works.pop().unwrap_or_default(),
            _ => Work {
                inner: WorkInner::Batch(works),
            },
        }
    }

    /// Run work in order: each piece's events are delivered before the next
    /// piece starts.
    pub fn sequence(works: impl IntoIterator<Item = Work<Event>>) -> Self {
        let mut works: Vec<_> = works.into_iter().filter(|w| !w.is_none()).collect();
        match works.len() {
            0 => Work::none(),
            1 => works.pop().unwrap_or_default(),
            _ => Work {
                inner: WorkInner::Sequence(works),
            },
        }
    }

    /// Transform the event type (for embedding a child feature).
    pub fn map<NewEvent: Send + 'static>(
        self,
        f: impl Fn(Event) -> NewEvent + Send + Sync + 'static,
    ) -> Work<NewEvent> {
        self.map_with(std::sync::Arc::new(f))
    }

    fn map_with<NewEvent: Send + 'static>(
        self,
        f: std::sync::Arc<dyn Fn(Event) -> NewEvent + Send + Sync>,
    ) -> Work<NewEvent> {
        match self.inner {
            WorkInner::None => Work::none(),
            WorkInner::Event(event) => Work::event(f(event)),
            WorkInner::Future(fut) => Work {
                inner: WorkInner::Future(Box::pin(async move { fut.await.map(|e| f(e)) })),
            },
            WorkInner::Stream(stream) => {
                use futures::StreamExt;
                Work {
                    inner: WorkInner::Stream(Box::pin(stream.map(move |e| f(e)))),
                }
            }
            WorkInner::Batch(works) => Work {
                inner: WorkInner::Batch(works.into_iter().map(|w| w.map_with(f.clone())).collect()),
            },
            WorkInner::Sequence(works) => Work {
                inner: WorkInner::Sequence(
                    works.into_iter().map(|w| w.map_with(f.clone())).collect(),
                ),
            },
        }
    }

    // --- Inspection methods (useful for testing) ---

    /// Returns `true` if this is no-op work.
    pub fn is_none(&self) -> bool {
        matches!(self.inner, WorkInner::None)
    }

    /// If this work is an immediate event, return it.
    pub fn into_event(self) -> Option<Event> {
        match self.inner {
            WorkInner::Event(event) => Some(event),
            _ => None,
        }
    }

    /// If this work is a batch, return the inner pieces.
    pub fn into_batch(self) -> Option<Vec<Work<Event>>> {
        match self.inner {
            WorkInner::Batch(works) => Some(works),
            _ => None,
        }
    }
}

impl<Event: Send + 'static> Default for Work<Event> {
    fn default() -> Self {
        Work::none()
    }
}

impl<Event: Send + 'static> std::fmt::Debug for Work<Event> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            WorkInner::None => f.write_str("Work::None"),
            WorkInner::Event(_) => f.write_str("Work::Event"),
            WorkInner::Future(_) => f.write_str("Work::Future"),
            WorkInner::Stream(_) => f.write_str("Work::Stream"),
            WorkInner::Batch(works) => f.debug_tuple("Work::Batch").field(works).finish(),
            WorkInner::Sequence(works) => f.debug_tuple("Work::Sequence").field(works).finish(),
        }
    }
}
