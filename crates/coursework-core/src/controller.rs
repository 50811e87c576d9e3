use crate::handler::EffectHandler;
use crate::jobs::JobRegistry;
use crate::presenter::Presenter;
use crate::update::Update;
use crate::view::{EventSink, ViewStream};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, info_span, trace, warn, Instrument};

/// Lifecycle phase of a loop instance.
///
/// ```text
/// Uninitialized --start--> Running --stop--> Stopping --> Stopped
/// ```
///
/// `Stopped` is terminal: a new feature instance needs a new [`Loop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Built but not started.
    Uninitialized,
    /// Applying events and running effects.
    Running,
    /// Stop requested; in-flight work is being cancelled.
    Stopping,
    /// The runtime task has exited.
    Stopped,
}

/// Errors surfaced by a [`Loop`] or its [`LoopHandle`].
#[derive(Debug, thiserror::Error)]
pub enum LoopError {
    /// [`Loop::start`] was called outside a tokio runtime.
    #[error("loop must be started inside a tokio runtime")]
    NoRuntime,
    /// `update` or `present` panicked while the loop was running.
    #[error("loop panicked: {0}")]
    Panicked(String),
}

/// Configuration options for a [`Loop`].
///
/// Use struct update syntax to override only what you need:
///
/// ```rust,ignore
/// let options = LoopOptions {
///     name: "syllabus".into(),
///     ..LoopOptions::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct LoopOptions {
    /// Label of the tracing span wrapping the loop task (default: `"loop"`).
    pub name: String,
    /// Skip publishing a view state equal to the previous one (default: true).
    pub dedupe_view_states: bool,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            name: "loop".into(),
            dedupe_view_states: true,
        }
    }
}

type EventFilter<Event> = Box<dyn Fn(Event) -> Option<Event> + Send + Sync>;

/// A feature instance that has not been started yet.
///
/// A `Loop` bundles the three parts of a feature: the [`Update`] transition
/// table `U`, the [`EffectHandler`] `H` and the [`Presenter`] `P`.
/// [`start`](Loop::start) consumes it and spawns the runtime task, so an
/// instance can never be restarted.
///
/// # Example
///
/// ```rust,ignore
/// let handle = Loop::<SyllabusUpdate, _, _>::new(handler, presenter)
///     .with_options(LoopOptions { name: "syllabus".into(), ..Default::default() })
///     .start(course_id)?;
///
/// let mut states = handle.view_states();
/// while let Some(state) = states.next().await {
///     render(&state);
/// }
/// ```
pub struct Loop<U, H, P>
where
    U: Update,
    H: EffectHandler<Effect = U::Effect, Event = U::Event>,
    P: Presenter<Model = U::Model>,
{
    handler: H,
    presenter: P,
    options: LoopOptions,
    filter: Option<EventFilter<U::Event>>,
    phase_tx: watch::Sender<Phase>,
}

impl<U, H, P> Loop<U, H, P>
where
    U: Update,
    H: EffectHandler<Effect = U::Effect, Event = U::Event>,
    P: Presenter<Model = U::Model>,
{
    /// An unstarted loop with default [`LoopOptions`].
    pub fn new(handler: H, presenter: P) -> Self {
        let (phase_tx, _) = watch::channel(Phase::Uninitialized);
        Self {
            handler,
            presenter,
            options: LoopOptions::default(),
            filter: None,
            phase_tx,
        }
    }

    /// Replace the default options.
    pub fn with_options(mut self, options: LoopOptions) -> Self {
        self.options = options;
        self
    }

    /// Set an event filter.  Events pass through the filter before reaching
    /// `update`: return `Some(event)` to pass (possibly transformed), `None`
    /// to drop.
    pub fn with_filter(
        mut self,
        filter: impl Fn(U::Event) -> Option<U::Event> + Send + Sync + 'static,
    ) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// [`Phase::Uninitialized`] until [`start`](Self::start) is called.
    pub fn phase(&self) -> Phase {
        *self.phase_tx.borrow()
    }

    /// Apply `init`, dispatch its effects, publish the first view state and
    /// spawn the runtime task.
    pub fn start(
        self,
        flags: U::Flags,
    ) -> Result<LoopHandle<U::Model, U::Event, P::ViewState>, LoopError> {
        tokio::runtime::Handle::try_current().map_err(|_| LoopError::NoRuntime)?;

        let span = info_span!("loop", name = %self.options.name);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);

        let (model, effects) = U::init(flags).into_parts();
        let model = Arc::new(model);
        let view_state = self.presenter.present(&model);
        let (model_tx, model_rx) = watch::channel(model.clone());
        let (view_tx, view_rx) = watch::channel(view_state);
        let phase_rx = self.phase_tx.subscribe();

        let mut runtime = Runtime::<U, H, P> {
            model,
            handler: self.handler,
            presenter: self.presenter,
            filter: self.filter,
            jobs: JobRegistry::new(event_tx.clone()),
            model_tx,
            view_tx,
            dedupe_view_states: self.options.dedupe_view_states,
            phase: PhaseGuard(self.phase_tx),
        };

        span.in_scope(|| {
            info!(effects = effects.len(), "loop started");
            runtime.phase.set(Phase::Running);
            for effect in effects {
                runtime.dispatch(effect);
            }
        });

        let task = tokio::spawn(runtime.run(event_rx, stop_rx).instrument(span));

        Ok(LoopHandle {
            events: EventSink::new(event_tx),
            model_rx,
            view_rx,
            phase_rx,
            stop_tx,
            task: Some(task),
        })
    }
}

/// Control handle of a running loop, held by the view that started it.
///
/// Dropping the handle tears the loop down; call [`stop`](LoopHandle::stop)
/// to do so explicitly and wait for teardown to complete.
pub struct LoopHandle<M, Event, V> {
    events: EventSink<Event>,
    model_rx: watch::Receiver<Arc<M>>,
    view_rx: watch::Receiver<V>,
    phase_rx: watch::Receiver<Phase>,
    stop_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl<M, Event, V> LoopHandle<M, Event, V>
where
    M: Send + Sync + 'static,
    Event: Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// A sink the view writes events into.
    pub fn events(&self) -> EventSink<Event> {
        self.events.clone()
    }

    /// Enqueue a single event.
    pub fn dispatch(&self, event: Event) {
        self.events.send(event);
    }

    /// Stream of view states, starting with the current one.
    pub fn view_states(&self) -> ViewStream<V> {
        ViewStream::new(self.view_rx.clone())
    }

    /// The latest published view state.
    pub fn view_state(&self) -> V {
        self.view_rx.borrow().clone()
    }

    /// The current model snapshot.
    pub fn model(&self) -> Arc<M> {
        self.model_rx.borrow().clone()
    }

    /// Watch every model replacement.  Useful in tests to await a state.
    pub fn model_watch(&self) -> watch::Receiver<Arc<M>> {
        self.model_rx.clone()
    }

    pub fn phase(&self) -> Phase {
        *self.phase_rx.borrow()
    }

    /// Tear the loop down and wait until it has stopped.
    ///
    /// Outstanding jobs are cancelled and queued events are dropped.  Returns
    /// [`LoopError::Panicked`] if the loop died from a panic.  Calling `stop`
    /// again is a no-op.
    pub async fn stop(&mut self) -> Result<(), LoopError> {
        let Some(task) = self.task.take() else {
            return Ok(());
        };
        let _ = self.stop_tx.send(true);
        task.await.or_else(panic_to_error)
    }
}

impl<M, Event, V> Drop for LoopHandle<M, Event, V> {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.stop_tx.send(true);
        }
    }
}

fn panic_to_error(err: JoinError) -> Result<(), LoopError> {
    if !err.is_panic() {
        return Ok(());
    }
    let payload = err.into_panic();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    Err(LoopError::Panicked(message))
}

/// Publishes `Stopped` however the runtime task ends, panics included.
struct PhaseGuard(watch::Sender<Phase>);

impl PhaseGuard {
    fn set(&self, phase: Phase) {
        self.0.send_replace(phase);
    }
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        self.0.send_replace(Phase::Stopped);
    }
}

/// State owned by the runtime task.  The only place a current model lives.
struct Runtime<U, H, P>
where
    U: Update,
    H: EffectHandler<Effect = U::Effect, Event = U::Event>,
    P: Presenter<Model = U::Model>,
{
    model: Arc<U::Model>,
    handler: H,
    presenter: P,
    filter: Option<EventFilter<U::Event>>,
    jobs: JobRegistry<U::Event>,
    model_tx: watch::Sender<Arc<U::Model>>,
    view_tx: watch::Sender<P::ViewState>,
    dedupe_view_states: bool,
    phase: PhaseGuard,
}

impl<U, H, P> Runtime<U, H, P>
where
    U: Update,
    H: EffectHandler<Effect = U::Effect, Event = U::Event>,
    P: Presenter<Model = U::Model>,
{
    async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<U::Event>,
        mut stop: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                biased;

                // Fires on an explicit stop and when the handle is gone.
                _ = stop.changed() => break,

                Some(event) = events.recv() => {
                    self.apply(event);
                }

                Some(result) = self.jobs.join_next(), if !self.jobs.is_empty() => {
                    if result.is_err_and(|err| err.is_panic()) {
                        warn!("effect job panicked; its event is lost");
                    }
                }
            }
        }

        self.teardown(events);
    }

    fn apply(&mut self, event: U::Event) {
        let event = match &self.filter {
            Some(filter) => match filter(event) {
                Some(event) => event,
                None => {
                    trace!("event filtered out");
                    return;
                }
            },
            None => event,
        };

        debug!(?event, "applying event");
        let (model, effects) = U::update(&self.model, event).into_parts();
        let changed = model.is_some();
        trace!(changed, effects = effects.len(), "transition applied");

        if let Some(model) = model {
            self.model = Arc::new(model);
            self.model_tx.send_replace(self.model.clone());
        }
        for effect in effects {
            self.dispatch(effect);
        }
        if changed {
            self.publish();
        }
    }

    fn dispatch(&mut self, effect: U::Effect) {
        trace!(?effect, "dispatching effect");
        let work = self.handler.handle(effect);
        self.jobs.run(work);
    }

    fn publish(&mut self) {
        let view_state = self.presenter.present(&self.model);
        if self.dedupe_view_states {
            self.view_tx.send_if_modified(|current| {
                if *current == view_state {
                    return false;
                }
                *current = view_state;
                true
            });
        } else {
            self.view_tx.send_replace(view_state);
        }
    }

    fn teardown(mut self, mut events: mpsc::UnboundedReceiver<U::Event>) {
        self.phase.set(Phase::Stopping);
        self.jobs.shutdown();

        events.close();
        let mut dropped = 0usize;
        while events.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            warn!(dropped, "dropping events queued at teardown");
        }
        info!("loop stopped");
    }
}
