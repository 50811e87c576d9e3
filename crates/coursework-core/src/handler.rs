use crate::work::Work;
use std::fmt::Debug;

/// Executes effects against external collaborators.
///
/// `handle` runs on the loop's task, so it must not block: it only describes
/// the work (see [`Work`]) and the runtime spawns it.  All suspension happens
/// inside the returned futures, at the boundary of repository calls, timed
/// delays or navigation hand-offs.
///
/// Collaborators (repositories, routers, the current user) are fields of the
/// implementing type, supplied at construction.
///
/// # Failure handling
///
/// The futures inside [`Work`] resolve to an `Event`, not to a `Result`, so a
/// collaborator failure can only leave the handler as a failure event.
///
/// # Example
///
/// ```rust,ignore
/// struct Handler { repo: Arc<dyn CourseRepository> }
///
/// impl EffectHandler for Handler {
///     type Effect = Effect;
///     type Event = Event;
///
///     fn handle(&self, effect: Effect) -> Work<Event> {
///         match effect {
///             Effect::Load { id } => {
///                 let repo = self.repo.clone();
///                 Work::perform(async move { repo.course(id).await }, Event::Loaded)
///             }
///         }
///     }
/// }
/// ```
pub trait EffectHandler: Send + Sync + 'static {
    type Effect: Debug + Send + 'static;
    type Event: Send + 'static;

    /// Describe the work required to carry out `effect`.
    fn handle(&self, effect: Self::Effect) -> Work<Self::Event>;
}

/// An [`EffectHandler`] backed by a closure.  Handy for tests and tiny
/// features.
pub struct FnHandler<Effect, Event, F> {
    f: F,
    _marker: std::marker::PhantomData<fn(Effect) -> Event>,
}

impl<Effect, Event, F> FnHandler<Effect, Event, F>
where
    F: Fn(Effect) -> Work<Event> + Send + Sync + 'static,
    Effect: Debug + Send + 'static,
    Event: Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<Effect, Event, F> EffectHandler for FnHandler<Effect, Event, F>
where
    F: Fn(Effect) -> Work<Event> + Send + Sync + 'static,
    Effect: Debug + Send + 'static,
    Event: Send + 'static,
{
    type Effect = Effect;
    type Event = Event;

    fn handle(&self, effect: Effect) -> Work<Event> {
        (self.f)(effect)
    }
}
