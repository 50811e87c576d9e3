use crate::jobs::{drive, JobSender};
use crate::update::Update;
use crate::work::Work;
use tokio::sync::mpsc;

/// A headless harness that drives an [`Update`] without the runtime.
///
/// `TestLoop` applies transitions synchronously in a plain `#[test]` function,
/// with no tokio runtime involved.  Effects are not executed: they pile up
/// and can be inspected with [`effects`](TestLoop::effects) or taken with
/// [`take_effects`](TestLoop::take_effects), which makes it easy to feed a
/// completion event back by hand in whatever order a test needs.
///
/// # Example
///
/// ```rust,ignore
/// use coursework_core::testing::TestLoop;
///
/// let mut lp = TestLoop::<SyllabusUpdate>::new(course_id);
/// assert_eq!(lp.take_effects(), vec![Effect::LoadData { course_id, force_network: false }]);
///
/// lp.send(Event::DataLoaded(data));
/// assert!(!lp.model().is_loading);
/// ```
pub struct TestLoop<U: Update> {
    model: U::Model,
    effects: Vec<U::Effect>,
    last_changed: bool,
}

impl<U: Update> TestLoop<U> {
    /// Create a harness by calling [`Update::init`] with the given flags.
    pub fn new(flags: U::Flags) -> Self {
        let (model, effects) = U::init(flags).into_parts();
        Self {
            model,
            effects,
            last_changed: true,
        }
    }

    /// Start from an arbitrary model, skipping `init`.
    pub fn with_model(model: U::Model) -> Self {
        Self {
            model,
            effects: Vec::new(),
            last_changed: false,
        }
    }

    /// Apply one event.  Emitted effects are appended to the pending list.
    pub fn send(&mut self, event: U::Event) -> &mut Self {
        let (model, effects) = U::update(&self.model, event).into_parts();
        self.last_changed = model.is_some();
        if let Some(model) = model {
            self.model = model;
        }
        self.effects.extend(effects);
        self
    }

    pub fn model(&self) -> &U::Model {
        &self.model
    }

    /// Effects emitted so far and not yet taken.
    pub fn effects(&self) -> &[U::Effect] {
        &self.effects
    }

    pub fn take_effects(&mut self) -> Vec<U::Effect> {
        std::mem::take(&mut self.effects)
    }

    /// Whether the last [`send`](TestLoop::send) replaced the model.
    pub fn model_changed(&self) -> bool {
        self.last_changed
    }
}

/// Execute `work` to completion and collect every event it emits, in
/// emission order.
///
/// Meant for effect handler tests: `run_work(handler.handle(effect)).await`.
pub async fn run_work<Event: Send + 'static>(work: Work<Event>) -> Vec<Event> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let sender = JobSender::new(tx);
    drive(work, &sender).await;
    drop(sender);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update::{First, Next};
    use std::time::Duration;

    struct Counter;

    #[derive(Debug)]
    enum Msg {
        Increment,
        Save,
        Saved,
        Ignored,
    }

    #[derive(Debug, PartialEq)]
    enum Effect {
        Persist(i64),
    }

    impl Update for Counter {
        type Model = i64;
        type Event = Msg;
        type Effect = Effect;
        type Flags = i64;

        fn init(start: i64) -> First<i64, Effect> {
            First::new(start)
        }

        fn update(model: &i64, msg: Msg) -> Next<i64, Effect> {
            match msg {
                Msg::Increment => Next::next(model + 1),
                Msg::Save => Next::dispatch([Effect::Persist(*model)]),
                Msg::Saved | Msg::Ignored => Next::no_change(),
            }
        }
    }

    #[test]
    fn init_with_flags() {
        let lp = TestLoop::<Counter>::new(42);
        assert_eq!(*lp.model(), 42);
        assert!(lp.effects().is_empty());
    }

    #[test]
    fn send_applies_transitions() {
        let mut lp = TestLoop::<Counter>::new(0);
        lp.send(Msg::Increment).send(Msg::Increment);
        assert_eq!(*lp.model(), 2);
        assert!(lp.model_changed());
    }

    #[test]
    fn effects_accumulate_until_taken() {
        let mut lp = TestLoop::<Counter>::new(3);
        lp.send(Msg::Save);
        assert!(!lp.model_changed());
        assert_eq!(lp.take_effects(), vec![Effect::Persist(3)]);
        assert!(lp.effects().is_empty());
    }

    #[test]
    fn no_change_is_reported() {
        let mut lp = TestLoop::<Counter>::with_model(9);
        lp.send(Msg::Ignored);
        assert_eq!(*lp.model(), 9);
        assert!(!lp.model_changed());
        lp.send(Msg::Saved);
        assert!(!lp.model_changed());
    }

    #[tokio::test(start_paused = true)]
    async fn run_work_collects_every_event() {
        let work = Work::sequence(vec![
            Work::after(Duration::from_millis(5), 1),
            Work::batch(vec![Work::event(2), Work::perform(async { 3 }, |n| n)]),
            Work::spawn(async {}),
        ]);
        let mut events = run_work(work).await;
        events[1..].sort();
        assert_eq!(events, vec![1, 2, 3]);
    }
}
