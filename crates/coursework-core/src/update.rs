use std::fmt::Debug;

/// The pure transition table of a feature.
///
/// An `Update` implementation describes every legal way the feature's
/// [`Model`](Update::Model) can change.  The runtime drives it as a loop:
///
/// 1. [`init`](Update::init) builds the first model and the effects that
///    should fire immediately (typically a load).
/// 2. Every incoming [`Event`](Update::Event) is applied with
///    [`update`](Update::update) against the *current* model.
/// 3. The returned effects are handed to an
///    [`EffectHandler`](crate::EffectHandler), whose completions come back as
///    new events.
///
/// Both functions are associated functions rather than methods: a transition
/// has nothing to read except its arguments, so it cannot capture mutable
/// state or reach a collaborator.  Calling `update` twice with the same model
/// and event must yield the same [`Next`].
///
/// # Example
///
/// ```rust,ignore
/// use coursework_core::{First, Next, Update};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Counter { count: i32, saving: bool }
///
/// #[derive(Debug)]
/// enum Event { Increment, Saved }
///
/// #[derive(Debug, PartialEq)]
/// enum Effect { Save(i32) }
///
/// struct CounterUpdate;
///
/// impl Update for CounterUpdate {
///     type Model = Counter;
///     type Event = Event;
///     type Effect = Effect;
///     type Flags = i32;
///
///     fn init(start: i32) -> First<Counter, Effect> {
///         First::new(Counter { count: start, saving: false })
///     }
///
///     fn update(model: &Counter, event: Event) -> Next<Counter, Effect> {
///         match event {
///             Event::Increment => {
///                 let count = model.count + 1;
///                 Next::next_with(Counter { count, saving: true }, [Effect::Save(count)])
///             }
///             Event::Saved => Next::next(Counter { saving: false, ..model.clone() }),
///         }
///     }
/// }
/// ```
pub trait Update: Send + Sync + 'static {
    /// Immutable state snapshot.  Every transition replaces it wholesale.
    type Model: Clone + Send + Sync + 'static;

    /// Closed set of inputs the machine accepts: user actions and async
    /// completions alike.
    type Event: Debug + Send + 'static;

    /// Closed set of side-effect requests.  Effects carry parameters only,
    /// never behavior.
    type Effect: Debug + Send + 'static;

    /// Startup data passed to [`init`](Update::init).  Use `()` when the
    /// feature needs nothing.
    type Flags: Send + 'static;

    /// Build the initial model and the effects to dispatch on start.
    fn init(flags: Self::Flags) -> First<Self::Model, Self::Effect>;

    /// Apply one event to the current model.
    ///
    /// Events that reference data no longer present in `model` must resolve
    /// to [`Next::no_change`] (or an explicit not-found transition), never a
    /// panic.
    fn update(model: &Self::Model, event: Self::Event) -> Next<Self::Model, Self::Effect>;
}

/// Result of [`Update::init`]: the first model and the effects to start with.
#[derive(Debug, Clone, PartialEq)]
pub struct First<M, F> {
    pub model: M,
    pub effects: Vec<F>,
}

impl<M, F> First<M, F> {
    /// Start with `model` and no effects.
    pub fn new(model: M) -> Self {
        Self {
            model,
            effects: Vec::new(),
        }
    }

    /// Start with `model` and dispatch `effects` immediately.
    pub fn with_effects(model: M, effects: impl IntoIterator<Item = F>) -> Self {
        Self {
            model,
            effects: effects.into_iter().collect(),
        }
    }

    pub fn into_parts(self) -> (M, Vec<F>) {
        (self.model, self.effects)
    }
}

/// Result of [`Update::update`].
///
/// `model` is `None` when the transition leaves the current model in place;
/// effects are independent requests with no ordering between their
/// completions.
#[derive(Debug, Clone, PartialEq)]
pub struct Next<M, F> {
    model: Option<M>,
    effects: Vec<F>,
}

impl<M, F> Next<M, F> {
    /// Replace the model, dispatch nothing.
    pub fn next(model: M) -> Self {
        Self {
            model: Some(model),
            effects: Vec::new(),
        }
    }

    /// Replace the model and dispatch `effects`.
    pub fn next_with(model: M, effects: impl IntoIterator<Item = F>) -> Self {
        Self {
            model: Some(model),
            effects: effects.into_iter().collect(),
        }
    }

    /// Keep the model, dispatch `effects`.
    pub fn dispatch(effects: impl IntoIterator<Item = F>) -> Self {
        Self {
            model: None,
            effects: effects.into_iter().collect(),
        }
    }

    /// Keep the model, dispatch nothing.
    pub fn no_change() -> Self {
        Self {
            model: None,
            effects: Vec::new(),
        }
    }

    // --- Inspection methods (useful for testing) ---

    /// Returns `true` if this transition replaces the model.
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Returns `true` if this transition dispatches at least one effect.
    pub fn has_effects(&self) -> bool {
        !self.effects.is_empty()
    }

    /// Returns `true` for [`Next::no_change`].
    pub fn is_no_change(&self) -> bool {
        self.model.is_none() && self.effects.is_empty()
    }

    pub fn model(&self) -> Option<&M> {
        self.model.as_ref()
    }

    pub fn effects(&self) -> &[F] {
        &self.effects
    }

    /// The new model, or a clone of `current` when the model is unchanged.
    pub fn model_or(&self, current: &M) -> M
    where
        M: Clone,
    {
        self.model.clone().unwrap_or_else(|| current.clone())
    }

    pub fn into_parts(self) -> (Option<M>, Vec<F>) {
        (self.model, self.effects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_change_has_nothing() {
        let next: Next<i32, ()> = Next::no_change();
        assert!(next.is_no_change());
        assert!(!next.has_model());
        assert!(!next.has_effects());
    }

    #[test]
    fn dispatch_keeps_model() {
        let next: Next<i32, &str> = Next::dispatch(["load"]);
        assert!(!next.has_model());
        assert_eq!(next.effects(), &["load"]);
        assert!(!next.is_no_change());
    }

    #[test]
    fn next_with_carries_both() {
        let next: Next<i32, &str> = Next::next_with(7, ["a", "b"]);
        assert_eq!(next.model(), Some(&7));
        assert_eq!(next.effects().len(), 2);
    }

    #[test]
    fn model_or_falls_back_to_current() {
        let unchanged: Next<i32, ()> = Next::no_change();
        assert_eq!(unchanged.model_or(&3), 3);

        let changed: Next<i32, ()> = Next::next(9);
        assert_eq!(changed.model_or(&3), 9);
    }

    #[test]
    fn first_into_parts() {
        let first: First<&str, u8> = First::with_effects("model", [1, 2]);
        let (model, effects) = first.into_parts();
        assert_eq!(model, "model");
        assert_eq!(effects, vec![1, 2]);
    }
}
