//! Unidirectional state-machine runtime behind every coursework screen.
//!
//! A screen is split into pure and impure halves that only talk through
//! values:
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Update`] | Pure `(Model, Event) -> (Model, Effects)` transition table, plus `init` |
//! | [`EffectHandler`] | Turns an effect into [`Work`]: repository calls, delays, navigation |
//! | [`Presenter`] | Pure `Model -> ViewState` projection |
//! | [`Loop`] / [`LoopHandle`] | Runtime that owns the current model and serializes events |
//! | [`EventSink`] / [`ViewStream`] | The boundary a view reads from and writes into |
//! | [`TestLoop`](testing::TestLoop) | Headless harness for transition tests |
//!
//! # Flow
//!
//! 1. **start** -- [`Loop::start`] calls [`Update::init`], dispatches the
//!    initial effects and publishes the first view state.
//! 2. **event** -- the view (or a finished effect) enqueues an event.
//! 3. **update** -- the loop applies events one at a time, in arrival order,
//!    against the current model.
//! 4. **effects** -- new effects go to the handler; their work runs
//!    concurrently and re-enters as events.
//! 5. **present** -- every new model is projected and published.
//! 6. **stop** -- [`LoopHandle::stop`] cancels every outstanding job and drops
//!    queued events; nothing is applied afterwards.

pub mod controller;
pub mod handler;
mod jobs;
pub mod presenter;
pub mod testing;
pub mod update;
pub mod view;
pub mod work;

pub use controller::{Loop, LoopError, LoopHandle, LoopOptions, Phase};
pub use handler::{EffectHandler, FnHandler};
pub use presenter::{FnPresenter, Presenter};
pub use update::{First, Next, Update};
pub use view::{EventSink, ViewStream};
pub use work::Work;
