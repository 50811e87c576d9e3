//! **coursework** -- unidirectional screens for a learning management client.
//!
//! This is the umbrella crate.  It re-exports the runtime and the syllabus
//! feature and adds the pieces needed to put a screen in front of a user:
//!
//! * All public items from [`coursework_core`] are available at the crate
//!   root ([`Update`], [`EffectHandler`], [`Presenter`], [`Loop`], ...).
//! * The [`syllabus`] module re-exports [`coursework_syllabus`].
//! * [`terminal`] drives any [`Screen`](terminal::Screen) against a running
//!   loop on a real terminal; [`screens`] holds the concrete screens.
//! * [`logging`] routes `tracing` output to a file so the UI stays intact.
//! * [`ratatui`], [`crossterm`] and [`tokio`] are re-exported so downstream
//!   crates do not need to depend on them directly.
//!
//! # Quick start
//!
//! ```ignore
//! use coursework::screens::SyllabusScreen;
//! use coursework::syllabus::{syllabus_loop, CourseId, SyllabusPresenter};
//! use coursework::terminal::{run_screen, TerminalOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), coursework::terminal::TerminalError> {
//!     let handle = syllabus_loop(repository, router, SyllabusPresenter::new(chrono::Utc::now()))
//!         .start(CourseId(42))?;
//!     run_screen(handle, SyllabusScreen::new(), TerminalOptions::default()).await
//! }
//! ```

pub use coursework_core::*;
pub mod syllabus {
    pub use coursework_syllabus::*;
}

pub mod logging;
pub mod screens;
pub mod terminal;

pub use crossterm;
pub use ratatui;
pub use tokio;
