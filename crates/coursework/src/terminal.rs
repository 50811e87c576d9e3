//! Terminal front end for a running loop.
//!
//! [`run_screen`] owns the terminal for as long as the screen is shown: it
//! redraws whenever the loop publishes a new view state or the window is
//! resized, turns key presses into events through a [`Screen`], and stops
//! the loop when the screen asks to quit.

use coursework_core::{LoopError, LoopHandle};
use crossterm::event::{Event as InputEvent, EventStream, KeyEvent, KeyEventKind};
use crossterm::{
    cursor, execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use std::io::{self, stderr, stdout, Stderr, Stdout, Write};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// What a key press means to the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome<Event> {
    /// Handled locally (or not at all); nothing reaches the loop.
    Ignore,
    /// Forward an event to the loop.
    Send(Event),
    /// Leave the screen and stop the loop.
    Quit,
}

/// A view over one loop: draws its view states and interprets keys.
///
/// Purely visual state such as the highlighted row lives in the screen
/// itself; anything that should change the model goes out as an event.
pub trait Screen {
    type Event: Send + 'static;
    type ViewState: Clone + Send + Sync + 'static;

    fn render(&mut self, state: &Self::ViewState, frame: &mut Frame);

    fn on_key(&mut self, state: &Self::ViewState, key: KeyEvent) -> KeyOutcome<Self::Event>;
}

/// Output target for the terminal UI.
///
/// When stdout is piped, render to [`Stderr`](OutputTarget::Stderr) so the
/// screen still reaches the terminal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputTarget {
    #[default]
    Stdout,
    Stderr,
}

enum Output {
    Stdout(Stdout),
    Stderr(Stderr),
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout(w) => w.write(buf),
            Output::Stderr(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout(w) => w.flush(),
            Output::Stderr(w) => w.flush(),
        }
    }
}

impl Output {
    fn new(target: OutputTarget) -> Self {
        match target {
            OutputTarget::Stdout => Output::Stdout(stdout()),
            OutputTarget::Stderr => Output::Stderr(stderr()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TerminalError {
    /// Terminal setup, drawing, input or teardown failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// The loop could not start or ended abnormally.
    #[error(transparent)]
    Loop(#[from] LoopError),
}

/// Configuration for [`run_screen`].
///
/// ```rust,ignore
/// let opts = TerminalOptions {
///     title: Some("Syllabus".into()),
///     output: OutputTarget::Stderr,
///     ..TerminalOptions::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct TerminalOptions {
    /// Maximum redraws per second (default: 30, clamped to 1..=120).
    pub fps: u32,
    /// Draw in the alternate screen (default: true).
    pub alt_screen: bool,
    /// Terminal window title.
    pub title: Option<String>,
    /// Restore the terminal before a panic message is printed (default: true).
    pub catch_panics: bool,
    /// Treat Ctrl+C delivered as a signal like a quit key (default: true).
    pub handle_signals: bool,
    pub output: OutputTarget,
}

impl Default for TerminalOptions {
    fn default() -> Self {
        Self {
            fps: 30,
            alt_screen: true,
            title: None,
            catch_panics: true,
            handle_signals: true,
            output: OutputTarget::default(),
        }
    }
}

/// Show `screen` over a running loop until the user quits or the loop ends.
///
/// The loop is stopped before returning, and the terminal is restored on
/// every exit path, including a panic when
/// [`catch_panics`](TerminalOptions::catch_panics) is set.  A loop that
/// died on an invariant violation is reported as [`TerminalError::Loop`].
pub async fn run_screen<M, S>(
    mut handle: LoopHandle<M, S::Event, S::ViewState>,
    mut screen: S,
    options: TerminalOptions,
) -> Result<(), TerminalError>
where
    M: Send + Sync + 'static,
    S: Screen,
{
    let mut terminal = init_terminal(&options)?;
    let shown = show(&mut terminal, &handle, &mut screen, &options).await;
    let restored = restore_terminal(&options);
    let stopped = handle.stop().await;

    shown?;
    restored?;
    stopped?;
    Ok(())
}

async fn show<M, S>(
    terminal: &mut Terminal<CrosstermBackend<Output>>,
    handle: &LoopHandle<M, S::Event, S::ViewState>,
    screen: &mut S,
    options: &TerminalOptions,
) -> Result<(), TerminalError>
where
    M: Send + Sync + 'static,
    S: Screen,
{
    let sink = handle.events();
    let mut states = handle.view_states();
    let mut input = EventStream::new();
    let mut state = handle.view_state();

    terminal.draw(|frame| screen.render(&state, frame))?;
    let mut needs_redraw = false;

    let fps = options.fps.clamp(1, 120);
    let mut frame_interval = tokio::time::interval(Duration::from_secs_f64(1.0 / fps as f64));
    frame_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            _ = tokio::signal::ctrl_c(), if options.handle_signals => {
                info!("received ctrl+c signal");
                return Ok(());
            }

            next = input.next() => match next {
                Some(Ok(InputEvent::Key(key))) if key.kind == KeyEventKind::Press => {
                    match screen.on_key(&state, key) {
                        KeyOutcome::Ignore => {}
                        KeyOutcome::Send(event) => sink.send(event),
                        KeyOutcome::Quit => return Ok(()),
                    }
                    needs_redraw = true;
                }
                Some(Ok(InputEvent::Resize(..))) => needs_redraw = true,
                Some(Ok(_)) => {}
                Some(Err(error)) => return Err(error.into()),
                None => return Ok(()),
            },

            next = states.next() => match next {
                Some(next) => {
                    state = next;
                    needs_redraw = true;
                }
                None => {
                    debug!("view stream ended");
                    return Ok(());
                }
            },

            _ = frame_interval.tick() => {
                if needs_redraw {
                    terminal.draw(|frame| screen.render(&state, frame))?;
                    needs_redraw = false;
                }
            }
        }
    }
}

fn init_terminal(options: &TerminalOptions) -> io::Result<Terminal<CrosstermBackend<Output>>> {
    // Install the restoring panic hook once; repeated screens must not stack it.
    if options.catch_panics {
        use std::sync::Once;
        static HOOK_INSTALLED: Once = Once::new();
        let alt_screen = options.alt_screen;
        let output = options.output;
        HOOK_INSTALLED.call_once(|| {
            let original_hook = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                let _ = restore(alt_screen, output);
                original_hook(info);
            }));
        });
    }

    enable_raw_mode()?;
    let mut writer = Output::new(options.output);
    if options.alt_screen {
        execute!(writer, EnterAlternateScreen)?;
    }
    if let Some(ref title) = options.title {
        execute!(writer, SetTitle(title))?;
    }
    execute!(writer, cursor::Hide)?;

    Terminal::new(CrosstermBackend::new(writer))
}

fn restore_terminal(options: &TerminalOptions) -> io::Result<()> {
    restore(options.alt_screen, options.output)
}

/// Best-effort cleanup: every step runs even if an earlier one failed, and
/// only the raw-mode error is reported.
fn restore(alt_screen: bool, output: OutputTarget) -> io::Result<()> {
    let raw = disable_raw_mode();
    let mut writer = Output::new(output);
    execute!(writer, cursor::Show).ok();
    if alt_screen {
        execute!(writer, LeaveAlternateScreen).ok();
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let opts = TerminalOptions::default();
        assert_eq!(opts.fps, 30);
        assert!(opts.alt_screen);
        assert!(opts.catch_panics);
        assert!(opts.handle_signals);
        assert_eq!(opts.title, None);
        assert_eq!(opts.output, OutputTarget::Stdout);
    }

    #[test]
    fn loop_errors_pass_through() {
        let error = TerminalError::from(LoopError::Panicked("boom".into()));
        assert_eq!(error.to_string(), LoopError::Panicked("boom".into()).to_string());
        assert!(matches!(error, TerminalError::Loop(_)));
    }

    #[test]
    fn io_errors_are_labelled() {
        let error = TerminalError::from(io::Error::other("no tty"));
        assert_eq!(error.to_string(), "IO error: no tty");
    }
}
