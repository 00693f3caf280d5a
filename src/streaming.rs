//! Streaming Reveal Engine.
//!
//! Paces the display of an already-complete text: a ticker task grows the
//! visible prefix by `chars_per_tick` characters every `tick`. Phases:
//!
//! ```text
//! Idle -> Streaming -> Done
//!   \         \
//!    \         `-> Cancelled      (cancel / drop)
//!     `-> Done                    (skip)
//! ```
//!
//! Every ticker carries the generation it was started for and only mutates
//! state while holding the lock *and* while that generation is current.
//! `cancel`, `skip` and `set_text` bump the generation under the same lock,
//! so a stale tick can never grow a prefix or fire a completion.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub type CompletionCallback = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPhase {
    Idle,
    Streaming,
    Done,
    Cancelled,
}

impl RevealPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, RevealPhase::Done | RevealPhase::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealSnapshot {
    pub prefix: String,
    pub phase: RevealPhase,
}

impl RevealSnapshot {
    pub fn is_active(&self) -> bool {
        self.phase == RevealPhase::Streaming
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealOptions {
    pub tick: Duration,
    pub chars_per_tick: usize,
}

impl Default for RevealOptions {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(30),
            chars_per_tick: 1,
        }
    }
}

impl RevealOptions {
    pub fn with_tick(tick: Duration) -> Self {
        Self {
            tick,
            ..Self::default()
        }
    }
}

struct RevealState {
    generation: u64,
    chars: Vec<char>,
    cursor: usize,
    phase: RevealPhase,
    on_complete: Option<CompletionCallback>,
    ticker: Option<JoinHandle<()>>,
}

impl RevealState {
    fn snapshot(&self) -> RevealSnapshot {
        RevealSnapshot {
            prefix: self.chars[..self.cursor].iter().collect(),
            phase: self.phase,
        }
    }

    /// Invalidates the running ticker, if any.
    fn retire_ticker(&mut self) {
        self.generation += 1;
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

struct Shared {
    state: Mutex<RevealState>,
    snapshots: watch::Sender<RevealSnapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, RevealState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &RevealState) {
        self.snapshots.send_replace(state.snapshot());
    }
}

/// A cancellable, timed reveal of one text at a time.
///
/// Must be driven from within a tokio runtime. Dropping the handle cancels
/// any pending ticks.
pub struct StreamingReveal {
    shared: Arc<Shared>,
    options: RevealOptions,
}

impl StreamingReveal {
    pub fn new(options: RevealOptions) -> Self {
        let state = RevealState {
            generation: 0,
            chars: Vec::new(),
            cursor: 0,
            phase: RevealPhase::Idle,
            on_complete: None,
            ticker: None,
        };
        let (snapshots, _) = watch::channel(state.snapshot());
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                snapshots,
            }),
            options: RevealOptions {
                chars_per_tick: options.chars_per_tick.max(1),
                ..options
            },
        }
    }

    /// `reveal(fullText, charsPerTick)`: starts revealing `text` right away.
    pub fn start(
        text: &str,
        options: RevealOptions,
        on_complete: impl FnOnce() + Send + 'static,
    ) -> Self {
        let reveal = Self::new(options);
        reveal.set_text(text, on_complete);
        reveal
    }

    /// Replaces the text and restarts from an empty prefix. The previous
    /// text's completion callback is discarded without firing.
    pub fn set_text(&self, text: &str, on_complete: impl FnOnce() + Send + 'static) {
        let completed = {
            let mut state = self.shared.lock();
            state.retire_ticker();
            state.chars = text.chars().collect();
            state.cursor = 0;
            state.on_complete = Some(Box::new(on_complete));

            if state.chars.is_empty() {
                state.phase = RevealPhase::Done;
                self.shared.publish(&state);
                state.on_complete.take()
            } else {
                state.phase = RevealPhase::Streaming;
                self.shared.publish(&state);
                let generation = state.generation;
                state.ticker = Some(tokio::spawn(run_ticker(
                    self.shared.clone(),
                    generation,
                    self.options,
                )));
                None
            }
        };

        tracing::debug!("Reveal started ({} chars)", text.chars().count());
        if let Some(callback) = completed {
            callback();
        }
    }

    /// Jumps straight to the full text. Fires the completion callback if it
    /// has not fired yet.
    pub fn skip(&self) {
        let completed = {
            let mut state = self.shared.lock();
            if state.phase.is_terminal() {
                return;
            }
            state.retire_ticker();
            state.cursor = state.chars.len();
            state.phase = RevealPhase::Done;
            self.shared.publish(&state);
            state.on_complete.take()
        };
        if let Some(callback) = completed {
            callback();
        }
    }

    /// Stops the reveal, freezing the prefix. The completion callback is
    /// dropped without firing.
    pub fn cancel(&self) {
        let mut state = self.shared.lock();
        if state.phase.is_terminal() {
            return;
        }
        state.retire_ticker();
        state.phase = RevealPhase::Cancelled;
        state.on_complete = None;
        self.shared.publish(&state);
        tracing::debug!("Reveal cancelled at {}/{}", state.cursor, state.chars.len());
    }

    pub fn snapshot(&self) -> RevealSnapshot {
        self.shared.snapshots.borrow().clone()
    }

    pub fn current_prefix(&self) -> String {
        self.snapshot().prefix
    }

    pub fn is_active(&self) -> bool {
        self.phase() == RevealPhase::Streaming
    }

    pub fn phase(&self) -> RevealPhase {
        self.shared.snapshots.borrow().phase
    }

    pub fn subscribe(&self) -> watch::Receiver<RevealSnapshot> {
        self.shared.snapshots.subscribe()
    }

    /// Waits until the reveal reaches `Done` or `Cancelled`.
    pub async fn finished(&self) -> RevealPhase {
        let mut rx = self.subscribe();
        let phase = match rx.wait_for(|s| s.phase.is_terminal()).await {
            Ok(snapshot) => snapshot.phase,
            // The sender lives in `self`, so this only happens during teardown.
            Err(_) => RevealPhase::Cancelled,
        };
        phase
    }
}

impl Drop for StreamingReveal {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_ticker(shared: Arc<Shared>, generation: u64, options: RevealOptions) {
    let mut interval = tokio::time::interval(options.tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let completed = {
            let mut state = shared.lock();
            if state.generation != generation || state.phase != RevealPhase::Streaming {
                return;
            }
            state.cursor = (state.cursor + options.chars_per_tick).min(state.chars.len());
            if state.cursor == state.chars.len() {
                state.phase = RevealPhase::Done;
                state.ticker = None;
                shared.publish(&state);
                Some(state.on_complete.take())
            } else {
                shared.publish(&state);
                None
            }
        };

        if let Some(callback) = completed {
            tracing::debug!("Reveal finished");
            if let Some(callback) = callback {
                callback();
            }
            return;
        }
    }
}
