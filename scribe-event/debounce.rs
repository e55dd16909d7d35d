//! A single cancel-and-restart timer.
//!
//! Every [`Debounce::reset`] pushes the deadline out to `now + window`; only
//! the trailing edge fires. There is never more than one deadline armed.

use std::time::{
  Duration,
  Instant,
};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct Debounce {
  window:   Duration,
  deadline: Option<Instant>,
}

impl Default for Debounce {
  fn default() -> Self {
    Self::new(DEFAULT_DEBOUNCE)
  }
}

impl Debounce {
  pub fn new(window: Duration) -> Self {
    Self {
      window,
      deadline: None,
    }
  }

  pub fn window(&self) -> Duration {
    self.window
  }

  /// Change the window. An already armed deadline keeps its time; the new
  /// window applies from the next reset.
  pub fn set_window(&mut self, window: Duration) {
    self.window = window;
  }

  pub fn deadline(&self) -> Option<Instant> {
    self.deadline
  }

  #[inline]
  pub fn is_armed(&self) -> bool {
    self.deadline.is_some()
  }

  /// Clear any armed deadline and arm a new one a full window from `now`.
  pub fn reset(&mut self, now: Instant) -> Instant {
    let deadline = now + self.window;
    if let Some(previous) = self.deadline.replace(deadline) {
      log::trace!("debounce restarted, dropping deadline {previous:?}");
    }
    deadline
  }

  /// Disarm. Returns whether a deadline was pending.
  pub fn cancel(&mut self) -> bool {
    self.deadline.take().is_some()
  }

  /// Fire if the deadline has passed. Returns `true` once per armed window.
  pub fn poll(&mut self, now: Instant) -> bool {
    match self.deadline {
      Some(deadline) if deadline <= now => {
        self.deadline = None;
        true
      },
      _ => false,
    }
  }
}
