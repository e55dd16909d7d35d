use std::{
  cell::Cell,
  fmt,
  rc::Rc,
  time::{
    Duration,
    Instant,
  },
};

/// Source of "now" for timers.
pub trait Clock {
  fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> Instant {
    Instant::now()
  }
}

/// tokio's clock. Follows paused and auto-advanced time in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

impl Clock for TokioClock {
  fn now(&self) -> Instant {
    tokio::time::Instant::now().into_std()
  }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Clone)]
pub struct ManualClock {
  now: Rc<Cell<Instant>>,
}

impl ManualClock {
  pub fn new() -> Self {
    Self::starting_at(Instant::now())
  }

  pub fn starting_at(now: Instant) -> Self {
    Self {
      now: Rc::new(Cell::new(now)),
    }
  }

  pub fn advance(&self, by: Duration) {
    self.now.set(self.now.get() + by);
  }

  pub fn set(&self, now: Instant) {
    self.now.set(now);
  }
}

impl Default for ManualClock {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for ManualClock {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ManualClock")
      .field("now", &self.now.get())
      .finish()
  }
}

impl Clock for ManualClock {
  fn now(&self) -> Instant {
    self.now.get()
  }
}
