//! Deferral primitives for a single-threaded, host-driven controller.
//!
//! Nothing in here spawns or sleeps. Timers are plain deadlines that the
//! owner polls with the current time, and deferred work sits in a queue until
//! the host runs it at the end of its turn.

pub mod clock;
pub mod debounce;
pub mod queue;

pub use clock::{
  Clock,
  ManualClock,
  SystemClock,
  TokioClock,
};
pub use debounce::{
  DEFAULT_DEBOUNCE,
  Debounce,
};
pub use queue::TaskQueue;
