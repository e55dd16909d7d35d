//! Batches incremental changes into one debounced summary.
//!
//! The baseline is the document as of the last flush, or as it was when the
//! editor was mounted. Changes are composed onto a running total and push the
//! deadline out; once the deadline passes without new changes the whole
//! window is flushed at once and the owner moves the baseline forward.

use std::time::{
  Duration,
  Instant,
};

use scribe_core::delta::Delta;
use scribe_engine::Source;
use scribe_event::Debounce;

#[derive(Debug, Clone, PartialEq)]
pub struct Flush {
  pub baseline:   Delta,
  pub cumulative: Delta,
  /// Source of the last change in the window.
  pub source:     Source,
}

#[derive(Debug)]
struct Pending {
  cumulative: Delta,
  source:     Source,
  changes:    usize,
}

#[derive(Debug)]
pub struct ChangeAggregator {
  baseline: Delta,
  pending:  Option<Pending>,
  timer:    Debounce,
}

impl ChangeAggregator {
  pub fn new(window: Duration) -> Self {
    Self {
      baseline: Delta::new(),
      pending:  None,
      timer:    Debounce::new(window),
    }
  }

  pub fn window(&self) -> Duration {
    self.timer.window()
  }

  pub fn set_window(&mut self, window: Duration) {
    self.timer.set_window(window);
  }

  pub fn deadline(&self) -> Option<Instant> {
    self.timer.deadline()
  }

  pub fn is_pending(&self) -> bool {
    self.pending.is_some()
  }

  pub fn baseline(&self) -> &Delta {
    &self.baseline
  }

  /// Anchor the next window at `document`. Called after every flush with
  /// the document the flush reported on.
  pub fn rebase(&mut self, document: Delta) {
    self.baseline = document;
  }

  /// Start over from `document`: drop any pending window and disarm.
  pub fn reseed(&mut self, document: Delta) {
    self.cancel();
    self.baseline = document;
  }

  /// Add `delta` to the current window and restart the timer. Returns the
  /// new deadline.
  pub fn push(
    &mut self,
    delta: &Delta,
    source: Source,
    now: Instant,
    compose: impl FnOnce(&Delta, &Delta) -> Delta,
  ) -> Instant {
    match &mut self.pending {
      Some(pending) => {
        pending.cumulative = compose(&pending.cumulative, delta);
        pending.source = source;
        pending.changes += 1;
      },
      None => {
        self.pending = Some(Pending {
          cumulative: delta.clone(),
          source,
          changes: 1,
        });
      },
    }
    self.timer.reset(now)
  }

  /// Flush the window if its deadline has passed. The baseline is left for
  /// the owner to [`rebase`](Self::rebase).
  pub fn poll(&mut self, now: Instant) -> Option<Flush> {
    if !self.timer.poll(now) {
      return None;
    }
    let pending = self.pending.take()?;
    log::debug!("flushing {} changes", pending.changes);
    Some(Flush {
      baseline:   self.baseline.clone(),
      cumulative: pending.cumulative,
      source:     pending.source,
    })
  }

  /// Stop the timer and drop the pending window without flushing it.
  pub fn cancel(&mut self) -> bool {
    let armed = self.timer.cancel();
    if let Some(pending) = self.pending.take() {
      log::debug!("discarding {} unflushed changes", pending.changes);
    }
    armed
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const WINDOW: Duration = Duration::from_millis(100);

  fn typed(at: usize, text: &str) -> Delta {
    let mut delta = Delta::new();
    delta.retain(at, None).insert(text, None);
    delta
  }

  #[test]
  fn one_window_one_flush() {
    let t0 = Instant::now();
    let doc = Delta::text("\n");
    let (d1, d2, d3) = (typed(0, "a"), typed(1, "b"), typed(2, "c"));
    let mut aggregator = ChangeAggregator::new(WINDOW);
    aggregator.reseed(doc.clone());

    aggregator.push(&d1, Source::User, t0, Delta::compose);
    aggregator.push(&d2, Source::User, t0 + Duration::from_millis(50), Delta::compose);
    aggregator.push(&d3, Source::Api, t0 + Duration::from_millis(90), Delta::compose);

    assert_eq!(aggregator.poll(t0 + Duration::from_millis(150)), None);
    let flush = aggregator.poll(t0 + Duration::from_millis(190)).unwrap();
    assert_eq!(flush.cumulative, d1.compose(&d2).compose(&d3));
    assert_eq!(flush.baseline, doc);
    assert_eq!(flush.source, Source::Api);
    assert_eq!(doc.compose(&flush.cumulative).plain_text(), "abc\n");

    assert!(!aggregator.is_pending());
    assert_eq!(aggregator.poll(t0 + Duration::from_secs(5)), None);
  }

  #[test]
  fn baseline_moves_only_when_rebased() {
    let t0 = Instant::now();
    let mut aggregator = ChangeAggregator::new(WINDOW);
    aggregator.reseed(Delta::text("\n"));

    aggregator.push(&typed(0, "a"), Source::User, t0, Delta::compose);
    let first = aggregator.poll(t0 + WINDOW).unwrap();
    assert_eq!(first.baseline, Delta::text("\n"));
    assert_eq!(aggregator.baseline(), &Delta::text("\n"));

    let flushed = first.baseline.compose(&first.cumulative);
    aggregator.rebase(flushed.clone());

    let later = t0 + Duration::from_secs(1);
    aggregator.push(&typed(1, "b"), Source::User, later, Delta::compose);
    let second = aggregator.poll(later + WINDOW).unwrap();
    assert_eq!(second.baseline, flushed);
    assert_eq!(second.baseline.plain_text(), "a\n");
  }

  #[test]
  fn cancel_drops_the_window() {
    let t0 = Instant::now();
    let mut aggregator = ChangeAggregator::new(WINDOW);
    aggregator.push(&typed(0, "a"), Source::User, t0, Delta::compose);

    assert!(aggregator.cancel());
    assert!(aggregator.deadline().is_none());
    assert_eq!(aggregator.poll(t0 + WINDOW), None);
  }

  #[test]
  fn reseed_discards_and_reanchors() {
    let t0 = Instant::now();
    let mut aggregator = ChangeAggregator::new(WINDOW);
    aggregator.push(&typed(0, "a"), Source::User, t0, Delta::compose);

    aggregator.reseed(Delta::text("fresh\n"));
    assert!(!aggregator.is_pending());
    assert_eq!(aggregator.deadline(), None);
    assert_eq!(aggregator.baseline(), &Delta::text("fresh\n"));
  }
}
