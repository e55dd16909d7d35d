use scribe_core::selection::SelectionRange;
use scribe_engine::{
  Engine,
  Generation,
  Source,
};

/// Work queued until the current synchronous turn is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deferred {
  /// Put the selection back after a content write. Dropped if the editor
  /// was regenerated in the meantime.
  RestoreSelection {
    generation: Generation,
    range:      Option<SelectionRange>,
  },
}

/// Clamp `range` to the current document and apply it. `None` leaves the
/// selection alone.
pub fn restore_selection<E: Engine>(engine: &mut E, range: Option<SelectionRange>) {
  let Some(range) = range else {
    return;
  };
  let range = range.clamp(engine.length());
  engine.set_selection(Some(range), Source::Api);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTransition {
  /// The editor gained focus with this range.
  Gained(SelectionRange),
  /// The editor lost focus; this was the range before.
  Lost(SelectionRange),
}

/// Focus changes implied by a selection change.
pub fn focus_transition(
  prev: Option<SelectionRange>,
  next: Option<SelectionRange>,
) -> Option<FocusTransition> {
  match (prev, next) {
    (None, Some(range)) => Some(FocusTransition::Gained(range)),
    (Some(range), None) => Some(FocusTransition::Lost(range)),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use scribe_core::delta::Delta;
  use scribe_engine::{
    EditorRead,
    EngineConfig,
    HostDocument,
    MemoryEngine,
    Owner,
    Surface,
  };

  use super::*;

  #[test]
  fn transitions() {
    let origin = SelectionRange::point(0);
    assert_eq!(
      focus_transition(None, Some(origin)),
      Some(FocusTransition::Gained(origin))
    );
    assert_eq!(
      focus_transition(Some(origin), None),
      Some(FocusTransition::Lost(origin))
    );
    assert_eq!(
      focus_transition(Some(origin), Some(SelectionRange::point(1))),
      None
    );
    assert_eq!(focus_transition(None, None), None);
  }

  #[test]
  fn restore_clamps_and_skips_none() {
    let mut engine = MemoryEngine::construct(
      &Surface::new(Owner::default(), HostDocument::new()),
      EngineConfig::default(),
    );
    engine.set_contents(Delta::text("abc\n"), Source::Silent);

    restore_selection(&mut engine, None);
    assert_eq!(engine.selection(), None);

    restore_selection(&mut engine, Some(SelectionRange::new(9, 9)));
    assert_eq!(engine.selection(), Some(SelectionRange::point(3)));
  }
}
