//! Turns the engine's unified change channel into the individual callbacks.

use std::{
  sync::Arc,
  time::Instant,
};

use scribe_core::{
  delta::Delta,
  selection::SelectionRange,
  value::{
    Value,
    values_equal,
  },
};
use scribe_engine::{
  EditorRead,
  EngineEvent,
  Source,
};

use crate::{
  aggregate::ChangeAggregator,
  content::read_value,
  props::{
    Callbacks,
    ContentChange,
    FocusChange,
    SelectionChange,
  },
  selection::{
    FocusTransition,
    focus_transition,
  },
  view::EditorView,
};

/// What the controller believes the editor currently shows.
#[derive(Debug, Default)]
pub struct Tracked {
  pub value:        Option<Value>,
  pub selection:    Option<SelectionRange>,
  /// Change payload of the last `on_change`, kept to recognise it if the
  /// host feeds it back in.
  pub last_emitted: Option<Arc<Delta>>,
}

pub struct FanOut<'a> {
  pub editor:     &'a dyn EditorRead,
  pub tracked:    &'a mut Tracked,
  pub callbacks:  &'a mut Callbacks,
  pub aggregator: &'a mut ChangeAggregator,
  pub compose:    &'a dyn Fn(&Delta, &Delta) -> Delta,
  pub now:        Instant,
}

impl FanOut<'_> {
  pub fn dispatch(&mut self, event: EngineEvent) {
    match event {
      EngineEvent::TextChange { delta, source, .. } => self.text_change(delta, source),
      EngineEvent::SelectionChange { range, source, .. } => self.selection_change(range, source),
    }
  }

  fn text_change(&mut self, delta: Delta, source: Source) {
    let next = read_value(self.editor, self.tracked.value.as_ref());
    if self
      .tracked
      .value
      .as_ref()
      .is_some_and(|tracked| values_equal(tracked, &next))
    {
      log::trace!("{} change left the value as it was", source.as_str());
      return;
    }

    let delta = Arc::new(delta);
    self.tracked.last_emitted = Some(Arc::clone(&delta));
    let value = self.tracked.value.insert(next);

    if let Some(on_change) = self.callbacks.on_change.as_mut() {
      on_change(&ContentChange {
        value,
        delta: &delta,
        source,
        editor: EditorView::new(self.editor),
      });
    }

    if self.callbacks.on_change_debounced.is_some() {
      let compose = self.compose;
      self
        .aggregator
        .push(&delta, source, self.now, |a, b| compose(a, b));
    }
  }

  fn selection_change(&mut self, range: Option<SelectionRange>, source: Source) {
    if range == self.tracked.selection {
      return;
    }
    let prev = std::mem::replace(&mut self.tracked.selection, range);
    let editor = EditorView::new(self.editor);

    if let Some(on_change_selection) = self.callbacks.on_change_selection.as_mut() {
      on_change_selection(&SelectionChange {
        range,
        source,
        editor,
      });
    }

    match focus_transition(prev, range) {
      Some(FocusTransition::Gained(range)) => {
        if let Some(on_focus) = self.callbacks.on_focus.as_mut() {
          on_focus(&FocusChange {
            range,
            source,
            editor,
          });
        }
      },
      Some(FocusTransition::Lost(range)) => {
        if let Some(on_blur) = self.callbacks.on_blur.as_mut() {
          on_blur(&FocusChange {
            range,
            source,
            editor,
          });
        }
      },
      None => {},
    }
  }
}
