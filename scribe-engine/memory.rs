//! An engine backed by plain data.
//!
//! `MemoryEngine` honours the [`Engine`] contract without any rendering: the
//! document is a [`Delta`] that always ends in a newline, the selection is a
//! clamped range, and layout is a fixed character grid. It also offers
//! helpers that simulate a person typing, deleting, formatting and moving
//! the cursor, all reported with [`Source::User`].

use scribe_core::{
  attributes::{
    self,
    AttributeMap,
  },
  delta::{
    Delta,
    Op,
    OpKind,
  },
  selection::SelectionRange,
};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use crate::{
  engine::{
    Bounds,
    EditorRead,
    Engine,
    EngineConfig,
    EngineEvent,
    Source,
  },
  host::{
    Generation,
    Surface,
  },
  markup,
};

pub const TOOLBAR_CLASS: &str = "ql-toolbar";

const CHAR_WIDTH: f64 = 8.0;
const LINE_HEIGHT: f64 = 20.0;

#[derive(Debug)]
pub struct MemoryEngine {
  generation: Generation,
  config:     EngineConfig,
  contents:   Delta,
  selection:  Option<SelectionRange>,
  /// Last non-empty selection, restored on focus.
  saved:      SelectionRange,
  enabled:    bool,
  tab_index:  Option<i32>,
  events:     Option<UnboundedSender<EngineEvent>>,
}

impl MemoryEngine {
  pub fn generation(&self) -> Generation {
    self.generation
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  pub fn tab_index(&self) -> Option<i32> {
    self.tab_index
  }

  pub fn is_subscribed(&self) -> bool {
    self.events.is_some()
  }

  /// Type `text` at `index`.
  pub fn insert_text(&mut self, index: usize, text: &str) -> Delta {
    let index = index.min(self.length().saturating_sub(1));
    let mut change = Delta::new();
    change.retain(index, None).insert(text, None);
    self.update_contents(change, Source::User)
  }

  /// Delete `length` characters at `index`.
  pub fn delete_text(&mut self, index: usize, length: usize) -> Delta {
    let range = SelectionRange::new(index, length).clamp(self.length());
    let mut change = Delta::new();
    change.retain(range.index, None).delete(range.length);
    self.update_contents(change, Source::User)
  }

  /// Apply `format: value` to a range. A `null` value removes the format.
  pub fn format_text(&mut self, index: usize, length: usize, format: &str, value: Value) -> Delta {
    let range = SelectionRange::new(index, length).clamp(self.length());
    let mut change = Delta::new();
    change.retain(range.index, None).retain(
      range.length,
      Some(AttributeMap::from([(format.to_string(), value)])),
    );
    self.update_contents(change, Source::User)
  }

  /// Move the cursor as the person editing would.
  pub fn select(&mut self, range: Option<SelectionRange>) {
    self.set_selection(range, Source::User);
  }

  fn emit(&self, event: EngineEvent) {
    let Some(events) = &self.events else {
      return;
    };
    if events.send(event).is_err() {
      log::warn!("engine {} has a closed event channel", self.generation);
    }
  }

  /// Drop formats outside the allow-list.
  fn filter_formats(&self, delta: Delta) -> Delta {
    let Some(allowed) = &self.config.formats else {
      return delta;
    };

    let mut filtered = Delta::new();
    for op in delta.ops {
      let op = match op {
        Op::Insert { insert, attributes } => {
          Op::insert(insert, attributes::retain_allowed(attributes, allowed))
        },
        Op::Retain { retain, attributes } => {
          Op::retain(retain, attributes::retain_allowed(attributes, allowed))
        },
        delete @ Op::Delete { .. } => delete,
      };
      filtered.push(op);
    }
    filtered
  }

  fn apply(&mut self, mut change: Delta, source: Source) -> Delta {
    change.chop();
    if change.is_empty() {
      return change;
    }
    if source == Source::User && !self.enabled {
      log::debug!("engine {} is disabled, ignoring user edit", self.generation);
      return Delta::new();
    }

    let mut next = self.contents.compose(&change);
    if !next.is_document() {
      // Changes reaching past the end leave retains and deletes behind.
      next = Delta::from(
        next
          .ops
          .into_iter()
          .filter(|op| op.kind() == OpKind::Insert)
          .collect::<Vec<_>>(),
      );
    }
    if !next.plain_text().ends_with('\n') {
      let mut fix = Delta::new();
      fix.retain(next.document_len(), None).insert("\n", None);
      next = next.compose(&fix);
      change = change.compose(&fix);
    }
    let old_contents = std::mem::replace(&mut self.contents, next);

    let old_range = self.selection;
    if let Some(range) = old_range {
      let priority = source != Source::User;
      let start = change.transform_position(range.index, priority);
      let end = change.transform_position(range.end(), priority);
      self.selection =
        Some(SelectionRange::new(start, end.saturating_sub(start)).clamp(self.length()));
    }

    if source != Source::Silent {
      self.emit(EngineEvent::TextChange {
        delta: change.clone(),
        old_contents,
        source,
      });
      if self.selection != old_range {
        self.emit(EngineEvent::SelectionChange {
          range: self.selection,
          old_range,
          source,
        });
      }
    }

    change
  }

  fn wants_toolbar(config: &EngineConfig) -> bool {
    if config.has_external_toolbar() {
      return false;
    }
    match config.modules.get("toolbar") {
      Some(Value::Bool(false) | Value::Null) => false,
      Some(_) => true,
      None => config.theme.as_deref() == Some("snow"),
    }
  }
}

impl EditorRead for MemoryEngine {
  fn length(&self) -> usize {
    self.contents.document_len()
  }

  fn text(&self, range: Option<SelectionRange>) -> String {
    let text = self.contents.plain_text();
    match range {
      Some(range) => text.chars().skip(range.index).take(range.length).collect(),
      None => text,
    }
  }

  fn markup(&self) -> String {
    markup::to_markup(&self.contents)
  }

  fn contents(&self) -> Delta {
    self.contents.clone()
  }

  fn selection(&self) -> Option<SelectionRange> {
    self.selection
  }

  fn bounds(&self, range: SelectionRange) -> Bounds {
    let range = range.clamp(self.length());
    let before: Vec<char> = self.contents.plain_text().chars().take(range.index).collect();
    let line = before.iter().filter(|c| **c == '\n').count();
    let column = before.iter().rev().take_while(|c| **c != '\n').count();

    Bounds {
      left:   column as f64 * CHAR_WIDTH,
      top:    line as f64 * LINE_HEIGHT,
      width:  range.length as f64 * CHAR_WIDTH,
      height: LINE_HEIGHT,
    }
  }
}

impl Engine for MemoryEngine {
  const AUXILIARY_CLASS: &'static str = TOOLBAR_CLASS;

  fn construct(surface: &Surface, config: EngineConfig) -> Self {
    if Self::wants_toolbar(&config) {
      surface.host.attach(TOOLBAR_CLASS, surface.owner);
    }

    let mut engine = Self {
      generation: surface.generation(),
      enabled: !config.read_only,
      config,
      contents: Delta::text("\n"),
      selection: None,
      saved: SelectionRange::default(),
      tab_index: None,
      events: None,
    };

    if let Some(initial) = &surface.markup {
      let contents = engine.convert(initial);
      engine.set_contents(contents, Source::Silent);
    }

    log::debug!(
      "constructed engine {} on <{}> ({} chars)",
      engine.generation,
      surface.tag,
      engine.length()
    );
    engine
  }

  fn set_contents(&mut self, contents: Delta, source: Source) -> Delta {
    let mut document = Delta::new();
    for op in self.filter_formats(contents).ops {
      if op.kind() == OpKind::Insert {
        document.push(op);
      }
    }
    if !document.plain_text().ends_with('\n') {
      document.insert("\n", None);
    }

    let mut change = document;
    change.delete(self.length());
    self.apply(change, source)
  }

  fn update_contents(&mut self, change: Delta, source: Source) -> Delta {
    let change = self.filter_formats(change);
    self.apply(change, source)
  }

  fn set_selection(&mut self, range: Option<SelectionRange>, source: Source) {
    let range = range.map(|range| range.clamp(self.length()));
    let old_range = std::mem::replace(&mut self.selection, range);
    if let Some(range) = range {
      self.saved = range;
    }
    if old_range != range && source != Source::Silent {
      self.emit(EngineEvent::SelectionChange {
        range,
        old_range,
        source,
      });
    }
  }

  fn convert(&self, markup: &str) -> Delta {
    self.filter_formats(markup::from_markup(markup))
  }

  fn enable(&mut self, enabled: bool) {
    self.enabled = enabled;
  }

  fn is_enabled(&self) -> bool {
    self.enabled
  }

  fn subscribe(&mut self, events: UnboundedSender<EngineEvent>) {
    self.events = Some(events);
  }

  fn unsubscribe(&mut self) {
    self.events = None;
  }

  fn focus(&mut self) {
    if self.selection.is_none() {
      self.set_selection(Some(self.saved), Source::User);
    }
  }

  fn blur(&mut self) {
    self.set_selection(None, Source::User);
  }

  fn has_focus(&self) -> bool {
    self.selection.is_some()
  }

  fn set_tab_index(&mut self, tab_index: Option<i32>) {
    self.tab_index = tab_index;
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use tokio::sync::mpsc::{
    self,
    UnboundedReceiver,
  };

  use super::*;
  use crate::host::{
    EditorId,
    HostDocument,
    Owner,
  };

  fn engine_with(config: EngineConfig) -> (MemoryEngine, UnboundedReceiver<EngineEvent>, HostDocument) {
    let host = HostDocument::new();
    let mut engine = MemoryEngine::construct(&Surface::new(Owner::default(), host.clone()), config);
    let (tx, rx) = mpsc::unbounded_channel();
    engine.subscribe(tx);
    (engine, rx, host)
  }

  fn drain(rx: &mut UnboundedReceiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
      events.push(event);
    }
    events
  }

  #[test]
  fn starts_with_a_single_newline() {
    let (engine, _, _) = engine_with(EngineConfig::default());
    assert_eq!(engine.length(), 1);
    assert_eq!(engine.markup(), "<p><br></p>");
    assert!(engine.is_enabled());
  }

  #[test]
  fn set_contents_appends_missing_newline_and_reports_change() {
    let (mut engine, mut rx, _) = engine_with(EngineConfig::default());
    engine.set_contents(Delta::text("hello"), Source::Api);

    assert_eq!(engine.text(None), "hello\n");
    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    let EngineEvent::TextChange {
      delta,
      old_contents,
      source,
    } = &events[0]
    else {
      panic!("expected a text change, got {events:?}");
    };
    assert_eq!(*source, Source::Api);
    assert_eq!(old_contents, &Delta::text("\n"));
    assert_eq!(old_contents.compose(delta), engine.contents());
  }

  #[test]
  fn silent_changes_emit_nothing() {
    let (mut engine, mut rx, _) = engine_with(EngineConfig::default());
    engine.set_contents(Delta::text("quiet\n"), Source::Silent);
    engine.set_selection(Some(SelectionRange::point(2)), Source::Silent);
    assert!(drain(&mut rx).is_empty());
    assert_eq!(engine.selection(), Some(SelectionRange::point(2)));
  }

  #[test]
  fn user_edits_shift_the_cursor() {
    let (mut engine, mut rx, _) = engine_with(EngineConfig::default());
    engine.set_contents(Delta::text("ac\n"), Source::Silent);
    engine.select(Some(SelectionRange::point(1)));
    drain(&mut rx);

    engine.insert_text(1, "b");
    assert_eq!(engine.text(None), "abc\n");
    assert_eq!(engine.selection(), Some(SelectionRange::point(2)));

    let events = drain(&mut rx);
    assert!(matches!(events[0], EngineEvent::TextChange {
      source: Source::User,
      ..
    }));
    assert!(matches!(events[1], EngineEvent::SelectionChange {
      range: Some(SelectionRange { index: 2, length: 0 }),
      ..
    }));
  }

  #[test]
  fn api_inserts_at_the_cursor_do_not_move_it() {
    let (mut engine, _, _) = engine_with(EngineConfig::default());
    engine.set_contents(Delta::text("ac\n"), Source::Silent);
    engine.select(Some(SelectionRange::point(1)));

    let mut change = Delta::new();
    change.retain(1, None).insert("b", None);
    engine.update_contents(change, Source::Api);
    assert_eq!(engine.selection(), Some(SelectionRange::point(1)));
  }

  #[test]
  fn disabled_engine_ignores_user_edits_only() {
    let (mut engine, _, _) = engine_with(EngineConfig {
      read_only: true,
      ..Default::default()
    });
    assert!(!engine.is_enabled());

    engine.insert_text(0, "nope");
    assert_eq!(engine.text(None), "\n");

    engine.set_contents(Delta::text("api\n"), Source::Api);
    assert_eq!(engine.text(None), "api\n");
  }

  #[test]
  fn trailing_newline_survives_deletes() {
    let (mut engine, _, _) = engine_with(EngineConfig::default());
    engine.set_contents(Delta::text("abc\n"), Source::Silent);

    let mut change = Delta::new();
    change.delete(10);
    engine.update_contents(change, Source::Api);
    assert_eq!(engine.text(None), "\n");
  }

  #[test]
  fn format_allow_list() {
    let (mut engine, _, _) = engine_with(EngineConfig {
      formats: Some(vec!["bold".to_string()]),
      ..Default::default()
    });

    let converted = engine.convert("<p><strong>a</strong><em>b</em></p>");
    engine.set_contents(converted, Source::Api);
    assert_eq!(engine.markup(), "<p><strong>a</strong>b</p>");

    engine.format_text(0, 2, "underline", json!(true));
    engine.format_text(1, 1, "bold", json!(true));
    assert_eq!(engine.markup(), "<p><strong>ab</strong></p>");

    engine.format_text(0, 2, "bold", Value::Null);
    assert_eq!(engine.markup(), "<p>ab</p>");
  }

  #[test]
  fn focus_restores_the_last_selection() {
    let (mut engine, mut rx, _) = engine_with(EngineConfig::default());
    engine.set_contents(Delta::text("hello\n"), Source::Silent);

    engine.focus();
    assert_eq!(engine.selection(), Some(SelectionRange::point(0)));
    engine.select(Some(SelectionRange::new(1, 3)));
    engine.blur();
    assert!(!engine.has_focus());
    engine.focus();
    assert_eq!(engine.selection(), Some(SelectionRange::new(1, 3)));

    let ranges: Vec<_> = drain(&mut rx)
      .into_iter()
      .filter_map(|event| {
        match event {
          EngineEvent::SelectionChange { range, .. } => Some(range),
          _ => None,
        }
      })
      .collect();
    assert_eq!(ranges, vec![
      Some(SelectionRange::point(0)),
      Some(SelectionRange::new(1, 3)),
      None,
      Some(SelectionRange::new(1, 3)),
    ]);
  }

  #[test]
  fn selection_is_clamped() {
    let (mut engine, _, _) = engine_with(EngineConfig::default());
    engine.set_contents(Delta::text("abc\n"), Source::Silent);
    engine.set_selection(Some(SelectionRange::new(2, 40)), Source::Api);
    assert_eq!(engine.selection(), Some(SelectionRange::new(2, 1)));
    assert_eq!(engine.text(engine.selection()), "c");
  }

  #[test]
  fn toolbar_attachment() {
    let (_, _, host) = engine_with(EngineConfig {
      theme: Some("snow".to_string()),
      ..Default::default()
    });
    assert_eq!(host.count(TOOLBAR_CLASS), 1);

    let (_, _, host) = engine_with(EngineConfig::default());
    assert_eq!(host.count(TOOLBAR_CLASS), 0);

    let mut modules = serde_json::Map::new();
    modules.insert("toolbar".to_string(), json!("#external"));
    let (_, _, host) = engine_with(EngineConfig {
      theme: Some("snow".to_string()),
      modules,
      ..Default::default()
    });
    assert_eq!(host.count(TOOLBAR_CLASS), 0);

    let mut modules = serde_json::Map::new();
    modules.insert("toolbar".to_string(), json!(false));
    let (_, _, host) = engine_with(EngineConfig {
      theme: Some("snow".to_string()),
      modules,
      ..Default::default()
    });
    assert_eq!(host.count(TOOLBAR_CLASS), 0);
  }

  #[test]
  fn initial_markup_from_the_surface() {
    let host = HostDocument::new();
    let mut surface = Surface::new(Owner::new(EditorId::default(), Generation::new(3)), host);
    surface.markup = Some("<p>seed</p>".to_string());
    let engine = MemoryEngine::construct(&surface, EngineConfig::default());
    assert_eq!(engine.text(None), "seed\n");
    assert_eq!(engine.generation(), Generation::new(3));
  }

  #[test]
  fn grid_bounds() {
    let (mut engine, _, _) = engine_with(EngineConfig::default());
    engine.set_contents(Delta::text("ab\ncdef\n"), Source::Silent);
    assert_eq!(engine.bounds(SelectionRange::new(5, 2)), Bounds {
      left:   16.0,
      top:    20.0,
      width:  16.0,
      height: 20.0,
    });
  }
}
