use scribe_core::{
  delta::Delta,
  selection::SelectionRange,
};
use serde::{
  Deserialize,
  Serialize,
};
use serde_json::{
  Map,
  Value,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::host::Surface;

/// Who caused a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
  /// A programmatic change made through the engine's API.
  Api,
  /// A change made by the person editing.
  User,
  /// A programmatic change that emits no events.
  Silent,
}

impl Source {
  pub const fn as_str(&self) -> &'static str {
    match self {
      Source::Api => "api",
      Source::User => "user",
      Source::Silent => "silent",
    }
  }
}

/// Notifications on the engine's unified change channel.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
  TextChange {
    delta:        Delta,
    old_contents: Delta,
    source:       Source,
  },
  SelectionChange {
    range:     Option<SelectionRange>,
    old_range: Option<SelectionRange>,
    source:    Source,
  },
}

/// Layout rectangle of a range, relative to the editor surface.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
  pub left:   f64,
  pub top:    f64,
  pub width:  f64,
  pub height: f64,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct EngineConfig {
  pub theme:       Option<String>,
  pub modules:     Map<String, Value>,
  /// Allowed formats. `None` allows everything.
  pub formats:     Option<Vec<String>>,
  /// Selector of the element that bounds floating UI.
  pub bounds:      Option<String>,
  pub placeholder: Option<String>,
  pub read_only:   bool,
}

impl EngineConfig {
  pub fn has_external_toolbar(&self) -> bool {
    is_external_toolbar(&self.modules)
  }
}

/// Whether the `toolbar` module points at an element the host manages
/// itself: either a selector string or an object with a string `container`.
pub fn is_external_toolbar(modules: &Map<String, Value>) -> bool {
  match modules.get("toolbar") {
    Some(Value::String(_)) => true,
    Some(Value::Object(toolbar)) => toolbar.get("container").is_some_and(Value::is_string),
    _ => false,
  }
}

/// Read-only queries on a live editor.
pub trait EditorRead {
  /// Document length in characters, trailing newline included.
  fn length(&self) -> usize;
  /// Plain text of `range`, or of the whole document.
  fn text(&self, range: Option<SelectionRange>) -> String;
  /// Markup serialization of the document.
  fn markup(&self) -> String;
  fn contents(&self) -> Delta;
  fn selection(&self) -> Option<SelectionRange>;
  fn bounds(&self, range: SelectionRange) -> Bounds;
}

/// Everything the binding layer drives on an editing engine.
///
/// Content and selection writes report through the channel handed to
/// [`Engine::subscribe`], never through callbacks into the caller, so an
/// engine can be driven from inside the code that reacts to its events.
pub trait Engine: EditorRead {
  /// Class of the auxiliary element (toolbar) an engine may insert into the
  /// host document next to its surface.
  const AUXILIARY_CLASS: &'static str;

  fn construct(surface: &Surface, config: EngineConfig) -> Self
  where
    Self: Sized;

  /// Replace the document. Returns the change that was applied.
  fn set_contents(&mut self, contents: Delta, source: Source) -> Delta;

  /// Apply a change to the document. Returns the change that was applied.
  fn update_contents(&mut self, change: Delta, source: Source) -> Delta;

  /// Set or clear the selection. Setting a selection focuses the editor.
  fn set_selection(&mut self, range: Option<SelectionRange>, source: Source);

  /// Convert markup into a document.
  fn convert(&self, markup: &str) -> Delta;

  fn compose(&self, a: &Delta, b: &Delta) -> Delta {
    a.compose(b)
  }

  fn enable(&mut self, enabled: bool);
  fn is_enabled(&self) -> bool;

  fn subscribe(&mut self, events: UnboundedSender<EngineEvent>);
  fn unsubscribe(&mut self);

  fn focus(&mut self);
  fn blur(&mut self);
  fn has_focus(&self) -> bool;

  /// `None` removes a previously set tab index.
  fn set_tab_index(&mut self, tab_index: Option<i32>);
}
