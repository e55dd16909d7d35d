//! The host-facing prop surface and how prop transitions are classified.

use std::{
  fmt,
  sync::Arc,
  time::Duration,
};

use scribe_core::{
  delta::Delta,
  selection::SelectionRange,
  value::Value,
};
use scribe_engine::{
  ElementTemplate,
  EngineConfig,
  Source,
  engine::is_external_toolbar,
};
use serde::{
  Deserialize,
  Serialize,
};
use serde_json::Map;

use crate::{
  error::{
    EditorError,
    Result,
  },
  view::EditorView,
};

/// Editor configuration that is plain data, as opposed to callbacks.
///
/// Also the shape of the `[editor]` table in configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct EditorOptions {
  /// Visual theme. Regenerates the editor when changed.
  pub theme:               Option<String>,
  /// Engine module configuration. Regenerates the editor when changed.
  pub modules:             Map<String, serde_json::Value>,
  /// Format allow-list. `None` allows every format. Regenerates.
  pub formats:             Option<Vec<String>>,
  /// Selector for the element bounding floating UI. Regenerates.
  pub bounds:              Option<String>,
  pub placeholder:         Option<String>,
  pub read_only:           bool,
  pub tab_index:           Option<i32>,
  /// Debounce window for `on_change_debounced`. Regenerates.
  pub debounce_ms:         u64,
  /// Use a `<pre>` editing area instead of a `<div>`. Regenerates, since
  /// the editing area is only created with a new surface.
  pub preserve_whitespace: bool,
  pub id:                  Option<String>,
  pub class_name:          Option<String>,
  pub style:               Option<String>,
}

impl Default for EditorOptions {
  fn default() -> Self {
    Self {
      theme:               Some("snow".to_string()),
      modules:             Map::new(),
      formats:             None,
      bounds:              None,
      placeholder:         None,
      read_only:           false,
      tab_index:           None,
      debounce_ms:         1000,
      preserve_whitespace: false,
      id:                  None,
      class_name:          None,
      style:               None,
    }
  }
}

impl EditorOptions {
  pub fn debounce_window(&self) -> Duration {
    Duration::from_millis(self.debounce_ms)
  }

  pub fn has_external_toolbar(&self) -> bool {
    is_external_toolbar(&self.modules)
  }

  pub fn engine_config(&self) -> EngineConfig {
    EngineConfig {
      theme:       self.theme.clone(),
      modules:     self.modules.clone(),
      formats:     self.formats.clone(),
      bounds:      self.bounds.clone(),
      placeholder: self.placeholder.clone(),
      read_only:   self.read_only,
    }
  }
}

/// Payload of `on_change`.
#[derive(Debug)]
pub struct ContentChange<'a> {
  /// The new value, in the same representation as the tracked one.
  pub value:  &'a Value,
  /// The change itself. Do not feed this back in as `value`.
  pub delta:  &'a Arc<Delta>,
  pub source: Source,
  pub editor: EditorView<'a>,
}

/// Payload of `on_change_debounced`.
#[derive(Debug)]
pub struct DebouncedChange<'a> {
  pub value:    &'a Value,
  /// Document at the start of the debounce window.
  pub baseline: &'a Delta,
  /// Every change of the window composed into one.
  pub delta:    &'a Delta,
  pub source:   Source,
  pub editor:   EditorView<'a>,
}

/// Payload of `on_change_selection`.
#[derive(Debug)]
pub struct SelectionChange<'a> {
  pub range:  Option<SelectionRange>,
  pub source: Source,
  pub editor: EditorView<'a>,
}

/// Payload of `on_focus` (the new range) and `on_blur` (the range before
/// focus was lost).
#[derive(Debug)]
pub struct FocusChange<'a> {
  pub range:  SelectionRange,
  pub source: Source,
  pub editor: EditorView<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventKind {
  Press,
  Down,
  Up,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
  pub key:   String,
  pub shift: bool,
  pub ctrl:  bool,
  pub alt:   bool,
  pub meta:  bool,
}

impl KeyEvent {
  pub fn new(key: impl Into<String>) -> Self {
    Self {
      key: key.into(),
      ..Default::default()
    }
  }
}

pub type ChangeCallback = Box<dyn FnMut(&ContentChange<'_>)>;
pub type DebouncedCallback = Box<dyn FnMut(&DebouncedChange<'_>)>;
pub type SelectionCallback = Box<dyn FnMut(&SelectionChange<'_>)>;
pub type FocusCallback = Box<dyn FnMut(&FocusChange<'_>)>;
pub type KeyCallback = Box<dyn FnMut(&KeyEvent)>;

#[derive(Default)]
pub struct Callbacks {
  pub on_change:           Option<ChangeCallback>,
  pub on_change_debounced: Option<DebouncedCallback>,
  pub on_change_selection: Option<SelectionCallback>,
  pub on_focus:            Option<FocusCallback>,
  pub on_blur:             Option<FocusCallback>,
  pub on_key_press:        Option<KeyCallback>,
  pub on_key_down:         Option<KeyCallback>,
  pub on_key_up:           Option<KeyCallback>,
}

impl Callbacks {
  pub(crate) fn key_mut(&mut self, kind: KeyEventKind) -> Option<&mut KeyCallback> {
    match kind {
      KeyEventKind::Press => self.on_key_press.as_mut(),
      KeyEventKind::Down => self.on_key_down.as_mut(),
      KeyEventKind::Up => self.on_key_up.as_mut(),
    }
  }
}

impl fmt::Debug for Callbacks {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let slots = [
      ("on_change", self.on_change.is_some()),
      ("on_change_debounced", self.on_change_debounced.is_some()),
      ("on_change_selection", self.on_change_selection.is_some()),
      ("on_focus", self.on_focus.is_some()),
      ("on_blur", self.on_blur.is_some()),
      ("on_key_press", self.on_key_press.is_some()),
      ("on_key_down", self.on_key_down.is_some()),
      ("on_key_up", self.on_key_up.is_some()),
    ];
    f.debug_list()
      .entries(slots.iter().filter(|(_, set)| *set).map(|(name, _)| name))
      .finish()
  }
}

/// Everything the host passes on a render.
#[derive(Debug, Default)]
pub struct Props {
  /// Controlled value. When set, the editor is kept in sync with it.
  pub value:         Option<Value>,
  /// Initial value for an uncontrolled editor.
  pub default_value: Option<Value>,
  pub options:       EditorOptions,
  /// Custom editing area. At most one.
  pub children:      Vec<ElementTemplate>,
  pub callbacks:     Callbacks,
}

impl Props {
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn with_value(mut self, value: impl Into<Value>) -> Self {
    self.value = Some(value.into());
    self
  }

  #[must_use]
  pub fn with_default_value(mut self, value: impl Into<Value>) -> Self {
    self.default_value = Some(value.into());
    self
  }

  #[must_use]
  pub fn with_options(mut self, options: EditorOptions) -> Self {
    self.options = options;
    self
  }

  #[must_use]
  pub fn with_child(mut self, child: ElementTemplate) -> Self {
    self.children.push(child);
    self
  }

  #[must_use]
  pub fn with_on_change(mut self, f: impl FnMut(&ContentChange<'_>) + 'static) -> Self {
    self.callbacks.on_change = Some(Box::new(f));
    self
  }

  #[must_use]
  pub fn with_on_change_debounced(mut self, f: impl FnMut(&DebouncedChange<'_>) + 'static) -> Self {
    self.callbacks.on_change_debounced = Some(Box::new(f));
    self
  }

  #[must_use]
  pub fn with_on_change_selection(
    mut self,
    f: impl FnMut(&SelectionChange<'_>) + 'static,
  ) -> Self {
    self.callbacks.on_change_selection = Some(Box::new(f));
    self
  }

  #[must_use]
  pub fn with_on_focus(mut self, f: impl FnMut(&FocusChange<'_>) + 'static) -> Self {
    self.callbacks.on_focus = Some(Box::new(f));
    self
  }

  #[must_use]
  pub fn with_on_blur(mut self, f: impl FnMut(&FocusChange<'_>) + 'static) -> Self {
    self.callbacks.on_blur = Some(Box::new(f));
    self
  }

  #[must_use]
  pub fn with_on_key(mut self, kind: KeyEventKind, f: impl FnMut(&KeyEvent) + 'static) -> Self {
    let slot = match kind {
      KeyEventKind::Press => &mut self.callbacks.on_key_press,
      KeyEventKind::Down => &mut self.callbacks.on_key_down,
      KeyEventKind::Up => &mut self.callbacks.on_key_up,
    };
    *slot = Some(Box::new(f));
    self
  }
}

/// Reject props that cannot be mounted. Runs before anything is touched.
pub fn validate_props(props: &Props) -> Result<()> {
  match props.children.as_slice() {
    [] => Ok(()),
    [child] if child.tag.eq_ignore_ascii_case("textarea") => {
      Err(EditorError::ForbiddenChild(child.tag.clone()))
    },
    [_] => Ok(()),
    children => Err(EditorError::MultipleChildren(children.len())),
  }
}

/// Props that cannot be changed on a live engine.
pub fn regeneration_props_changed(prev: &Props, next: &Props) -> bool {
  let (a, b) = (&prev.options, &next.options);
  a.modules != b.modules
    || a.formats != b.formats
    || a.bounds != b.bounds
    || a.theme != b.theme
    || a.debounce_ms != b.debounce_ms
    || a.preserve_whitespace != b.preserve_whitespace
    || prev.children != next.children
}

/// Props that only affect the surrounding container.
pub fn render_props_changed(prev: &Props, next: &Props) -> bool {
  let (a, b) = (&prev.options, &next.options);
  a.id != b.id
    || a.class_name != b.class_name
    || a.style != b.style
    || a.placeholder != b.placeholder
    || a.tab_index != b.tab_index
}
