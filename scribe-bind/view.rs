use std::fmt;

use scribe_core::{
  delta::Delta,
  selection::SelectionRange,
};
use scribe_engine::{
  Bounds,
  EditorRead,
};

/// Read-only access to a live editor, handed to callbacks.
#[derive(Clone, Copy)]
pub struct EditorView<'a> {
  editor: &'a dyn EditorRead,
}

impl<'a> EditorView<'a> {
  pub fn new(editor: &'a dyn EditorRead) -> Self {
    Self { editor }
  }

  pub fn length(&self) -> usize {
    self.editor.length()
  }

  pub fn text(&self, range: Option<SelectionRange>) -> String {
    self.editor.text(range)
  }

  pub fn markup(&self) -> String {
    self.editor.markup()
  }

  pub fn contents(&self) -> Delta {
    self.editor.contents()
  }

  pub fn selection(&self) -> Option<SelectionRange> {
    self.editor.selection()
  }

  pub fn bounds(&self, range: SelectionRange) -> Bounds {
    self.editor.bounds(range)
  }
}

impl fmt::Debug for EditorView<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("EditorView")
      .field("length", &self.length())
      .field("selection", &self.selection())
      .finish()
  }
}
