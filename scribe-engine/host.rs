//! What an engine instance is mounted into: a generation-keyed surface and
//! the host document that outlives every instance.

use std::{
  cell::{
    Cell,
    RefCell,
  },
  fmt,
  rc::Rc,
};

/// Identity of one incarnation of the editor. Advanced once per
/// regeneration.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
  pub const fn new(value: u64) -> Self {
    Self(value)
  }

  pub const fn get(self) -> u64 {
    self.0
  }

  #[must_use]
  pub const fn next(self) -> Self {
    Self(self.0 + 1)
  }
}

impl fmt::Display for Generation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// A child element supplied by the host to serve as the editing area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementTemplate {
  pub tag:    String,
  /// Initial inner markup.
  pub markup: Option<String>,
}

impl ElementTemplate {
  pub fn new(tag: impl Into<String>) -> Self {
    Self {
      tag:    tag.into(),
      markup: None,
    }
  }

  #[must_use]
  pub fn with_markup(mut self, markup: impl Into<String>) -> Self {
    self.markup = Some(markup.into());
    self
  }
}

/// One controller bound to a [`HostDocument`]. Handed out by
/// [`HostDocument::register`], so ids are unique per document.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EditorId(u64);

impl EditorId {
  pub const fn new(value: u64) -> Self {
    Self(value)
  }

  pub const fn get(self) -> u64 {
    self.0
  }
}

impl fmt::Display for EditorId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// A single engine instance: which editor, which incarnation of it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Owner {
  pub editor:     EditorId,
  pub generation: Generation,
}

impl Owner {
  pub const fn new(editor: EditorId, generation: Generation) -> Self {
    Self { editor, generation }
  }
}

impl fmt::Display for Owner {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}", self.editor, self.generation)
  }
}

/// The element an engine instance is constructed against.
///
/// `key()` changes with every generation, which tells the host to mount a
/// fresh node instead of reusing the previous one.
#[derive(Debug, Clone)]
pub struct Surface {
  pub owner:      Owner,
  pub tag:        String,
  pub markup:     Option<String>,
  pub id:         Option<String>,
  pub class_name: Option<String>,
  pub style:      Option<String>,
  pub host:       HostDocument,
}

impl Surface {
  pub fn new(owner: Owner, host: HostDocument) -> Self {
    Self {
      owner,
      tag: "div".to_string(),
      markup: None,
      id: None,
      class_name: None,
      style: None,
      host,
    }
  }

  pub fn generation(&self) -> Generation {
    self.owner.generation
  }

  pub fn key(&self) -> String {
    format!("editor-{}", self.owner.generation)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxiliaryElement {
  pub class: String,
  /// Engine instance that inserted it. `None` for elements the host
  /// inserted itself.
  pub owner: Option<Owner>,
}

/// Shared view of the surrounding document. Engines may leave auxiliary
/// elements (toolbars) here that are not children of their own surface, so
/// they survive the surface being torn down. Several editors may share one.
#[derive(Default, Clone)]
pub struct HostDocument {
  elements: Rc<RefCell<Vec<AuxiliaryElement>>>,
  editors:  Rc<Cell<u64>>,
}

impl HostDocument {
  pub fn new() -> Self {
    Self::default()
  }

  /// Allocate an id for an editor living in this document.
  pub fn register(&self) -> EditorId {
    let id = self.editors.get();
    self.editors.set(id + 1);
    EditorId(id)
  }

  /// Insert an element on behalf of an engine instance.
  pub fn attach(&self, class: &str, owner: Owner) {
    self.elements.borrow_mut().push(AuxiliaryElement {
      class: class.to_string(),
      owner: Some(owner),
    });
  }

  /// Insert an element owned by the host.
  pub fn insert_external(&self, class: &str) {
    self.elements.borrow_mut().push(AuxiliaryElement {
      class: class.to_string(),
      owner: None,
    });
  }

  /// Remove every element with `class` inserted by `owner`. Elements of
  /// other instances and of the host stay.
  pub fn remove_owned(&self, class: &str, owner: Owner) -> Vec<AuxiliaryElement> {
    let mut elements = self.elements.borrow_mut();
    let (removed, kept): (Vec<_>, Vec<_>) = elements
      .drain(..)
      .partition(|element| element.class == class && element.owner == Some(owner));
    *elements = kept;
    removed
  }

  pub fn count(&self, class: &str) -> usize {
    self
      .elements
      .borrow()
      .iter()
      .filter(|element| element.class == class)
      .count()
  }

  pub fn elements(&self) -> Vec<AuxiliaryElement> {
    self.elements.borrow().clone()
  }
}

impl fmt::Debug for HostDocument {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list().entries(self.elements.borrow().iter()).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn removal_is_scoped_to_the_owner() {
    let host = HostDocument::new();
    let (a, b) = (host.register(), host.register());
    assert_ne!(a, b);

    let a1 = Owner::new(a, Generation::new(1));
    let b0 = Owner::new(b, Generation::new(0));
    host.attach("ql-toolbar", a1);
    host.attach("ql-toolbar", b0);
    host.insert_external("ql-toolbar");

    let clone = host.clone();
    let removed = clone.remove_owned("ql-toolbar", b0);
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].owner, Some(b0));
    assert_eq!(host.elements(), vec![
      AuxiliaryElement {
        class: "ql-toolbar".to_string(),
        owner: Some(a1),
      },
      AuxiliaryElement {
        class: "ql-toolbar".to_string(),
        owner: None,
      },
    ]);

    assert!(host.remove_owned("ql-toolbar", Owner::new(a, Generation::new(0))).is_empty());
    assert!(host.remove_owned("missing", a1).is_empty());
    assert_eq!(host.count("ql-toolbar"), 2);
  }

  #[test]
  fn surface_key_follows_generation() {
    let owner = Owner::new(EditorId::new(4), Generation::default().next().next());
    let surface = Surface::new(owner, HostDocument::new());
    assert_eq!(surface.key(), "editor-2");
    assert_eq!(surface.generation(), Generation::new(2));
    assert_eq!(surface.tag, "div");
  }
}
