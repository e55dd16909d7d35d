use serde::{
  Deserialize,
  Serialize,
};

/// A cursor or selection over document character offsets.
///
/// A missing selection (the editor is not focused) is modelled as
/// `Option<SelectionRange>`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionRange {
  pub index:  usize,
  pub length: usize,
}

impl SelectionRange {
  pub const fn new(index: usize, length: usize) -> Self {
    Self { index, length }
  }

  /// A collapsed selection (a cursor).
  pub const fn point(index: usize) -> Self {
    Self::new(index, 0)
  }

  #[inline]
  pub const fn end(&self) -> usize {
    self.index + self.length
  }

  #[inline]
  pub const fn is_collapsed(&self) -> bool {
    self.length == 0
  }

  /// Fit the range inside a document of `document_len` characters.
  ///
  /// The trailing newline of a document cannot be selected, so the index is
  /// capped at `document_len - 1` and the length at whatever remains before
  /// it. Out of range selections are shrunk, never rejected.
  #[must_use]
  pub fn clamp(self, document_len: usize) -> Self {
    let last = document_len.saturating_sub(1);
    let index = self.index.min(last);
    let length = self.length.min(last - index);
    Self { index, length }
  }
}
