//! Operation-log documents and changes.
//!
//! A [`Delta`] is an ordered list of [`Op`]s applied from the start of a
//! document:
//!
//! - **Retain(n)** - keep `n` characters, optionally reformatting them
//! - **Delete(n)** - remove `n` characters
//! - **Insert(s)** - insert `s`, optionally formatted
//!
//! A delta made only of inserts *is* a document. Any other delta is a change
//! that can be composed onto a document (or onto another change):
//!
//! ```
//! use scribe_core::delta::Delta;
//!
//! let doc = Delta::text("hello\n");
//! let mut change = Delta::new();
//! change.retain(5, None).insert(" world", None);
//!
//! let next = doc.compose(&change);
//! assert_eq!(next.plain_text(), "hello world\n");
//! ```
//!
//! Unlike a length-checked changeset, a delta carries an implicit trailing
//! retain: characters past the end of a change are kept as they are.
//!
//! # Normalization
//!
//! The builder methods ([`Delta::insert`], [`Delta::retain`],
//! [`Delta::delete`], [`Delta::push`]) merge adjacent operations of the same
//! kind and formatting, drop zero-length operations, and always place an
//! insert before a delete at the same position. Two deltas built through
//! them that describe the same edit therefore compare equal.

use serde::{
  Deserialize,
  Serialize,
};

use crate::{
  Tendril,
  attributes::{
    self,
    AttributeMap,
  },
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Op {
  /// Insert text at the current position.
  Insert {
    insert:     Tendril,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attributes: Option<AttributeMap>,
  },

  /// Move over n characters, applying `attributes` when present.
  Retain {
    retain:     usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attributes: Option<AttributeMap>,
  },

  /// Delete n characters.
  Delete { delete: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
  Insert,
  Retain,
  Delete,
}

impl Op {
  pub fn insert(text: impl Into<Tendril>, attributes: Option<AttributeMap>) -> Self {
    Op::Insert {
      insert: text.into(),
      attributes,
    }
  }

  pub fn retain(n: usize, attributes: Option<AttributeMap>) -> Self {
    Op::Retain {
      retain: n,
      attributes,
    }
  }

  pub fn delete(n: usize) -> Self {
    Op::Delete { delete: n }
  }

  pub fn kind(&self) -> OpKind {
    match self {
      Op::Insert { .. } => OpKind::Insert,
      Op::Retain { .. } => OpKind::Retain,
      Op::Delete { .. } => OpKind::Delete,
    }
  }

  /// Length in characters.
  pub fn len_chars(&self) -> usize {
    match self {
      Op::Insert { insert, .. } => insert.chars().count(),
      Op::Retain { retain: n, .. } | Op::Delete { delete: n } => *n,
    }
  }

  pub fn attributes(&self) -> Option<&AttributeMap> {
    match self {
      Op::Insert { attributes, .. } | Op::Retain { attributes, .. } => attributes.as_ref(),
      Op::Delete { .. } => None,
    }
  }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delta {
  pub ops: Vec<Op>,
}

impl From<Vec<Op>> for Delta {
  fn from(ops: Vec<Op>) -> Self {
    Self { ops }
  }
}

impl Delta {
  pub fn new() -> Self {
    Self::default()
  }

  /// A document consisting of a single unformatted insert.
  pub fn text(text: impl Into<Tendril>) -> Self {
    let mut delta = Self::new();
    delta.insert(text, None);
    delta
  }

  // Delta builder operations: insert/retain/delete.
  //

  pub fn insert(&mut self, text: impl Into<Tendril>, attributes: Option<AttributeMap>) -> &mut Self {
    let text = text.into();
    if text.is_empty() {
      return self;
    }
    self.push(Op::insert(text, attributes.filter(|attrs| !attrs.is_empty())))
  }

  pub fn retain(&mut self, n: usize, attributes: Option<AttributeMap>) -> &mut Self {
    if n == 0 {
      return self;
    }
    self.push(Op::retain(n, attributes.filter(|attrs| !attrs.is_empty())))
  }

  pub fn delete(&mut self, n: usize) -> &mut Self {
    if n == 0 {
      return self;
    }
    self.push(Op::delete(n))
  }

  /// Append an operation, merging it into the previous one when possible.
  pub fn push(&mut self, op: Op) -> &mut Self {
    if op.len_chars() == 0 {
      return self;
    }

    let mut index = self.ops.len();

    match (self.ops.last_mut(), &op) {
      (Some(Op::Delete { delete: count }), Op::Delete { delete: n }) => {
        *count += n;
        return self;
      },
      // Inserting before or after a delete at the same position is
      // equivalent, so inserts always go first.
      (Some(Op::Delete { .. }), Op::Insert { .. }) => {
        index -= 1;
        if index == 0 {
          self.ops.insert(0, op);
          return self;
        }
      },
      _ => {},
    }

    if index > 0 {
      match (&mut self.ops[index - 1], &op) {
        (
          Op::Insert {
            insert: prev,
            attributes: prev_attributes,
          },
          Op::Insert { insert, attributes },
        ) if *prev_attributes == *attributes => {
          prev.push_str(insert);
          return self;
        },
        (
          Op::Retain {
            retain: prev,
            attributes: prev_attributes,
          },
          Op::Retain { retain, attributes },
        ) if *prev_attributes == *attributes => {
          *prev += retain;
          return self;
        },
        _ => {},
      }
    }

    self.ops.insert(index, op);
    self
  }

  /// Append every operation of `other`.
  pub fn extend(&mut self, other: Delta) -> &mut Self {
    for op in other.ops {
      self.push(op);
    }
    self
  }

  /// Drop a trailing unformatted retain, which is implied anyway.
  pub fn chop(&mut self) -> &mut Self {
    if let Some(Op::Retain {
      attributes: None, ..
    }) = self.ops.last()
    {
      self.ops.pop();
    }
    self
  }

  /// Sum of the lengths of every operation.
  pub fn length(&self) -> usize {
    self.ops.iter().map(Op::len_chars).sum()
  }

  /// Number of characters in the document described by the inserts.
  pub fn document_len(&self) -> usize {
    self
      .ops
      .iter()
      .filter(|op| op.kind() == OpKind::Insert)
      .map(Op::len_chars)
      .sum()
  }

  /// Whether this delta only contains inserts, i.e. describes a document
  /// rather than a change.
  pub fn is_document(&self) -> bool {
    self.ops.iter().all(|op| op.kind() == OpKind::Insert)
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.ops.is_empty()
  }

  /// Concatenated text of every insert.
  pub fn plain_text(&self) -> String {
    self
      .ops
      .iter()
      .filter_map(|op| {
        match op {
          Op::Insert { insert, .. } => Some(insert.as_str()),
          _ => None,
        }
      })
      .collect()
  }

  /// Combine two deltas. Applying the result is equivalent to applying
  /// `self` and then `other`.
  #[must_use]
  pub fn compose(&self, other: &Delta) -> Delta {
    let mut left = OpIter::new(&self.ops);
    let mut right = OpIter::new(&other.ops);
    let mut delta = Delta::new();

    // A leading plain retain on the right passes left inserts through as-is.
    if let Some(Op::Retain {
      retain,
      attributes: None,
    }) = right.peek()
    {
      let mut first_left = *retain;
      while left.peek_kind() == OpKind::Insert && left.peek_len() <= first_left {
        first_left -= left.peek_len();
        delta.push(left.next());
      }
      if *retain > first_left {
        right.next_op(*retain - first_left);
      }
    }

    while left.has_next() || right.has_next() {
      if right.peek_kind() == OpKind::Insert {
        delta.push(right.next());
        continue;
      }
      if left.peek_kind() == OpKind::Delete {
        delta.push(left.next());
        continue;
      }

      let length = left.peek_len().min(right.peek_len());
      let left_op = left.next_op(length);
      let right_op = right.next_op(length);

      match right_op {
        Op::Retain {
          attributes: right_attributes,
          ..
        } => {
          let op = match left_op {
            Op::Retain { attributes, .. } => {
              Op::retain(
                length,
                attributes::compose(attributes.as_ref(), right_attributes.as_ref(), true),
              )
            },
            Op::Insert { insert, attributes } => {
              Op::insert(
                insert,
                attributes::compose(attributes.as_ref(), right_attributes.as_ref(), false),
              )
            },
            delete @ Op::Delete { .. } => delete,
          };
          delta.push(op);
        },
        Op::Delete { delete } => {
          // Deleting something the left side inserted cancels both out.
          if left_op.kind() == OpKind::Retain {
            delta.push(Op::delete(delete));
          }
        },
        Op::Insert { .. } => {},
      }
    }

    delta.chop();
    delta
  }

  /// Map a character offset through this change.
  ///
  /// With `priority`, an insert at exactly `index` is treated as happening
  /// after it, so the offset does not move.
  pub fn transform_position(&self, mut index: usize, priority: bool) -> usize {
    let mut iter = OpIter::new(&self.ops);
    let mut offset = 0;

    while iter.has_next() && offset <= index {
      let length = iter.peek_len();
      let kind = iter.peek_kind();
      iter.next();
      match kind {
        OpKind::Delete => {
          index -= length.min(index - offset);
          continue;
        },
        OpKind::Insert if offset < index || !priority => index += length,
        _ => {},
      }
      offset += length;
    }

    index
  }
}

/// Walks a slice of operations, splitting them on demand.
///
/// Past the end it yields an unbounded plain retain, which is what makes the
/// trailing retain of a delta implicit.
struct OpIter<'a> {
  ops:    &'a [Op],
  index:  usize,
  offset: usize,
}

impl<'a> OpIter<'a> {
  fn new(ops: &'a [Op]) -> Self {
    Self {
      ops,
      index: 0,
      offset: 0,
    }
  }

  fn has_next(&self) -> bool {
    self.peek_len() < usize::MAX
  }

  fn peek(&self) -> Option<&'a Op> {
    self.ops.get(self.index)
  }

  fn peek_len(&self) -> usize {
    match self.peek() {
      Some(op) => op.len_chars() - self.offset,
      None => usize::MAX,
    }
  }

  fn peek_kind(&self) -> OpKind {
    self.peek().map_or(OpKind::Retain, Op::kind)
  }

  fn next(&mut self) -> Op {
    self.next_op(usize::MAX)
  }

  /// Take up to `length` characters worth of the current operation.
  fn next_op(&mut self, length: usize) -> Op {
    let Some(op) = self.peek() else {
      return Op::retain(usize::MAX, None);
    };

    let offset = self.offset;
    let remaining = op.len_chars() - offset;
    let length = if length >= remaining {
      self.index += 1;
      self.offset = 0;
      remaining
    } else {
      self.offset += length;
      length
    };

    match op {
      Op::Delete { .. } => Op::delete(length),
      Op::Retain { attributes, .. } => Op::retain(length, attributes.clone()),
      Op::Insert { insert, attributes } => {
        Op::insert(char_slice(insert, offset, length), attributes.clone())
      },
    }
  }
}

fn char_slice(text: &str, start: usize, len: usize) -> Tendril {
  let from = text
    .char_indices()
    .nth(start)
    .map_or(text.len(), |(pos, _)| pos);
  let to = text[from..]
    .char_indices()
    .nth(len)
    .map_or(text.len(), |(pos, _)| from + pos);
  Tendril::from(&text[from..to])
}
