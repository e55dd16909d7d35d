//! The two value representations an editor accepts and emits.

use std::sync::Arc;

use serde::{
  Deserialize,
  Serialize,
};

use crate::delta::Delta;

/// Editor content as supplied by, or reported to, the host.
///
/// Deltas are shared behind an [`Arc`] so that a payload handed out in a
/// change notification can later be recognised by identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
  Markup(String),
  Delta(Arc<Delta>),
}

impl Value {
  #[inline]
  pub fn is_delta(&self) -> bool {
    matches!(self, Value::Delta(_))
  }

  pub fn as_delta(&self) -> Option<&Arc<Delta>> {
    match self {
      Value::Delta(delta) => Some(delta),
      Value::Markup(_) => None,
    }
  }

  pub fn as_markup(&self) -> Option<&str> {
    match self {
      Value::Markup(markup) => Some(markup),
      Value::Delta(_) => None,
    }
  }

  /// Whether this value is the very same delta allocation as `payload`.
  pub fn is_same_delta(&self, payload: &Arc<Delta>) -> bool {
    self
      .as_delta()
      .is_some_and(|delta| Arc::ptr_eq(delta, payload))
  }
}

pub fn is_delta(value: &Value) -> bool {
  value.is_delta()
}

/// Format-aware equality.
///
/// Two deltas are equal when their operations are; two markup strings when
/// their text is. A markup string never equals a delta, even when both
/// describe the same rendered document.
pub fn values_equal(a: &Value, b: &Value) -> bool {
  match (a, b) {
    (Value::Delta(a), Value::Delta(b)) => a.ops == b.ops,
    (Value::Markup(a), Value::Markup(b)) => a == b,
    _ => false,
  }
}

impl PartialEq for Value {
  fn eq(&self, other: &Self) -> bool {
    values_equal(self, other)
  }
}

impl From<&str> for Value {
  fn from(markup: &str) -> Self {
    Value::Markup(markup.to_string())
  }
}

impl From<String> for Value {
  fn from(markup: String) -> Self {
    Value::Markup(markup)
  }
}

impl From<Delta> for Value {
  fn from(delta: Delta) -> Self {
    Value::Delta(Arc::new(delta))
  }
}

impl From<Arc<Delta>> for Value {
  fn from(delta: Arc<Delta>) -> Self {
    Value::Delta(delta)
  }
}
