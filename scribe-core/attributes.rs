//! Formatting attributes carried by insert and retain operations.
//!
//! Attributes are a sorted map from format name to a JSON value. A `null`
//! value on a retain means "remove this format" and only survives
//! composition when the left-hand side is itself a retain.

use std::collections::BTreeMap;

pub type AttributeMap = BTreeMap<String, serde_json::Value>;

/// Compose two attribute maps, `b` applied on top of `a`.
///
/// When `keep_null` is false, `null` entries of `b` are dropped from the
/// result instead of being carried forward. Returns `None` when the result
/// is empty.
pub fn compose(
  a: Option<&AttributeMap>,
  b: Option<&AttributeMap>,
  keep_null: bool,
) -> Option<AttributeMap> {
  let mut attributes: AttributeMap = match b {
    Some(b) if keep_null => b.clone(),
    Some(b) => {
      b.iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
    },
    None => AttributeMap::new(),
  };

  if let Some(a) = a {
    for (key, value) in a {
      let overridden = b.is_some_and(|b| b.contains_key(key));
      if !overridden {
        attributes.insert(key.clone(), value.clone());
      }
    }
  }

  (!attributes.is_empty()).then_some(attributes)
}

/// Keep only the attributes whose name appears in `allowed`.
pub fn retain_allowed(attributes: Option<AttributeMap>, allowed: &[String]) -> Option<AttributeMap> {
  let attributes: AttributeMap = attributes?
    .into_iter()
    .filter(|(key, _)| allowed.iter().any(|format| format == key))
    .collect();
  (!attributes.is_empty()).then_some(attributes)
}
