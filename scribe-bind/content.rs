//! Writing values into the engine and reading them back out.

use scribe_core::{
  delta::Delta,
  value::Value,
};
use scribe_engine::{
  EditorRead,
  Engine,
  Source,
};

/// Replace the engine's document with `value`. Markup goes through the
/// engine's converter first. Returns the change the engine applied.
pub fn apply_content<E: Engine>(engine: &mut E, value: &Value) -> Delta {
  let contents = match value {
    Value::Markup(markup) => engine.convert(markup),
    Value::Delta(delta) => Delta::clone(delta),
  };
  engine.set_contents(contents, Source::Api)
}

/// Read the engine's document in the same representation as `like`:
/// a delta for a delta, markup otherwise.
pub fn read_value(editor: &dyn EditorRead, like: Option<&Value>) -> Value {
  match like {
    Some(Value::Delta(_)) => Value::from(editor.contents()),
    _ => Value::Markup(editor.markup()),
  }
}
