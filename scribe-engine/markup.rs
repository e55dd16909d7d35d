//! Conversion between documents and a small HTML subset.
//!
//! Blocks: `p`/`div`, `h1`..`h6`, `blockquote`, with `br` for line breaks.
//! Inline: `strong`/`b`, `em`/`i`, `u`, `s`/`strike`/`del`, `code`, `a href`.
//! Anything else is skipped, keeping its text.
//!
//! Block formats live on the newline that ends the line, inline formats on
//! the text itself:
//!
//! ```text
//! <h1>Title</h1>   =>  "Title" + "\n" {header: 1}
//! <p><em>x</em></p> =>  "x" {italic: true} + "\n"
//! ```

use scribe_core::{
  attributes::AttributeMap,
  delta::{
    Delta,
    Op,
  },
};
use serde_json::Value;
use smallvec::SmallVec;

/// Inline formats, outermost first.
const INLINE_ORDER: [&str; 6] = ["link", "bold", "italic", "underline", "strike", "code"];

pub fn to_markup(delta: &Delta) -> String {
  let mut out = String::new();
  let mut line = String::new();

  for op in &delta.ops {
    let Op::Insert { insert, attributes } = op else {
      continue;
    };
    let attributes = attributes.as_ref();
    let mut parts = insert.split('\n');
    if let Some(first) = parts.next() {
      push_inline(&mut line, first, attributes);
    }
    for part in parts {
      close_line(&mut out, &mut line, attributes);
      push_inline(&mut line, part, attributes);
    }
  }

  if !line.is_empty() {
    close_line(&mut out, &mut line, None);
  }
  out
}

fn push_inline(line: &mut String, text: &str, attributes: Option<&AttributeMap>) {
  if text.is_empty() {
    return;
  }

  let mut closing: SmallVec<[&str; 6]> = SmallVec::new();
  for format in INLINE_ORDER {
    let Some(value) = attributes.and_then(|attrs| attrs.get(format)) else {
      continue;
    };
    let tag = match (format, value) {
      ("link", Value::String(href)) => {
        line.push_str("<a href=\"");
        escape_into(line, href, true);
        line.push_str("\">");
        "a"
      },
      (_, Value::Bool(true)) => {
        let tag = inline_tag(format);
        line.push('<');
        line.push_str(tag);
        line.push('>');
        tag
      },
      _ => continue,
    };
    closing.push(tag);
  }

  escape_into(line, text, false);

  for tag in closing.iter().rev() {
    line.push_str("</");
    line.push_str(tag);
    line.push('>');
  }
}

fn inline_tag(format: &str) -> &'static str {
  match format {
    "bold" => "strong",
    "italic" => "em",
    "underline" => "u",
    "strike" => "s",
    "code" => "code",
    _ => "span",
  }
}

fn close_line(out: &mut String, line: &mut String, attributes: Option<&AttributeMap>) {
  let header = attributes
    .and_then(|attrs| attrs.get("header"))
    .and_then(Value::as_u64)
    .filter(|level| (1..=6).contains(level));
  let blockquote = attributes
    .and_then(|attrs| attrs.get("blockquote"))
    .is_some_and(|value| *value == Value::Bool(true));

  let tag = match header {
    Some(level) => format!("h{level}"),
    None if blockquote => "blockquote".to_string(),
    None => "p".to_string(),
  };

  out.push('<');
  out.push_str(&tag);
  out.push('>');
  if line.is_empty() {
    out.push_str("<br>");
  } else {
    out.push_str(line);
  }
  out.push_str("</");
  out.push_str(&tag);
  out.push('>');
  line.clear();
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
  for c in text.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' if attribute => out.push_str("&quot;"),
      c => out.push(c),
    }
  }
}

// Parsing.

#[derive(Debug, PartialEq)]
enum Token<'a> {
  Text(&'a str),
  Open {
    name:       String,
    attributes: Vec<(String, String)>,
  },
  Close(String),
}

fn tokenize(input: &str) -> Vec<Token<'_>> {
  let mut tokens = Vec::new();
  let mut rest = input;

  while !rest.is_empty() {
    let Some(open) = rest.find('<') else {
      tokens.push(Token::Text(rest));
      break;
    };
    if open > 0 {
      tokens.push(Token::Text(&rest[..open]));
    }

    let tag = &rest[open + 1..];
    let starts_tag = tag
      .chars()
      .next()
      .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'));
    if !starts_tag {
      tokens.push(Token::Text(&rest[open..open + 1]));
      rest = tag;
      continue;
    }
    let Some(close) = tag_end(tag) else {
      tokens.push(Token::Text(&rest[open..]));
      break;
    };
    let inner = &tag[..close];
    rest = &tag[close + 1..];

    if let Some(name) = inner.strip_prefix('/') {
      tokens.push(Token::Close(name.trim().to_ascii_lowercase()));
    } else if inner.starts_with(['!', '?']) {
      // comments, doctypes, processing instructions
    } else {
      let inner = inner.trim_end();
      let inner = inner.strip_suffix('/').unwrap_or(inner);
      let name_end = inner.find(char::is_whitespace).unwrap_or(inner.len());
      tokens.push(Token::Open {
        name:       inner[..name_end].to_ascii_lowercase(),
        attributes: parse_attributes(&inner[name_end..]),
      });
    }
  }

  tokens
}

/// Byte offset of the `>` closing a tag, skipping quoted attribute values.
fn tag_end(tag: &str) -> Option<usize> {
  let mut quote = None;
  for (pos, c) in tag.char_indices() {
    match (quote, c) {
      (None, '"' | '\'') => quote = Some(c),
      (Some(q), c) if c == q => quote = None,
      (None, '>') => return Some(pos),
      _ => {},
    }
  }
  None
}

fn parse_attributes(mut rest: &str) -> Vec<(String, String)> {
  let mut attributes = Vec::new();

  loop {
    rest = rest.trim_start();
    if rest.is_empty() {
      break;
    }

    let name_end = rest
      .find(|c: char| c.is_whitespace() || c == '=')
      .unwrap_or(rest.len());
    let name = rest[..name_end].to_ascii_lowercase();
    rest = rest[name_end..].trim_start();

    let value = match rest.strip_prefix('=') {
      Some(after) => {
        let after = after.trim_start();
        match after.chars().next() {
          Some(quote @ ('"' | '\'')) => {
            let body = &after[1..];
            let end = body.find(quote).unwrap_or(body.len());
            rest = body.get(end + 1..).unwrap_or("");
            decode_entities(&body[..end])
          },
          _ => {
            let end = after.find(char::is_whitespace).unwrap_or(after.len());
            rest = &after[end..];
            decode_entities(&after[..end])
          },
        }
      },
      None => String::new(),
    };

    if !name.is_empty() {
      attributes.push((name, value));
    }
  }

  attributes
}

fn decode_entities(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut rest = text;

  while let Some(amp) = rest.find('&') {
    out.push_str(&rest[..amp]);
    rest = &rest[amp..];

    let decoded = rest.find(';').and_then(|semi| {
      let decoded = match &rest[1..semi] {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        entity => {
          entity
            .strip_prefix("#x")
            .or_else(|| entity.strip_prefix("#X"))
            .map(|hex| u32::from_str_radix(hex, 16))
            .or_else(|| entity.strip_prefix('#').map(str::parse::<u32>))
            .and_then(Result::ok)
            .and_then(char::from_u32)
        },
      };
      decoded.map(|c| (c, semi))
    });

    match decoded {
      Some((c, semi)) => {
        out.push(c);
        rest = &rest[semi + 1..];
      },
      None => {
        out.push('&');
        rest = &rest[1..];
      },
    }
  }

  out.push_str(rest);
  out
}

fn block_format(name: &str) -> Option<AttributeMap> {
  let mut attributes = AttributeMap::new();
  match name {
    "p" | "div" => {},
    "blockquote" => {
      attributes.insert("blockquote".to_string(), Value::Bool(true));
    },
    _ => {
      let level = name
        .strip_prefix('h')
        .and_then(|level| level.parse::<u8>().ok())
        .filter(|level| (1..=6).contains(level))?;
      attributes.insert("header".to_string(), Value::from(level));
    },
  }
  Some(attributes)
}

fn inline_format(name: &str, attributes: &[(String, String)]) -> Option<(&'static str, Value)> {
  let format = match name {
    "strong" | "b" => "bold",
    "em" | "i" => "italic",
    "u" => "underline",
    "s" | "strike" | "del" => "strike",
    "code" => "code",
    "a" => {
      let href = attributes.iter().find(|(key, _)| key == "href")?;
      return Some(("link", Value::String(href.1.clone())));
    },
    _ => return None,
  };
  Some((format, Value::Bool(true)))
}

struct Inline {
  tag:    String,
  format: &'static str,
  value:  Value,
}

/// Parse markup into a document.
///
/// The result is not guaranteed to end with a newline; text outside any
/// block element is inserted as-is.
pub fn from_markup(markup: &str) -> Delta {
  let mut delta = Delta::new();
  let mut inline: SmallVec<[Inline; 4]> = SmallVec::new();
  let mut block: Option<AttributeMap> = None;
  let mut line_has_content = false;

  let current_inline = |inline: &[Inline]| -> Option<AttributeMap> {
    Some(
      inline
        .iter()
        .map(|entry| (entry.format.to_string(), entry.value.clone()))
        .collect(),
    )
  };

  for token in tokenize(markup) {
    match token {
      Token::Text(text) => {
        if block.is_none() && text.trim().is_empty() {
          continue;
        }
        let text = decode_entities(&text.replace(['\n', '\r'], " "));
        if text.is_empty() {
          continue;
        }
        delta.insert(text, current_inline(&inline));
        line_has_content = true;
      },
      Token::Open { name, attributes } => {
        if let Some(format) = block_format(&name) {
          if line_has_content {
            delta.insert("\n", block.take());
          }
          block = Some(format);
          line_has_content = false;
        } else if name == "br" {
          if line_has_content {
            delta.insert("\n", block.clone());
            line_has_content = false;
          }
        } else if let Some((format, value)) = inline_format(&name, &attributes) {
          inline.push(Inline {
            tag: name,
            format,
            value,
          });
        }
      },
      Token::Close(name) => {
        if block_format(&name).is_some() {
          if block.is_some() {
            delta.insert("\n", block.take());
            line_has_content = false;
          }
        } else if let Some(pos) = inline.iter().rposition(|entry| entry.tag == name) {
          inline.remove(pos);
        }
      },
    }
  }

  delta
}
