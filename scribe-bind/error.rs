use thiserror::Error;

pub type Result<T> = std::result::Result<T, EditorError>;

/// Broad class of a failure, for callers that only care how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The props describe something that cannot be mounted.
  Configuration,
  /// The operation needs a live editor.
  Precondition,
  /// The caller is using the controller in a way that would loop.
  Misuse,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EditorError {
  #[error("editor not yet instantiated")]
  NotInstantiated,
  #[error("the editor takes a single child element, got {0}")]
  MultipleChildren(usize),
  #[error("<{0}> cannot be used as the editing area")]
  ForbiddenChild(String),
  #[error(
    "the value is the delta emitted by the last change event; pass the editor contents (or a copy) \
     instead of the change payload"
  )]
  DeltaFedBack,
}

impl EditorError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      EditorError::NotInstantiated => ErrorKind::Precondition,
      EditorError::MultipleChildren(_) | EditorError::ForbiddenChild(_) => ErrorKind::Configuration,
      EditorError::DeltaFedBack => ErrorKind::Misuse,
    }
  }
}
