//! The capability set consumed from a rich-text editing engine, plus
//! [`MemoryEngine`], a plain-data implementation of it.

pub mod engine;
pub mod host;
pub mod markup;
pub mod memory;

pub use engine::{
  Bounds,
  EditorRead,
  Engine,
  EngineConfig,
  EngineEvent,
  Source,
};
pub use host::{
  AuxiliaryElement,
  EditorId,
  ElementTemplate,
  Generation,
  HostDocument,
  Owner,
  Surface,
};
pub use memory::MemoryEngine;
