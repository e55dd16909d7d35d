//! Content model shared by the engine and the binding layer.
//!
//! - [`delta`]: operation-log documents and changes ([`delta::Delta`]).
//! - [`attributes`]: formatting attribute maps and their composition.
//! - [`selection`]: nullable `{index, length}` ranges and bounds clamping.
//! - [`value`]: the two accepted value representations and their equality.

use smartstring::{
  LazyCompact,
  SmartString,
};

pub mod attributes;
pub mod delta;
pub mod selection;
pub mod value;

pub type Tendril = SmartString<LazyCompact>;
