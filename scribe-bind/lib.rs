//! Binds a stateful rich-text engine into a host that re-renders with new
//! props.
//!
//! The host creates a [`Controller`] with its first [`Props`], calls
//! [`Controller::mount`] once the surface exists, and [`Controller::update`]
//! on every re-render. The controller decides whether the engine can be
//! patched in place or has to be regenerated, keeps a controlled value in
//! sync, and turns the engine's change channel into the callbacks on
//! [`props::Callbacks`].

pub mod aggregate;
pub mod config;
pub mod content;
pub mod controller;
pub mod driver;
pub mod error;
pub mod fanout;
pub mod props;
pub mod selection;
pub mod view;

pub use controller::{
  Controller,
  LifecycleState,
  UpdateOutcome,
};
pub use error::{
  EditorError,
  ErrorKind,
  Result,
};
pub use props::{
  EditorOptions,
  Props,
};
pub use scribe_engine::ElementTemplate;
pub use view::EditorView;
