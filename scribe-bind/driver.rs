//! Drives a [`Controller`] from a command channel on a tokio runtime.
//!
//! The loop waits for the next host command, but never past the
//! controller's debounce deadline; when the deadline wins, the pending
//! debounced change is flushed. Deferred work runs before every wait.
//!
//! Give the controller a [`scribe_event::TokioClock`] so its deadlines follow
//! the runtime's clock, paused or not.

use std::fmt;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
  controller::Controller,
  error::Result,
  props::{
    KeyEvent,
    KeyEventKind,
    Props,
  },
};

pub enum HostCommand<E> {
  Update(Props),
  Edit(Box<dyn FnOnce(&mut E)>),
  Focus,
  Blur,
  Key(KeyEventKind, KeyEvent),
  Unmount,
}

impl<E> HostCommand<E> {
  pub fn edit(f: impl FnOnce(&mut E) + 'static) -> Self {
    HostCommand::Edit(Box::new(f))
  }
}

impl<E> fmt::Debug for HostCommand<E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      HostCommand::Update(props) => f.debug_tuple("Update").field(props).finish(),
      HostCommand::Edit(_) => f.write_str("Edit"),
      HostCommand::Focus => f.write_str("Focus"),
      HostCommand::Blur => f.write_str("Blur"),
      HostCommand::Key(kind, event) => f.debug_tuple("Key").field(kind).field(event).finish(),
      HostCommand::Unmount => f.write_str("Unmount"),
    }
  }
}

/// Process commands until `Unmount` arrives or every sender is gone.
///
/// Errors from [`Controller::update`] and [`Controller::edit`] end the loop
/// and are returned.
pub async fn run<E: scribe_engine::Engine>(
  controller: &mut Controller<E>,
  mut commands: UnboundedReceiver<HostCommand<E>>,
) -> Result<()> {
  loop {
    controller.run_microtasks();

    let command = match controller.next_deadline() {
      Some(deadline) => {
        match tokio::time::timeout_at(deadline.into(), commands.recv()).await {
          Ok(command) => command,
          Err(_) => {
            controller.poll_timers();
            continue;
          },
        }
      },
      None => commands.recv().await,
    };
    let Some(command) = command else {
      break;
    };

    log::trace!("host command {command:?}");
    match command {
      HostCommand::Update(props) => {
        controller.update(props)?;
      },
      HostCommand::Edit(edit) => controller.edit(edit)?,
      HostCommand::Focus => controller.focus(),
      HostCommand::Blur => controller.blur(),
      HostCommand::Key(kind, event) => controller.handle_key(kind, &event),
      HostCommand::Unmount => {
        controller.unmount();
        break;
      },
    }
  }

  Ok(())
}
