//! The lifecycle controller.
//!
//! A [`Controller`] owns one engine instance at a time and reconciles it
//! with the props the host renders:
//!
//! ```text
//! Uninstantiated --mount--> Active --regeneration prop--> Regenerating --> Active (generation + 1)
//!                              |                                              |
//!                              +------------------unmount---------------------+--> Destroyed
//! ```
//!
//! The controller never blocks and never spawns. Engine events queue up in a
//! channel and are dispatched whenever the controller gets control back (the
//! end of `mount`, `update`, `edit`, ...). Two kinds of deferred work are left
//! for the host to drive:
//!
//! - [`Controller::run_microtasks`] after each synchronous turn, which
//!   restores selections that a content write displaced,
//! - [`Controller::poll_timers`] once [`Controller::next_deadline`] passes,
//!   which flushes the debounced change summary.
//!
//! [`crate::driver::run`] does both on a tokio runtime.

use std::{
  rc::Rc,
  time::Instant,
};

use scribe_core::{
  delta::Delta,
  selection::SelectionRange,
  value::{
    Value,
    values_equal,
  },
};
use scribe_engine::{
  EditorId,
  EditorRead,
  Engine,
  EngineEvent,
  Generation,
  HostDocument,
  Owner,
  Source,
  Surface,
};
use scribe_event::{
  Clock,
  SystemClock,
  TaskQueue,
};
use tokio::sync::mpsc::{
  self,
  UnboundedReceiver,
};

use crate::{
  aggregate::ChangeAggregator,
  content::{
    apply_content,
    read_value,
  },
  error::{
    EditorError,
    Result,
  },
  fanout::{
    FanOut,
    Tracked,
  },
  props::{
    DebouncedChange,
    KeyEvent,
    KeyEventKind,
    Props,
    regeneration_props_changed,
    render_props_changed,
    validate_props,
  },
  selection::{
    Deferred,
    restore_selection,
  },
  view::EditorView,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
  Uninstantiated,
  Active,
  Regenerating,
  Destroyed,
}

/// What the host should do after [`Controller::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
  /// Nothing visible changed.
  Skip,
  /// Re-render the surrounding container.
  Render,
  /// The engine was rebuilt on a new surface; mount it under its new key.
  Regenerated(Generation),
}

impl UpdateOutcome {
  pub fn should_render(&self) -> bool {
    !matches!(self, UpdateOutcome::Skip)
  }
}

/// Document and selection carried across a regeneration.
#[derive(Debug)]
struct Snapshot {
  contents:  Delta,
  selection: Option<SelectionRange>,
}

pub struct Controller<E: Engine> {
  id:         EditorId,
  props:      Props,
  state:      LifecycleState,
  generation: Generation,
  engine:     Option<E>,
  surface:    Option<Surface>,
  host:       HostDocument,
  events:     Option<UnboundedReceiver<EngineEvent>>,
  tracked:    Tracked,
  aggregator: ChangeAggregator,
  microtasks: TaskQueue<Deferred>,
  clock:      Rc<dyn Clock>,
}

impl<E: Engine> Controller<E> {
  /// Validate `props` and seed the tracked value from `value`, falling back
  /// to `default_value`.
  pub fn new(props: Props, host: HostDocument) -> Result<Self> {
    validate_props(&props)?;

    let tracked = Tracked {
      value: props.value.clone().or_else(|| props.default_value.clone()),
      ..Default::default()
    };
    let aggregator = ChangeAggregator::new(props.options.debounce_window());

    Ok(Self {
      id: host.register(),
      props,
      state: LifecycleState::Uninstantiated,
      generation: Generation::default(),
      engine: None,
      surface: None,
      host,
      events: None,
      tracked,
      aggregator,
      microtasks: TaskQueue::new(),
      clock: Rc::new(SystemClock),
    })
  }

  #[must_use]
  pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
    self.clock = Rc::new(clock);
    self
  }

  /// Identity of this editor within its host document.
  pub fn id(&self) -> EditorId {
    self.id
  }

  pub fn state(&self) -> LifecycleState {
    self.state
  }

  pub fn generation(&self) -> Generation {
    self.generation
  }

  pub fn props(&self) -> &Props {
    &self.props
  }

  /// Surface of the live engine.
  pub fn surface(&self) -> Option<&Surface> {
    self.surface.as_ref()
  }

  /// The value the controller believes the editor shows.
  pub fn value(&self) -> Option<&Value> {
    self.tracked.value.as_ref()
  }

  /// The last selection reported by the engine.
  pub fn selection(&self) -> Option<SelectionRange> {
    self.tracked.selection
  }

  pub fn pending_microtasks(&self) -> usize {
    self.microtasks.len()
  }

  /// Create the engine and show the tracked value. Mounting again after
  /// [`Controller::unmount`] builds a fresh instance.
  ///
  /// The document shown once the value is applied is the first baseline of
  /// `on_change_debounced`.
  pub fn mount(&mut self) {
    if self.engine.is_some() {
      log::warn!("editor {} is already mounted", self.generation);
      return;
    }

    self.instantiate();
    if let Some(value) = self.tracked.value.clone() {
      self.apply_value(value);
    }
    self.process_events();

    if let Some(engine) = self.engine.as_ref() {
      self.aggregator.reseed(engine.contents());
    }
  }

  /// Reconcile the editor with the next props.
  ///
  /// Invalid props are rejected before anything changes. Otherwise the
  /// read-only flag, then the controlled value, then the render decision are
  /// handled in that order. Events caused along the way are dispatched to
  /// the outgoing callbacks.
  pub fn update(&mut self, next: Props) -> Result<UpdateOutcome> {
    validate_props(&next)?;
    if let (Some(value), Some(emitted)) = (&next.value, &self.tracked.last_emitted)
      && value.is_same_delta(emitted)
    {
      return Err(EditorError::DeltaFedBack);
    }

    if let Some(engine) = self.engine.as_mut() {
      if next.options.read_only != self.props.options.read_only {
        engine.enable(!next.options.read_only);
      }
      if next.options.tab_index != self.props.options.tab_index {
        engine.set_tab_index(next.options.tab_index);
      }
    }

    if let Some(value) = &next.value {
      let unchanged = self
        .tracked
        .value
        .as_ref()
        .is_some_and(|tracked| values_equal(tracked, value));
      if !unchanged {
        self.apply_value(value.clone());
      }
    }

    self.process_events();

    let dirty = regeneration_props_changed(&self.props, &next);
    let render = dirty || render_props_changed(&self.props, &next);
    let regenerate = dirty && self.engine.is_some();
    let snapshot = regenerate.then(|| self.teardown_for_regeneration());

    self.props = next;
    self
      .aggregator
      .set_window(self.props.options.debounce_window());

    if let Some(snapshot) = snapshot {
      self.restore(snapshot);
      return Ok(UpdateOutcome::Regenerated(self.generation));
    }

    Ok(if render {
      UpdateOutcome::Render
    } else {
      UpdateOutcome::Skip
    })
  }

  /// Tear the engine down. A pending debounced change is dropped, not
  /// flushed.
  pub fn unmount(&mut self) {
    if self.aggregator.cancel() {
      log::debug!("cancelled debounce timer of editor {}", self.generation);
    }
    let external_toolbar = self.props.options.has_external_toolbar();
    self.destroy_engine(external_toolbar);
    self.microtasks.clear();
    self.tracked.selection = None;
    self.state = LifecycleState::Destroyed;
  }

  /// The live engine.
  pub fn editor(&self) -> Result<&E> {
    self.engine.as_ref().ok_or(EditorError::NotInstantiated)
  }

  /// Run `f` against the live engine, then dispatch whatever it caused.
  pub fn edit<R>(&mut self, f: impl FnOnce(&mut E) -> R) -> Result<R> {
    let engine = self.engine.as_mut().ok_or(EditorError::NotInstantiated)?;
    let result = f(engine);
    self.process_events();
    Ok(result)
  }

  pub fn focus(&mut self) {
    if let Some(engine) = self.engine.as_mut() {
      engine.focus();
    }
    self.process_events();
  }

  pub fn blur(&mut self) {
    if let Some(engine) = self.engine.as_mut() {
      engine.blur();
    }
    self.process_events();
  }

  /// Forward a key event from the editing surface to its callback.
  pub fn handle_key(&mut self, kind: KeyEventKind, event: &KeyEvent) {
    if let Some(callback) = self.props.callbacks.key_mut(kind) {
      callback(event);
    }
  }

  /// Dispatch every engine event queued so far. Returns how many there were.
  pub fn process_events(&mut self) -> usize {
    let Some(events) = self.events.as_mut() else {
      return 0;
    };
    let mut batch = Vec::new();
    while let Ok(event) = events.try_recv() {
      batch.push(event);
    }
    let Some(engine) = self.engine.as_ref() else {
      return 0;
    };

    let count = batch.len();
    let compose = |a: &Delta, b: &Delta| engine.compose(a, b);
    let mut fanout = FanOut {
      editor:     engine,
      tracked:    &mut self.tracked,
      callbacks:  &mut self.props.callbacks,
      aggregator: &mut self.aggregator,
      compose:    &compose,
      now:        self.clock.now(),
    };
    for event in batch {
      fanout.dispatch(event);
    }
    count
  }

  /// Run deferred work. Tasks from an earlier generation are dropped.
  pub fn run_microtasks(&mut self) -> usize {
    let mut ran = 0;
    loop {
      let tasks = self.microtasks.take();
      if tasks.is_empty() {
        break;
      }
      for task in tasks {
        match task {
          Deferred::RestoreSelection { generation, range } => {
            let engine = match self.engine.as_mut() {
              Some(engine) if generation == self.generation => engine,
              _ => {
                log::trace!("dropping selection restore for stale editor {generation}");
                continue;
              },
            };
            restore_selection(engine, range);
            ran += 1;
          },
        }
      }
      self.process_events();
    }
    ran
  }

  /// Flush the debounced change summary if it is due.
  pub fn poll_timers(&mut self) -> bool {
    let Some(flush) = self.aggregator.poll(self.clock.now()) else {
      return false;
    };
    let Some(engine) = self.engine.as_ref() else {
      return false;
    };

    let value = read_value(engine, self.tracked.value.as_ref());
    if let Some(on_change_debounced) = self.props.callbacks.on_change_debounced.as_mut() {
      on_change_debounced(&DebouncedChange {
        value:    &value,
        baseline: &flush.baseline,
        delta:    &flush.cumulative,
        source:   flush.source,
        editor:   EditorView::new(engine),
      });
    }
    self.aggregator.rebase(engine.contents());
    true
  }

  /// When [`Controller::poll_timers`] next has work.
  pub fn next_deadline(&self) -> Option<Instant> {
    self.aggregator.deadline()
  }

  fn make_surface(&self) -> Surface {
    let options = &self.props.options;
    let owner = Owner::new(self.id, self.generation);
    let mut surface = Surface::new(owner, self.host.clone());
    match self.props.children.first() {
      Some(child) => {
        surface.tag = child.tag.clone();
        surface.markup = child.markup.clone();
      },
      None if options.preserve_whitespace => surface.tag = "pre".to_string(),
      None => {},
    }
    surface.id = options.id.clone();
    surface.class_name = options.class_name.clone();
    surface.style = options.style.clone();
    surface
  }

  fn instantiate(&mut self) {
    let surface = self.make_surface();
    let mut engine = E::construct(&surface, self.props.options.engine_config());
    if self.props.options.tab_index.is_some() {
      engine.set_tab_index(self.props.options.tab_index);
    }

    let (tx, rx) = mpsc::unbounded_channel();
    engine.subscribe(tx);

    log::debug!("editor {} instantiated as {}", self.generation, surface.key());
    self.events = Some(rx);
    self.engine = Some(engine);
    self.surface = Some(surface);
    self.state = LifecycleState::Active;
  }

  /// Track `value` and write it into the engine, restoring the selection
  /// on the next turn.
  fn apply_value(&mut self, value: Value) {
    self.tracked.value = Some(value.clone());
    let Some(engine) = self.engine.as_mut() else {
      return;
    };
    let selection = engine.selection();
    apply_content(engine, &value);
    self.defer_restore(selection);
  }

  fn defer_restore(&mut self, range: Option<SelectionRange>) {
    self.microtasks.defer(Deferred::RestoreSelection {
      generation: self.generation,
      range,
    });
  }

  fn destroy_engine(&mut self, external_toolbar: bool) {
    let Some(mut engine) = self.engine.take() else {
      return;
    };
    engine.unsubscribe();
    self.events = None;
    drop(engine);
    self.surface = None;

    if external_toolbar {
      return;
    }
    let owner = Owner::new(self.id, self.generation);
    for orphan in self.host.remove_owned(E::AUXILIARY_CLASS, owner) {
      log::debug!("removed leftover {} of editor {owner}", orphan.class);
    }
  }

  fn teardown_for_regeneration(&mut self) -> Snapshot {
    self.state = LifecycleState::Regenerating;
    let snapshot = match self.engine.as_ref() {
      Some(engine) => {
        Snapshot {
          contents:  engine.contents(),
          selection: engine.selection(),
        }
      },
      None => {
        Snapshot {
          contents:  Delta::new(),
          selection: None,
        }
      },
    };
    let external_toolbar = self.props.options.has_external_toolbar();
    self.destroy_engine(external_toolbar);
    self.generation = self.generation.next();
    snapshot
  }

  fn restore(&mut self, snapshot: Snapshot) {
    self.instantiate();
    if let Some(engine) = self.engine.as_mut() {
      engine.set_contents(snapshot.contents, Source::Api);
    }
    self.defer_restore(snapshot.selection);
    self.process_events();
  }
}
