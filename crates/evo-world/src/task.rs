//! Timed, abortable, single-fire actions.
//!
//! A task counts down once per tick. Before each countdown step it runs its
//! validation hook; a failed validation aborts the task for good and the
//! completion action never fires. `S` is the task owner, `W` the world the
//! hooks may read or mutate.

use std::fmt;
use tracing::trace;

type Validate<S, W> = Box<dyn FnMut(&S, &W) -> bool>;
type Update<S, W> = Box<dyn FnMut(&mut S, &mut W)>;
type Action<S, W> = Box<dyn FnOnce(&mut S, &mut W)>;

/// What a task is doing, for status display
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TaskKind {
    Consume,
    Gestate,
    Wean,
}

impl TaskKind {
    pub fn verb(&self) -> &'static str {
        match self {
            TaskKind::Consume => "consuming",
            TaskKind::Gestate => "gestating",
            TaskKind::Wean => "weaning",
        }
    }
}

/// Lifecycle of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Done,
    Aborted,
}

pub struct Task<S, W> {
    kind: TaskKind,
    timer: u32,
    validate: Option<Validate<S, W>>,
    update: Option<Update<S, W>>,
    action: Option<Action<S, W>>,
    aborted: bool,
}

impl<S, W> Task<S, W> {
    pub fn new(kind: TaskKind, timer: u32) -> Self {
        Self {
            kind,
            timer,
            validate: None,
            update: None,
            action: None,
            aborted: false,
        }
    }

    /// Checked before every tick; returning `false` aborts the task
    pub fn with_validation(mut self, validate: impl FnMut(&S, &W) -> bool + 'static) -> Self {
        self.validate = Some(Box::new(validate));
        self
    }

    /// Runs on every successful tick, after the countdown
    pub fn with_update(mut self, update: impl FnMut(&mut S, &mut W) + 'static) -> Self {
        self.update = Some(Box::new(update));
        self
    }

    /// Runs once, on the tick the countdown reaches zero
    pub fn with_action(mut self, action: impl FnOnce(&mut S, &mut W) + 'static) -> Self {
        self.action = Some(Box::new(action));
        self
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn timer(&self) -> u32 {
        self.timer
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn is_running(&self) -> bool {
        self.state() == TaskState::Pending
    }

    pub fn state(&self) -> TaskState {
        if self.aborted {
            TaskState::Aborted
        } else if self.timer == 0 {
            TaskState::Done
        } else {
            TaskState::Pending
        }
    }

    /// Advance the task by one tick
    pub fn tick(&mut self, owner: &mut S, world: &mut W) -> TaskState {
        if self.state() != TaskState::Pending {
            return self.state();
        }

        if let Some(validate) = self.validate.as_mut() {
            if !validate(owner, world) {
                self.aborted = true;
                self.action = None;
                trace!(task = self.kind.verb(), timer = self.timer, "Task aborted");
                return TaskState::Aborted;
            }
        }

        self.timer -= 1;
        if let Some(update) = self.update.as_mut() {
            update(owner, world);
        }

        if self.timer == 0 {
            if let Some(action) = self.action.take() {
                action(owner, world);
            }
            trace!(task = self.kind.verb(), "Task done");
        }

        self.state()
    }
}

impl<S, W> fmt::Debug for Task<S, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("kind", &self.kind)
            .field("timer", &self.timer)
            .field("aborted", &self.aborted)
            .field("has_action", &self.action.is_some())
            .finish()
    }
}
