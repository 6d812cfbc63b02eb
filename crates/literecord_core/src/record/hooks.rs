//! Lifecycle callbacks around create, update and save.
//!
//! A record type opts in by returning itself from
//! [`ActiveRecord::hooks`](super::ActiveRecord::hooks); types that do not are
//! never probed further. Within [`LifecycleHooks`] every method defaults to a
//! no-op, so a type overrides only the points it cares about.

use super::ActiveRecord;
use log::debug;

/// Outcome of a before-hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookFlow {
    #[default]
    Continue,
    /// Stop the operation; it reports `false` and issues no SQL.
    Abort,
}

impl From<bool> for HookFlow {
    fn from(proceed: bool) -> Self {
        if proceed {
            Self::Continue
        } else {
            Self::Abort
        }
    }
}

impl From<()> for HookFlow {
    fn from(_: ()) -> Self {
        Self::Continue
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    Create,
    Update,
    Save,
}

impl HookEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Save => "save",
        }
    }
}

pub trait LifecycleHooks {
    fn before_create(&mut self) -> HookFlow {
        HookFlow::Continue
    }

    fn after_create(&mut self) {}

    fn before_update(&mut self) -> HookFlow {
        HookFlow::Continue
    }

    fn after_update(&mut self) {}

    fn before_save(&mut self) -> HookFlow {
        HookFlow::Continue
    }

    fn after_save(&mut self) {}
}

/// Runs the before-hook for `event` when the record exposes hooks.
pub(crate) fn run_before<R: ActiveRecord>(record: &mut R, event: HookEvent) -> HookFlow {
    let Some(hooks) = record.hooks() else {
        return HookFlow::Continue;
    };
    let flow = match event {
        HookEvent::Create => hooks.before_create(),
        HookEvent::Update => hooks.before_update(),
        HookEvent::Save => hooks.before_save(),
    };
    if flow == HookFlow::Abort {
        debug!(
            "event=hook_veto module=record status=abort hook=before_{} table={}",
            event.as_str(),
            R::descriptor().table()
        );
    }
    flow
}

/// Runs the after-hook for `event` when the record exposes hooks.
pub(crate) fn run_after<R: ActiveRecord>(record: &mut R, event: HookEvent) {
    let Some(hooks) = record.hooks() else {
        return;
    };
    match event {
        HookEvent::Create => hooks.after_create(),
        HookEvent::Update => hooks.after_update(),
        HookEvent::Save => hooks.after_save(),
    }
}
