//! The auto-mine state machine
//!
//! Pure transition functions over [`SchedulerState`]. Each returns a
//! [`Transition`] telling the caller what to do with the periodic timer;
//! the async driver in the parent module applies it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of the periodic mining loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchedulerState {
    /// No tick is pending
    #[default]
    Stopped,
    /// Ticking every period
    Running,
    /// A stop was requested; the pending tick runs once more and then halts
    StopRequested,
}

/// What the driver must do with the periodic timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Leave the timer as it is
    Keep,
    /// Arm the first tick one period from now
    Arm,
    /// Re-arm one period after the tick that just ran
    Rearm,
    /// Cancel the timer
    Disarm,
}

/// Outcome of feeding one input to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State before the input
    pub from: SchedulerState,
    /// State after the input
    pub to: SchedulerState,
    /// Timer effect
    pub timer: TimerAction,
}

impl Transition {
    fn new(from: SchedulerState, to: SchedulerState, timer: TimerAction) -> Self {
        Self { from, to, timer }
    }

    /// Whether the input changed the state
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

impl SchedulerState {
    /// A start request.
    ///
    /// Resuming from `StopRequested` keeps the timer that is already
    /// pending, so the loop never runs two timers at once.
    pub fn on_start(self) -> Transition {
        match self {
            SchedulerState::Stopped => {
                Transition::new(self, SchedulerState::Running, TimerAction::Arm)
            }
            SchedulerState::StopRequested => {
                Transition::new(self, SchedulerState::Running, TimerAction::Keep)
            }
            SchedulerState::Running => Transition::new(self, self, TimerAction::Keep),
        }
    }

    /// A stop request. The pending tick still fires.
    pub fn on_stop(self) -> Transition {
        match self {
            SchedulerState::Running => {
                Transition::new(self, SchedulerState::StopRequested, TimerAction::Keep)
            }
            SchedulerState::Stopped | SchedulerState::StopRequested => {
                Transition::new(self, self, TimerAction::Keep)
            }
        }
    }

    /// A periodic tick whose cycle has just completed
    pub fn on_tick(self) -> Transition {
        match self {
            SchedulerState::Running => Transition::new(self, self, TimerAction::Rearm),
            SchedulerState::StopRequested | SchedulerState::Stopped => {
                Transition::new(self, SchedulerState::Stopped, TimerAction::Disarm)
            }
        }
    }

    /// Whether a periodic tick is pending in this state
    pub fn has_pending_tick(self) -> bool {
        !matches!(self, SchedulerState::Stopped)
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerState::Stopped => write!(f, "stopped"),
            SchedulerState::Running => write!(f, "running"),
            SchedulerState::StopRequested => write!(f, "stop-requested"),
        }
    }
}
