//! Auto-mine scheduler
//!
//! Runs [`MiningCycle`]s on a fixed period or one at a time. All commands,
//! ticks and tip updates for one scheduler funnel through a single tokio
//! task that owns the [`HeaderBuffer`], so cycles never overlap and header
//! mutations land between cycles.

use crate::crypto::{DisplayHash, DoubleDigest, HashAlgorithm};
use crate::cycle::{Clock, MiningCycle, SystemClock};
use crate::header::HeaderBuffer;
use crate::sink::EventSink;
use crate::tip::{NoopPollControl, PollControl, TipFollower};
use crate::types::BlockHeader;
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub mod state;

pub use state::{SchedulerState, TimerAction, Transition};

/// Default period between auto-mine cycles
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(250);

/// Engine options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Period between cycles while running
    pub tick_period: Duration,
    /// Hash primitive for the double digest
    pub algorithm: HashAlgorithm,
    /// Start mining on header load and mirror start/stop to the poll layer
    pub follow_tip: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_period: DEFAULT_TICK_PERIOD,
            algorithm: HashAlgorithm::default(),
            follow_tip: false,
        }
    }
}

/// Point-in-time view of a scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current state
    pub state: SchedulerState,
    /// Whether a periodic tick is pending
    pub tick_armed: bool,
    /// Copy of the header
    pub header: HeaderBuffer,
}

#[derive(Debug)]
pub(crate) enum Command {
    Start,
    Stop,
    StepOnce,
    NewTip(DisplayHash),
    LoadHeader(BlockHeader),
    Snapshot(oneshot::Sender<Snapshot>),
}

/// Handle to a running scheduler.
///
/// Every method is fire-and-forget except [`snapshot`](Self::snapshot) and
/// [`shutdown`](Self::shutdown). Commands are applied in the order they are
/// sent. Dropping the handle stops the engine task.
#[derive(Debug)]
pub struct MineScheduler {
    tx: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<HeaderBuffer>>,
}

impl MineScheduler {
    /// Spawn a scheduler over `header` using wall-clock time and no poll layer.
    ///
    /// Must be called from within a tokio runtime. The header is moved in;
    /// nothing else can mutate it until [`shutdown`](Self::shutdown) hands it back.
    pub fn spawn<S>(header: HeaderBuffer, config: SchedulerConfig, sink: S) -> Self
    where
        S: EventSink + 'static,
    {
        Self::spawn_with(
            header,
            config,
            Arc::new(sink),
            Arc::new(SystemClock),
            Arc::new(NoopPollControl),
        )
    }

    /// Spawn a scheduler with explicit collaborators
    pub fn spawn_with(
        header: HeaderBuffer,
        config: SchedulerConfig,
        sink: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
        poll: Arc<dyn PollControl>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        info!(
            tick_period = ?config.tick_period,
            algorithm = %config.algorithm,
            follow_tip = config.follow_tip,
            "Spawning mine scheduler"
        );

        let engine = Engine {
            header,
            state: SchedulerState::Stopped,
            next_tick: None,
            tick_period: config.tick_period,
            follow_tip: config.follow_tip,
            cycle: MiningCycle::new(DoubleDigest::new(config.algorithm), clock),
            sink,
            poll,
        };
        let handle = tokio::spawn(engine.run(rx, cancel.clone()));

        Self {
            tx,
            cancel,
            handle: Some(handle),
        }
    }

    /// Begin or resume periodic mining
    pub fn start(&self) -> Result<()> {
        self.send(Command::Start)
    }

    /// Request a stop; the pending tick still runs once
    pub fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    /// Run exactly one cycle on the engine task, whatever the state
    pub fn step_once(&self) -> Result<()> {
        self.send(Command::StepOnce)
    }

    /// Replace the header between cycles.
    ///
    /// In follow-tip mode this also starts mining.
    pub fn load_header(&self, header: BlockHeader) -> Result<()> {
        self.send(Command::LoadHeader(header))
    }

    /// Overwrite the previous-block hash with a display-order tip
    pub fn on_new_tip(&self, hash_display_order: &[u8]) -> Result<()> {
        self.tip_follower().on_new_tip(hash_display_order)
    }

    /// Overwrite the previous-block hash with a display-order hex tip
    pub fn on_new_tip_hex(&self, hash_display_hex: &str) -> Result<()> {
        self.tip_follower().on_new_tip_hex(hash_display_hex)
    }

    /// An inbound handle for a tip poller
    pub fn tip_follower(&self) -> TipFollower {
        TipFollower::new(self.tx.clone())
    }

    /// Current state, answered after every previously sent command
    pub async fn snapshot(&self) -> Result<Snapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Snapshot(reply_tx))?;
        reply_rx
            .await
            .map_err(|_| Error::misuse("scheduler stopped before answering"))
    }

    /// Stop the engine task and take the header back.
    ///
    /// Commands already queued are dropped; a cycle in progress completes.
    pub async fn shutdown(mut self) -> Result<HeaderBuffer> {
        self.cancel.cancel();
        let handle = self
            .handle
            .take()
            .ok_or_else(|| Error::misuse("scheduler already shut down"))?;
        handle
            .await
            .map_err(|e| Error::misuse(format!("scheduler task failed: {}", e)))
    }

    fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(command)
            .map_err(|_| Error::misuse("scheduler is no longer running"))
    }
}

impl Drop for MineScheduler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// State owned by the engine task
struct Engine {
    header: HeaderBuffer,
    state: SchedulerState,
    next_tick: Option<Instant>,
    tick_period: Duration,
    follow_tip: bool,
    cycle: MiningCycle,
    sink: Arc<dyn EventSink>,
    poll: Arc<dyn PollControl>,
}

impl Engine {
    async fn run(
        mut self,
        mut rx: mpsc::UnboundedReceiver<Command>,
        cancel: CancellationToken,
    ) -> HeaderBuffer {
        loop {
            let next_tick = self.next_tick;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                command = rx.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                _ = wait_for(next_tick) => self.tick(),
            }
        }

        info!(state = %self.state, nonce = self.header.nonce(), "Mine scheduler stopped");
        self.header
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Start => self.start(),
            Command::Stop => {
                let transition = self.state.on_stop();
                self.apply(transition);
                if transition.changed() && self.follow_tip {
                    self.poll.pause_poll();
                }
            }
            Command::StepOnce => {
                debug!(state = %self.state, "Single step");
                self.cycle.run(&mut self.header, self.sink.as_ref());
            }
            Command::NewTip(tip) => {
                debug!(tip = %tip, "Applying new tip");
                self.header.set_previous_hash_display(&tip);
            }
            Command::LoadHeader(header) => {
                info!(header = %header, "Loading header");
                self.header = HeaderBuffer::from_header(&header);
                if self.follow_tip {
                    self.start();
                }
            }
            Command::Snapshot(reply) => {
                let snapshot = Snapshot {
                    state: self.state,
                    tick_armed: self.next_tick.is_some(),
                    header: self.header.clone(),
                };
                if reply.send(snapshot).is_err() {
                    warn!("Snapshot requester went away");
                }
            }
        }
    }

    fn start(&mut self) {
        let transition = self.state.on_start();
        self.apply(transition);
        if transition.changed() && self.follow_tip {
            self.poll.start_poll();
        }
    }

    fn tick(&mut self) {
        self.cycle.run(&mut self.header, self.sink.as_ref());
        let transition = self.state.on_tick();
        self.apply(transition);
    }

    fn apply(&mut self, transition: Transition) {
        if transition.changed() {
            debug!(from = %transition.from, to = %transition.to, "Scheduler transition");
        }
        self.state = transition.to;

        let now = Instant::now();
        match transition.timer {
            TimerAction::Keep => {}
            TimerAction::Arm => self.next_tick = Some(now + self.tick_period),
            TimerAction::Rearm => {
                // Late ticks are delayed, not bursted
                let next = self
                    .next_tick
                    .map(|last| last + self.tick_period)
                    .filter(|next| *next > now)
                    .unwrap_or(now + self.tick_period);
                self.next_tick = Some(next);
            }
            TimerAction::Disarm => self.next_tick = None,
        }
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
