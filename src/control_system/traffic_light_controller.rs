use std::collections::VecDeque;

use tokio::sync::{mpsc, watch};

use crate::global_variables::PREEMPT_MAILBOX_CAPACITY;
use crate::simulation_engine::clock::TickBarrier;
use crate::simulation_engine::directions::Direction;
use crate::simulation_engine::lights::{IntersectionState, Regime, SharedLights};

/// Asynchronous notifications for the preemption protocol. These travel
/// on their own mailbox, never through the tick barrier, so they stay
/// observable while actors are parked at the rendezvous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreemptCommand {
    Request(Direction),
    Release,
}

/// Fire-and-forget sender side of the preemption mailbox.
#[derive(Clone)]
pub struct PreemptionHandle {
    tx: mpsc::Sender<PreemptCommand>,
}

impl PreemptionHandle {
    pub fn request_preemption(&self, direction: Direction) {
        self.send(PreemptCommand::Request(direction));
    }

    pub fn release_preemption(&self) {
        self.send(PreemptCommand::Release);
    }

    fn send(&self, command: PreemptCommand) {
        match self.tx.try_send(command) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(command)) => {
                log::warn!("[Lights] control mailbox full, dropping {:?}", command);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                log::debug!("[Lights] control mailbox closed");
            }
        }
    }
}

/// Builds the preemption mailbox pair: the handle goes to the
/// coordinator, the receiver to the light controller.
pub fn preemption_mailbox() -> (PreemptionHandle, mpsc::Receiver<PreemptCommand>) {
    let (tx, rx) = mpsc::channel(PREEMPT_MAILBOX_CAPACITY);
    (PreemptionHandle { tx }, rx)
}

/// Owns the shared light state and drives it one update per tick.
///
/// NORMAL regime holds one axis green for `hold_ticks` ticks, then flips.
/// PRIORITY(d) forces everything red except `d` and holds until the
/// coordinator releases it; further requests queue FIFO behind the active
/// one. Release re-enters NORMAL at its entry phase (North/South green),
/// the prior phase is deliberately not preserved.
pub struct TrafficLightController {
    lights: SharedLights,
    control_rx: mpsc::Receiver<PreemptCommand>,
    ready_tx: watch::Sender<u64>,
    barrier: TickBarrier,
    hold_ticks: u64,
    held: u64,
    regime: Regime,
    pending: VecDeque<Direction>,
}

impl TrafficLightController {
    pub fn new(
        lights: SharedLights,
        control_rx: mpsc::Receiver<PreemptCommand>,
        ready_tx: watch::Sender<u64>,
        barrier: TickBarrier,
        hold_ticks: u64,
    ) -> Self {
        Self {
            lights,
            control_rx,
            ready_tx,
            barrier,
            hold_ticks,
            held: 0,
            regime: Regime::Normal,
            pending: VecDeque::new(),
        }
    }

    pub fn regime(&self) -> Regime {
        self.regime
    }

    pub async fn run(mut self) {
        let mut tick: u64 = 1;
        loop {
            self.drain_control();
            self.update_cycle();
            // Publish "lights are valid for tick T"; the coordinator
            // waits on this before arbitrating.
            let _ = self.ready_tx.send(tick);
            self.barrier.wait().await;
            tick += 1;
        }
    }

    /// Commands sent at any point during the previous tick are applied
    /// here, before this tick's light computation: preemption latency is
    /// bounded by one tick.
    fn drain_control(&mut self) {
        while let Ok(command) = self.control_rx.try_recv() {
            self.apply(command);
        }
    }

    fn apply(&mut self, command: PreemptCommand) {
        match command {
            PreemptCommand::Request(direction) => match self.regime {
                // Already serving this direction; requests are idempotent.
                Regime::Priority(active) if active == direction => {}
                Regime::Priority(_) => {
                    if !self.pending.contains(&direction) {
                        self.pending.push_back(direction);
                    }
                }
                Regime::Normal => self.enter_priority(direction),
            },
            PreemptCommand::Release => match self.regime {
                Regime::Priority(active) => {
                    log::info!("[Lights] priority for {} released", active);
                    match self.pending.pop_front() {
                        Some(next) => self.enter_priority(next),
                        None => self.enter_normal(),
                    }
                }
                // Releasing while already normal is a no-op.
                Regime::Normal => {}
            },
        }
    }

    fn enter_priority(&mut self, direction: Direction) {
        log::info!("[Lights] entering priority regime for {}", direction);
        self.regime = Regime::Priority(direction);
        self.lights.lock().unwrap().set_priority(direction);
    }

    fn enter_normal(&mut self) {
        self.regime = Regime::Normal;
        self.held = 0;
        *self.lights.lock().unwrap() = IntersectionState::normal_entry();
    }

    fn update_cycle(&mut self) {
        if let Regime::Priority(_) = self.regime {
            return;
        }
        if self.held >= self.hold_ticks {
            let mut state = self.lights.lock().unwrap();
            state.flip_axes();
            log::debug!(
                "[Lights] normal cycle flipped, green: {:?}",
                state.green_directions()
            );
            self.held = 0;
        }
        self.held += 1;
    }
}
