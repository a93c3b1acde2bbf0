use std::collections::{HashMap, VecDeque};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{mpsc, watch};

use crate::communication::messages::{Crossing, DirectionSnapshot, Snapshot};
use crate::control_system::traffic_light_controller::PreemptionHandle;
use crate::simulation_engine::clock::{Clock, TickBarrier};
use crate::simulation_engine::directions::Direction;
use crate::simulation_engine::lights::SharedLights;
use crate::simulation_engine::vehicles::Vehicle;

/// Decides whether the head vehicle of a green direction may cross while
/// the opposite green direction also has traffic.
///
/// The move is blocked only when the other head exists and our
/// destination equals the lane immediately right of its destination,
/// i.e. the two paths would merge.
pub fn may_cross(head: Option<&Vehicle>, other_head: Option<&Vehicle>) -> bool {
    let head = match head {
        Some(vehicle) => vehicle,
        None => return false,
    };
    match other_head {
        Some(other) => head.destination != other.destination.right_of(),
        None => true,
    }
}

/// One approach as the coordinator sees it: the queue end it drains, the
/// vehicles already admitted, and the preemption bookkeeping.
struct Road {
    queue_rx: mpsc::Receiver<Vehicle>,
    waiting: VecDeque<Vehicle>,
    disabled: bool,
    preempt_requested: bool,
}

impl Road {
    fn new(queue_rx: mpsc::Receiver<Vehicle>) -> Self {
        Self {
            queue_rx,
            waiting: VecDeque::new(),
            disabled: false,
            preempt_requested: false,
        }
    }
}

/// Manages vehicle movement at the intersection: drains the per-direction
/// queues, arbitrates right-of-way against the current lights, drives the
/// preemption protocol, and emits one snapshot per tick.
pub struct Coordinator {
    roads: HashMap<Direction, Road>,
    lights: SharedLights,
    preemption: PreemptionHandle,
    lights_ready: watch::Receiver<u64>,
    barrier: TickBarrier,
    clock: Clock,
    snapshot_tx: mpsc::Sender<Snapshot>,
    crossed_this_tick: Vec<Crossing>,
    rng: SmallRng,
}

impl Coordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queues: HashMap<Direction, mpsc::Receiver<Vehicle>>,
        lights: SharedLights,
        preemption: PreemptionHandle,
        lights_ready: watch::Receiver<u64>,
        barrier: TickBarrier,
        clock: Clock,
        snapshot_tx: mpsc::Sender<Snapshot>,
        rng_seed: u64,
    ) -> Self {
        let roads = queues
            .into_iter()
            .map(|(direction, queue_rx)| (direction, Road::new(queue_rx)))
            .collect();
        Self {
            roads,
            lights,
            preemption,
            lights_ready,
            barrier,
            clock,
            snapshot_tx,
            crossed_this_tick: Vec::new(),
            rng: SmallRng::seed_from_u64(rng_seed),
        }
    }

    /// Main loop that processes traffic from all directions.
    pub async fn run(mut self) {
        let mut tick: u64 = 1;
        loop {
            self.step(tick).await;
            tick += 1;
        }
    }

    /// Bounded variant of [`run`] for headless runs and tests.
    pub async fn run_for(mut self, ticks: u64) {
        for tick in 1..=ticks {
            self.step(tick).await;
        }
    }

    async fn step(&mut self, tick: u64) {
        self.accept_traffic();
        self.signal_priority_heads();
        self.wait_for_lights(tick).await;
        self.move_vehicles();
        self.publish_snapshot(tick);
        self.clock.advance(1).await;
        self.barrier.wait().await;
    }

    /// Non-blocking drain of every vehicle queue into its waiting list.
    /// A torn-down queue disables that direction for the rest of the run;
    /// the other directions keep going.
    fn accept_traffic(&mut self) {
        for direction in Direction::ALL {
            let road = match self.roads.get_mut(&direction) {
                Some(road) if !road.disabled => road,
                _ => continue,
            };
            loop {
                match road.queue_rx.try_recv() {
                    Ok(vehicle) => road.waiting.push_back(vehicle),
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        log::error!(
                            "[Coordinator] vehicle queue for {} is gone, disabling that approach",
                            direction
                        );
                        road.disabled = true;
                        break;
                    }
                }
            }
            if !road.waiting.is_empty() {
                log::debug!(
                    "[Coordinator] {} has {} vehicle(s) waiting",
                    direction,
                    road.waiting.len()
                );
            }
        }
    }

    /// A priority vehicle at the head of a waiting list triggers a
    /// preemption request, unconditionally, even when its approach is
    /// already green.
    fn signal_priority_heads(&mut self) {
        for direction in Direction::ALL {
            let road = match self.roads.get_mut(&direction) {
                Some(road) => road,
                None => continue,
            };
            if road.preempt_requested {
                continue;
            }
            if road.waiting.front().is_some_and(Vehicle::is_priority) {
                log::info!(
                    "[Coordinator] priority vehicle at the head of {}, requesting preemption",
                    direction
                );
                self.preemption.request_preemption(direction);
                road.preempt_requested = true;
            }
        }
    }

    async fn wait_for_lights(&mut self, tick: u64) {
        let ready = self
            .lights_ready
            .wait_for(|ready| *ready >= tick)
            .await
            .is_ok();
        if !ready {
            // Without the light controller there is no valid state to
            // arbitrate against; stall rather than guess.
            log::error!("[Coordinator] light controller is gone, simulation is stalled");
            std::future::pending::<()>().await;
        }
    }

    fn green_directions(&self) -> Vec<Direction> {
        self.lights.lock().unwrap().green_directions()
    }

    fn move_vehicles(&mut self) {
        self.crossed_this_tick.clear();
        let greens = self.green_directions();
        match greens.as_slice() {
            [] => {}
            [only] => self.pop_and_cross(*only),
            [d1, d2] => self.arbitrate_pair(*d1, *d2),
            more => {
                // The light controller invariant rules this out.
                log::error!("[Coordinator] invalid light state, green: {:?}", more);
            }
        }
    }

    /// Two simultaneously green directions (always an opposite-axis pair):
    /// apply the right-of-way conflict rule to each ordered pair, move
    /// every cleared head, and fall back to a random tie-break when the
    /// rule clears neither.
    fn arbitrate_pair(&mut self, d1: Direction, d2: Direction) {
        let head1 = self.head(d1);
        let head2 = self.head(d2);

        let mut cleared = Vec::new();
        if may_cross(head1.as_ref(), head2.as_ref()) {
            cleared.push(d1);
        }
        if may_cross(head2.as_ref(), head1.as_ref()) {
            cleared.push(d2);
        }

        if !cleared.is_empty() {
            for direction in cleared {
                self.pop_and_cross(direction);
            }
            return;
        }

        // Mutual conflict would need h1.dest == right_of(h2.dest) and
        // h2.dest == right_of(h1.dest), i.e. a destination equal to its
        // own opposite, so with two heads present at least one is always
        // cleared and only the both-empty case reaches this fallback.
        // Kept anyway: let at most one vehicle through, chosen uniformly,
        // favoring whichever direction has traffic.
        let candidates: Vec<Direction> = [d1, d2]
            .into_iter()
            .filter(|d| self.head(*d).is_some())
            .collect();
        match candidates.as_slice() {
            [] => {}
            [only] => self.pop_and_cross(*only),
            [a, b] => {
                let chosen = if self.rng.random_bool(0.5) { *a } else { *b };
                self.pop_and_cross(chosen);
            }
            _ => unreachable!("at most two candidates"),
        }
    }

    fn head(&self, direction: Direction) -> Option<Vehicle> {
        self.roads
            .get(&direction)
            .and_then(|road| road.waiting.front().copied())
    }

    /// Pops the head vehicle of a direction, if any. Priority departures
    /// re-emit the preemption request unconditionally and release the
    /// regime they triggered.
    fn pop_and_cross(&mut self, direction: Direction) {
        let road = match self.roads.get_mut(&direction) {
            Some(road) => road,
            None => return,
        };
        let vehicle = match road.waiting.pop_front() {
            Some(vehicle) => vehicle,
            // Popping an empty list is a no-op, never a fault.
            None => return,
        };
        log::info!(
            "[Coordinator] moving vehicle from {} to {}",
            direction,
            vehicle.destination
        );
        if vehicle.is_priority() {
            self.preemption.request_preemption(direction);
            if road.preempt_requested {
                self.preemption.release_preemption();
                road.preempt_requested = false;
            }
        }
        self.crossed_this_tick.push(Crossing { direction, vehicle });
    }

    /// End-of-tick state for the renderer: light color and waiting
    /// vehicles per direction, plus the vehicles that crossed this tick.
    fn publish_snapshot(&mut self, tick: u64) {
        let state = *self.lights.lock().unwrap();
        let directions = Direction::ALL
            .into_iter()
            .map(|direction| DirectionSnapshot {
                direction,
                light: state.color(direction),
                vehicles: self
                    .roads
                    .get(&direction)
                    .map(|road| road.waiting.iter().copied().collect())
                    .unwrap_or_default(),
            })
            .collect();
        let snapshot = Snapshot {
            tick,
            directions,
            crossings: std::mem::take(&mut self.crossed_this_tick),
        };
        if let Err(mpsc::error::TrySendError::Full(_)) = self.snapshot_tx.try_send(snapshot) {
            log::debug!("[Coordinator] snapshot consumer is behind, dropping tick {}", tick);
        }
    }
}
