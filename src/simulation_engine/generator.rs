use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;

use crate::simulation_engine::clock::TickBarrier;
use crate::simulation_engine::directions::Direction;
use crate::simulation_engine::vehicles::{Vehicle, VehicleKind};

/// Arrival policy for one approach. A single generator type covers both
/// normal and priority traffic; the priority share is configuration, not
/// a separate generator.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorPolicy {
    /// Chance of producing a vehicle on a given tick.
    pub spawn_probability: f64,
    /// Chance that a produced vehicle is a priority vehicle.
    pub priority_probability: f64,
}

impl Default for GeneratorPolicy {
    fn default() -> Self {
        Self {
            spawn_probability: 0.4,
            priority_probability: 0.05,
        }
    }
}

/// Produces vehicles into one direction's bounded queue, in lockstep with
/// the rest of the simulation. A full queue blocks the send, which is the
/// backpressure signal: the generator simply waits for the coordinator to
/// drain space.
pub struct TrafficGenerator {
    source: Direction,
    policy: GeneratorPolicy,
    queue_tx: mpsc::Sender<Vehicle>,
    barrier: TickBarrier,
    rng: SmallRng,
    queue_closed: bool,
}

impl TrafficGenerator {
    pub fn new(
        source: Direction,
        policy: GeneratorPolicy,
        queue_tx: mpsc::Sender<Vehicle>,
        barrier: TickBarrier,
        rng_seed: u64,
    ) -> Self {
        Self {
            source,
            policy,
            queue_tx,
            barrier,
            rng: SmallRng::seed_from_u64(rng_seed),
            queue_closed: false,
        }
    }

    pub async fn run(mut self) {
        loop {
            if !self.queue_closed && self.rng.random_bool(self.policy.spawn_probability) {
                if let Some(vehicle) = self.make_vehicle() {
                    self.enqueue(vehicle).await;
                }
            }
            self.barrier.wait().await;
        }
    }

    fn make_vehicle(&mut self) -> Option<Vehicle> {
        let kind = if self.rng.random_bool(self.policy.priority_probability) {
            VehicleKind::Priority
        } else {
            VehicleKind::Normal
        };
        let others: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|d| *d != self.source)
            .collect();
        let destination = others[self.rng.random_range(0..others.len())];
        match Vehicle::new(kind, self.source, destination) {
            Ok(vehicle) => Some(vehicle),
            Err(e) => {
                log::error!("[TrafficGen] rejected vehicle on {}: {}", self.source, e);
                None
            }
        }
    }

    async fn enqueue(&mut self, vehicle: Vehicle) {
        let capacity = self.queue_tx.max_capacity();
        let in_queue = capacity - self.queue_tx.capacity();
        log::debug!(
            "[TrafficGen] queue status {}: {}/{}",
            self.source,
            in_queue,
            capacity
        );
        // try_send first so congestion is observable before blocking.
        match self.queue_tx.try_send(vehicle) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(vehicle)) => {
                log::debug!(
                    "[TrafficGen] path for {} is congested, blocking new vehicles",
                    self.source
                );
                if self.queue_tx.send(vehicle).await.is_err() {
                    self.note_closed();
                }
            }
            Err(mpsc::error::TrySendError::Closed(_)) => self.note_closed(),
        }
    }

    fn note_closed(&mut self) {
        // The consumer side was torn down; keep attending the barrier so
        // the rest of the simulation is not stalled by this approach.
        log::error!(
            "[TrafficGen] vehicle queue for {} is closed, no more traffic from here",
            self.source
        );
        self.queue_closed = true;
    }
}
