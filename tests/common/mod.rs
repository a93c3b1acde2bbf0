// Not every test binary uses every helper here.
#![allow(dead_code)]

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crossroad_sim::communication::messages::Snapshot;
use crossroad_sim::control_system::traffic_light_controller::{
    preemption_mailbox, TrafficLightController,
};
use crossroad_sim::global_variables::MAX_VEHICLES_IN_QUEUE;
use crossroad_sim::simulation_engine::clock::{Clock, TickBarrier};
use crossroad_sim::simulation_engine::coordinator::Coordinator;
use crossroad_sim::simulation_engine::directions::Direction;
use crossroad_sim::simulation_engine::generator::{GeneratorPolicy, TrafficGenerator};
use crossroad_sim::simulation_engine::lights;
use crossroad_sim::simulation_engine::vehicles::Vehicle;

/// A manually stepped simulation without generators: tests inject
/// vehicles straight into the per-direction queues and observe one
/// snapshot per tick.
pub struct ManualSim {
    queue_txs: HashMap<Direction, mpsc::Sender<Vehicle>>,
    step_tx: mpsc::Sender<()>,
    snapshot_rx: mpsc::Receiver<Snapshot>,
}

impl ManualSim {
    pub fn spawn(hold_ticks: u64, seed: u64) -> Self {
        // Coordinator and light controller are the only barrier
        // participants; the test plays the generators.
        let barrier = TickBarrier::new(2);
        let shared_lights = lights::new_shared();
        let (preemption, control_rx) = preemption_mailbox();
        let (ready_tx, ready_rx) = watch::channel(0);
        let (snapshot_tx, snapshot_rx) = mpsc::channel(64);
        let (step_tx, step_rx) = mpsc::channel(64);

        let mut queue_txs = HashMap::new();
        let mut queues = HashMap::new();
        for direction in Direction::ALL {
            let (queue_tx, queue_rx) = mpsc::channel(MAX_VEHICLES_IN_QUEUE);
            queue_txs.insert(direction, queue_tx);
            queues.insert(direction, queue_rx);
        }

        tokio::spawn(
            TrafficLightController::new(
                shared_lights.clone(),
                control_rx,
                ready_tx,
                barrier.clone(),
                hold_ticks,
            )
            .run(),
        );
        tokio::spawn(
            Coordinator::new(
                queues,
                shared_lights,
                preemption,
                ready_rx,
                barrier,
                Clock::manual(step_rx),
                snapshot_tx,
                seed,
            )
            .run(),
        );

        Self {
            queue_txs,
            step_tx,
            snapshot_rx,
        }
    }

    /// Completes the current tick and returns its snapshot. Vehicles
    /// enqueued after this call are admitted on the next tick.
    pub async fn tick(&mut self) -> Snapshot {
        let snapshot = self.snapshot_rx.recv().await.expect("coordinator alive");
        self.step_tx.send(()).await.expect("manual clock alive");
        snapshot
    }

    pub async fn enqueue(&self, vehicle: Vehicle) {
        self.queue_txs[&vehicle.source]
            .send(vehicle)
            .await
            .expect("queue open");
    }

    /// Tears down one direction's generator side.
    pub fn drop_queue(&mut self, direction: Direction) {
        self.queue_txs.remove(&direction);
    }
}

/// Runs a full simulation (randomized generators on every approach) for
/// a fixed number of ticks at full speed and returns all snapshots.
pub async fn run_randomized(
    ticks: u64,
    policy: GeneratorPolicy,
    hold_ticks: u64,
    seed: u64,
) -> Vec<Snapshot> {
    let barrier = TickBarrier::new(2 + Direction::ALL.len());
    let shared_lights = lights::new_shared();
    let (preemption, control_rx) = preemption_mailbox();
    let (ready_tx, ready_rx) = watch::channel(0);
    let (snapshot_tx, mut snapshot_rx) = mpsc::channel(ticks as usize + 8);

    let mut queues = HashMap::new();
    for (i, direction) in Direction::ALL.into_iter().enumerate() {
        let (queue_tx, queue_rx) = mpsc::channel(MAX_VEHICLES_IN_QUEUE);
        queues.insert(direction, queue_rx);
        tokio::spawn(
            TrafficGenerator::new(
                direction,
                policy,
                queue_tx,
                barrier.clone(),
                seed.wrapping_add(1 + i as u64),
            )
            .run(),
        );
    }

    tokio::spawn(
        TrafficLightController::new(
            shared_lights.clone(),
            control_rx,
            ready_tx,
            barrier.clone(),
            hold_ticks,
        )
        .run(),
    );

    Coordinator::new(
        queues,
        shared_lights,
        preemption,
        ready_rx,
        barrier,
        Clock::auto(Duration::ZERO),
        snapshot_tx,
        seed,
    )
    .run_for(ticks)
    .await;

    let mut snapshots = Vec::new();
    while let Ok(snapshot) = snapshot_rx.try_recv() {
        snapshots.push(snapshot);
    }
    snapshots
}
