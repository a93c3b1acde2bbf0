// simulation_main.rs
use std::collections::HashMap;
use std::time::Duration;

use clap::Parser;
use rand::Rng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};

use crossroad_sim::communication::snapshot_stream::SnapshotPublisher;
use crossroad_sim::control_system::traffic_light_controller::{
    preemption_mailbox, TrafficLightController,
};
use crossroad_sim::global_variables::{
    DEFAULT_TICK_MILLIS, MAX_VEHICLES_IN_QUEUE, NORMAL_HOLD_TICKS, RENDERER_ADDR,
    SNAPSHOT_CHANNEL_CAPACITY,
};
use crossroad_sim::simulation_engine::clock::{Clock, TickBarrier};
use crossroad_sim::simulation_engine::coordinator::Coordinator;
use crossroad_sim::simulation_engine::directions::Direction;
use crossroad_sim::simulation_engine::generator::{GeneratorPolicy, TrafficGenerator};
use crossroad_sim::simulation_engine::lights;

#[derive(Parser)]
#[command(name = "crossroad_sim")]
#[command(about = "Four-way intersection simulation")]
struct Cli {
    /// Real-time length of one tick in milliseconds
    #[arg(long, default_value_t = DEFAULT_TICK_MILLIS)]
    tick_millis: u64,

    /// Advance ticks by pressing enter instead of a real-time delay
    #[arg(long)]
    manual: bool,

    /// Stop after this many ticks (runs until interrupted when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Probability that a direction spawns a vehicle on a given tick
    #[arg(long, default_value_t = 0.4)]
    spawn_probability: f64,

    /// Probability that a spawned vehicle is a priority vehicle
    #[arg(long, default_value_t = 0.05)]
    priority_probability: f64,

    /// Address the renderer listens on for the snapshot stream
    #[arg(long, default_value = RENDERER_ADDR)]
    renderer: String,

    /// Seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let seed = cli.seed.unwrap_or_else(|| rand::rng().random());
    log::info!("starting simulation with seed {}", seed);

    // Coordinator + light controller + one generator per direction.
    let barrier = TickBarrier::new(2 + Direction::ALL.len());
    let shared_lights = lights::new_shared();
    let (preemption, control_rx) = preemption_mailbox();
    let (ready_tx, ready_rx) = watch::channel(0);
    let (snapshot_tx, snapshot_rx) = mpsc::channel(SNAPSHOT_CHANNEL_CAPACITY);

    let clock = if cli.manual {
        let (step_tx, step_rx) = mpsc::channel(1);
        tokio::spawn(read_manual_steps(step_tx));
        Clock::manual(step_rx)
    } else {
        Clock::auto(Duration::from_millis(cli.tick_millis))
    };
    log::info!("clock mode: {:?}", clock.mode());

    let policy = GeneratorPolicy {
        spawn_probability: cli.spawn_probability,
        priority_probability: cli.priority_probability,
    };
    let mut queues = HashMap::new();
    for (i, direction) in Direction::ALL.into_iter().enumerate() {
        let (queue_tx, queue_rx) = mpsc::channel(MAX_VEHICLES_IN_QUEUE);
        queues.insert(direction, queue_rx);
        let generator = TrafficGenerator::new(
            direction,
            policy,
            queue_tx,
            barrier.clone(),
            seed.wrapping_add(1 + i as u64),
        );
        tokio::spawn(generator.run());
    }

    let controller = TrafficLightController::new(
        shared_lights.clone(),
        control_rx,
        ready_tx,
        barrier.clone(),
        NORMAL_HOLD_TICKS,
    );
    tokio::spawn(controller.run());

    tokio::spawn(SnapshotPublisher::new(cli.renderer, snapshot_rx).run());

    let coordinator = Coordinator::new(
        queues,
        shared_lights,
        preemption,
        ready_rx,
        barrier,
        clock,
        snapshot_tx,
        seed,
    );

    match cli.ticks {
        Some(ticks) => {
            coordinator.run_for(ticks).await;
            log::info!("simulation finished after {} ticks", ticks);
        }
        None => {
            tokio::spawn(coordinator.run());
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("interrupted, shutting down");
            }
        }
    }
}

/// Feeds the manual clock: one tick per line on stdin.
async fn read_manual_steps(step_tx: mpsc::Sender<()>) {
    println!("Manual clock: press enter to advance one tick.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(_)) = lines.next_line().await {
        if step_tx.send(()).await.is_err() {
            break;
        }
    }
}
