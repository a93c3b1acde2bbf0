// Per-direction vehicle queue capacity.
pub const MAX_VEHICLES_IN_QUEUE: usize = 5;

// Ticks a normal-cycle phase holds one axis green before flipping.
pub const NORMAL_HOLD_TICKS: u64 = 5;

// Default real-time length of one tick in auto clock mode.
pub const DEFAULT_TICK_MILLIS: u64 = 1000;

// Where the renderer listens for the snapshot stream.
pub const RENDERER_ADDR: &str = "127.0.0.1:6666";

// Preemption control mailbox depth; drained fully once per tick.
pub const PREEMPT_MAILBOX_CAPACITY: usize = 8;

// Snapshot channel depth between the coordinator and the publisher.
// A slow or disconnected renderer drops frames instead of stalling the tick.
pub const SNAPSHOT_CHANNEL_CAPACITY: usize = 16;
