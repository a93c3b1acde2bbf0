use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Barrier};

/// How simulated time advances between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMode {
    /// Real-time delay of `tick_duration` per tick.
    Auto,
    /// Block until an external step command arrives.
    Manual,
}

/// Owns the tick rhythm. `advance` is called once per tick by the
/// coordinator, before the barrier rendezvous.
pub struct Clock {
    state: ClockState,
}

enum ClockState {
    Auto { tick_duration: Duration },
    Manual { step_rx: mpsc::Receiver<()> },
}

impl Clock {
    pub fn auto(tick_duration: Duration) -> Self {
        Self {
            state: ClockState::Auto { tick_duration },
        }
    }

    pub fn manual(step_rx: mpsc::Receiver<()>) -> Self {
        Self {
            state: ClockState::Manual { step_rx },
        }
    }

    pub fn mode(&self) -> ClockMode {
        match self.state {
            ClockState::Auto { .. } => ClockMode::Auto,
            ClockState::Manual { .. } => ClockMode::Manual,
        }
    }

    pub async fn advance(&mut self, units: u32) {
        match &mut self.state {
            ClockState::Auto { tick_duration } => {
                if !tick_duration.is_zero() {
                    tokio::time::sleep(*tick_duration * units).await;
                }
            }
            ClockState::Manual { step_rx } => {
                for _ in 0..units {
                    if step_rx.recv().await.is_none() {
                        // The stepper is gone; stalling the run is the
                        // accepted outcome, not an error to recover from.
                        log::warn!("[Clock] step source closed; simulation is stalled");
                        std::future::pending::<()>().await;
                    }
                }
            }
        }
    }
}

/// Lockstep rendezvous for all actors: nobody starts tick T+1 before
/// every participant has finished tick T. No timeouts; a stalled
/// participant stalls the whole run.
#[derive(Clone)]
pub struct TickBarrier {
    inner: Arc<Barrier>,
}

impl TickBarrier {
    pub fn new(participants: usize) -> Self {
        Self {
            inner: Arc::new(Barrier::new(participants)),
        }
    }

    pub async fn wait(&self) {
        self.inner.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn auto_clock_with_zero_duration_returns_immediately() {
        let mut clock = Clock::auto(Duration::ZERO);
        clock.advance(1).await;
        clock.advance(3).await;
        assert_eq!(clock.mode(), ClockMode::Auto);
    }

    #[tokio::test]
    async fn manual_clock_waits_for_each_step() {
        let (step_tx, step_rx) = mpsc::channel(4);
        let mut clock = Clock::manual(step_rx);

        step_tx.send(()).await.unwrap();
        step_tx.send(()).await.unwrap();
        clock.advance(2).await;

        // A third advance must block until another step arrives.
        let advance = tokio::time::timeout(Duration::from_millis(20), clock.advance(1));
        assert!(advance.await.is_err());
    }

    #[tokio::test]
    async fn barrier_releases_all_participants_together() {
        let barrier = TickBarrier::new(3);
        let mut handles = Vec::new();
        for _ in 0..2 {
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move { barrier.wait().await }));
        }
        barrier.wait().await;
        for handle in handles {
            handle.await.unwrap();
        }
    }
}
