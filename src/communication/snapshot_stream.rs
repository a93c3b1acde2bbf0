use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::communication::messages::{encode_snapshot, Snapshot};

/// Ships snapshots to the renderer over a persistent TCP connection.
///
/// The coordinator is the connector, the renderer the listener. Any
/// connect or write failure is recoverable: the current snapshot is
/// dropped and the next one retries the connection, so the stream always
/// resumes with current state and never stalls the simulation.
pub struct SnapshotPublisher {
    addr: String,
    rx: mpsc::Receiver<Snapshot>,
}

impl SnapshotPublisher {
    pub fn new(addr: impl Into<String>, rx: mpsc::Receiver<Snapshot>) -> Self {
        Self {
            addr: addr.into(),
            rx,
        }
    }

    pub async fn run(mut self) {
        let mut stream: Option<TcpStream> = None;
        let mut outage_logged = false;

        while let Some(snapshot) = self.rx.recv().await {
            if stream.is_none() {
                match TcpStream::connect(&self.addr).await {
                    Ok(connected) => {
                        log::info!("[Snapshot] connected to renderer at {}", self.addr);
                        stream = Some(connected);
                        outage_logged = false;
                    }
                    Err(e) => {
                        if !outage_logged {
                            log::warn!(
                                "[Snapshot] renderer unreachable at {}: {}, dropping snapshots until it returns",
                                self.addr,
                                e
                            );
                            outage_logged = true;
                        }
                        continue;
                    }
                }
            }

            let payload = encode_snapshot(&snapshot);
            if let Some(connected) = stream.as_mut() {
                if let Err(e) = connected.write_all(payload.as_bytes()).await {
                    log::warn!("[Snapshot] renderer connection lost: {}, will reconnect", e);
                    stream = None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communication::messages::DirectionSnapshot;
    use crate::simulation_engine::directions::Direction;
    use crate::simulation_engine::lights::LightColor;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    fn empty_snapshot(tick: u64) -> Snapshot {
        Snapshot {
            tick,
            directions: Direction::ALL
                .into_iter()
                .map(|direction| DirectionSnapshot {
                    direction,
                    light: LightColor::Red,
                    vehicles: vec![],
                })
                .collect(),
            crossings: vec![],
        }
    }

    #[tokio::test]
    async fn publishes_records_to_a_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let (tx, rx) = mpsc::channel(4);
        tokio::spawn(SnapshotPublisher::new(addr, rx).run());

        tx.send(empty_snapshot(1)).await.unwrap();
        let (mut socket, _) = listener.accept().await.unwrap();
        drop(tx); // publisher exits after the last snapshot

        let mut received = String::new();
        socket.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, encode_snapshot(&empty_snapshot(1)));
    }

    #[tokio::test]
    async fn missing_renderer_does_not_stop_the_publisher() {
        // Nothing listens on this address; sends must complete anyway.
        let (tx, rx) = mpsc::channel(4);
        let publisher = tokio::spawn(SnapshotPublisher::new("127.0.0.1:1", rx).run());

        for tick in 1..=3 {
            tx.send(empty_snapshot(tick)).await.unwrap();
        }
        drop(tx);
        publisher.await.unwrap();
    }
}
