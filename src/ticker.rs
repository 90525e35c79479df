//! Periodic clock task: advances the shared clock on a fixed interval and
//! pushes a snapshot of the state to every subscriber.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use scene::{Message, SharedState, StateSnapshot};

struct Subscriber {
    name: String,
    tx: Sender<StateSnapshot>,
}

/// Fan-out of snapshots over bounded channels.
///
/// A push never blocks: a subscriber whose channel is full or closed is
/// dropped on the spot and never retried.
#[derive(Default)]
pub struct Broadcast {
    subscribers: Vec<Subscriber>,
}

impl Broadcast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber that may lag behind by at most `capacity`
    /// snapshots.
    pub fn subscribe(&mut self, name: &str, capacity: usize) -> Receiver<StateSnapshot> {
        let (tx, rx) = bounded(capacity);
        self.subscribers.push(Subscriber { name: name.to_string(), tx });
        log::info!("subscriber '{}' registered ({} total)", name, self.subscribers.len());
        rx
    }

    /// Pushes `snapshot` to every subscriber, returns how many are left.
    pub fn publish(&mut self, snapshot: &StateSnapshot) -> usize {
        self.subscribers.retain(|sub| match sub.tx.try_send(*snapshot) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::warn!("subscriber '{}' is not keeping up, removing it", sub.name);
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                log::info!("subscriber '{}' disconnected", sub.name);
                false
            }
        });
        self.subscribers.len()
    }
}

/// Handle to the clock thread.
pub struct Ticker {
    handle: JoinHandle<u64>,
}

impl Ticker {
    /// Starts the clock thread. It runs until `running` is cleared or, when
    /// `frames` is set, after that many ticks.
    pub fn spawn(
        state: SharedState,
        broadcast: Broadcast,
        interval: Duration,
        frames: Option<u64>,
        running: Arc<AtomicBool>,
    ) -> io::Result<Ticker> {
        let handle = thread::Builder::new()
            .name("ticker".into())
            .spawn(move || run_ticker_loop(state, broadcast, interval, frames, running))?;

        Ok(Self { handle })
    }

    /// Waits for the thread and returns the number of ticks it ran.
    pub fn join(self) -> thread::Result<u64> {
        self.handle.join()
    }
}

fn run_ticker_loop(
    state: SharedState,
    mut broadcast: Broadcast,
    interval: Duration,
    frames: Option<u64>,
    running: Arc<AtomicBool>,
) -> u64 {
    log::debug!("ticker started, interval {:?}", interval);

    let mut ticks = 0;
    let mut last = Instant::now();
    let mut deadline = last + interval;

    while running.load(Ordering::Relaxed) {
        if frames.is_some_and(|frames| ticks >= frames) {
            break;
        }

        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
            deadline += interval;
        } else {
            // fell behind, don't try to catch up with a burst of ticks
            deadline = now + interval;
        }

        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32() * 1000.0;
        last = now;

        state.update(&Message::AdvanceClock { dt });
        let snapshot = state.snapshot();
        broadcast.publish(&snapshot);

        ticks += 1;
    }

    log::debug!("ticker stopped after {} ticks", ticks);
    ticks
}

/// Subscriber that logs a one-line summary of every `every`th snapshot.
/// Exits when the broadcast side goes away.
pub fn spawn_logger(rx: Receiver<StateSnapshot>, every: u64) -> io::Result<JoinHandle<u64>> {
    thread::Builder::new().name("snapshot-log".into()).spawn(move || {
        let mut received = 0;
        for snapshot in rx.iter() {
            received += 1;
            if every > 0 && received % every == 0 {
                log::info!(
                    "t={:.0}ms camera={:.2} dudv={:.3} scenery={}",
                    snapshot.clock,
                    snapshot.camera_position,
                    snapshot.water.dudv_offset(snapshot.clock),
                    snapshot.scenery
                );
            }
        }
        received
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> StateSnapshot {
        SharedState::default().snapshot()
    }

    #[test]
    fn publish_reaches_every_subscriber() {
        let mut broadcast = Broadcast::new();
        let a = broadcast.subscribe("a", 4);
        let b = broadcast.subscribe("b", 4);

        assert_eq!(broadcast.publish(&snapshot()), 2);
        assert_eq!(a.try_recv().unwrap(), snapshot());
        assert_eq!(b.try_recv().unwrap(), snapshot());
    }

    #[test]
    fn dropped_receiver_is_removed() {
        let mut broadcast = Broadcast::new();
        let keep = broadcast.subscribe("keep", 4);
        drop(broadcast.subscribe("gone", 4));

        assert_eq!(broadcast.publish(&snapshot()), 1);
        assert_eq!(keep.len(), 1);
    }

    #[test]
    fn full_subscriber_is_removed_without_blocking() {
        let mut broadcast = Broadcast::new();
        let slow = broadcast.subscribe("slow", 1);
        let fast = broadcast.subscribe("fast", 4);

        assert_eq!(broadcast.publish(&snapshot()), 2);
        let _ = fast.try_recv();
        assert_eq!(broadcast.publish(&snapshot()), 1);

        // the removed subscriber still holds what it was sent, then sees a
        // closed channel
        assert!(slow.try_recv().is_ok());
        assert!(slow.recv().is_err());
        assert_eq!(fast.len(), 1);
    }

    #[test]
    fn ticker_advances_clock_and_stops_after_frames() {
        let state = SharedState::default();
        let mut broadcast = Broadcast::new();
        let rx = broadcast.subscribe("test", 8);

        let ticker = Ticker::spawn(
            state.clone(),
            broadcast,
            Duration::from_millis(1),
            Some(3),
            Arc::new(AtomicBool::new(true)),
        )
        .unwrap();
        assert_eq!(ticker.join().unwrap(), 3);

        let snapshots: Vec<_> = rx.iter().collect();
        assert_eq!(snapshots.len(), 3);
        assert!(snapshots.windows(2).all(|w| w[0].clock < w[1].clock));
        assert!(state.clock() > 0.0);
        assert_eq!(snapshots[2].clock, state.clock());
    }

    #[test]
    fn ticker_stops_when_running_is_cleared() {
        let running = Arc::new(AtomicBool::new(true));
        let ticker = Ticker::spawn(
            SharedState::default(),
            Broadcast::new(),
            Duration::from_millis(1),
            None,
            Arc::clone(&running),
        )
        .unwrap();

        thread::sleep(Duration::from_millis(20));
        running.store(false, Ordering::Relaxed);
        assert!(ticker.join().unwrap() > 0);
    }

    #[test]
    fn logger_drains_until_disconnect() {
        let mut broadcast = Broadcast::new();
        let logger = spawn_logger(broadcast.subscribe("log", 8), 2).unwrap();
        for _ in 0..5 {
            broadcast.publish(&snapshot());
        }
        drop(broadcast);
        assert_eq!(logger.join().unwrap(), 5);
    }
}
