//! Concurrent joins, leaves, publishes and disconnects from many threads.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use parking_lot::Mutex;
use scoreline_relay::{
    ChannelDirectory, ChannelId, ConnectionId, ConnectionRegistry, DeliveryError, Echo,
    RelayDispatcher, Transport,
};
use serde_json::value::RawValue;

#[derive(Default)]
struct CountingTransport {
    sent: AtomicUsize,
    per_connection: Mutex<HashMap<ConnectionId, usize>>,
}

impl Transport for CountingTransport {
    fn send(&self, connection: &ConnectionId, _frame: Arc<str>) -> Result<(), DeliveryError> {
        let _ = self.sent.fetch_add(1, Ordering::Relaxed);
        *self
            .per_connection
            .lock()
            .entry(connection.clone())
            .or_default() += 1;
        Ok(())
    }
}

const THREADS: usize = 8;
const ROUNDS: usize = 200;

#[test]
fn churn_leaves_directory_consistent() {
    let directory = Arc::new(ChannelDirectory::new());
    let registry = ConnectionRegistry::new(directory.clone());
    let transport = Arc::new(CountingTransport::default());
    let dispatcher = Arc::new(RelayDispatcher::new(directory.clone(), transport.clone()));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let registry = registry.clone();
            let dispatcher = Arc::clone(&dispatcher);
            thread::spawn(move || {
                let payload = RawValue::from_string(r#"{"score":"1-0"}"#.to_owned()).unwrap();
                for round in 0..ROUNDS {
                    let conn = ConnectionId::from(format!("t{t}-r{round}"));
                    let game = ChannelId::from(format!("game-{}", round % 5));
                    let other = ChannelId::from(format!("game-{}", (round + 1) % 5));
                    registry.register(&conn);
                    let _ = registry.directory().join(&game, &conn);
                    let _ = registry.directory().join(&other, &conn);
                    dispatcher.publish(&conn, &game, "scoreUpdate", &payload, Echo::IncludeSender);
                    let _ = registry.directory().leave(&other, &conn);
                    if round % 3 != 0 {
                        let _ = registry.unregister(&conn);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Survivors are the round % 3 == 0 connections, each in exactly one game.
    let survivors_per_thread = (0..ROUNDS).filter(|r| r % 3 == 0).count();
    assert_eq!(registry.connection_count(), THREADS * survivors_per_thread);

    let mut total_members = 0;
    for g in 0..5 {
        let chan = ChannelId::from(format!("game-{g}"));
        for member in directory.members_of(&chan) {
            assert!(registry.memberships_of(&member).contains(&chan));
        }
        total_members += directory.member_count(&chan);
    }
    assert_eq!(total_members, THREADS * survivors_per_thread);

    // Every publisher was a member of its target channel, so it saw at least its own echo.
    assert!(transport.sent.load(Ordering::Relaxed) >= THREADS * ROUNDS);
}

#[test]
fn disconnect_everyone_prunes_all_channels() {
    let directory = Arc::new(ChannelDirectory::new());
    let registry = ConnectionRegistry::new(directory.clone());

    let ids: Vec<ConnectionId> = (0..64).map(|i| ConnectionId::from(format!("c{i}"))).collect();
    for (i, id) in ids.iter().enumerate() {
        registry.register(id);
        let _ = directory.join(&ChannelId::from(format!("game-{}", i % 4)), id);
    }
    assert_eq!(directory.channel_count(), 4);

    let handles: Vec<_> = ids
        .chunks(16)
        .map(|chunk| {
            let registry = registry.clone();
            let chunk = chunk.to_vec();
            thread::spawn(move || {
                for id in &chunk {
                    let _ = registry.unregister(id);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(directory.channel_count(), 0);
    assert_eq!(registry.connection_count(), 0);
}
