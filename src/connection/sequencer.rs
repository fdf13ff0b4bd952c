use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::RequestError;
use crate::transport::{ConnectionEvent, EventHub};

/// Counter value before the broker's seed has arrived
const UNSEEDED: i64 = -1;

/// Allocator for the single request-identity namespace.
///
/// Orders and queries draw from one counter so an identity is never reused
/// across request kinds. The counter is seeded exactly once, from the
/// `NextValidId` event the broker pushes after connecting; the first caller
/// blocks until that seed lands, every later caller gets an id with one
/// atomic post-increment. One sequencer exists per connection; the identity
/// space is instance-owned, so two connections in one process cannot corrupt
/// each other's streams.
#[derive(Debug)]
pub struct OrderIdSequencer {
    counter: Arc<AtomicI64>,
    seeded_rx: watch::Receiver<bool>,
}

impl OrderIdSequencer {
    /// Wire the sequencer to the hub's connection channel. Must be called
    /// before `connect` so the seed event cannot be missed.
    pub fn new(hub: &EventHub) -> Self {
        let counter = Arc::new(AtomicI64::new(UNSEEDED));
        let (seeded_tx, seeded_rx) = watch::channel(false);

        let mut events = hub.subscribe_connection();
        let task_counter = Arc::clone(&counter);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ConnectionEvent::NextValidId { order_id }) => {
                        // only the first seed counts; the counter never resets
                        match task_counter.compare_exchange(
                            UNSEEDED,
                            order_id,
                            Ordering::AcqRel,
                            Ordering::Acquire,
                        ) {
                            Ok(_) => {
                                debug!(seed = order_id, "order id counter seeded");
                                let _ = seeded_tx.send(true);
                            }
                            Err(current) => {
                                debug!(
                                    seed = order_id,
                                    current, "ignoring repeated id seed"
                                );
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!(missed = n, "sequencer lagged on connection events");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Self { counter, seeded_rx }
    }

    /// Next identity in the namespace.
    ///
    /// Waits for the broker seed on the first call of a fresh connection;
    /// afterwards this is a single atomic increment.
    pub async fn next_id(&self, seed_timeout: std::time::Duration) -> Result<i64, RequestError> {
        if self.counter.load(Ordering::Acquire) == UNSEEDED {
            let mut seeded = self.seeded_rx.clone();
            let wait = seeded.wait_for(|ready| *ready);
            if tokio::time::timeout(seed_timeout, wait).await.is_err() {
                return Err(RequestError::IdentityTimeout(seed_timeout));
            }
            // wait_for also returns on channel closure; re-check the counter
            if self.counter.load(Ordering::Acquire) == UNSEEDED {
                return Err(RequestError::IdentityTimeout(seed_timeout));
            }
        }
        Ok(self.counter.fetch_add(1, Ordering::AcqRel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::BrokerEvent;
    use std::collections::HashSet;
    use std::time::Duration;

    #[tokio::test]
    async fn first_caller_waits_for_seed() {
        let hub = EventHub::new();
        let seq = Arc::new(OrderIdSequencer::new(&hub));

        let waiter = {
            let seq = Arc::clone(&seq);
            tokio::spawn(async move { seq.next_id(Duration::from_secs(1)).await })
        };
        tokio::task::yield_now().await;
        hub.dispatch(BrokerEvent::NextValidId { order_id: 500 });

        assert_eq!(waiter.await.unwrap().unwrap(), 500);
        // seeded now, so the next call answers without any event
        assert_eq!(seq.next_id(Duration::from_millis(10)).await.unwrap(), 501);
    }

    #[tokio::test]
    async fn missing_seed_times_out() {
        let hub = EventHub::new();
        let seq = OrderIdSequencer::new(&hub);

        let err = seq.next_id(Duration::from_millis(50)).await.unwrap_err();
        assert!(matches!(err, RequestError::IdentityTimeout(_)));
    }

    #[tokio::test]
    async fn repeated_seed_does_not_reset_counter() {
        let hub = EventHub::new();
        let seq = OrderIdSequencer::new(&hub);

        hub.dispatch(BrokerEvent::NextValidId { order_id: 10 });
        assert_eq!(seq.next_id(Duration::from_secs(1)).await.unwrap(), 10);

        hub.dispatch(BrokerEvent::NextValidId { order_id: 3 });
        tokio::task::yield_now().await;
        assert_eq!(seq.next_id(Duration::from_secs(1)).await.unwrap(), 11);
    }

    #[tokio::test]
    async fn concurrent_callers_get_distinct_consecutive_ids() {
        let hub = EventHub::new();
        let seq = Arc::new(OrderIdSequencer::new(&hub));
        hub.dispatch(BrokerEvent::NextValidId { order_id: 1000 });

        let mut handles = Vec::new();
        for _ in 0..32 {
            let seq = Arc::clone(&seq);
            handles.push(tokio::spawn(async move {
                seq.next_id(Duration::from_secs(1)).await.unwrap()
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap());
        }
        assert_eq!(ids.len(), 32);
        assert_eq!(*ids.iter().min().unwrap(), 1000);
        assert_eq!(*ids.iter().max().unwrap(), 1031);
    }
}
