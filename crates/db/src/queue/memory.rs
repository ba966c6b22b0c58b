//! In-memory Task Queue.
//!
//! Holds a FIFO of ready messages plus a lease table of in-flight ones.
//! Leases past their deadline are promoted back to the front of the ready
//! queue on the next `receive`.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use stylist_core::messages::SubmissionMessage;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{Delivery, QueueError, TaskQueue};

struct Entry {
    id: i64,
    message: SubmissionMessage,
    delivery_count: i32,
}

struct Lease {
    entry: Entry,
    deadline: Instant,
}

struct QueueState {
    ready: VecDeque<Entry>,
    in_flight: HashMap<i64, Lease>,
    next_id: i64,
    closed: bool,
}

impl QueueState {
    fn promote_expired(&mut self) {
        let now = Instant::now();
        let mut expired: Vec<i64> = self
            .in_flight
            .iter()
            .filter(|(_, lease)| lease.deadline <= now)
            .map(|(id, _)| *id)
            .collect();
        // Oldest first, so redelivery keeps submission order.
        expired.sort_unstable_by(|a, b| b.cmp(a));
        for id in expired {
            if let Some(lease) = self.in_flight.remove(&id) {
                self.ready.push_front(lease.entry);
            }
        }
    }
}

pub struct MemoryTaskQueue {
    state: Mutex<QueueState>,
    visibility_timeout: Duration,
}

impl MemoryTaskQueue {
    pub fn new(visibility_timeout: Duration) -> Self {
        Self {
            state: Mutex::new(QueueState {
                ready: VecDeque::new(),
                in_flight: HashMap::new(),
                next_id: 1,
                closed: false,
            }),
            visibility_timeout,
        }
    }

    /// Number of messages not yet acknowledged (ready plus in flight).
    pub async fn len(&self) -> usize {
        let state = self.state.lock().await;
        state.ready.len() + state.in_flight.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Reject further enqueues. Used to simulate a broker outage.
    pub async fn close(&self) {
        self.state.lock().await.closed = true;
    }
}

#[async_trait]
impl TaskQueue for MemoryTaskQueue {
    async fn enqueue(&self, message: &SubmissionMessage) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(QueueError::Closed);
        }
        let id = state.next_id;
        state.next_id += 1;
        state.ready.push_back(Entry {
            id,
            message: message.clone(),
            delivery_count: 0,
        });
        Ok(())
    }

    async fn receive(&self) -> Result<Option<Delivery>, QueueError> {
        let mut state = self.state.lock().await;
        state.promote_expired();

        let Some(mut entry) = state.ready.pop_front() else {
            return Ok(None);
        };
        entry.delivery_count += 1;
        let delivery = Delivery {
            id: entry.id,
            message: entry.message.clone(),
            delivery_count: entry.delivery_count,
        };
        let deadline = Instant::now() + self.visibility_timeout;
        state.in_flight.insert(entry.id, Lease { entry, deadline });
        Ok(Some(delivery))
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), QueueError> {
        self.state.lock().await.in_flight.remove(&delivery.id);
        Ok(())
    }

    async fn release(&self, delivery: &Delivery) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        if let Some(lease) = state.in_flight.remove(&delivery.id) {
            state.ready.push_front(lease.entry);
        }
        Ok(())
    }
}
