// JDWP event log
//
// Events arrive unsolicited from the VM inside composite frames. The
// dispatcher appends them here in arrival order, runs registered callbacks,
// then releases them to `await_event` consumers.

use crate::error::{JdwpError, JdwpResult};
use crate::record::Record;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// One decoded event. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Id of the event request that produced this event (0 for automatic ones).
    pub request_id: i32,
    pub suspend_policy: u8,
    pub event_kind: u8,
    /// Variant name from the event composite, e.g. "Breakpoint".
    pub name: String,
    pub fields: Record,
}

pub type EventCallback = Arc<dyn Fn(&EventRecord) + Send + Sync>;

#[derive(Default)]
struct LogState {
    records: Vec<Arc<EventRecord>>,
    consumed: Vec<bool>,
    // Records below this index are visible to waiters
    released: usize,
    closed: bool,
}

pub struct EventLog {
    state: Mutex<LogState>,
    callbacks: Mutex<Vec<EventCallback>>,
    notify: watch::Sender<u64>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("EventLog")
            .field("records", &state.records.len())
            .field("released", &state.released)
            .field("closed", &state.closed)
            .finish()
    }
}

impl EventLog {
    pub fn new() -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            state: Mutex::new(LogState::default()),
            callbacks: Mutex::new(Vec::new()),
            notify,
        }
    }

    /// Register a callback run once per record, in registration order.
    pub fn on_event(&self, callback: EventCallback) {
        lock(&self.callbacks).push(callback);
    }

    /// Append one frame's records. Only the dispatcher calls this.
    pub fn append(&self, records: Vec<EventRecord>) {
        if records.is_empty() {
            return;
        }

        let records: Vec<Arc<EventRecord>> = records.into_iter().map(Arc::new).collect();
        let end = {
            let mut state = lock(&self.state);
            state.consumed.extend(std::iter::repeat(false).take(records.len()));
            state.records.extend(records.iter().cloned());
            state.records.len()
        };

        let callbacks = lock(&self.callbacks).clone();
        for record in &records {
            debug!("Event {} (kind={}, request_id={})", record.name, record.event_kind, record.request_id);
            for callback in &callbacks {
                callback(record);
            }
        }

        lock(&self.state).released = end;
        self.notify.send_modify(|generation| *generation += 1);
    }

    /// Wake every waiter; waits with no match fail with `ConnectionClosed`.
    pub fn close(&self) {
        {
            let mut state = lock(&self.state);
            if state.closed {
                return;
            }
            state.closed = true;
        }
        self.notify.send_modify(|generation| *generation += 1);
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    /// Snapshot of every record appended so far, in arrival order.
    pub fn events(&self) -> Vec<Arc<EventRecord>> {
        lock(&self.state).records.clone()
    }

    /// Wait for the first unconsumed released record matching `predicate`
    /// and consume it. Records already in the log are considered first.
    pub async fn await_event<F>(
        &self,
        predicate: F,
        timeout: Option<Duration>,
    ) -> JdwpResult<Arc<EventRecord>>
    where
        F: Fn(&EventRecord) -> bool,
    {
        let mut rx = self.notify.subscribe();

        let wait = async {
            loop {
                // Mark the current generation seen before scanning
                rx.borrow_and_update();
                if let Some(record) = self.take_match(&predicate)? {
                    return Ok(record);
                }
                if rx.changed().await.is_err() {
                    return Err(JdwpError::ConnectionClosed);
                }
            }
        };

        match timeout {
            Some(duration) => tokio::time::timeout(duration, wait)
                .await
                .map_err(|_| JdwpError::Timeout)?,
            None => wait.await,
        }
    }

    fn take_match<F>(&self, predicate: &F) -> JdwpResult<Option<Arc<EventRecord>>>
    where
        F: Fn(&EventRecord) -> bool,
    {
        let mut state = lock(&self.state);
        let released = state.released;
        let found = (0..released).find(|&i| !state.consumed[i] && predicate(&state.records[i]));

        match found {
            Some(i) => {
                state.consumed[i] = true;
                Ok(Some(state.records[i].clone()))
            }
            None if state.closed => Err(JdwpError::ConnectionClosed),
            None => Ok(None),
        }
    }
}
