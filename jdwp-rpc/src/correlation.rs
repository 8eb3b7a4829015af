// Request/reply correlation
//
// Owns the id counter and the pending-call map for one connection. Callers
// register before their frame is queued; the dispatcher resolves entries as
// reply frames arrive, in whatever order the VM answers. Frames are written
// whole by a single writer task, so a caller that gives up never leaves a
// partial frame on the wire.

use crate::codegen::{CommandFormat, Protocol};
use crate::error::{CodecError, JdwpError, JdwpResult};
use crate::protocol::CommandPacket;
use crate::wire::{self, WireValue};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Reply as seen by the correlation layer: positional values, or none when
/// the VM reported an error.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReply {
    pub request_id: u32,
    pub error_code: u16,
    pub values: Option<Vec<WireValue>>,
}

struct PendingCall {
    command_set: u8,
    command: u8,
    format: Arc<CommandFormat>,
    slot: oneshot::Sender<JdwpResult<RawReply>>,
}

#[derive(Default)]
struct PendingState {
    calls: HashMap<u32, PendingCall>,
    closed: bool,
}

enum Outbound {
    Frame(Vec<u8>),
    Shutdown,
}

pub struct Correlator {
    protocol: Arc<Protocol>,
    outbound: mpsc::UnboundedSender<Outbound>,
    pending: Mutex<PendingState>,
    next_id: AtomicU32,
}

impl std::fmt::Debug for Correlator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pending = self.lock();
        f.debug_struct("Correlator")
            .field("pending", &pending.calls.len())
            .field("closed", &pending.closed)
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}

/// Removes a call's entry once its caller stops waiting, whether it got a
/// reply, timed out or was dropped mid-await.
struct PendingGuard<'a> {
    correlator: &'a Correlator,
    id: u32,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.correlator.lock().calls.remove(&self.id);
    }
}

impl Correlator {
    /// Spawns the writer task, so this must run inside a tokio runtime.
    pub fn new(protocol: Arc<Protocol>, writer: BoxedWriter) -> Self {
        let (outbound, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(writer, rx));

        Self {
            protocol,
            outbound,
            pending: Mutex::new(PendingState::default()),
            next_id: AtomicU32::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PendingState> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_id(&self) -> u32 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Send a request and wait for its reply. A nonzero error code is part
    /// of a successful result.
    pub async fn call_and_await(
        &self,
        command_set: u8,
        command: u8,
        values: &[WireValue],
        timeout: Option<Duration>,
    ) -> JdwpResult<RawReply> {
        let format = self.protocol.format(command_set, command)?.clone();
        let payload = wire::encode(&format.request, values)?;

        let id = self.next_id();
        let (slot, rx) = oneshot::channel();
        {
            let mut pending = self.lock();
            if pending.closed {
                return Err(JdwpError::ConnectionClosed);
            }
            pending.calls.insert(
                id,
                PendingCall {
                    command_set,
                    command,
                    format,
                    slot,
                },
            );
        }
        let _guard = PendingGuard { correlator: self, id };

        debug!("Sending command id={} ({},{})", id, command_set, command);
        self.enqueue(CommandPacket::new(id, command_set, command).with_data(payload))?;

        let received = match timeout {
            Some(duration) => match tokio::time::timeout(duration, rx).await {
                Ok(received) => received,
                Err(_) => {
                    debug!("Command id={} timed out after {:?}", id, duration);
                    return Err(JdwpError::Timeout);
                }
            },
            None => rx.await,
        };

        // A dropped slot means the dispatcher went away without resolving
        received.map_err(|_| JdwpError::ConnectionClosed)?
    }

    /// Send a request without registering interest in its reply.
    pub async fn send_no_wait(&self, command_set: u8, command: u8, values: &[WireValue]) -> JdwpResult<u32> {
        let format = self.protocol.format(command_set, command)?;
        let payload = wire::encode(&format.request, values)?;

        if self.is_closed() {
            return Err(JdwpError::ConnectionClosed);
        }

        let id = self.next_id();
        debug!("Sending command id={} ({},{}) without waiting", id, command_set, command);
        self.enqueue(CommandPacket::new(id, command_set, command).with_data(payload))?;
        Ok(id)
    }

    fn enqueue(&self, packet: CommandPacket) -> JdwpResult<()> {
        self.outbound
            .send(Outbound::Frame(packet.encode()))
            .map_err(|_| JdwpError::ConnectionClosed)
    }

    /// Hand a reply to its waiter. Replies nobody waits for are dropped.
    /// A payload that does not match the command's reply format is returned
    /// as an error after the waiter has been told.
    pub fn resolve(&self, request_id: u32, error_code: u16, payload: &[u8]) -> Result<(), CodecError> {
        let Some(call) = self.lock().calls.remove(&request_id) else {
            debug!("Dropping reply id={} with no pending call", request_id);
            return Ok(());
        };

        if error_code != 0 {
            let _ = call.slot.send(Ok(RawReply {
                request_id,
                error_code,
                values: None,
            }));
            return Ok(());
        }

        match wire::decode(&call.format.response, payload) {
            Ok(values) => {
                let _ = call.slot.send(Ok(RawReply {
                    request_id,
                    error_code,
                    values: Some(values),
                }));
                Ok(())
            }
            Err(e) => {
                warn!(
                    "Failed to decode reply id={} for ({},{}): {}",
                    request_id, call.command_set, call.command, e
                );
                let _ = call.slot.send(Err(JdwpError::Codec(e.clone())));
                Err(e)
            }
        }
    }

    /// Wake every outstanding caller with `ConnectionClosed`. Later calls
    /// fail immediately. Safe to call more than once.
    pub fn fail_all(&self) {
        let calls = {
            let mut pending = self.lock();
            pending.closed = true;
            std::mem::take(&mut pending.calls)
        };

        if !calls.is_empty() {
            debug!("Failing {} pending calls", calls.len());
        }
        for (_, call) in calls {
            let _ = call.slot.send(Err(JdwpError::ConnectionClosed));
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn pending_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Close the write side once every frame queued so far is out.
    pub(crate) fn shutdown_writer(&self) {
        let _ = self.outbound.send(Outbound::Shutdown);
    }
}

async fn run_writer(mut writer: BoxedWriter, mut rx: mpsc::UnboundedReceiver<Outbound>) {
    while let Some(message) = rx.recv().await {
        match message {
            Outbound::Frame(bytes) => {
                if let Err(e) = write_frame(&mut writer, &bytes).await {
                    warn!("Write failed: {}", e);
                    break;
                }
            }
            Outbound::Shutdown => {
                if let Err(e) = writer.shutdown().await {
                    debug!("Writer shutdown: {}", e);
                }
                break;
            }
        }
    }
    debug!("Writer task exiting");
}

async fn write_frame(writer: &mut BoxedWriter, bytes: &[u8]) -> std::io::Result<()> {
    writer.write_all(bytes).await?;
    writer.flush().await
}
