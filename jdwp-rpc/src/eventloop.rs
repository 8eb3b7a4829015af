// JDWP Event Loop
//
// The only reader of the transport. Replies go to the correlator, composite
// event frames to the event log. Any read or decode failure stops the loop,
// which fails every pending call and wakes every event waiter.

use crate::codegen::Protocol;
use crate::correlation::Correlator;
use crate::error::{JdwpError, JdwpResult};
use crate::events::EventLog;
use crate::protocol::{CommandPacket, Frame, HEADER_SIZE};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

#[derive(Debug)]
pub(crate) struct Dispatcher {
    correlator: Arc<Correlator>,
    events: Arc<EventLog>,
    state: watch::Sender<LoopState>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Dispatcher {
    /// Start the reader task
    pub(crate) fn spawn(
        reader: BoxedReader,
        protocol: Arc<Protocol>,
        correlator: Arc<Correlator>,
        events: Arc<EventLog>,
        max_packet_size: usize,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(LoopState::Running);
        let dispatcher = Arc::new(Self {
            correlator,
            events,
            state,
            task: Mutex::new(None),
        });

        let handle = tokio::spawn(event_loop_task(
            dispatcher.clone(),
            reader,
            protocol,
            max_packet_size,
        ));
        *dispatcher.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);

        dispatcher
    }

    pub(crate) fn state(&self) -> LoopState {
        *self.state.borrow()
    }

    /// Resolves once the loop has stopped.
    pub(crate) async fn stopped(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|state| *state == LoopState::Stopped).await;
    }

    fn stop(&self, reason: &str) {
        if self.state.send_replace(LoopState::Stopped) == LoopState::Running {
            info!("Event loop shutting down: {}", reason);
        }
        self.correlator.fail_all();
        self.events.close();
    }

    /// Local teardown: stop reading and fail everything still waiting.
    pub(crate) fn abort(&self) {
        self.stop("disconnected");
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }
    }
}

/// Main event loop task
async fn event_loop_task(
    dispatcher: Arc<Dispatcher>,
    mut reader: BoxedReader,
    protocol: Arc<Protocol>,
    max_packet_size: usize,
) {
    info!("Event loop started");

    let reason = loop {
        match read_frame(&mut reader, max_packet_size).await {
            Ok(Frame::Reply(reply)) => {
                debug!("Received reply id={} error_code={}", reply.id, reply.error_code);
                if let Err(e) = dispatcher
                    .correlator
                    .resolve(reply.id, reply.error_code, &reply.data)
                {
                    error!("Undecodable reply id={}: {}", reply.id, e);
                    break format!("undecodable reply: {}", e);
                }
            }
            Ok(Frame::Command(packet)) => {
                if let Err(e) = handle_command(&dispatcher.events, &protocol, packet) {
                    error!("Failed to parse event: {}", e);
                    break format!("undecodable event: {}", e);
                }
            }
            Err(JdwpError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break "transport closed".to_string();
            }
            Err(e) => {
                error!("Failed to read packet: {}", e);
                break e.to_string();
            }
        }
    };

    dispatcher.stop(&reason);
}

fn handle_command(events: &EventLog, protocol: &Protocol, packet: CommandPacket) -> JdwpResult<()> {
    let is_composite = protocol
        .command_by_id(packet.command_set, packet.command)
        .map(|cmd| !cmd.has_reply())
        .unwrap_or(false);

    let decoder = match protocol.event_decoder() {
        Some(decoder) if is_composite => decoder,
        _ => {
            // We don't implement VM->debugger commands other than events
            warn!(
                "Ignoring VM command ({},{}) id={}",
                packet.command_set, packet.command, packet.id
            );
            return Ok(());
        }
    };

    let records = decoder.decode(&packet.data)?;
    debug!(
        "Parsed event set: {} events, suspend_policy={}",
        records.len(),
        records.first().map(|r| r.suspend_policy).unwrap_or_default()
    );
    events.append(records);
    Ok(())
}

/// Read one frame. Lengths below the header size or above `max_packet_size`
/// are transport errors.
pub async fn read_frame<R>(reader: &mut R, max_packet_size: usize) -> JdwpResult<Frame>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header).await?;

    let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;

    if length < HEADER_SIZE {
        return Err(JdwpError::Transport(format!(
            "Invalid packet length: {}",
            length
        )));
    }

    if length > max_packet_size {
        return Err(JdwpError::Transport(format!(
            "Packet too large: {} bytes (max: {} bytes)",
            length, max_packet_size
        )));
    }

    let mut full_packet = Vec::with_capacity(length);
    full_packet.extend_from_slice(&header);
    full_packet.resize(length, 0);
    reader.read_exact(&mut full_packet[HEADER_SIZE..]).await?;

    Frame::decode(&full_packet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ReplyPacket;

    #[tokio::test]
    async fn test_read_frame_splits_stream() {
        let mut bytes = ReplyPacket::new(3, 0, vec![1, 2, 3]).encode();
        bytes.extend(CommandPacket::new(4, 64, 100).encode());
        let mut reader = &bytes[..];

        let first = read_frame(&mut reader, 1024).await.unwrap();
        assert_eq!(first, Frame::Reply(ReplyPacket::new(3, 0, vec![1, 2, 3])));
        let second = read_frame(&mut reader, 1024).await.unwrap();
        assert_eq!(second.id(), 4);

        assert!(matches!(
            read_frame(&mut reader, 1024).await,
            Err(JdwpError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_read_frame_limits() {
        let bytes = ReplyPacket::new(1, 0, vec![0; 64]).encode();
        let mut reader = &bytes[..];
        assert!(matches!(
            read_frame(&mut reader, 32).await,
            Err(JdwpError::Transport(_))
        ));

        let short = [0, 0, 0, 4, 0, 0, 0, 1, 0x80, 0, 0];
        let mut reader = &short[..];
        assert!(matches!(
            read_frame(&mut reader, 1024).await,
            Err(JdwpError::Transport(_))
        ));
    }
}
