// JDWP connection management
//
// Handles TCP connection, handshake, and event loop startup. Everything a
// connection shares is behind an `Arc`, so clones are cheap handles onto the
// same correlator, event log and dispatcher.

use crate::codegen::{CompiledCommandSet, Protocol};
use crate::config::ClientConfig;
use crate::correlation::{BoxedWriter, Correlator, RawReply};
use crate::error::{JdwpError, JdwpResult};
use crate::eventloop::{BoxedReader, Dispatcher, LoopState};
use crate::events::{EventCallback, EventLog, EventRecord};
use crate::protocol::JDWP_HANDSHAKE;
use crate::wire::WireValue;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct JdwpConnection {
    protocol: Arc<Protocol>,
    correlator: Arc<Correlator>,
    events: Arc<EventLog>,
    dispatcher: Arc<Dispatcher>,
    config: ClientConfig,
}

impl JdwpConnection {
    /// Connect to a JVM via JDWP using the built-in protocol
    pub async fn connect(host: &str, port: u16) -> JdwpResult<Self> {
        let protocol = Protocol::builtin()?;
        Self::connect_with(host, port, protocol, ClientConfig::default()).await
    }

    pub async fn connect_with(
        host: &str,
        port: u16,
        protocol: Arc<Protocol>,
        config: ClientConfig,
    ) -> JdwpResult<Self> {
        info!("Connecting to JDWP at {}:{}", host, port);

        let mut stream = TcpStream::connect((host, port)).await?;
        let _ = stream.set_nodelay(true);

        tokio::time::timeout(config.handshake_timeout, Self::handshake(&mut stream))
            .await
            .map_err(|_| JdwpError::Timeout)??;

        // Split stream and spawn event loop
        let (reader, writer) = stream.into_split();
        Ok(Self::from_transport(reader, writer, protocol, config))
    }

    /// Attach to an already handshaken transport.
    pub fn from_transport<R, W>(reader: R, writer: W, protocol: Arc<Protocol>, config: ClientConfig) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let reader: BoxedReader = Box::new(reader);
        let writer: BoxedWriter = Box::new(writer);

        let correlator = Arc::new(Correlator::new(protocol.clone(), writer));
        let events = Arc::new(EventLog::new());
        let dispatcher = Dispatcher::spawn(
            reader,
            protocol.clone(),
            correlator.clone(),
            events.clone(),
            config.max_packet_size,
        );

        Self {
            protocol,
            correlator,
            events,
            dispatcher,
            config,
        }
    }

    /// Perform JDWP handshake
    pub async fn handshake<S>(stream: &mut S) -> JdwpResult<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        debug!("Performing JDWP handshake");

        stream.write_all(JDWP_HANDSHAKE).await?;
        stream.flush().await?;

        let mut buf = vec![0u8; JDWP_HANDSHAKE.len()];
        stream.read_exact(&mut buf).await?;

        if buf != JDWP_HANDSHAKE {
            warn!("Invalid handshake response: {:?}", buf);
            return Err(JdwpError::InvalidHandshake);
        }

        info!("JDWP handshake successful");
        Ok(())
    }

    pub fn protocol(&self) -> &Arc<Protocol> {
        &self.protocol
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn command_set(&self, name: &str) -> JdwpResult<&CompiledCommandSet> {
        Ok(self.protocol.command_set(name)?)
    }

    /// Send a command and wait for its reply. `None` falls back to the
    /// configured reply timeout.
    pub async fn call_and_await(
        &self,
        command_set: u8,
        command: u8,
        values: &[WireValue],
        timeout: Option<Duration>,
    ) -> JdwpResult<RawReply> {
        let timeout = timeout.or(self.config.reply_timeout);
        self.correlator
            .call_and_await(command_set, command, values, timeout)
            .await
    }

    /// Send a command; its reply, if any, is dropped.
    pub async fn send_no_wait(&self, command_set: u8, command: u8, values: &[WireValue]) -> JdwpResult<u32> {
        self.correlator.send_no_wait(command_set, command, values).await
    }

    pub fn on_event<F>(&self, callback: F)
    where
        F: Fn(&EventRecord) + Send + Sync + 'static,
    {
        let callback: EventCallback = Arc::new(callback);
        self.events.on_event(callback);
    }

    pub async fn await_event<F>(&self, predicate: F, timeout: Option<Duration>) -> JdwpResult<Arc<EventRecord>>
    where
        F: Fn(&EventRecord) -> bool,
    {
        self.events.await_event(predicate, timeout).await
    }

    pub fn events(&self) -> Vec<Arc<EventRecord>> {
        self.events.events()
    }

    pub fn state(&self) -> LoopState {
        self.dispatcher.state()
    }

    /// Resolves once the dispatcher has stopped, for whatever reason.
    pub async fn closed(&self) {
        self.dispatcher.stopped().await
    }

    /// Stop the dispatcher, fail outstanding calls and close the write side.
    pub async fn disconnect(&self) {
        info!("Disconnecting from JDWP");
        self.dispatcher.abort();
        self.correlator.shutdown_writer();
    }
}
