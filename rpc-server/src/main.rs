// JDWP RPC server
//
// Attaches to a JVM debug port and bridges every command set as line-delimited
// JSON-RPC 2.0 over one TCP client connection. Events are pushed to the client
// as `event` notifications.

use anyhow::{Context, Result};
use clap::Parser;
use jdwp_rpc::spec::Specification;
use jdwp_rpc::{ClientConfig, JdwpConnection, Protocol};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

mod convert;
mod handlers;
mod protocol;
mod services;

use handlers::RequestHandler;
use protocol::*;

#[derive(Parser, Debug)]
#[command(name = "jdwp-rpc-server", version, about)]
struct Args {
    /// Port the RPC client connects to
    #[clap(short, long, env = "JDWP_RPC_PORT", default_value_t = 7070)]
    port: u16,

    #[clap(long, env = "JDWP_RPC_BIND", default_value = "127.0.0.1")]
    bind: String,

    #[clap(long, env = "JDWP_HOST", default_value = "localhost")]
    jvm_host: String,

    #[clap(long, env = "JDWP_PORT", default_value_t = 5005)]
    jvm_port: u16,

    /// JSON specification document; the built-in JDWP tables when absent
    #[clap(short, long, env = "JDWP_SPEC")]
    spec: Option<PathBuf>,

    /// Default reply timeout in milliseconds
    #[clap(long)]
    reply_timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("jdwp_rpc_server=info".parse()?)
                .add_directive("jdwp_rpc=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    info!("Starting JDWP RPC server...");

    let protocol = load_protocol(args.spec.as_deref())?;
    let mut config = ClientConfig::default();
    if let Some(ms) = args.reply_timeout_ms {
        config = config.with_reply_timeout(Some(Duration::from_millis(ms)));
    }

    let conn = JdwpConnection::connect_with(&args.jvm_host, args.jvm_port, protocol, config)
        .await
        .with_context(|| format!("attaching to {}:{}", args.jvm_host, args.jvm_port))?;

    let listener = TcpListener::bind((args.bind.as_str(), args.port))
        .await
        .with_context(|| format!("binding {}:{}", args.bind, args.port))?;
    info!("Waiting for a client on {}:{}", args.bind, args.port);

    let (stream, peer) = listener.accept().await?;
    drop(listener);
    info!("Client connected from {}", peer);

    let (reader, writer) = stream.into_split();
    serve(BufReader::new(reader), writer, conn.clone()).await?;

    conn.disconnect().await;
    info!("JDWP RPC server shutting down");
    Ok(())
}

fn load_protocol(path: Option<&Path>) -> Result<Arc<Protocol>> {
    match path {
        Some(path) => {
            info!("Loading specification from {}", path.display());
            let spec = Specification::from_path(path)
                .with_context(|| format!("reading {}", path.display()))?;
            Ok(Arc::new(Protocol::compile(&spec)?))
        }
        None => Ok(Protocol::builtin()?),
    }
}

/// Serve one client until it disconnects or the JVM connection stops.
async fn serve<R, W>(reader: R, mut writer: W, conn: JdwpConnection) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Send + Unpin + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let events = tx.clone();
    conn.on_event(move |event| match serde_json::to_value(event) {
        Ok(params) => send(&events, &JsonRpcNotification::new("event", params)),
        Err(e) => warn!("Dropping unserializable event: {}", e),
    });

    let outbound = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            debug!("Sending: {}", line);
            if writer.write_all(line.as_bytes()).await.is_err()
                || writer.write_all(b"\n").await.is_err()
                || writer.flush().await.is_err()
            {
                break;
            }
        }
    });

    let handler = RequestHandler::new(conn.clone());
    let mut lines = reader.lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = conn.closed() => {
                info!("JVM connection stopped");
                break;
            }
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("Client disconnected");
                break;
            }
            Err(e) => {
                error!("Read error: {}", e);
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!("Received: {}", line);

        let value = match serde_json::from_str::<Value>(line) {
            Ok(value) => value,
            Err(e) => {
                error!("Parse error: {}", e);
                let error = JsonRpcError::new(PARSE_ERROR, "Parse error");
                send(&tx, &JsonRpcResponse::failure(Value::Null, error));
                continue;
            }
        };

        if value.get("id").is_none() {
            debug!("Ignoring notification: {}", line);
            continue;
        }

        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => {
                let handler = handler.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let response = handler.handle_request(request).await;
                    send(&tx, &response);
                });
            }
            Err(e) => {
                error!("Invalid request: {}", e);
                let error = JsonRpcError::new(INVALID_REQUEST, "Invalid request");
                send(&tx, &JsonRpcResponse::failure(Value::Null, error));
            }
        }
    }

    outbound.abort();
    Ok(())
}

fn send<T: serde::Serialize>(tx: &mpsc::UnboundedSender<String>, message: &T) {
    match serde_json::to_string(message) {
        Ok(line) => {
            let _ = tx.send(line);
        }
        Err(e) => error!("Failed to serialize message: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio::io::duplex;

    #[test]
    fn test_load_builtin_protocol() {
        let protocol = load_protocol(None).unwrap();
        assert!(protocol.command("VirtualMachine", "Version").is_ok());
    }

    #[test]
    fn test_load_protocol_from_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "commandSets": [{{ "id": 1, "name": "VirtualMachine", "commands": [
                    {{ "id": 1, "name": "Version", "request": [],
                       "response": {{ "kind": "reply", "args": [
                         {{ "kind": "simple", "name": "description", "type": "string" }} ] }} }} ] }}],
                "constantSets": [{{ "name": "Error", "constants": [{{ "name": "Error_NONE", "value": 0 }}] }}]
            }}"#
        )
        .unwrap();

        let protocol = load_protocol(Some(file.path())).unwrap();
        assert_eq!(protocol.command_sets().len(), 1);
        assert_eq!(protocol.format(1, 1).unwrap().response.to_string(), "s");
    }

    #[test]
    fn test_load_protocol_rejects_bad_documents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "commandSets": [], "constantSets": [] }}"#).unwrap();
        assert!(load_protocol(Some(file.path())).is_err());

        assert!(load_protocol(Some(Path::new("/nonexistent/spec.json"))).is_err());
    }

    #[tokio::test]
    async fn test_serve_answers_until_client_leaves() {
        let (vm_side, _vm) = duplex(1 << 16);
        let (vm_reader, vm_writer) = tokio::io::split(vm_side);
        let conn = JdwpConnection::from_transport(
            vm_reader,
            vm_writer,
            Protocol::builtin().unwrap(),
            ClientConfig::default(),
        );

        let (server_side, client_side) = duplex(1 << 16);
        let (server_reader, server_writer) = tokio::io::split(server_side);
        let server = tokio::spawn(serve(BufReader::new(server_reader), server_writer, conn));

        let (client_reader, mut client_writer) = tokio::io::split(client_side);
        let mut responses = BufReader::new(client_reader).lines();

        client_writer.write_all(b"not json\n").await.unwrap();
        let parse_error: Value =
            serde_json::from_str(&responses.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(parse_error["error"]["code"], PARSE_ERROR);

        client_writer
            .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"services/list\"}\n")
            .await
            .unwrap();
        let listing: Value =
            serde_json::from_str(&responses.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(listing["id"], 7);
        assert!(listing["result"]["services"].is_array());

        drop(responses);
        drop(client_writer);
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_serve_stops_with_the_jvm() {
        let (vm_side, vm) = duplex(1 << 16);
        let (vm_reader, vm_writer) = tokio::io::split(vm_side);
        let conn = JdwpConnection::from_transport(
            vm_reader,
            vm_writer,
            Protocol::builtin().unwrap(),
            ClientConfig::default(),
        );

        let (server_side, _client) = duplex(1 << 16);
        let (server_reader, server_writer) = tokio::io::split(server_side);
        let server = tokio::spawn(serve(BufReader::new(server_reader), server_writer, conn));

        drop(vm);
        server.await.unwrap().unwrap();
    }
}
