// JSON-RPC request handlers
//
// Routes "<CommandSet>.<Command>" to the matching command stub, plus the
// services/list, events/await and events/list methods.

use crate::convert::record_from_json;
use crate::protocol::*;
use crate::services::list_services;
use jdwp_rpc::{CommandSetStub, EventRecord, JdwpConnection, JdwpError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AwaitEventParams {
    event_kind: Option<u8>,
    request_id: Option<i32>,
    timeout_ms: Option<u64>,
}

impl AwaitEventParams {
    fn matches(&self, event: &EventRecord) -> bool {
        self.event_kind.map_or(true, |kind| event.event_kind == kind)
            && self.request_id.map_or(true, |id| event.request_id == id)
    }
}

#[derive(Clone)]
pub struct RequestHandler {
    conn: JdwpConnection,
}

impl RequestHandler {
    pub fn new(conn: JdwpConnection) -> Self {
        Self { conn }
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Handling {}", request.method);

        let result = match request.method.as_str() {
            "services/list" => self.handle_list_services(),
            "events/await" => self.handle_await_event(request.params).await,
            "events/list" => self.handle_list_events(),
            method => self.handle_command(method, request.params).await,
        };

        match result {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(error) => JsonRpcResponse::failure(request.id, error),
        }
    }

    fn handle_list_services(&self) -> Result<Value, JsonRpcError> {
        to_result(&list_services(self.conn.protocol()))
    }

    fn handle_list_events(&self) -> Result<Value, JsonRpcError> {
        let events = self.conn.events();
        let records: Vec<&EventRecord> = events.iter().map(|e| e.as_ref()).collect();
        to_result(&records)
    }

    async fn handle_await_event(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: AwaitEventParams = match params {
            Some(value) => serde_json::from_value(value).map_err(|e| {
                JsonRpcError::new(INVALID_PARAMS, format!("Invalid events/await params: {}", e))
            })?,
            None => AwaitEventParams::default(),
        };

        let timeout = params.timeout_ms.map(Duration::from_millis);
        let event = self
            .conn
            .await_event(|event| params.matches(event), timeout)
            .await
            .map_err(rpc_error)?;
        to_result(event.as_ref())
    }

    async fn handle_command(&self, method: &str, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let (set, command) = method
            .split_once('.')
            .ok_or_else(|| method_not_found(method))?;

        let protocol = self.conn.protocol();
        let cmd = protocol
            .command(set, command)
            .map_err(|_| method_not_found(method))?;
        if !cmd.has_reply() {
            return Err(JsonRpcError::new(
                METHOD_NOT_FOUND,
                format!("{} is delivered as event notifications", method),
            ));
        }

        let request = record_from_json(cmd.request_args(), &params.unwrap_or(Value::Null))
            .map_err(|e| JsonRpcError::new(INVALID_PARAMS, e))?;

        let stub = CommandSetStub::new(&self.conn, set).map_err(rpc_error)?;
        let reply = stub.call(command, &request).await.map_err(rpc_error)?;
        to_result(&reply)
    }
}

fn method_not_found(method: &str) -> JsonRpcError {
    JsonRpcError::new(METHOD_NOT_FOUND, format!("Method not found: {}", method))
}

fn to_result<T: Serialize + ?Sized>(value: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()))
}

fn rpc_error(err: JdwpError) -> JsonRpcError {
    let code = match &err {
        JdwpError::Codec(_) | JdwpError::Lookup(_) => INVALID_PARAMS,
        JdwpError::Timeout => TIMEOUT,
        JdwpError::ConnectionClosed => CONNECTION_CLOSED,
        _ => {
            warn!("Request failed: {}", err);
            INTERNAL_ERROR
        }
    };

    let mut error = JsonRpcError::new(code, err.to_string());
    if let JdwpError::Vm { code, name } = &err {
        error.data = Some(json!({ "errorCode": code, "error": name }));
    }
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use jdwp_rpc::eventloop::read_frame;
    use jdwp_rpc::protocol::{CommandPacket, Frame, ReplyPacket};
    use jdwp_rpc::{ClientConfig, Protocol};
    use tokio::io::{duplex, AsyncWriteExt, DuplexStream};

    fn attach() -> (RequestHandler, DuplexStream) {
        let (ours, theirs) = duplex(1 << 16);
        let (reader, writer) = tokio::io::split(ours);
        let conn = JdwpConnection::from_transport(
            reader,
            writer,
            Protocol::builtin().unwrap(),
            ClientConfig::default().with_reply_timeout(Some(Duration::from_secs(5))),
        );
        (RequestHandler::new(conn), theirs)
    }

    fn request(method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: json!(1),
            method: method.to_string(),
            params: Some(params),
        }
    }

    async fn next_command(vm: &mut DuplexStream) -> CommandPacket {
        match read_frame(vm, 1 << 20).await.unwrap() {
            Frame::Command(packet) => packet,
            other => panic!("expected command, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_command_roundtrip_through_stub() {
        let (handler, mut vm) = attach();

        let call = tokio::spawn({
            let handler = handler.clone();
            async move {
                handler
                    .handle_request(request("ThreadReference.FrameCount", json!({"thread": 42})))
                    .await
            }
        });

        let packet = next_command(&mut vm).await;
        assert_eq!((packet.command_set, packet.command), (11, 7));
        assert_eq!(packet.data, 42u64.to_be_bytes().to_vec());

        let reply = ReplyPacket::new(packet.id, 0, 3i32.to_be_bytes().to_vec());
        vm.write_all(&reply.encode()).await.unwrap();

        let response = call.await.unwrap();
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["errorCode"], 0);
        assert_eq!(result["data"]["frameCount"], 3);
    }

    #[tokio::test]
    async fn test_vm_error_is_returned_in_reply() {
        let (handler, mut vm) = attach();

        let call = tokio::spawn({
            let handler = handler.clone();
            async move {
                handler
                    .handle_request(request("ThreadReference.Name", json!({"thread": 1})))
                    .await
            }
        });

        let packet = next_command(&mut vm).await;
        let reply = ReplyPacket::new(packet.id, 10, Vec::new());
        vm.write_all(&reply.encode()).await.unwrap();

        let result = call.await.unwrap().result.unwrap();
        assert_eq!(result["errorCode"], 10);
        assert_eq!(result["error"], "INVALID_THREAD");
        assert!(result["data"].is_null());
    }

    #[tokio::test]
    async fn test_bad_params_never_reach_the_vm() {
        let (handler, _vm) = attach();

        let missing = handler
            .handle_request(request("ThreadReference.Frames", json!({"thread": 1})))
            .await;
        assert_eq!(missing.error.unwrap().code, INVALID_PARAMS);

        let wrong_type = handler
            .handle_request(request("VirtualMachine.ClassesBySignature", json!({"signature": 5})))
            .await;
        assert_eq!(wrong_type.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_unknown_methods() {
        let (handler, _vm) = attach();

        for method in ["NoSuchSet.Version", "VirtualMachine.NoSuch", "version", "Event.Composite"] {
            let response = handler.handle_request(request(method, json!({}))).await;
            assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND, "{}", method);
        }
    }

    #[tokio::test]
    async fn test_services_list() {
        let (handler, _vm) = attach();
        let response = handler.handle_request(request("services/list", Value::Null)).await;
        let services = response.result.unwrap()["services"].as_array().unwrap().len();
        let total: usize = handler
            .conn
            .protocol()
            .command_sets()
            .iter()
            .map(|s| s.commands().len())
            .sum();
        assert_eq!(services, total);
    }

    #[tokio::test]
    async fn test_await_event_filters_and_times_out() {
        let (handler, mut vm) = attach();

        let waiter = tokio::spawn({
            let handler = handler.clone();
            async move {
                handler
                    .handle_request(request(
                        "events/await",
                        json!({"eventKind": 100, "timeoutMs": 5000}),
                    ))
                    .await
            }
        });

        // VMDeath (99) then ClassUnload (100)
        let mut data = vec![0u8];
        data.extend_from_slice(&2i32.to_be_bytes());
        data.push(99);
        data.extend_from_slice(&0i32.to_be_bytes());
        data.push(100);
        data.extend_from_slice(&4i32.to_be_bytes());
        let sig = "Lcom/example/Gone;";
        data.extend_from_slice(&(sig.len() as u32).to_be_bytes());
        data.extend_from_slice(sig.as_bytes());
        let packet = CommandPacket::new(1, 64, 100).with_data(data);
        vm.write_all(&packet.encode()).await.unwrap();

        let result = waiter.await.unwrap().result.unwrap();
        assert_eq!(result["eventKind"], 100);
        assert_eq!(result["requestId"], 4);
        assert_eq!(result["fields"]["signature"], sig);

        let timed_out = handler
            .handle_request(request("events/await", json!({"eventKind": 2, "timeoutMs": 20})))
            .await;
        assert_eq!(timed_out.error.unwrap().code, TIMEOUT);
    }
}
