// End-to-end scenarios against an in-process mock VM.

use bytes::BufMut;
use jdwp_rpc::commands::{command_sets, event_kinds, event_commands, event_set_commands, mod_kinds, vm_commands};
use jdwp_rpc::eventloop::read_frame;
use jdwp_rpc::protocol::{CommandPacket, Frame, ReplyPacket};
use jdwp_rpc::types::Location;
use jdwp_rpc::{
    record, ClientConfig, Data, JdwpConnection, JdwpError, LoopState, Protocol, Record,
    SuspendPolicy,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{duplex, AsyncWriteExt, DuplexStream};

const WAIT: Option<Duration> = Some(Duration::from_secs(5));

struct MockVm {
    stream: DuplexStream,
    next_event_id: u32,
}

impl MockVm {
    async fn next_command(&mut self) -> CommandPacket {
        match read_frame(&mut self.stream, 1 << 20).await.unwrap() {
            Frame::Command(packet) => packet,
            other => panic!("expected command, got {:?}", other),
        }
    }

    async fn reply(&mut self, id: u32, error_code: u16, data: Vec<u8>) {
        let bytes = ReplyPacket::new(id, error_code, data).encode();
        self.stream.write_all(&bytes).await.unwrap();
    }

    async fn composite(&mut self, suspend_policy: u8, events: &[Vec<u8>]) {
        let mut data = Vec::new();
        data.put_u8(suspend_policy);
        data.put_i32(events.len() as i32);
        for event in events {
            data.put_slice(event);
        }
        self.next_event_id += 1;
        let bytes = CommandPacket::new(self.next_event_id, command_sets::EVENT, event_set_commands::COMPOSITE)
            .with_data(data)
            .encode();
        self.stream.write_all(&bytes).await.unwrap();
    }
}

fn attach() -> (JdwpConnection, MockVm) {
    attach_with_buffer(1 << 16)
}

// A small buffer makes large frames block until the VM reads them
fn attach_with_buffer(size: usize) -> (JdwpConnection, MockVm) {
    let (ours, theirs) = duplex(size);
    let (reader, writer) = tokio::io::split(ours);
    let conn = JdwpConnection::from_transport(
        reader,
        writer,
        Protocol::builtin().unwrap(),
        ClientConfig::default().with_reply_timeout(WAIT),
    );
    (
        conn,
        MockVm {
            stream: theirs,
            next_event_id: 0x1000,
        },
    )
}

fn put_string(buf: &mut Vec<u8>, s: &str) {
    buf.put_u32(s.len() as u32);
    buf.put_slice(s.as_bytes());
}

fn version_payload(vm_name: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    put_string(&mut buf, "Java Debug Wire Protocol (Reference Implementation) version 17.0");
    buf.put_i32(17);
    buf.put_i32(0);
    put_string(&mut buf, "17.0.8+7");
    put_string(&mut buf, vm_name);
    buf
}

fn put_location(buf: &mut Vec<u8>, loc: &Location) {
    buf.put_u8(loc.type_tag);
    buf.put_u64(loc.class_id);
    buf.put_u64(loc.method_id);
    buf.put_u64(loc.index);
}

#[tokio::test]
async fn version_returns_named_fields() {
    let (conn, mut vm) = attach();
    let stub = conn.virtual_machine().unwrap();

    let call = tokio::spawn(async move { stub.version(&Record::new()).await });

    let cmd = vm.next_command().await;
    assert_eq!((cmd.command_set, cmd.command), (1, vm_commands::VERSION));
    assert!(cmd.data.is_empty());
    vm.reply(cmd.id, 0, version_payload("OpenJDK 64-Bit Server VM")).await;

    let reply = call.await.unwrap().unwrap();
    assert_eq!(reply.error_code, 0);
    assert_eq!(reply.request_id, cmd.id);

    let data = reply.data.unwrap();
    assert_eq!(
        data.names().collect::<Vec<_>>(),
        vec!["description", "jdwpMajor", "jdwpMinor", "vmVersion", "vmName"]
    );
    assert_eq!(data.int("jdwpMajor"), Some(17));
    assert_eq!(data.string("vmName"), Some("OpenJDK 64-Bit Server VM"));

    let format = conn.protocol().format_by_key("1-1").unwrap();
    assert_eq!(format.request.to_string(), "");
    assert_eq!(format.response.to_string(), "siiss");
}

#[tokio::test]
async fn class_prepare_event_is_observed_through_await_event() {
    let (conn, mut vm) = attach();
    let events = conn.event_request().unwrap();
    let machine = conn.virtual_machine().unwrap();

    let client = tokio::spawn({
        let conn = conn.clone();
        async move {
            let request = record! {
                "eventKind" => event_kinds::CLASS_PREPARE,
                "suspendPolicy" => SuspendPolicy::None as u8,
                "modifiers" => Vec::<Data>::new(),
            };
            let set = events.set(&request).await?.into_result()?;
            machine.resume(&Record::new()).await?.into_result()?;
            let event = conn
                .await_event(|e| e.event_kind == event_kinds::CLASS_PREPARE, WAIT)
                .await?;
            Ok::<_, JdwpError>((set, event))
        }
    });

    let set = vm.next_command().await;
    assert_eq!((set.command_set, set.command), (command_sets::EVENT_REQUEST, event_commands::SET));
    assert_eq!(set.data, vec![event_kinds::CLASS_PREPARE, 0, 0, 0, 0, 0]);
    let mut reply = Vec::new();
    reply.put_i32(5);
    vm.reply(set.id, 0, reply).await;

    let resume = vm.next_command().await;
    assert_eq!((resume.command_set, resume.command), (1, vm_commands::RESUME));
    vm.reply(resume.id, 0, vec![]).await;

    let mut event = Vec::new();
    event.put_u8(event_kinds::CLASS_PREPARE);
    event.put_i32(5);
    event.put_u64(0x77); // thread
    event.put_u8(1);
    event.put_u64(0x4242);
    put_string(&mut event, "Lcom/example/Person;");
    event.put_i32(7);
    vm.composite(0, &[event]).await;

    let (set, event) = client.await.unwrap().unwrap();
    assert_eq!(set.int("requestID"), Some(5));
    assert_eq!(event.request_id, 5);
    assert_eq!(event.suspend_policy, 0);
    assert_eq!(event.fields.string("signature"), Some("Lcom/example/Person;"));
    assert_eq!(event.fields.id("typeID"), Some(0x4242));
}

#[tokio::test]
async fn breakpoint_event_carries_the_setter_request_id() {
    let (conn, mut vm) = attach();
    let events = conn.event_request().unwrap();
    let machine = conn.virtual_machine().unwrap();
    let location = Location { type_tag: 1, class_id: 0x10, method_id: 0x20, index: 0 };

    let client = tokio::spawn({
        let conn = conn.clone();
        async move {
            let request_id = events
                .set_breakpoint(location.class_id, location.method_id, location.index, SuspendPolicy::All)
                .await?;
            machine.resume(&Record::new()).await?;
            let event = conn
                .await_event(|e| e.event_kind == event_kinds::BREAKPOINT, WAIT)
                .await?;
            Ok::<_, JdwpError>((request_id, event))
        }
    });

    let set = vm.next_command().await;
    let mut expected = vec![event_kinds::BREAKPOINT, SuspendPolicy::All as u8];
    expected.put_i32(1);
    expected.put_u8(mod_kinds::LOCATION_ONLY);
    put_location(&mut expected, &location);
    assert_eq!(set.data, expected);

    let mut reply = Vec::new();
    reply.put_i32(9);
    vm.reply(set.id, 0, reply).await;

    let resume = vm.next_command().await;
    vm.reply(resume.id, 0, vec![]).await;

    let mut hit = Vec::new();
    hit.put_u8(event_kinds::BREAKPOINT);
    hit.put_i32(9);
    hit.put_u64(0x77);
    put_location(&mut hit, &location);
    vm.composite(2, &[hit]).await;

    let (request_id, event) = client.await.unwrap().unwrap();
    assert_eq!(request_id, 9);
    assert_eq!(event.request_id, request_id);
    assert_eq!(event.fields.location("location"), Some(&location));

    let breakpoints: Vec<_> = conn
        .events()
        .into_iter()
        .filter(|e| e.event_kind == event_kinds::BREAKPOINT)
        .collect();
    assert_eq!(breakpoints.len(), 1);
}

#[tokio::test]
async fn concurrent_calls_each_get_their_own_reply() {
    let (conn, mut vm) = attach();

    let mut calls = Vec::new();
    for _ in 0..3 {
        let stub = conn.virtual_machine().unwrap();
        calls.push(tokio::spawn(async move { stub.version(&Record::new()).await }));
    }

    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(vm.next_command().await.id);
    }
    let mut sorted = ids.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), 3);

    // Reply in reverse order, naming each VM after its request id
    for id in ids.iter().rev() {
        vm.reply(*id, 0, version_payload(&format!("vm-{}", id))).await;
    }

    for call in calls {
        let reply = call.await.unwrap().unwrap();
        let expected = format!("vm-{}", reply.request_id);
        assert_eq!(reply.data.unwrap().string("vmName"), Some(expected.as_str()));
    }
}

#[tokio::test]
async fn fire_and_forget_reply_is_dropped() {
    let (conn, mut vm) = attach();
    let machine = conn.virtual_machine().unwrap();

    let id = machine.exit(&record! { "exitCode" => 0i32 }).await.unwrap();
    let exit = vm.next_command().await;
    assert_eq!(exit.id, id);
    vm.reply(id, 0, vec![]).await;

    let call = tokio::spawn(async move { machine.version(&Record::new()).await });
    let cmd = vm.next_command().await;
    assert!(cmd.id > id);
    vm.reply(cmd.id, 0, version_payload("still alive")).await;

    let reply = call.await.unwrap().unwrap();
    assert_eq!(reply.data.unwrap().string("vmName"), Some("still alive"));
    assert_eq!(conn.state(), LoopState::Running);
}

#[tokio::test]
async fn vm_error_code_is_returned_with_its_name() {
    let (conn, mut vm) = attach();
    let threads = conn.thread_reference().unwrap();

    let call = tokio::spawn(async move { threads.name(&record! { "thread" => 0xdeadu64 }).await });
    let cmd = vm.next_command().await;
    vm.reply(cmd.id, 10, vec![]).await;

    let reply = call.await.unwrap().unwrap();
    assert_eq!(reply.error_code, 10);
    assert_eq!(reply.error_name(), Some("INVALID_THREAD"));
    assert!(reply.data.is_none());
    assert!(matches!(reply.into_result(), Err(JdwpError::Vm { code: 10, .. })));
}

#[tokio::test]
async fn callbacks_see_every_event_and_vm_commands_are_ignored() {
    let (conn, mut vm) = attach();
    let seen = Arc::new(AtomicUsize::new(0));
    {
        let seen = seen.clone();
        conn.on_event(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
    }

    // A VM-originated command that is not an event composite
    let stray = CommandPacket::new(1, 1, 1).encode();
    vm.stream.write_all(&stray).await.unwrap();

    let mut start = Vec::new();
    start.put_u8(event_kinds::VM_START);
    start.put_i32(0);
    start.put_u64(1);
    let mut thread = Vec::new();
    thread.put_u8(event_kinds::THREAD_START);
    thread.put_i32(0);
    thread.put_u64(2);
    vm.composite(0, &[start, thread]).await;

    let last = conn
        .await_event(|e| e.event_kind == event_kinds::THREAD_START, WAIT)
        .await
        .unwrap();
    assert_eq!(last.fields.id("thread"), Some(2));
    assert_eq!(seen.load(Ordering::SeqCst), 2);
    assert_eq!(conn.events()[0].name, "VMStart");
    assert_eq!(conn.state(), LoopState::Running);
}

#[tokio::test]
async fn eof_wakes_every_waiter_and_later_calls_fail_fast() {
    let (conn, mut vm) = attach();

    let stub = conn.virtual_machine().unwrap();
    let call = tokio::spawn(async move { stub.version(&Record::new()).await });
    let waiter = tokio::spawn({
        let conn = conn.clone();
        async move { conn.await_event(|_| true, None).await }
    });

    vm.next_command().await;
    drop(vm);

    assert!(matches!(call.await.unwrap(), Err(JdwpError::ConnectionClosed)));
    assert!(matches!(waiter.await.unwrap(), Err(JdwpError::ConnectionClosed)));

    conn.closed().await;
    assert_eq!(conn.state(), LoopState::Stopped);

    let later = tokio::time::timeout(
        Duration::from_secs(1),
        conn.virtual_machine().unwrap().version(&Record::new()),
    )
    .await
    .expect("call after EOF must not block");
    assert!(matches!(later, Err(JdwpError::ConnectionClosed)));
}

#[tokio::test]
async fn reply_timeout_holds_while_the_transport_is_blocked() {
    let (conn, _vm) = attach_with_buffer(64);
    let machine = conn.virtual_machine().unwrap();
    let utf = "x".repeat(4096);

    // The VM never reads, so the frame cannot be fully written
    let res = tokio::time::timeout(
        Duration::from_secs(1),
        machine.stub().call_with_timeout(
            "CreateString",
            &record! { "utf" => utf.as_str() },
            Some(Duration::from_millis(50)),
        ),
    )
    .await
    .expect("reply timeout must fire while the write is stuck");
    assert!(matches!(res, Err(JdwpError::Timeout)));

    let sent = tokio::time::timeout(
        Duration::from_secs(1),
        machine.exit(&record! { "exitCode" => 0i32 }),
    )
    .await
    .expect("fire-and-forget must not wait on the stuck write");
    assert!(sent.is_ok());
}

#[tokio::test]
async fn cancelled_call_leaves_the_stream_intact() {
    let (conn, mut vm) = attach_with_buffer(64);
    let machine = conn.virtual_machine().unwrap();
    let utf = "y".repeat(4096);

    let cancelled = tokio::time::timeout(
        Duration::from_millis(50),
        machine.create_string(&record! { "utf" => utf.as_str() }),
    )
    .await;
    assert!(cancelled.is_err());

    let call = tokio::spawn({
        let machine = machine.clone();
        async move { machine.version(&Record::new()).await }
    });

    // The abandoned frame still arrives whole, followed by the next one
    let create = vm.next_command().await;
    assert_eq!((create.command_set, create.command), (1, vm_commands::CREATE_STRING));
    assert_eq!(create.data.len(), 4 + utf.len());
    vm.reply(create.id, 0, 0x77u64.to_be_bytes().to_vec()).await;

    let version = vm.next_command().await;
    assert_eq!(version.command, vm_commands::VERSION);
    vm.reply(version.id, 0, version_payload("intact")).await;

    let reply = call.await.unwrap().unwrap();
    assert_eq!(reply.data.unwrap().string("vmName"), Some("intact"));
    assert_eq!(conn.state(), LoopState::Running);
}

#[tokio::test]
async fn unmapped_event_kind_stops_the_connection() {
    let (conn, mut vm) = attach();

    let mut start = Vec::new();
    start.put_u8(event_kinds::VM_START);
    start.put_i32(0);
    start.put_u64(1);
    vm.composite(0, &[start]).await;
    conn.await_event(|e| e.event_kind == event_kinds::VM_START, WAIT)
        .await
        .unwrap();

    let stub = conn.virtual_machine().unwrap();
    let call = tokio::spawn(async move { stub.version(&Record::new()).await });
    let waiter = tokio::spawn({
        let conn = conn.clone();
        async move {
            conn.await_event(|e| e.event_kind == event_kinds::BREAKPOINT, None)
                .await
        }
    });
    vm.next_command().await;

    let mut unknown = Vec::new();
    unknown.put_u8(0xEE);
    unknown.put_i32(0);
    vm.composite(0, &[unknown]).await;

    assert!(matches!(call.await.unwrap(), Err(JdwpError::ConnectionClosed)));
    assert!(matches!(waiter.await.unwrap(), Err(JdwpError::ConnectionClosed)));

    tokio::time::timeout(Duration::from_secs(1), conn.closed())
        .await
        .expect("dispatcher must stop on an unmapped event kind");
    assert_eq!(conn.state(), LoopState::Stopped);

    let events = conn.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_kind, event_kinds::VM_START);
}
