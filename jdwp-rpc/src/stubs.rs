// Command stubs
//
// Each stub packs a named request, sends it through the correlator and
// unpacks the reply. Nonzero JDWP error codes come back inside `Reply`.

use crate::codegen::{CompiledCommand, Protocol};
use crate::commands::{event_kinds, mod_kinds};
use crate::connection::JdwpConnection;
use crate::error::{CodecError, JdwpError, JdwpResult, LookupError};
use crate::record::{Data, Record};
use crate::types::{Location, MethodId, ReferenceTypeId};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Suspend policy for events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SuspendPolicy {
    None = 0,
    EventThread = 1,
    All = 2,
}

/// Result of one command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub request_id: u32,
    pub error_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub data: Option<Record>,
}

impl Reply {
    pub fn is_error(&self) -> bool {
        self.error_code != 0
    }

    /// Symbolic name of the error code, when the error table knows it.
    pub fn error_name(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn into_result(self) -> JdwpResult<Record> {
        if self.error_code != 0 {
            return Err(JdwpError::Vm {
                code: self.error_code,
                name: self.error.unwrap_or_else(|| "UNKNOWN_ERROR".to_string()),
            });
        }
        Ok(self.data.unwrap_or_default())
    }
}

/// Stub for one command set, looked up by name.
#[derive(Debug, Clone)]
pub struct CommandSetStub {
    conn: JdwpConnection,
    name: String,
}

impl CommandSetStub {
    pub fn new(conn: &JdwpConnection, name: &str) -> JdwpResult<Self> {
        conn.command_set(name)?;
        Ok(Self {
            conn: conn.clone(),
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connection(&self) -> &JdwpConnection {
        &self.conn
    }

    fn protocol(&self) -> Arc<Protocol> {
        self.conn.protocol().clone()
    }

    pub async fn call(&self, command: &str, request: &Record) -> JdwpResult<Reply> {
        self.call_with_timeout(command, request, None).await
    }

    pub async fn call_with_timeout(
        &self,
        command: &str,
        request: &Record,
        timeout: Option<Duration>,
    ) -> JdwpResult<Reply> {
        let protocol = self.protocol();
        let cmd = protocol.command(&self.name, command)?;
        if !cmd.has_reply() {
            return Err(LookupError::NoSynchronousReply {
                set: self.name.clone(),
                command: command.to_string(),
            }
            .into());
        }

        let values = cmd.pack_request(request)?;
        let raw = self
            .conn
            .call_and_await(cmd.set_id, cmd.id, &values, timeout)
            .await?;

        if raw.error_code != 0 {
            log_error(&protocol, cmd, raw.error_code, raw.request_id, request);
            return Ok(Reply {
                request_id: raw.request_id,
                error_code: raw.error_code,
                error: protocol.errors().lookup(raw.error_code).ok().map(String::from),
                data: None,
            });
        }

        let data = cmd.unpack_response(raw.values.unwrap_or_default())?;
        Ok(Reply {
            request_id: raw.request_id,
            error_code: 0,
            error: None,
            data: Some(data),
        })
    }

    /// Fire-and-forget. Returns the id the request was sent with.
    pub async fn send(&self, command: &str, request: &Record) -> JdwpResult<u32> {
        let protocol = self.protocol();
        let cmd = protocol.command(&self.name, command)?;
        let values = cmd.pack_request(request)?;
        self.conn.send_no_wait(cmd.set_id, cmd.id, &values).await
    }
}

fn log_error(protocol: &Protocol, cmd: &CompiledCommand, code: u16, request_id: u32, request: &Record) {
    let summary = serde_json::to_string(request).unwrap_or_default();
    warn!(
        "{}",
        protocol
            .errors()
            .diagnostic(code, request_id, cmd.set_id, cmd.id, &summary)
    );
}

macro_rules! command_set_stubs {
    (@method call $method:ident $command:literal) => {
        pub async fn $method(&self, request: &Record) -> JdwpResult<Reply> {
            self.0.call($command, request).await
        }
    };
    (@method send $method:ident $command:literal) => {
        pub async fn $method(&self, request: &Record) -> JdwpResult<u32> {
            self.0.send($command, request).await
        }
    };
    ($(
        $(#[$doc:meta])*
        $stub:ident, $accessor:ident, $set:literal {
            $($kind:ident $method:ident => $command:literal;)*
        }
    )*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone)]
            pub struct $stub(CommandSetStub);

            impl $stub {
                $(command_set_stubs!(@method $kind $method $command);)*

                pub fn stub(&self) -> &CommandSetStub {
                    &self.0
                }
            }

            impl JdwpConnection {
                pub fn $accessor(&self) -> JdwpResult<$stub> {
                    CommandSetStub::new(self, $set).map($stub)
                }
            }
        )*
    };
}

command_set_stubs! {
    /// VirtualMachine command set (1)
    VirtualMachine, virtual_machine, "VirtualMachine" {
        call version => "Version";
        call classes_by_signature => "ClassesBySignature";
        call all_classes => "AllClasses";
        call all_threads => "AllThreads";
        call top_level_thread_groups => "TopLevelThreadGroups";
        call dispose => "Dispose";
        call id_sizes => "IDSizes";
        call suspend => "Suspend";
        call resume => "Resume";
        send exit => "Exit";
        call create_string => "CreateString";
        call capabilities => "Capabilities";
        call class_paths => "ClassPaths";
        call dispose_objects => "DisposeObjects";
        call hold_events => "HoldEvents";
        call release_events => "ReleaseEvents";
    }

    /// ReferenceType command set (2)
    ReferenceType, reference_type, "ReferenceType" {
        call signature => "Signature";
        call class_loader => "ClassLoader";
        call modifiers => "Modifiers";
        call fields => "Fields";
        call methods => "Methods";
        call get_values => "GetValues";
        call source_file => "SourceFile";
        call status => "Status";
        call interfaces => "Interfaces";
        call class_object => "ClassObject";
    }

    ClassType, class_type, "ClassType" {
        call superclass => "Superclass";
    }

    Method, method, "Method" {
        call line_table => "LineTable";
        call variable_table => "VariableTable";
        call bytecodes => "Bytecodes";
    }

    ObjectReference, object_reference, "ObjectReference" {
        call reference_type => "ReferenceType";
        call get_values => "GetValues";
    }

    StringReference, string_reference, "StringReference" {
        call value => "Value";
    }

    /// ThreadReference command set (11)
    ThreadReference, thread_reference, "ThreadReference" {
        call name => "Name";
        call suspend => "Suspend";
        call resume => "Resume";
        call status => "Status";
        call thread_group => "ThreadGroup";
        call frames => "Frames";
        call frame_count => "FrameCount";
        call suspend_count => "SuspendCount";
    }

    ThreadGroupReference, thread_group_reference, "ThreadGroupReference" {
        call name => "Name";
    }

    ArrayReference, array_reference, "ArrayReference" {
        call length => "Length";
    }

    /// EventRequest command set (15)
    EventRequest, event_request, "EventRequest" {
        call set => "Set";
        call clear => "Clear";
        call clear_all_breakpoints => "ClearAllBreakpoints";
    }

    StackFrame, stack_frame, "StackFrame" {
        call get_values => "GetValues";
        call this_object => "ThisObject";
    }
}

impl EventRequest {
    /// Set a breakpoint at a specific location.
    /// Returns the request ID carried by the resulting events.
    pub async fn set_breakpoint(
        &self,
        class_id: ReferenceTypeId,
        method_id: MethodId,
        bytecode_index: u64,
        suspend_policy: SuspendPolicy,
    ) -> JdwpResult<i32> {
        let location = Location {
            type_tag: 1, // class
            class_id,
            method_id,
            index: bytecode_index,
        };
        let modifier = Record::new()
            .with("modKind", mod_kinds::LOCATION_ONLY)
            .with("loc", location);

        self.set_event(event_kinds::BREAKPOINT, suspend_policy, vec![Data::from(modifier)])
            .await
    }

    /// Ask for CLASS_PREPARE events, optionally filtered by a class pattern.
    pub async fn set_class_prepare(
        &self,
        class_pattern: Option<&str>,
        suspend_policy: SuspendPolicy,
    ) -> JdwpResult<i32> {
        let modifiers = class_pattern
            .map(|pattern| {
                Data::from(
                    Record::new()
                        .with("modKind", mod_kinds::CLASS_MATCH)
                        .with("classPattern", pattern),
                )
            })
            .into_iter()
            .collect();

        self.set_event(event_kinds::CLASS_PREPARE, suspend_policy, modifiers)
            .await
    }

    async fn set_event(&self, event_kind: u8, suspend_policy: SuspendPolicy, modifiers: Vec<Data>) -> JdwpResult<i32> {
        let request = Record::new()
            .with("eventKind", event_kind)
            .with("suspendPolicy", suspend_policy as u8)
            .with("modifiers", modifiers);

        let reply = self.set(&request).await?.into_result()?;
        reply
            .int("requestID")
            .and_then(|id| i32::try_from(id).ok())
            .ok_or_else(|| CodecError::MissingField("requestID".to_string()).into())
    }

    /// Clear a breakpoint by request ID
    pub async fn clear_breakpoint(&self, request_id: i32) -> JdwpResult<()> {
        let request = Record::new()
            .with("eventKind", event_kinds::BREAKPOINT)
            .with("requestID", request_id);
        self.clear(&request).await?.into_result().map(|_| ())
    }
}
