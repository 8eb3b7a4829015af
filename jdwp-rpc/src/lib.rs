// JDWP client library driven by a protocol specification
//
// - Specification model and built-in JDWP command sets
// - Codec generation: pack formats, request packers, reply unpackers
// - Request/reply correlation over one connection
// - Event dispatch with callbacks and predicate waits
// - Command stubs per command set

pub mod codegen;
pub mod commands;
pub mod config;
pub mod connection;
pub mod correlation;
pub mod error;
pub mod eventloop;
pub mod events;
pub mod protocol;
pub mod reader;
pub mod record;
pub mod spec;
pub mod stubs;
pub mod types;
pub mod wire;

pub use codegen::Protocol;
pub use config::ClientConfig;
pub use connection::JdwpConnection;
pub use error::{CodecError, GenerationError, JdwpError, JdwpResult, LookupError};
pub use eventloop::LoopState;
pub use events::EventRecord;
pub use record::{Data, Record};
pub use stubs::{CommandSetStub, Reply, SuspendPolicy};
