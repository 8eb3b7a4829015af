// Error taxonomy
//
// GenerationError - malformed specification, raised before any stub exists
// CodecError      - a value does not fit its declared wire shape
// LookupError     - a key is missing from one of the generated tables
// JdwpError       - everything a live connection can report

use thiserror::Error;

pub type JdwpResult<T> = Result<T, JdwpError>;

#[derive(Debug, Error)]
pub enum JdwpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid handshake")]
    InvalidHandshake,

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Lookup failed: {0}")]
    Lookup(#[from] LookupError),

    #[error("Protocol generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("JDWP error code {code}: {name}")]
    Vm { code: u16, name: String },

    #[error("Timed out")]
    Timeout,

    #[error("Connection closed")]
    ConnectionClosed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("unknown argument kind '{kind}' in {context}")]
    UnknownArgumentKind { kind: String, context: String },

    #[error("unknown wire type '{name}' in {context}")]
    UnknownWireType { name: String, context: String },

    #[error("missing '{key}' in {context}")]
    MissingKey { key: &'static str, context: String },

    #[error("select in {context} has no variants")]
    EmptySelect { context: String },

    #[error("select in {context} declares discriminant {value} twice")]
    DuplicateVariant { context: String, value: i64 },

    #[error("select discriminant in {context} must be byte or int, found {found}")]
    InvalidDiscriminant { context: String, found: String },

    #[error("command set {set} declares command id {id} twice")]
    DuplicateCommandId { set: String, id: u8 },

    #[error("command set id {id} declared twice")]
    DuplicateCommandSetId { id: u8 },

    #[error("specification declares no constant sets; the error set must come first")]
    MissingErrorConstants,

    #[error("invalid specification document: {0}")]
    Document(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("not enough data for {what}: need {needed}, have {remaining}")]
    Truncated {
        what: &'static str,
        needed: usize,
        remaining: usize,
    },

    #[error("{0} trailing bytes after decoding")]
    TrailingBytes(usize),

    #[error("missing field '{0}'")]
    MissingField(String),

    #[error("field '{field}' expects {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    #[error("value does not match wire shape {expected}")]
    ShapeMismatch { expected: String },

    #[error("no variant for discriminant {0}")]
    UnknownDiscriminant(i64),

    #[error("invalid value tag {0:#x}")]
    InvalidTag(u8),

    #[error("invalid count {0}")]
    InvalidCount(i32),

    #[error("invalid UTF-8 in string: {0}")]
    InvalidString(String),

    #[error("invalid pack format '{format}' at {position}")]
    InvalidFormat { format: String, position: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("unknown error code {0}")]
    UnknownErrorCode(u16),

    #[error("no pack format for key {0}")]
    UnknownCommandKey(String),

    #[error("unknown command set '{0}'")]
    UnknownCommandSet(String),

    #[error("unknown command {set}.{command}")]
    UnknownCommand { set: String, command: String },

    #[error("{set}.{command} delivers events and has no synchronous reply")]
    NoSynchronousReply { set: String, command: String },
}
