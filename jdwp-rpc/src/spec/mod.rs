// Specification model
//
// In-memory description of JDWP command sets, commands and argument shapes.
// Pure data: the codec generator in `crate::codegen` is its only consumer.

pub mod builtin;
pub mod document;

use serde::{Deserialize, Serialize};

/// Scalar wire types. Width and encoding of each is fixed by the scalar codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WireType {
    Byte,
    Boolean,
    Int,
    Long,
    ObjectId,
    ReferenceTypeId,
    MethodId,
    FieldId,
    FrameId,
    String,
    Location,
    TaggedObjectId,
    Value,
}

impl WireType {
    /// Single character used in pack-format descriptors.
    pub fn format_char(self) -> char {
        match self {
            WireType::Byte => 'b',
            WireType::Boolean => 'z',
            WireType::Int => 'i',
            WireType::Long => 'l',
            WireType::ObjectId => 'o',
            WireType::ReferenceTypeId => 'r',
            WireType::MethodId => 'm',
            WireType::FieldId => 'f',
            WireType::FrameId => 'F',
            WireType::String => 's',
            WireType::Location => 'L',
            WireType::TaggedObjectId => 'T',
            WireType::Value => 'v',
        }
    }

    pub fn from_format_char(c: char) -> Option<Self> {
        let wire = match c {
            'b' => WireType::Byte,
            'z' => WireType::Boolean,
            'i' => WireType::Int,
            'l' => WireType::Long,
            'o' => WireType::ObjectId,
            'r' => WireType::ReferenceTypeId,
            'm' => WireType::MethodId,
            'f' => WireType::FieldId,
            'F' => WireType::FrameId,
            's' => WireType::String,
            'L' => WireType::Location,
            'T' => WireType::TaggedObjectId,
            'v' => WireType::Value,
            _ => return None,
        };
        Some(wire)
    }

    /// Map a JDWP type name, as written in specification documents.
    pub fn from_name(name: &str) -> Option<Self> {
        let wire = match name {
            "byte" => WireType::Byte,
            "boolean" => WireType::Boolean,
            "int" => WireType::Int,
            "long" => WireType::Long,
            "object" | "threadObject" | "threadGroupObject" | "stringObject"
            | "classLoaderObject" | "classObject" | "arrayObject" => WireType::ObjectId,
            "referenceType" | "referenceTypeID" | "classType" | "interfaceType"
            | "arrayType" => WireType::ReferenceTypeId,
            "method" | "methodID" => WireType::MethodId,
            "field" | "fieldID" => WireType::FieldId,
            "frame" | "frameID" => WireType::FrameId,
            "string" => WireType::String,
            "location" => WireType::Location,
            "tagged-object" | "taggedObject" => WireType::TaggedObjectId,
            "value" => WireType::Value,
            _ => return None,
        };
        Some(wire)
    }

    pub fn name(self) -> &'static str {
        match self {
            WireType::Byte => "byte",
            WireType::Boolean => "boolean",
            WireType::Int => "int",
            WireType::Long => "long",
            WireType::ObjectId => "object",
            WireType::ReferenceTypeId => "referenceType",
            WireType::MethodId => "methodID",
            WireType::FieldId => "fieldID",
            WireType::FrameId => "frameID",
            WireType::String => "string",
            WireType::Location => "location",
            WireType::TaggedObjectId => "tagged-object",
            WireType::Value => "value",
        }
    }

    pub fn is_integral(self) -> bool {
        matches!(self, WireType::Byte | WireType::Int)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Simple {
    pub name: String,
    pub wire_type: WireType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub fields: Vec<Simple>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variant {
    pub value: i64,
    pub name: String,
    pub group: Group,
}

/// Tagged union. Variants are kept in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Select {
    pub discriminant: Simple,
    pub variants: Vec<Variant>,
}

impl Select {
    pub fn variant(&self, value: i64) -> Option<&Variant> {
        self.variants.iter().find(|v| v.value == value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RepeatElement {
    Simple(Simple),
    Group(Group),
    Select(Select),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repeat {
    pub name: String,
    pub element: RepeatElement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Argument {
    Simple(Simple),
    Repeat(Repeat),
    Group(Group),
    Select(Select),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub args: Vec<Argument>,
}

/// Asynchronous events: suspend policy, count, then one `select` per event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventComposite {
    pub events: Select,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ResponseShape {
    Reply(Response),
    Events(EventComposite),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    pub id: u8,
    pub name: String,
    pub request: Vec<Argument>,
    pub response: ResponseShape,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSet {
    pub id: u8,
    pub name: String,
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constant {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstantSet {
    pub name: String,
    pub constants: Vec<Constant>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Specification {
    pub command_sets: Vec<CommandSet>,
    pub constant_sets: Vec<ConstantSet>,
}

impl Specification {
    /// The error set is the first constant set by convention.
    pub fn error_constants(&self) -> Option<&ConstantSet> {
        self.constant_sets.first()
    }

    pub fn command_set(&self, name: &str) -> Option<&CommandSet> {
        self.command_sets.iter().find(|cs| cs.name == name)
    }
}

// Builders used by the built-in specification and by tests

pub fn simple(name: &str, wire_type: WireType) -> Simple {
    Simple {
        name: name.to_string(),
        wire_type,
    }
}

pub fn arg(name: &str, wire_type: WireType) -> Argument {
    Argument::Simple(simple(name, wire_type))
}

pub fn group(fields: Vec<Simple>) -> Group {
    Group { fields }
}

pub fn repeat(name: &str, element: RepeatElement) -> Argument {
    Argument::Repeat(Repeat {
        name: name.to_string(),
        element,
    })
}

pub fn variant(value: i64, name: &str, fields: Vec<Simple>) -> Variant {
    Variant {
        value,
        name: name.to_string(),
        group: Group { fields },
    }
}

pub fn command(id: u8, name: &str, request: Vec<Argument>, reply: Vec<Argument>) -> Command {
    Command {
        id,
        name: name.to_string(),
        request,
        response: ResponseShape::Reply(Response { args: reply }),
    }
}
