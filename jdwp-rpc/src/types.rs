// JDWP type definitions
//
// Scalar values exchanged on the wire. Every id is 8 bytes wide.

use crate::error::CodecError;
use crate::spec::WireType;
use serde::{Deserialize, Serialize};

pub type ObjectId = u64;
pub type ThreadId = ObjectId;
pub type ReferenceTypeId = u64;
pub type MethodId = u64;
pub type FieldId = u64;
pub type FrameId = u64;

// Location identifies a code position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub type_tag: u8, // 1=class, 2=interface, 3=array
    pub class_id: ReferenceTypeId,
    pub method_id: MethodId,
    pub index: u64, // bytecode index (PC)
}

// Object id preceded by its signature tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggedObjectId {
    pub tag: u8,
    pub id: ObjectId,
}

// Type tags for values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TypeTag {
    Array = 91,        // '['
    Byte = 66,         // 'B'
    Char = 67,         // 'C'
    Object = 76,       // 'L'
    Float = 70,        // 'F'
    Double = 68,       // 'D'
    Int = 73,          // 'I'
    Long = 74,         // 'J'
    Short = 83,        // 'S'
    Void = 86,         // 'V'
    Boolean = 90,      // 'Z'
    String = 115,      // 's'
    Thread = 116,      // 't'
    ThreadGroup = 103, // 'g'
    ClassLoader = 108, // 'l'
    ClassObject = 99,  // 'c'
}

impl TypeTag {
    pub fn from_u8(tag: u8) -> Option<Self> {
        let tag = match tag {
            b'[' => TypeTag::Array,
            b'B' => TypeTag::Byte,
            b'C' => TypeTag::Char,
            b'L' => TypeTag::Object,
            b'F' => TypeTag::Float,
            b'D' => TypeTag::Double,
            b'I' => TypeTag::Int,
            b'J' => TypeTag::Long,
            b'S' => TypeTag::Short,
            b'V' => TypeTag::Void,
            b'Z' => TypeTag::Boolean,
            b's' => TypeTag::String,
            b't' => TypeTag::Thread,
            b'g' => TypeTag::ThreadGroup,
            b'l' => TypeTag::ClassLoader,
            b'c' => TypeTag::ClassObject,
            _ => return None,
        };
        Some(tag)
    }

    pub fn is_object(self) -> bool {
        matches!(
            self,
            TypeTag::Array
                | TypeTag::Object
                | TypeTag::String
                | TypeTag::Thread
                | TypeTag::ThreadGroup
                | TypeTag::ClassLoader
                | TypeTag::ClassObject
        )
    }
}

// Tagged value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    pub tag: u8,
    pub data: ValueData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueData {
    Byte(i8),
    Char(u16),
    Float(f32),
    Double(f64),
    Int(i32),
    Long(i64),
    Short(i16),
    Boolean(bool),
    Object(ObjectId),
    Void,
}

/// One scalar wire value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Byte(u8),
    Boolean(bool),
    Int(i32),
    Long(i64),
    Id(u64),
    String(String),
    Location(Location),
    TaggedObject(TaggedObjectId),
    Value(Value),
}

impl Scalar {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Scalar::Byte(_) => "byte",
            Scalar::Boolean(_) => "boolean",
            Scalar::Int(_) => "int",
            Scalar::Long(_) => "long",
            Scalar::Id(_) => "id",
            Scalar::String(_) => "string",
            Scalar::Location(_) => "location",
            Scalar::TaggedObject(_) => "tagged-object",
            Scalar::Value(_) => "value",
        }
    }

    /// Integral view used for select discriminants.
    pub fn as_key(&self) -> Option<i64> {
        match *self {
            Scalar::Byte(v) => Some(v as i64),
            Scalar::Int(v) => Some(v as i64),
            Scalar::Long(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Scalar::Id(v) => i64::try_from(v).ok(),
            _ => self.as_key(),
        }
    }

    pub fn as_id(&self) -> Option<u64> {
        match *self {
            Scalar::Id(v) => Some(v),
            Scalar::Byte(v) => Some(v as u64),
            Scalar::Int(v) => u64::try_from(v).ok(),
            Scalar::Long(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_location(&self) -> Option<&Location> {
        match self {
            Scalar::Location(l) => Some(l),
            _ => None,
        }
    }

    /// Convert into the canonical scalar for `wire`, widening or narrowing
    /// integers when the value fits.
    pub fn coerce(self, wire: WireType, field: &str) -> Result<Scalar, CodecError> {
        let mismatch = |found: &Scalar| CodecError::TypeMismatch {
            field: field.to_string(),
            expected: wire.name().to_string(),
            found: found.kind_name().to_string(),
        };

        let coerced = match wire {
            WireType::Byte => self
                .as_i64()
                .and_then(|v| u8::try_from(v).ok())
                .map(Scalar::Byte),
            WireType::Boolean => match self {
                Scalar::Boolean(_) => Some(self.clone()),
                _ => None,
            },
            WireType::Int => self
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(Scalar::Int),
            WireType::Long => self.as_i64().map(Scalar::Long),
            WireType::ObjectId
            | WireType::ReferenceTypeId
            | WireType::MethodId
            | WireType::FieldId
            | WireType::FrameId => self.as_id().map(Scalar::Id),
            WireType::String => match self {
                Scalar::String(_) => Some(self.clone()),
                _ => None,
            },
            WireType::Location => match self {
                Scalar::Location(_) => Some(self.clone()),
                _ => None,
            },
            WireType::TaggedObjectId => match self {
                Scalar::TaggedObject(_) => Some(self.clone()),
                _ => None,
            },
            WireType::Value => match self {
                Scalar::Value(_) => Some(self.clone()),
                _ => None,
            },
        };

        coerced.ok_or_else(|| mismatch(&self))
    }
}

impl From<u8> for Scalar {
    fn from(v: u8) -> Self {
        Scalar::Byte(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Boolean(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Long(v)
    }
}

impl From<u64> for Scalar {
    fn from(v: u64) -> Self {
        Scalar::Id(v)
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::String(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::String(v.to_string())
    }
}

impl From<Location> for Scalar {
    fn from(v: Location) -> Self {
        Scalar::Location(v)
    }
}

impl From<TaggedObjectId> for Scalar {
    fn from(v: TaggedObjectId) -> Self {
        Scalar::TaggedObject(v)
    }
}

impl From<Value> for Scalar {
    fn from(v: Value) -> Self {
        Scalar::Value(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_narrows_when_value_fits() {
        let s = Scalar::Int(8).coerce(WireType::Byte, "eventKind").unwrap();
        assert_eq!(s, Scalar::Byte(8));

        let s = Scalar::Long(42).coerce(WireType::ObjectId, "thread").unwrap();
        assert_eq!(s, Scalar::Id(42));
    }

    #[test]
    fn test_coerce_rejects_out_of_range_and_wrong_kind() {
        let err = Scalar::Int(300).coerce(WireType::Byte, "eventKind").unwrap_err();
        assert_eq!(
            err,
            CodecError::TypeMismatch {
                field: "eventKind".to_string(),
                expected: "byte".to_string(),
                found: "int".to_string(),
            }
        );

        assert!(Scalar::from("x").coerce(WireType::Int, "n").is_err());
        assert!(Scalar::Int(-1).coerce(WireType::MethodId, "m").is_err());
    }

    #[test]
    fn test_type_tag_widths() {
        assert!(TypeTag::from_u8(b's').unwrap().is_object());
        assert!(!TypeTag::from_u8(b'I').unwrap().is_object());
        assert!(TypeTag::from_u8(b'?').is_none());
    }

    #[test]
    fn test_location_json_uses_camel_case() {
        let loc = Location {
            type_tag: 1,
            class_id: 5,
            method_id: 6,
            index: 12,
        };
        let json = serde_json::to_value(loc).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"typeTag": 1, "classId": 5, "methodId": 6, "index": 12})
        );
        assert_eq!(serde_json::from_value::<Location>(json).unwrap(), loc);

        assert!(serde_json::from_value::<Location>(
            serde_json::json!({"type_tag": 1, "class_id": 5, "method_id": 6, "index": 12})
        )
        .is_err());

        let tagged = TaggedObjectId { tag: b'L', id: 9 };
        assert_eq!(
            serde_json::to_value(tagged).unwrap(),
            serde_json::json!({"tag": 76, "id": 9})
        );
    }
}
