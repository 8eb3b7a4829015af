// Scalar wire codec
//
// Turns positional wire values into frame payload bytes and back, guided only
// by a pack-format descriptor. All multi-byte values are big-endian.

use crate::codegen::format::{Format, PackFormat};
use crate::error::CodecError;
use crate::reader::*;
use crate::spec::WireType;
use crate::types::{Scalar, Value, ValueData};
use bytes::{BufMut, BytesMut};
use serde::Serialize;

/// Positional value produced by request packing and consumed by reply
/// unpacking. A group or a select travels as a tuple; a select tuple carries
/// its discriminant first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WireValue {
    Scalar(Scalar),
    Tuple(Vec<WireValue>),
    Seq(Vec<WireValue>),
}

impl WireValue {
    pub fn scalar(v: impl Into<Scalar>) -> Self {
        WireValue::Scalar(v.into())
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            WireValue::Scalar(s) => Some(s),
            _ => None,
        }
    }
}

pub fn encode(format: &PackFormat, values: &[WireValue]) -> Result<Vec<u8>, CodecError> {
    if format.0.len() != values.len() {
        return Err(shape(format));
    }
    let mut buf = BytesMut::new();
    for (f, v) in format.0.iter().zip(values) {
        encode_one(f, v, &mut buf)?;
    }
    Ok(buf.to_vec())
}

pub fn decode(format: &PackFormat, data: &[u8]) -> Result<Vec<WireValue>, CodecError> {
    let mut buf = data;
    let values = format
        .0
        .iter()
        .map(|f| decode_one(f, &mut buf))
        .collect::<Result<Vec<_>, _>>()?;

    if !buf.is_empty() {
        return Err(CodecError::TrailingBytes(buf.len()));
    }
    Ok(values)
}

fn shape(expected: &impl std::fmt::Display) -> CodecError {
    CodecError::ShapeMismatch {
        expected: expected.to_string(),
    }
}

fn encode_one(format: &Format, value: &WireValue, buf: &mut BytesMut) -> Result<(), CodecError> {
    match (format, value) {
        (Format::Scalar(wire), WireValue::Scalar(s)) => encode_scalar(*wire, s, buf),
        (Format::Group(items), WireValue::Tuple(values)) => {
            if items.len() != values.len() {
                return Err(shape(format));
            }
            for (f, v) in items.iter().zip(values) {
                encode_one(f, v, buf)?;
            }
            Ok(())
        }
        (Format::Repeat(element), WireValue::Seq(values)) => {
            buf.put_i32(values.len() as i32);
            for v in values {
                encode_one(element, v, buf)?;
            }
            Ok(())
        }
        (
            Format::Select {
                discriminant,
                variants,
            },
            WireValue::Tuple(values),
        ) => {
            let (tag, fields) = match values.split_first() {
                Some((WireValue::Scalar(tag), fields)) => (tag, fields),
                _ => return Err(shape(format)),
            };
            let key = tag.as_key().ok_or_else(|| shape(format))?;
            let items = variants
                .get(&key)
                .ok_or(CodecError::UnknownDiscriminant(key))?;
            if items.len() != fields.len() {
                return Err(shape(format));
            }
            encode_scalar(*discriminant, tag, buf)?;
            for (f, v) in items.iter().zip(fields) {
                encode_one(f, v, buf)?;
            }
            Ok(())
        }
        _ => Err(shape(format)),
    }
}

fn encode_scalar(wire: WireType, scalar: &Scalar, buf: &mut BytesMut) -> Result<(), CodecError> {
    match (wire, scalar) {
        (WireType::Byte, Scalar::Byte(v)) => buf.put_u8(*v),
        (WireType::Boolean, Scalar::Boolean(v)) => buf.put_u8(*v as u8),
        (WireType::Int, Scalar::Int(v)) => buf.put_i32(*v),
        (WireType::Long, Scalar::Long(v)) => buf.put_i64(*v),
        (
            WireType::ObjectId
            | WireType::ReferenceTypeId
            | WireType::MethodId
            | WireType::FieldId
            | WireType::FrameId,
            Scalar::Id(v),
        ) => buf.put_u64(*v),
        (WireType::String, Scalar::String(s)) => {
            buf.put_u32(s.len() as u32);
            buf.put_slice(s.as_bytes());
        }
        (WireType::Location, Scalar::Location(loc)) => {
            buf.put_u8(loc.type_tag);
            buf.put_u64(loc.class_id);
            buf.put_u64(loc.method_id);
            buf.put_u64(loc.index);
        }
        (WireType::TaggedObjectId, Scalar::TaggedObject(t)) => {
            buf.put_u8(t.tag);
            buf.put_u64(t.id);
        }
        (WireType::Value, Scalar::Value(v)) => encode_value(v, buf),
        // Integers the caller did not normalise yet
        (wire, s) => {
            let coerced = s.clone().coerce(wire, "")?;
            if &coerced == s {
                return Err(shape(&wire.format_char()));
            }
            return encode_scalar(wire, &coerced, buf);
        }
    }
    Ok(())
}

fn encode_value(v: &Value, buf: &mut BytesMut) {
    buf.put_u8(v.tag);
    match v.data {
        ValueData::Byte(b) => buf.put_i8(b),
        ValueData::Char(c) => buf.put_u16(c),
        ValueData::Short(s) => buf.put_i16(s),
        ValueData::Int(i) => buf.put_i32(i),
        ValueData::Long(l) => buf.put_i64(l),
        ValueData::Float(f) => buf.put_f32(f),
        ValueData::Double(d) => buf.put_f64(d),
        ValueData::Boolean(b) => buf.put_u8(b as u8),
        ValueData::Object(id) => buf.put_u64(id),
        ValueData::Void => {}
    }
}

fn decode_one(format: &Format, buf: &mut &[u8]) -> Result<WireValue, CodecError> {
    match format {
        Format::Scalar(wire) => Ok(WireValue::Scalar(decode_scalar(*wire, buf)?)),
        Format::Group(items) => Ok(WireValue::Tuple(
            items
                .iter()
                .map(|f| decode_one(f, buf))
                .collect::<Result<Vec<_>, _>>()?,
        )),
        Format::Repeat(element) => {
            let count = read_i32(buf)?;
            if count < 0 {
                return Err(CodecError::InvalidCount(count));
            }
            // Each element takes at least one byte unless its format is empty
            let mut values = Vec::with_capacity((count as usize).min(buf.len()));
            for _ in 0..count {
                values.push(decode_one(element, buf)?);
            }
            Ok(WireValue::Seq(values))
        }
        Format::Select {
            discriminant,
            variants,
        } => {
            let tag = decode_scalar(*discriminant, buf)?;
            let key = tag.as_key().ok_or_else(|| shape(format))?;
            let items = variants
                .get(&key)
                .ok_or(CodecError::UnknownDiscriminant(key))?;
            let mut values = Vec::with_capacity(items.len() + 1);
            values.push(WireValue::Scalar(tag));
            for f in items {
                values.push(decode_one(f, buf)?);
            }
            Ok(WireValue::Tuple(values))
        }
    }
}

fn decode_scalar(wire: WireType, buf: &mut &[u8]) -> Result<Scalar, CodecError> {
    let scalar = match wire {
        WireType::Byte => Scalar::Byte(read_u8(buf)?),
        WireType::Boolean => Scalar::Boolean(read_bool(buf)?),
        WireType::Int => Scalar::Int(read_i32(buf)?),
        WireType::Long => Scalar::Long(read_i64(buf)?),
        WireType::ObjectId
        | WireType::ReferenceTypeId
        | WireType::MethodId
        | WireType::FieldId
        | WireType::FrameId => Scalar::Id(read_u64(buf)?),
        WireType::String => Scalar::String(read_string(buf)?),
        WireType::Location => Scalar::Location(read_location(buf)?),
        WireType::TaggedObjectId => Scalar::TaggedObject(read_tagged_object(buf)?),
        WireType::Value => Scalar::Value(read_value(buf)?),
    };
    Ok(scalar)
}
