// Helper functions for reading JDWP data types from buffers

use crate::error::CodecError;
use crate::types::{Location, TaggedObjectId, TypeTag, Value, ValueData};
use bytes::Buf;

fn need(buf: &&[u8], what: &'static str, needed: usize) -> Result<(), CodecError> {
    if buf.remaining() < needed {
        return Err(CodecError::Truncated {
            what,
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

/// Read a JDWP string (4-byte length prefix + UTF-8 bytes)
pub fn read_string(buf: &mut &[u8]) -> Result<String, CodecError> {
    need(buf, "string length", 4)?;
    let len = buf.get_u32() as usize;
    need(buf, "string", len)?;

    let bytes = &buf[..len];
    buf.advance(len);

    String::from_utf8(bytes.to_vec()).map_err(|e| CodecError::InvalidString(e.to_string()))
}

pub fn read_u8(buf: &mut &[u8]) -> Result<u8, CodecError> {
    need(buf, "u8", 1)?;
    Ok(buf.get_u8())
}

pub fn read_bool(buf: &mut &[u8]) -> Result<bool, CodecError> {
    need(buf, "boolean", 1)?;
    Ok(buf.get_u8() != 0)
}

pub fn read_u16(buf: &mut &[u8]) -> Result<u16, CodecError> {
    need(buf, "u16", 2)?;
    Ok(buf.get_u16())
}

pub fn read_i32(buf: &mut &[u8]) -> Result<i32, CodecError> {
    need(buf, "i32", 4)?;
    Ok(buf.get_i32())
}

pub fn read_u32(buf: &mut &[u8]) -> Result<u32, CodecError> {
    need(buf, "u32", 4)?;
    Ok(buf.get_u32())
}

pub fn read_i64(buf: &mut &[u8]) -> Result<i64, CodecError> {
    need(buf, "i64", 8)?;
    Ok(buf.get_i64())
}

pub fn read_u64(buf: &mut &[u8]) -> Result<u64, CodecError> {
    need(buf, "u64", 8)?;
    Ok(buf.get_u64())
}

pub fn read_location(buf: &mut &[u8]) -> Result<Location, CodecError> {
    need(buf, "location", 25)?;
    Ok(Location {
        type_tag: buf.get_u8(),
        class_id: buf.get_u64(),
        method_id: buf.get_u64(),
        index: buf.get_u64(),
    })
}

pub fn read_tagged_object(buf: &mut &[u8]) -> Result<TaggedObjectId, CodecError> {
    need(buf, "tagged object id", 9)?;
    Ok(TaggedObjectId {
        tag: buf.get_u8(),
        id: buf.get_u64(),
    })
}

/// Read a tagged value; the tag decides how many bytes follow.
pub fn read_value(buf: &mut &[u8]) -> Result<Value, CodecError> {
    let tag = read_u8(buf)?;
    let type_tag = TypeTag::from_u8(tag).ok_or(CodecError::InvalidTag(tag))?;

    let data = match type_tag {
        TypeTag::Byte => ValueData::Byte(read_u8(buf)? as i8),
        TypeTag::Char => ValueData::Char(read_u16(buf)?),
        TypeTag::Short => ValueData::Short(read_u16(buf)? as i16),
        TypeTag::Int => ValueData::Int(read_i32(buf)?),
        TypeTag::Long => ValueData::Long(read_i64(buf)?),
        TypeTag::Float => ValueData::Float(f32::from_bits(read_u32(buf)?)),
        TypeTag::Double => ValueData::Double(f64::from_bits(read_u64(buf)?)),
        TypeTag::Boolean => ValueData::Boolean(read_bool(buf)?),
        TypeTag::Void => ValueData::Void,
        _ => ValueData::Object(read_u64(buf)?),
    };

    Ok(Value { tag, data })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_string() {
        let data = [0, 0, 0, 2, b'h', b'i', 9];
        let mut buf = &data[..];
        assert_eq!(read_string(&mut buf).unwrap(), "hi");
        assert_eq!(buf, &[9]);
    }

    #[test]
    fn test_truncated_reports_sizes() {
        let data = [0, 0, 0, 5, b'h'];
        let mut buf = &data[..];
        assert_eq!(
            read_string(&mut buf),
            Err(CodecError::Truncated {
                what: "string",
                needed: 5,
                remaining: 1
            })
        );
    }

    #[test]
    fn test_read_value_by_tag() {
        let data = [b'I', 0, 0, 0, 7, b'Z', 1, b's', 0, 0, 0, 0, 0, 0, 0, 3];
        let mut buf = &data[..];
        assert_eq!(read_value(&mut buf).unwrap().data, ValueData::Int(7));
        assert_eq!(read_value(&mut buf).unwrap().data, ValueData::Boolean(true));
        assert_eq!(read_value(&mut buf).unwrap().data, ValueData::Object(3));
        assert!(buf.is_empty());

        let mut bad = &[b'?', 0][..];
        assert_eq!(read_value(&mut bad), Err(CodecError::InvalidTag(b'?')));
    }
}
