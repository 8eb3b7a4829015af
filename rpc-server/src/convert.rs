// JSON params -> request records
//
// Walks a command's request arguments and picks matching keys out of a JSON
// object. Absent fields are left out so the packer reports them by name.

use jdwp_rpc::record::{Data, Record};
use jdwp_rpc::spec::{Argument, Group, RepeatElement, Select, Simple, WireType};
use jdwp_rpc::types::{Location, Scalar, TaggedObjectId, TypeTag, Value, ValueData};
use serde_json::{Map, Value as Json};

pub fn record_from_json(args: &[Argument], params: &Json) -> Result<Record, String> {
    let object = match params {
        Json::Object(map) => map,
        Json::Null => return Ok(Record::new()),
        other => return Err(format!("params must be an object, got {}", other)),
    };

    let mut record = Record::new();
    for arg in args {
        convert_argument(&mut record, arg, object)?;
    }
    Ok(record)
}

fn convert_argument(record: &mut Record, arg: &Argument, object: &Map<String, Json>) -> Result<(), String> {
    match arg {
        Argument::Simple(field) => convert_field(record, field, object),
        Argument::Group(group) => convert_group(record, group, object),
        Argument::Select(select) => convert_select(record, select, object),
        Argument::Repeat(repeat) => {
            let Some(value) = object.get(&repeat.name) else {
                return Ok(());
            };
            let items = value
                .as_array()
                .ok_or_else(|| format!("{}: expected an array", repeat.name))?;

            let list = items
                .iter()
                .map(|item| convert_element(&repeat.element, &repeat.name, item))
                .collect::<Result<Vec<_>, _>>()?;
            record.insert(&repeat.name, Data::List(list));
            Ok(())
        }
    }
}

fn convert_element(element: &RepeatElement, name: &str, item: &Json) -> Result<Data, String> {
    match element {
        RepeatElement::Simple(field) => scalar_from_json(field, item).map(Data::Scalar),
        RepeatElement::Group(group) => {
            let object = element_object(name, item)?;
            let mut record = Record::new();
            convert_group(&mut record, group, object)?;
            Ok(Data::Record(record))
        }
        RepeatElement::Select(select) => {
            let object = element_object(name, item)?;
            let mut record = Record::new();
            convert_select(&mut record, select, object)?;
            Ok(Data::Record(record))
        }
    }
}

fn element_object<'a>(name: &str, item: &'a Json) -> Result<&'a Map<String, Json>, String> {
    item.as_object()
        .ok_or_else(|| format!("{}: elements must be objects", name))
}

fn convert_field(record: &mut Record, field: &Simple, object: &Map<String, Json>) -> Result<(), String> {
    if let Some(value) = object.get(&field.name) {
        record.insert(&field.name, scalar_from_json(field, value)?);
    }
    Ok(())
}

fn convert_group(record: &mut Record, group: &Group, object: &Map<String, Json>) -> Result<(), String> {
    for field in &group.fields {
        convert_field(record, field, object)?;
    }
    Ok(())
}

fn convert_select(record: &mut Record, select: &Select, object: &Map<String, Json>) -> Result<(), String> {
    convert_field(record, &select.discriminant, object)?;

    let Some(key) = record
        .scalar(&select.discriminant.name)
        .and_then(Scalar::as_key)
    else {
        return Ok(());
    };
    let variant = select
        .variant(key)
        .ok_or_else(|| format!("{}: no variant for {}", select.discriminant.name, key))?;
    convert_group(record, &variant.group, object)
}

fn scalar_from_json(field: &Simple, value: &Json) -> Result<Scalar, String> {
    let name = &field.name;
    let invalid = || format!("{}: expected {}, got {}", name, field.wire_type.name(), value);

    let scalar = match field.wire_type {
        WireType::Byte | WireType::Int | WireType::Long => {
            value.as_i64().map(Scalar::Long).ok_or_else(invalid)?
        }
        WireType::Boolean => value.as_bool().map(Scalar::Boolean).ok_or_else(invalid)?,
        WireType::ObjectId
        | WireType::ReferenceTypeId
        | WireType::MethodId
        | WireType::FieldId
        | WireType::FrameId => id_from_json(value).map(Scalar::Id).ok_or_else(invalid)?,
        WireType::String => value
            .as_str()
            .map(|s| Scalar::String(s.to_string()))
            .ok_or_else(invalid)?,
        WireType::Location => serde_json::from_value::<Location>(value.clone())
            .map(Scalar::Location)
            .map_err(|e| format!("{}: {}", name, e))?,
        WireType::TaggedObjectId => serde_json::from_value::<TaggedObjectId>(value.clone())
            .map(Scalar::TaggedObject)
            .map_err(|e| format!("{}: {}", name, e))?,
        WireType::Value => tagged_value(value).map(Scalar::Value).ok_or_else(invalid)?,
    };
    Ok(scalar)
}

// Numbers, or decimal strings for ids past 2^53
fn id_from_json(value: &Json) -> Option<u64> {
    match value {
        Json::Number(n) => n.as_u64(),
        Json::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// `{"tag": 73, "data": 42}`: the tag decides how `data` is read.
fn tagged_value(value: &Json) -> Option<Value> {
    let tag = u8::try_from(value.get("tag")?.as_u64()?).ok()?;
    let data = value.get("data").unwrap_or(&Json::Null);

    let data = match TypeTag::from_u8(tag)? {
        TypeTag::Byte => ValueData::Byte(i8::try_from(data.as_i64()?).ok()?),
        TypeTag::Char => ValueData::Char(u16::try_from(data.as_u64()?).ok()?),
        TypeTag::Short => ValueData::Short(i16::try_from(data.as_i64()?).ok()?),
        TypeTag::Int => ValueData::Int(i32::try_from(data.as_i64()?).ok()?),
        TypeTag::Long => ValueData::Long(data.as_i64()?),
        TypeTag::Float => ValueData::Float(data.as_f64()? as f32),
        TypeTag::Double => ValueData::Double(data.as_f64()?),
        TypeTag::Boolean => ValueData::Boolean(data.as_bool()?),
        TypeTag::Void => ValueData::Void,
        t if t.is_object() => ValueData::Object(id_from_json(data)?),
        _ => return None,
    };
    Some(Value { tag, data })
}
