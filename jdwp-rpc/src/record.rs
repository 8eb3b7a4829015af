// Named records
//
// Requests and replies as callers see them: ordered name -> value pairs.
// Group and select contents are flattened into the record that holds them;
// repeated arguments become lists.

use crate::types::{Location, Scalar, TaggedObjectId, Value};
use serde::ser::{Serialize, SerializeMap, Serializer};

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Data {
    Scalar(Scalar),
    List(Vec<Data>),
    Record(Record),
}

impl Data {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Data::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Data]> {
        match self {
            Data::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Data::Record(r) => Some(r),
            _ => None,
        }
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Data::Scalar(s) => s.kind_name(),
            Data::List(_) => "list",
            Data::Record(_) => "record",
        }
    }
}

macro_rules! scalar_data {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Data {
            fn from(v: $ty) -> Self {
                Data::Scalar(Scalar::from(v))
            }
        })*
    };
}

scalar_data!(u8, bool, i32, i64, u64, String, &str, Location, TaggedObjectId, Value);

impl From<Scalar> for Data {
    fn from(s: Scalar) -> Self {
        Data::Scalar(s)
    }
}

impl From<Record> for Data {
    fn from(r: Record) -> Self {
        Data::Record(r)
    }
}

impl From<Vec<Data>> for Data {
    fn from(items: Vec<Data>) -> Self {
        Data::List(items)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Data)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Data>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace, keeping the original position of a replaced field.
    pub fn insert(&mut self, name: &str, value: impl Into<Data>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Data> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn scalar(&self, name: &str) -> Option<&Scalar> {
        self.get(name).and_then(Data::as_scalar)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.scalar(name).and_then(Scalar::as_i64)
    }

    pub fn id(&self, name: &str) -> Option<u64> {
        self.scalar(name).and_then(Scalar::as_id)
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.scalar(name).and_then(Scalar::as_str)
    }

    pub fn location(&self, name: &str) -> Option<&Location> {
        self.scalar(name).and_then(Scalar::as_location)
    }

    pub fn list(&self, name: &str) -> Option<&[Data]> {
        self.get(name).and_then(Data::as_list)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Data)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Build a [`Record`] from `"name" => value` pairs.
#[macro_export]
macro_rules! record {
    () => { $crate::record::Record::new() };
    ($($name:expr => $value:expr),+ $(,)?) => {
        $crate::record::Record::new()$(.with($name, $value))+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_declaration_order() {
        let r = crate::record! {
            "eventKind" => 8u8,
            "suspendPolicy" => 0u8,
            "modifiers" => Vec::<Data>::new(),
        };
        assert_eq!(r.names().collect::<Vec<_>>(), vec!["eventKind", "suspendPolicy", "modifiers"]);
        assert_eq!(r.int("eventKind"), Some(8));
        assert_eq!(r.list("modifiers").map(|l| l.len()), Some(0));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut r = Record::new().with("a", 1i32).with("b", 2i32);
        r.insert("a", 3i32);
        assert_eq!(r.iter().next(), Some(("a", &Data::from(3i32))));
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn test_serializes_as_ordered_map() {
        let r = Record::new().with("z", 1i32).with("a", "x");
        assert_eq!(serde_json::to_string(&r).unwrap(), r#"{"z":1,"a":"x"}"#);
    }
}
