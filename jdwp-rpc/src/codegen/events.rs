// Composite event decoding
//
// Layout: suspendPolicy (byte), count (int), then per event the eventKind
// discriminant followed by that kind's fields.

use super::format::{Format, PackFormat};
use crate::error::CodecError;
use crate::events::EventRecord;
use crate::record::Record;
use crate::spec::{EventComposite, Select, WireType};
use crate::types::Scalar;
use crate::wire::{self, WireValue};

const REQUEST_ID_FIELD: &str = "requestID";

#[derive(Debug, Clone)]
pub struct EventDecoder {
    events: Select,
    format: PackFormat,
}

impl EventDecoder {
    pub fn new(composite: &EventComposite) -> Self {
        let format = PackFormat(vec![
            Format::Scalar(WireType::Byte),
            Format::Repeat(Box::new(Format::from_select(&composite.events))),
        ]);
        Self {
            events: composite.events.clone(),
            format,
        }
    }

    pub fn format(&self) -> &PackFormat {
        &self.format
    }

    /// Name of the variant declared for `event_kind`, if any.
    pub fn kind_name(&self, event_kind: u8) -> Option<&str> {
        self.events
            .variant(event_kind as i64)
            .map(|v| v.name.as_str())
    }

    pub fn decode(&self, payload: &[u8]) -> Result<Vec<EventRecord>, CodecError> {
        let mut values = wire::decode(&self.format, payload)?.into_iter();

        let suspend_policy = match values.next() {
            Some(WireValue::Scalar(Scalar::Byte(policy))) => policy,
            _ => return Err(self.shape()),
        };
        let events = match values.next() {
            Some(WireValue::Seq(events)) => events,
            _ => return Err(self.shape()),
        };

        events
            .into_iter()
            .map(|event| self.record(suspend_policy, event))
            .collect()
    }

    fn record(&self, suspend_policy: u8, event: WireValue) -> Result<EventRecord, CodecError> {
        let WireValue::Tuple(values) = event else {
            return Err(self.shape());
        };
        let mut values = values.into_iter();

        let kind = values
            .next()
            .as_ref()
            .and_then(WireValue::as_scalar)
            .and_then(Scalar::as_key)
            .ok_or_else(|| self.shape())?;
        let variant = self
            .events
            .variant(kind)
            .ok_or(CodecError::UnknownDiscriminant(kind))?;

        let mut fields = Record::new();
        for (field, value) in variant.group.fields.iter().zip(values) {
            match value {
                WireValue::Scalar(s) => fields.insert(&field.name, s),
                _ => return Err(self.shape()),
            }
        }

        let request_id = fields
            .int(REQUEST_ID_FIELD)
            .and_then(|id| i32::try_from(id).ok())
            .unwrap_or(0);

        Ok(EventRecord {
            request_id,
            suspend_policy,
            event_kind: kind as u8,
            name: variant.name.clone(),
            fields,
        })
    }

    fn shape(&self) -> CodecError {
        CodecError::ShapeMismatch {
            expected: self.format.to_string(),
        }
    }
}
