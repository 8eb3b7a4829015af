// Codec generator
//
// Compiles a `Specification` into an immutable `Protocol`: per-command
// request packers and reply unpackers, the pack-format table keyed
// "{command_set_id}-{command_id}", the error table and the event decoder.
// A malformed specification fails here, before any stub can exist.

pub mod errors;
pub mod events;
pub mod format;

use crate::error::{CodecError, GenerationError, JdwpError, JdwpResult, LookupError};
use crate::record::{Data, Record};
use crate::spec::{
    Argument, ConstantSet, Group, RepeatElement, ResponseShape, Select, Simple, Specification,
};
use crate::types::Scalar;
use crate::wire::WireValue;
use errors::ErrorTable;
use events::EventDecoder;
use format::{Format, PackFormat};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Wire shapes of one command, as stored in the pack-format table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFormat {
    pub command_set_id: u8,
    pub command_id: u8,
    pub request: PackFormat,
    pub response: PackFormat,
}

impl CommandFormat {
    pub fn key(&self) -> String {
        format_key(self.command_set_id, self.command_id)
    }
}

pub fn format_key(command_set_id: u8, command_id: u8) -> String {
    format!("{}-{}", command_set_id, command_id)
}

#[derive(Debug)]
pub struct CompiledCommand {
    pub set_id: u8,
    pub set_name: String,
    pub id: u8,
    pub name: String,
    request: Vec<Argument>,
    response: ResponseShape,
    format: Arc<CommandFormat>,
}

impl CompiledCommand {
    pub fn format(&self) -> &Arc<CommandFormat> {
        &self.format
    }

    pub fn request_args(&self) -> &[Argument] {
        &self.request
    }

    pub fn response_shape(&self) -> &ResponseShape {
        &self.response
    }

    /// False for commands whose results arrive as events.
    pub fn has_reply(&self) -> bool {
        matches!(self.response, ResponseShape::Reply(_))
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.set_name, self.name)
    }

    /// Named request record -> positional wire values, in declaration order.
    pub fn pack_request(&self, request: &Record) -> Result<Vec<WireValue>, CodecError> {
        self.request
            .iter()
            .map(|arg| pack_argument(request, arg))
            .collect()
    }

    /// Positional reply values -> named record.
    pub fn unpack_response(&self, values: Vec<WireValue>) -> JdwpResult<Record> {
        let args = match &self.response {
            ResponseShape::Reply(response) => &response.args,
            ResponseShape::Events(_) => {
                return Err(JdwpError::Lookup(LookupError::NoSynchronousReply {
                    set: self.set_name.clone(),
                    command: self.name.clone(),
                }))
            }
        };

        if args.len() != values.len() {
            return Err(shape(&self.format.response).into());
        }

        let mut record = Record::new();
        for (arg, value) in args.iter().zip(values) {
            unpack_argument(&mut record, arg, value)?;
        }
        Ok(record)
    }
}

#[derive(Debug)]
pub struct CompiledCommandSet {
    pub id: u8,
    pub name: String,
    commands: Vec<CompiledCommand>,
}

impl CompiledCommandSet {
    pub fn commands(&self) -> &[CompiledCommand] {
        &self.commands
    }

    pub fn command(&self, name: &str) -> Result<&CompiledCommand, LookupError> {
        self.commands
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| LookupError::UnknownCommand {
                set: self.name.clone(),
                command: name.to_string(),
            })
    }
}

/// Everything the runtime needs, derived once from a specification.
#[derive(Debug)]
pub struct Protocol {
    command_sets: Vec<CompiledCommandSet>,
    formats: HashMap<String, Arc<CommandFormat>>,
    errors: ErrorTable,
    events: Option<EventDecoder>,
    constants: Vec<ConstantSet>,
}

static BUILTIN: OnceLock<Result<Arc<Protocol>, GenerationError>> = OnceLock::new();

impl Protocol {
    /// The protocol compiled from the built-in specification, shared by the
    /// whole process.
    pub fn builtin() -> Result<Arc<Protocol>, GenerationError> {
        BUILTIN
            .get_or_init(|| Protocol::compile(&crate::spec::builtin::specification()).map(Arc::new))
            .clone()
    }

    pub fn compile(spec: &Specification) -> Result<Protocol, GenerationError> {
        // The error table must exist before anything that reports errors.
        let errors = ErrorTable::from_constants(
            spec.error_constants()
                .ok_or(GenerationError::MissingErrorConstants)?,
        );

        let mut set_ids = HashSet::new();
        let mut formats = HashMap::new();
        let mut command_sets = Vec::with_capacity(spec.command_sets.len());
        let mut events = None;

        for set in &spec.command_sets {
            if !set_ids.insert(set.id) {
                return Err(GenerationError::DuplicateCommandSetId { id: set.id });
            }

            let mut command_ids = HashSet::new();
            let mut commands = Vec::with_capacity(set.commands.len());

            for cmd in &set.commands {
                if !command_ids.insert(cmd.id) {
                    return Err(GenerationError::DuplicateCommandId {
                        set: set.name.clone(),
                        id: cmd.id,
                    });
                }

                let context = format!("{}.{}", set.name, cmd.name);
                check_args(&cmd.request, &context)?;

                let response = match &cmd.response {
                    ResponseShape::Reply(response) => {
                        check_args(&response.args, &context)?;
                        PackFormat::from_args(&response.args)
                    }
                    ResponseShape::Events(composite) => {
                        check_select(&composite.events, &context)?;
                        let decoder = EventDecoder::new(composite);
                        let format = decoder.format().clone();
                        events = Some(decoder);
                        format
                    }
                };

                let format = Arc::new(CommandFormat {
                    command_set_id: set.id,
                    command_id: cmd.id,
                    request: PackFormat::from_args(&cmd.request),
                    response,
                });
                formats.insert(format.key(), format.clone());

                commands.push(CompiledCommand {
                    set_id: set.id,
                    set_name: set.name.clone(),
                    id: cmd.id,
                    name: cmd.name.clone(),
                    request: cmd.request.clone(),
                    response: cmd.response.clone(),
                    format,
                });
            }

            command_sets.push(CompiledCommandSet {
                id: set.id,
                name: set.name.clone(),
                commands,
            });
        }

        debug!(
            "Compiled {} command sets, {} pack formats, {} error codes",
            command_sets.len(),
            formats.len(),
            errors.len()
        );

        Ok(Protocol {
            command_sets,
            formats,
            errors,
            events,
            constants: spec.constant_sets.clone(),
        })
    }

    pub fn command_sets(&self) -> &[CompiledCommandSet] {
        &self.command_sets
    }

    pub fn command_set(&self, name: &str) -> Result<&CompiledCommandSet, LookupError> {
        self.command_sets
            .iter()
            .find(|cs| cs.name == name)
            .ok_or_else(|| LookupError::UnknownCommandSet(name.to_string()))
    }

    pub fn command(&self, set: &str, command: &str) -> Result<&CompiledCommand, LookupError> {
        self.command_set(set)?.command(command)
    }

    pub fn command_by_id(&self, command_set_id: u8, command_id: u8) -> Option<&CompiledCommand> {
        self.command_sets
            .iter()
            .find(|cs| cs.id == command_set_id)
            .and_then(|cs| cs.commands.iter().find(|c| c.id == command_id))
    }

    /// Pack-format table lookup by "{command_set_id}-{command_id}".
    pub fn format_by_key(&self, key: &str) -> Result<&Arc<CommandFormat>, LookupError> {
        self.formats
            .get(key)
            .ok_or_else(|| LookupError::UnknownCommandKey(key.to_string()))
    }

    pub fn format(&self, command_set_id: u8, command_id: u8) -> Result<&Arc<CommandFormat>, LookupError> {
        self.format_by_key(&format_key(command_set_id, command_id))
    }

    pub fn errors(&self) -> &ErrorTable {
        &self.errors
    }

    pub fn event_decoder(&self) -> Option<&EventDecoder> {
        self.events.as_ref()
    }

    pub fn constant_sets(&self) -> &[ConstantSet] {
        &self.constants
    }

    pub fn constant(&self, set: &str, name: &str) -> Option<i64> {
        self.constants
            .iter()
            .find(|cs| cs.name == set)
            .and_then(|cs| cs.constants.iter().find(|c| c.name == name))
            .map(|c| c.value)
    }
}

fn check_args(args: &[Argument], context: &str) -> Result<(), GenerationError> {
    for arg in args {
        match arg {
            Argument::Select(select) => check_select(select, context)?,
            Argument::Repeat(repeat) => {
                if let RepeatElement::Select(select) = &repeat.element {
                    check_select(select, context)?;
                }
            }
            Argument::Simple(_) | Argument::Group(_) => {}
        }
    }
    Ok(())
}

fn check_select(select: &Select, context: &str) -> Result<(), GenerationError> {
    if select.variants.is_empty() {
        return Err(GenerationError::EmptySelect {
            context: context.to_string(),
        });
    }
    if !select.discriminant.wire_type.is_integral() {
        return Err(GenerationError::InvalidDiscriminant {
            context: context.to_string(),
            found: select.discriminant.wire_type.name().to_string(),
        });
    }
    let mut seen = HashSet::new();
    for variant in &select.variants {
        if !seen.insert(variant.value) {
            return Err(GenerationError::DuplicateVariant {
                context: context.to_string(),
                value: variant.value,
            });
        }
    }
    Ok(())
}

fn shape(expected: &impl std::fmt::Display) -> CodecError {
    CodecError::ShapeMismatch {
        expected: expected.to_string(),
    }
}

fn mismatch(field: &str, expected: &str, found: &Data) -> CodecError {
    CodecError::TypeMismatch {
        field: field.to_string(),
        expected: expected.to_string(),
        found: found.kind_name().to_string(),
    }
}

// Packing

fn pack_argument(record: &Record, arg: &Argument) -> Result<WireValue, CodecError> {
    match arg {
        Argument::Simple(field) => pack_field(record, field),
        Argument::Group(group) => pack_group(record, group),
        Argument::Select(select) => pack_select(record, select),
        Argument::Repeat(repeat) => {
            let data = record
                .get(&repeat.name)
                .ok_or_else(|| CodecError::MissingField(repeat.name.clone()))?;
            let items = data
                .as_list()
                .ok_or_else(|| mismatch(&repeat.name, "list", data))?;

            let values = items
                .iter()
                .map(|item| match &repeat.element {
                    RepeatElement::Simple(field) => scalar_value(item, field).map(WireValue::Scalar),
                    RepeatElement::Group(group) => pack_group(element_record(item, &repeat.name)?, group),
                    RepeatElement::Select(select) => {
                        pack_select(element_record(item, &repeat.name)?, select)
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(WireValue::Seq(values))
        }
    }
}

fn element_record<'a>(item: &'a Data, name: &str) -> Result<&'a Record, CodecError> {
    item.as_record().ok_or_else(|| mismatch(name, "record", item))
}

fn scalar_value(data: &Data, field: &Simple) -> Result<Scalar, CodecError> {
    match data {
        Data::Scalar(s) => s.clone().coerce(field.wire_type, &field.name),
        other => Err(mismatch(&field.name, field.wire_type.name(), other)),
    }
}

fn pack_field(record: &Record, field: &Simple) -> Result<WireValue, CodecError> {
    let data = record
        .get(&field.name)
        .ok_or_else(|| CodecError::MissingField(field.name.clone()))?;
    scalar_value(data, field).map(WireValue::Scalar)
}

fn pack_group(record: &Record, group: &Group) -> Result<WireValue, CodecError> {
    group
        .fields
        .iter()
        .map(|field| pack_field(record, field))
        .collect::<Result<Vec<_>, _>>()
        .map(WireValue::Tuple)
}

fn pack_select(record: &Record, select: &Select) -> Result<WireValue, CodecError> {
    let tag = pack_field(record, &select.discriminant)?;
    let key = tag
        .as_scalar()
        .and_then(Scalar::as_key)
        .ok_or_else(|| shape(&Format::from_select(select)))?;
    let variant = select
        .variant(key)
        .ok_or(CodecError::UnknownDiscriminant(key))?;

    let mut values = Vec::with_capacity(variant.group.fields.len() + 1);
    values.push(tag);
    for field in &variant.group.fields {
        values.push(pack_field(record, field)?);
    }
    Ok(WireValue::Tuple(values))
}

// Unpacking

fn unpack_argument(record: &mut Record, arg: &Argument, value: WireValue) -> Result<(), CodecError> {
    match (arg, value) {
        (Argument::Simple(field), WireValue::Scalar(s)) => record.insert(&field.name, s),
        (Argument::Group(group), WireValue::Tuple(values)) => unpack_group(record, group, values)?,
        (Argument::Select(select), WireValue::Tuple(values)) => {
            unpack_select(record, select, values)?
        }
        (Argument::Repeat(repeat), WireValue::Seq(items)) => {
            let list = items
                .into_iter()
                .map(|item| unpack_element(&repeat.element, item))
                .collect::<Result<Vec<_>, _>>()?;
            record.insert(&repeat.name, Data::List(list));
        }
        (arg, _) => return Err(shape(&Format::from_argument(arg))),
    }
    Ok(())
}

fn unpack_element(element: &RepeatElement, value: WireValue) -> Result<Data, CodecError> {
    let mut record = Record::new();
    match (element, value) {
        (RepeatElement::Simple(_), WireValue::Scalar(s)) => return Ok(Data::Scalar(s)),
        (RepeatElement::Group(group), WireValue::Tuple(values)) => {
            unpack_group(&mut record, group, values)?
        }
        (RepeatElement::Select(select), WireValue::Tuple(values)) => {
            unpack_select(&mut record, select, values)?
        }
        (RepeatElement::Simple(field), _) => return Err(shape(&field.wire_type.format_char())),
        (RepeatElement::Group(group), _) => return Err(shape(&Format::from_group(group))),
        (RepeatElement::Select(select), _) => return Err(shape(&Format::from_select(select))),
    }
    Ok(Data::Record(record))
}

fn unpack_fields(record: &mut Record, fields: &[Simple], values: Vec<WireValue>) -> Result<(), CodecError> {
    for (field, value) in fields.iter().zip(values) {
        match value {
            WireValue::Scalar(s) => record.insert(&field.name, s),
            _ => return Err(shape(&field.wire_type.format_char())),
        }
    }
    Ok(())
}

fn unpack_group(record: &mut Record, group: &Group, values: Vec<WireValue>) -> Result<(), CodecError> {
    if group.fields.len() != values.len() {
        return Err(shape(&Format::from_group(group)));
    }
    unpack_fields(record, &group.fields, values)
}

fn unpack_select(record: &mut Record, select: &Select, values: Vec<WireValue>) -> Result<(), CodecError> {
    let mut values = values.into_iter();
    let tag = match values.next() {
        Some(WireValue::Scalar(tag)) => tag,
        _ => return Err(shape(&Format::from_select(select))),
    };
    let key = tag
        .as_key()
        .ok_or_else(|| shape(&Format::from_select(select)))?;
    // Only the selected variant's layout applies to what follows.
    let variant = select
        .variant(key)
        .ok_or(CodecError::UnknownDiscriminant(key))?;

    let rest: Vec<WireValue> = values.collect();
    if rest.len() != variant.group.fields.len() {
        return Err(shape(&Format::from_select(select)));
    }

    record.insert(&select.discriminant.name, tag);
    unpack_fields(record, &variant.group.fields, rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{
        arg, command, group, repeat, simple, variant, CommandSet, Constant, WireType,
    };
    use crate::types::Location;

    fn error_set() -> ConstantSet {
        ConstantSet {
            name: "Error".to_string(),
            constants: vec![
                Constant { name: "Error_NONE".to_string(), value: 0 },
                Constant { name: "Error_NOT_FOUND".to_string(), value: 41 },
            ],
        }
    }

    fn modifiers() -> Select {
        Select {
            discriminant: simple("modKind", WireType::Byte),
            variants: vec![
                variant(1, "Count", vec![simple("count", WireType::Int)]),
                variant(3, "ThreadOnly", vec![simple("thread", WireType::ObjectId)]),
                variant(7, "LocationOnly", vec![simple("loc", WireType::Location)]),
            ],
        }
    }

    fn spec_with(commands: Vec<crate::spec::Command>) -> Specification {
        Specification {
            command_sets: vec![CommandSet {
                id: 15,
                name: "EventRequest".to_string(),
                commands,
            }],
            constant_sets: vec![error_set()],
        }
    }

    fn set_command() -> crate::spec::Command {
        command(
            1,
            "Set",
            vec![
                arg("eventKind", WireType::Byte),
                arg("suspendPolicy", WireType::Byte),
                repeat("modifiers", RepeatElement::Select(modifiers())),
            ],
            vec![arg("requestID", WireType::Int)],
        )
    }

    #[test]
    fn test_pack_request_with_select_modifiers() {
        let protocol = Protocol::compile(&spec_with(vec![set_command()])).unwrap();
        let cmd = protocol.command("EventRequest", "Set").unwrap();

        let loc = Location { type_tag: 1, class_id: 5, method_id: 6, index: 0 };
        let request = crate::record! {
            "eventKind" => 2i32,
            "suspendPolicy" => 2i32,
            "modifiers" => vec![
                Data::from(crate::record! { "modKind" => 7i32, "loc" => loc }),
                Data::from(crate::record! { "modKind" => 1i32, "count" => 1i32 }),
            ],
        };
        let values = cmd.pack_request(&request).unwrap();

        assert_eq!(values[0], WireValue::scalar(2u8));
        assert_eq!(
            values[2],
            WireValue::Seq(vec![
                WireValue::Tuple(vec![WireValue::scalar(7u8), WireValue::scalar(loc)]),
                WireValue::Tuple(vec![WireValue::scalar(1u8), WireValue::scalar(1i32)]),
            ])
        );
        assert_eq!(cmd.format().request.to_string(), "bb*<b1(i)3(o)7(L)>");
        assert_eq!(protocol.format_by_key("15-1").unwrap().response.to_string(), "i");
    }

    #[test]
    fn test_pack_request_reports_missing_field() {
        let protocol = Protocol::compile(&spec_with(vec![set_command()])).unwrap();
        let cmd = protocol.command("EventRequest", "Set").unwrap();

        let err = cmd
            .pack_request(&crate::record! { "eventKind" => 8u8 })
            .unwrap_err();
        assert_eq!(err, CodecError::MissingField("suspendPolicy".to_string()));
    }

    #[test]
    fn test_unpack_select_uses_selected_variant_only() {
        let reply = vec![Argument::Select(modifiers())];
        let protocol = Protocol::compile(&spec_with(vec![command(2, "Probe", vec![], reply)])).unwrap();
        let cmd = protocol.command("EventRequest", "Probe").unwrap();

        let record = cmd
            .unpack_response(vec![WireValue::Tuple(vec![
                WireValue::scalar(3u8),
                WireValue::scalar(99u64),
            ])])
            .unwrap();
        assert_eq!(record.names().collect::<Vec<_>>(), vec!["modKind", "thread"]);
        assert_eq!(record.id("thread"), Some(99));
        assert!(record.get("count").is_none());
    }

    #[test]
    fn test_unpack_group_repeat_builds_records() {
        let reply = vec![repeat(
            "classes",
            RepeatElement::Group(group(vec![
                simple("refTypeTag", WireType::Byte),
                simple("typeID", WireType::ReferenceTypeId),
                simple("status", WireType::Int),
            ])),
        )];
        let protocol = Protocol::compile(&spec_with(vec![command(3, "Classes", vec![], reply)])).unwrap();
        let cmd = protocol.command("EventRequest", "Classes").unwrap();

        let values = vec![WireValue::Seq(vec![WireValue::Tuple(vec![
            WireValue::scalar(1u8),
            WireValue::scalar(0x42u64),
            WireValue::scalar(7i32),
        ])])];
        let first = cmd.unpack_response(values.clone()).unwrap();
        let second = cmd.unpack_response(values).unwrap();
        assert_eq!(first, second);

        let classes = first.list("classes").unwrap();
        let class = classes[0].as_record().unwrap();
        assert_eq!(class.id("typeID"), Some(0x42));
        assert_eq!(class.int("status"), Some(7));
    }

    #[test]
    fn test_generation_rejects_malformed_specs() {
        let empty = Select {
            discriminant: simple("modKind", WireType::Byte),
            variants: vec![],
        };
        let spec = spec_with(vec![command(1, "Bad", vec![Argument::Select(empty)], vec![])]);
        assert!(matches!(
            Protocol::compile(&spec),
            Err(GenerationError::EmptySelect { .. })
        ));

        let spec = spec_with(vec![set_command(), set_command()]);
        assert_eq!(
            Protocol::compile(&spec).unwrap_err(),
            GenerationError::DuplicateCommandId {
                set: "EventRequest".to_string(),
                id: 1
            }
        );

        let mut spec = spec_with(vec![set_command()]);
        spec.constant_sets.clear();
        assert_eq!(
            Protocol::compile(&spec).unwrap_err(),
            GenerationError::MissingErrorConstants
        );

        let mut dup = modifiers();
        dup.variants.push(variant(7, "Again", vec![]));
        let spec = spec_with(vec![command(1, "Dup", vec![Argument::Select(dup)], vec![])]);
        assert!(matches!(
            Protocol::compile(&spec),
            Err(GenerationError::DuplicateVariant { value: 7, .. })
        ));
    }

    #[test]
    fn test_lookup_failures_are_distinct() {
        let protocol = Protocol::compile(&spec_with(vec![set_command()])).unwrap();
        assert_eq!(
            protocol.format_by_key("1-1").unwrap_err(),
            LookupError::UnknownCommandKey("1-1".to_string())
        );
        assert!(matches!(
            protocol.command("EventRequest", "Nope"),
            Err(LookupError::UnknownCommand { .. })
        ));
        assert!(matches!(
            protocol.command_set("Nope"),
            Err(LookupError::UnknownCommandSet(_))
        ));
    }

    #[test]
    fn test_builtin_protocol_is_shared() {
        let a = Protocol::builtin().unwrap();
        let b = Protocol::builtin().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.format(1, 1).unwrap().response.to_string(), "siiss");
        assert!(a.event_decoder().is_some());
        assert!(!a.command("Event", "Composite").unwrap().has_reply());
    }
}
