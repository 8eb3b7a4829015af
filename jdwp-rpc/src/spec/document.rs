// JSON specification documents
//
// {
//   "commandSets": [{ "id": 1, "name": "VirtualMachine", "commands": [
//     { "id": 1, "name": "Version", "request": [],
//       "response": { "kind": "reply", "args": [
//         { "kind": "simple", "name": "description", "type": "string" } ] } } ] }],
//   "constantSets": [{ "name": "Error", "constants": [{ "name": "Error_NONE", "value": 0 }] }]
// }
//
// Arguments carry a `kind` tag: simple, repeat (with `element`), group (with
// `fields`) or select (with `discriminant` and `variants`). Responses are
// either `reply` or `events` (with `select`).

use super::{
    Argument, Command, CommandSet, Constant, ConstantSet, EventComposite, Group, Repeat,
    RepeatElement, Response, ResponseShape, Select, Simple, Specification, Variant, WireType,
};
use crate::error::GenerationError;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSpecification {
    #[serde(default)]
    command_sets: Vec<RawCommandSet>,
    #[serde(default)]
    constant_sets: Vec<RawConstantSet>,
}

#[derive(Debug, Deserialize)]
struct RawCommandSet {
    id: u8,
    name: String,
    #[serde(default)]
    commands: Vec<RawCommand>,
}

#[derive(Debug, Deserialize)]
struct RawCommand {
    id: u8,
    name: String,
    #[serde(default)]
    request: Vec<RawArgument>,
    response: RawResponse,
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    kind: String,
    #[serde(default)]
    args: Vec<RawArgument>,
    select: Option<RawArgument>,
}

#[derive(Debug, Deserialize)]
struct RawArgument {
    kind: String,
    name: Option<String>,
    #[serde(rename = "type")]
    wire_type: Option<String>,
    element: Option<Box<RawArgument>>,
    fields: Option<Vec<RawArgument>>,
    discriminant: Option<Box<RawArgument>>,
    variants: Option<Vec<RawVariant>>,
}

#[derive(Debug, Deserialize)]
struct RawVariant {
    value: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    fields: Vec<RawArgument>,
}

#[derive(Debug, Deserialize)]
struct RawConstantSet {
    name: String,
    #[serde(default)]
    constants: Vec<Constant>,
}

impl Specification {
    /// Parse a JSON specification document.
    pub fn from_json(text: &str) -> Result<Self, GenerationError> {
        let raw: RawSpecification =
            serde_json::from_str(text).map_err(|e| GenerationError::Document(e.to_string()))?;
        raw.into_model()
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GenerationError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| GenerationError::Document(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }
}

impl RawSpecification {
    fn into_model(self) -> Result<Specification, GenerationError> {
        let command_sets = self
            .command_sets
            .into_iter()
            .map(RawCommandSet::into_model)
            .collect::<Result<Vec<_>, _>>()?;

        let constant_sets = self
            .constant_sets
            .into_iter()
            .map(|cs| ConstantSet {
                name: cs.name,
                constants: cs.constants,
            })
            .collect();

        Ok(Specification {
            command_sets,
            constant_sets,
        })
    }
}

impl RawCommandSet {
    fn into_model(self) -> Result<CommandSet, GenerationError> {
        let set_name = self.name;
        let commands = self
            .commands
            .into_iter()
            .map(|c| c.into_model(&set_name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CommandSet {
            id: self.id,
            name: set_name,
            commands,
        })
    }
}

impl RawCommand {
    fn into_model(self, set_name: &str) -> Result<Command, GenerationError> {
        let context = format!("{}.{}", set_name, self.name);

        let request = self
            .request
            .into_iter()
            .map(|a| a.into_argument(&context))
            .collect::<Result<Vec<_>, _>>()?;

        let response = match self.response.kind.as_str() {
            "reply" => ResponseShape::Reply(Response {
                args: self
                    .response
                    .args
                    .into_iter()
                    .map(|a| a.into_argument(&context))
                    .collect::<Result<Vec<_>, _>>()?,
            }),
            "events" => {
                let select = self.response.select.ok_or_else(|| GenerationError::MissingKey {
                    key: "select",
                    context: context.clone(),
                })?;
                ResponseShape::Events(EventComposite {
                    events: select.into_select(&context)?,
                })
            }
            other => {
                return Err(GenerationError::UnknownArgumentKind {
                    kind: other.to_string(),
                    context,
                })
            }
        };

        Ok(Command {
            id: self.id,
            name: self.name,
            request,
            response,
        })
    }
}

impl RawArgument {
    fn into_argument(self, context: &str) -> Result<Argument, GenerationError> {
        let kind = self.kind.clone();
        match kind.as_str() {
            "simple" => Ok(Argument::Simple(self.into_simple(context)?)),
            "repeat" => {
                let name = self.name.ok_or_else(|| GenerationError::MissingKey {
                    key: "name",
                    context: context.to_string(),
                })?;
                let element = *self.element.ok_or_else(|| GenerationError::MissingKey {
                    key: "element",
                    context: context.to_string(),
                })?;
                let element_kind = element.kind.clone();
                let element = match element_kind.as_str() {
                    "simple" => RepeatElement::Simple(element.into_simple(context)?),
                    "group" => RepeatElement::Group(element.into_group(context)?),
                    "select" => RepeatElement::Select(element.into_select(context)?),
                    other => {
                        return Err(GenerationError::UnknownArgumentKind {
                            kind: format!("repeat of {}", other),
                            context: context.to_string(),
                        })
                    }
                };
                Ok(Argument::Repeat(Repeat { name, element }))
            }
            "group" => Ok(Argument::Group(self.into_group(context)?)),
            "select" => Ok(Argument::Select(self.into_select(context)?)),
            other => Err(GenerationError::UnknownArgumentKind {
                kind: other.to_string(),
                context: context.to_string(),
            }),
        }
    }

    fn into_simple(self, context: &str) -> Result<Simple, GenerationError> {
        if self.kind != "simple" {
            return Err(GenerationError::UnknownArgumentKind {
                kind: format!("{} where simple expected", self.kind),
                context: context.to_string(),
            });
        }
        let name = self.name.ok_or_else(|| GenerationError::MissingKey {
            key: "name",
            context: context.to_string(),
        })?;
        let type_name = self.wire_type.ok_or_else(|| GenerationError::MissingKey {
            key: "type",
            context: format!("{}.{}", context, name),
        })?;
        let wire_type =
            WireType::from_name(&type_name).ok_or_else(|| GenerationError::UnknownWireType {
                name: type_name.clone(),
                context: format!("{}.{}", context, name),
            })?;
        Ok(Simple { name, wire_type })
    }

    fn into_group(self, context: &str) -> Result<Group, GenerationError> {
        let fields = self.fields.ok_or_else(|| GenerationError::MissingKey {
            key: "fields",
            context: context.to_string(),
        })?;
        simple_fields(fields, context).map(|fields| Group { fields })
    }

    fn into_select(self, context: &str) -> Result<Select, GenerationError> {
        let discriminant = self.discriminant.ok_or_else(|| GenerationError::MissingKey {
            key: "discriminant",
            context: context.to_string(),
        })?;
        let discriminant = (*discriminant).into_simple(context)?;
        let variants = self
            .variants
            .unwrap_or_default()
            .into_iter()
            .map(|v| {
                Ok(Variant {
                    value: v.value,
                    name: v.name,
                    group: Group {
                        fields: simple_fields(v.fields, context)?,
                    },
                })
            })
            .collect::<Result<Vec<_>, GenerationError>>()?;
        Ok(Select {
            discriminant,
            variants,
        })
    }
}

fn simple_fields(fields: Vec<RawArgument>, context: &str) -> Result<Vec<Simple>, GenerationError> {
    fields.into_iter().map(|f| f.into_simple(context)).collect()
}
