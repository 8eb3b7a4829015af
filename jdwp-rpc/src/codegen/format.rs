// Pack-format descriptors
//
// Compact strings describing the wire shape of a request or reply:
//
//   scalar   one character, see `WireType::format_char`
//   group    ( ... )
//   repeat   *element            (int count, then count elements)
//   select   <d key(...) key(...)>  (discriminant, then the selected group)
//
// e.g. EventRequest.Set request: bb*<b1(i)2(i)3(o)...7(L)...>

use crate::error::CodecError;
use crate::spec::{Argument, Group, RepeatElement, Select, WireType};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Format {
    Scalar(WireType),
    Group(Vec<Format>),
    Repeat(Box<Format>),
    Select {
        discriminant: WireType,
        variants: BTreeMap<i64, Vec<Format>>,
    },
}

/// Top-level sequence of formats for one request or reply body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackFormat(pub Vec<Format>);

impl PackFormat {
    pub fn from_args(args: &[Argument]) -> Self {
        PackFormat(args.iter().map(Format::from_argument).collect())
    }

    pub fn parse(text: &str) -> Result<Self, CodecError> {
        let mut parser = Parser {
            text,
            chars: text.char_indices().peekable(),
        };
        let mut items = Vec::new();
        while parser.chars.peek().is_some() {
            items.push(parser.format()?);
        }
        Ok(PackFormat(items))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Format {
    pub fn from_argument(arg: &Argument) -> Self {
        match arg {
            Argument::Simple(s) => Format::Scalar(s.wire_type),
            Argument::Repeat(r) => Format::Repeat(Box::new(match &r.element {
                RepeatElement::Simple(s) => Format::Scalar(s.wire_type),
                RepeatElement::Group(g) => Format::from_group(g),
                RepeatElement::Select(s) => Format::from_select(s),
            })),
            Argument::Group(g) => Format::from_group(g),
            Argument::Select(s) => Format::from_select(s),
        }
    }

    pub fn from_group(group: &Group) -> Self {
        Format::Group(group_fields(group))
    }

    pub fn from_select(select: &Select) -> Self {
        Format::Select {
            discriminant: select.discriminant.wire_type,
            variants: select
                .variants
                .iter()
                .map(|v| (v.value, group_fields(&v.group)))
                .collect(),
        }
    }
}

fn group_fields(group: &Group) -> Vec<Format> {
    group
        .fields
        .iter()
        .map(|f| Format::Scalar(f.wire_type))
        .collect()
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Scalar(w) => write!(f, "{}", w.format_char()),
            Format::Group(items) => {
                write!(f, "(")?;
                for item in items {
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Format::Repeat(element) => write!(f, "*{}", element),
            Format::Select {
                discriminant,
                variants,
            } => {
                write!(f, "<{}", discriminant.format_char())?;
                for (key, items) in variants {
                    write!(f, "{}(", key)?;
                    for item in items {
                        write!(f, "{}", item)?;
                    }
                    write!(f, ")")?;
                }
                write!(f, ">")
            }
        }
    }
}

impl fmt::Display for PackFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.0 {
            write!(f, "{}", item)?;
        }
        Ok(())
    }
}

struct Parser<'a> {
    text: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl Parser<'_> {
    fn error(&self, position: usize) -> CodecError {
        CodecError::InvalidFormat {
            format: self.text.to_string(),
            position,
        }
    }

    fn format(&mut self) -> Result<Format, CodecError> {
        let (pos, c) = self.chars.next().ok_or_else(|| self.error(self.text.len()))?;
        match c {
            '(' => Ok(Format::Group(self.group_body()?)),
            '*' => Ok(Format::Repeat(Box::new(self.format()?))),
            '<' => self.select_body(),
            c => WireType::from_format_char(c)
                .map(Format::Scalar)
                .ok_or_else(|| self.error(pos)),
        }
    }

    // Items up to and including the closing ')'
    fn group_body(&mut self) -> Result<Vec<Format>, CodecError> {
        let mut items = Vec::new();
        loop {
            match self.chars.peek() {
                Some((_, ')')) => {
                    self.chars.next();
                    return Ok(items);
                }
                Some(_) => items.push(self.format()?),
                None => return Err(self.error(self.text.len())),
            }
        }
    }

    fn select_body(&mut self) -> Result<Format, CodecError> {
        let (pos, c) = self.chars.next().ok_or_else(|| self.error(self.text.len()))?;
        let discriminant = WireType::from_format_char(c).ok_or_else(|| self.error(pos))?;

        let mut variants = BTreeMap::new();
        loop {
            match self.chars.next() {
                Some((_, '>')) => break,
                Some((start, c)) if c == '-' || c.is_ascii_digit() => {
                    let mut end = start + c.len_utf8();
                    while let Some(&(i, d)) = self.chars.peek() {
                        if !d.is_ascii_digit() {
                            break;
                        }
                        end = i + d.len_utf8();
                        self.chars.next();
                    }
                    let key: i64 = self.text[start..end]
                        .parse()
                        .map_err(|_| self.error(start))?;
                    match self.chars.next() {
                        Some((_, '(')) => {}
                        Some((i, _)) => return Err(self.error(i)),
                        None => return Err(self.error(self.text.len())),
                    }
                    variants.insert(key, self.group_body()?);
                }
                Some((i, _)) => return Err(self.error(i)),
                None => return Err(self.error(self.text.len())),
            }
        }

        Ok(Format::Select {
            discriminant,
            variants,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{arg, group, repeat, simple, variant};

    #[test]
    fn test_render_version_reply() {
        let args = vec![
            arg("description", WireType::String),
            arg("jdwpMajor", WireType::Int),
            arg("jdwpMinor", WireType::Int),
            arg("vmVersion", WireType::String),
            arg("vmName", WireType::String),
        ];
        assert_eq!(PackFormat::from_args(&args).to_string(), "siiss");
    }

    #[test]
    fn test_render_nested_shapes() {
        let args = vec![
            arg("eventKind", WireType::Byte),
            repeat(
                "classes",
                RepeatElement::Group(group(vec![
                    simple("refTypeTag", WireType::Byte),
                    simple("typeID", WireType::ReferenceTypeId),
                ])),
            ),
            repeat(
                "modifiers",
                RepeatElement::Select(Select {
                    discriminant: simple("modKind", WireType::Byte),
                    variants: vec![
                        variant(7, "LocationOnly", vec![simple("loc", WireType::Location)]),
                        variant(1, "Count", vec![simple("count", WireType::Int)]),
                    ],
                }),
            ),
        ];
        assert_eq!(PackFormat::from_args(&args).to_string(), "b*(br)*<b1(i)7(L)>");
    }

    #[test]
    fn test_parse_inverts_render() {
        for text in ["", "siiss", "b*(br)*<b1(i)7(L)>", "oF*(ib)", "*v", "<i-1()2(zz)>"] {
            let parsed = PackFormat::parse(text).unwrap();
            assert_eq!(parsed.to_string(), text);
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            PackFormat::parse("i?"),
            Err(CodecError::InvalidFormat { position: 1, .. })
        ));
        assert!(PackFormat::parse("(ii").is_err());
        assert!(PackFormat::parse("<b1i>").is_err());
        assert!(PackFormat::parse("*").is_err());
    }
}
