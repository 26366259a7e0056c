//! Literals files: per-class seed values for generation.
//!
//! ```text
//! START CLASSLITERALS
//! CLASSNAME
//! pkg.A
//! LITERALS
//! int:42
//! String:"hello\n"
//! END CLASSLITERALS
//! ```
//!
//! Blank lines and `#` comments are ignored. A malformed record aborts the
//! whole read: partially read literals would silently under-seed a run.

#![allow(missing_docs)]

use std::fmt;
use std::fs;
use std::path::Path;

use crate::core::errors::{OpfError, Result};
use crate::reflect::ids::ClassId;
use crate::reflect::universe::ClassUniverse;
use crate::types::ty::{PrimitiveKind, Type};

use super::typed::TypedOperation;

const START: &str = "START CLASSLITERALS";
const END: &str = "END CLASSLITERALS";
const CLASSNAME: &str = "CLASSNAME";
const LITERALS: &str = "LITERALS";

/// Type of a literal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LiteralType {
    Primitive(PrimitiveKind),
    String,
}

impl fmt::Display for LiteralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => f.write_str(kind.name()),
            Self::String => f.write_str("java.lang.String"),
        }
    }
}

/// One literal, held in Java source form (`42L`, `'a'`, `"x"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    pub ty: LiteralType,
    pub source: String,
}

impl Literal {
    /// Parse `type:value`.
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        let (type_name, value) = text
            .split_once(':')
            .ok_or_else(|| format!("expected <type>:<value>, got {text:?}"))?;
        if type_name.chars().any(char::is_whitespace) {
            return Err(format!("type {type_name:?} contains whitespace"));
        }
        let ty = match type_name {
            "String" | "java.lang.String" => LiteralType::String,
            other => LiteralType::Primitive(
                PrimitiveKind::from_name(other)
                    .ok_or_else(|| format!("unsupported literal type {other:?}"))?,
            ),
        };
        let unparsable = || format!("value {value:?} is not a valid {ty}");
        let source = match ty {
            LiteralType::String if value == "null" => "null".to_string(),
            LiteralType::String => {
                let inner = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .ok_or_else(unparsable)?;
                quote(&unescape(inner)?)
            }
            LiteralType::Primitive(kind) => primitive_source(kind, value.trim()).ok_or_else(unparsable)?,
        };
        Ok(Self { ty, source })
    }

    #[must_use]
    pub fn value_type(&self, universe: &ClassUniverse) -> Option<Type> {
        match self.ty {
            LiteralType::Primitive(kind) => Some(Type::Primitive(kind)),
            LiteralType::String => universe.lookup("java.lang.String").map(Type::class),
        }
    }
}

fn primitive_source(kind: PrimitiveKind, value: &str) -> Option<String> {
    Some(match kind {
        PrimitiveKind::Boolean => value.parse::<bool>().ok()?.to_string(),
        PrimitiveKind::Byte => format!("(byte){}", value.parse::<i8>().ok()?),
        PrimitiveKind::Short => format!("(short){}", value.parse::<i16>().ok()?),
        PrimitiveKind::Int => value.parse::<i32>().ok()?.to_string(),
        PrimitiveKind::Long => format!("{}L", value.parse::<i64>().ok()?),
        PrimitiveKind::Float => {
            let parsed = value.parse::<f32>().ok().filter(|v| v.is_finite())?;
            format!("{parsed:?}f")
        }
        PrimitiveKind::Double => {
            let parsed = value.parse::<f64>().ok().filter(|v| v.is_finite())?;
            format!("{parsed:?}")
        }
        // Hex code point, as the constant dumper writes it.
        PrimitiveKind::Char => {
            let c = char::from_u32(u32::from_str_radix(value, 16).ok()?)?;
            format!("'{}'", c.escape_default())
        }
    })
}

fn unescape(text: &str) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            other => return Err(format!("unsupported escape \\{}", other.unwrap_or(' '))),
        }
    }
    Ok(out)
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Literals for one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralRecord {
    pub class_name: String,
    pub literals: Vec<Literal>,
    /// The record's lines as read, for error messages.
    pub raw: Vec<String>,
}

impl LiteralRecord {
    /// One `NonreceiverTerm` operation per literal, contributed by the
    /// record's class.
    pub fn operations(&self, universe: &ClassUniverse) -> Result<Vec<TypedOperation>> {
        let class = self.resolve_class(universe)?;
        self.literals
            .iter()
            .map(|literal| {
                let ty = literal.value_type(universe).ok_or_else(|| {
                    self.error("java.lang.String is not part of the class universe".to_string())
                })?;
                Ok(TypedOperation::for_literal(class, ty, literal.source.clone()))
            })
            .collect()
    }

    fn resolve_class(&self, universe: &ClassUniverse) -> Result<ClassId> {
        universe
            .lookup(&self.class_name)
            .ok_or_else(|| self.error(format!("unknown class {}", self.class_name)))
    }

    fn error(&self, details: String) -> OpfError {
        OpfError::LiteralsParse {
            details,
            record: self.raw.join("\n"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Start,
    ClassnameKeyword,
    ClassName,
    LiteralsKeyword,
    LiteralOrEnd,
}

/// Parse the text of a literals file.
pub fn parse_literals(text: &str) -> Result<Vec<LiteralRecord>> {
    let mut records = Vec::new();
    let mut state = Expect::Start;
    let mut raw: Vec<String> = Vec::new();
    let mut class_name = String::new();
    let mut literals = Vec::new();

    let fail = |details: String, raw: &[String]| OpfError::LiteralsParse {
        details,
        record: raw.join("\n"),
    };

    for (number, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        raw.push(line.to_string());
        let at = |what: &str| format!("line {}: {what}", number + 1);
        state = match state {
            Expect::Start if trimmed == START => Expect::ClassnameKeyword,
            Expect::Start => return Err(fail(at(&format!("expected {START}")), &raw)),
            Expect::ClassnameKeyword if trimmed == CLASSNAME => Expect::ClassName,
            Expect::ClassnameKeyword => return Err(fail(at(&format!("expected {CLASSNAME}")), &raw)),
            Expect::ClassName => {
                class_name = trimmed.to_string();
                Expect::LiteralsKeyword
            }
            Expect::LiteralsKeyword if trimmed == LITERALS => Expect::LiteralOrEnd,
            Expect::LiteralsKeyword => return Err(fail(at(&format!("expected {LITERALS}")), &raw)),
            Expect::LiteralOrEnd if trimmed == END => {
                records.push(LiteralRecord {
                    class_name: std::mem::take(&mut class_name),
                    literals: std::mem::take(&mut literals),
                    raw: std::mem::take(&mut raw),
                });
                Expect::Start
            }
            Expect::LiteralOrEnd => {
                let literal = Literal::parse(trimmed).map_err(|details| fail(at(&details), &raw))?;
                literals.push(literal);
                Expect::LiteralOrEnd
            }
        };
    }
    if state != Expect::Start {
        return Err(fail(format!("unterminated record, expected {END}"), &raw));
    }
    Ok(records)
}

/// Read and parse a literals file.
pub fn read_literals_file(path: &Path) -> Result<Vec<LiteralRecord>> {
    let text = fs::read_to_string(path).map_err(|source| OpfError::io(path, source))?;
    parse_literals(&text)
}
