//! Serialized class-universe descriptors and the generic type-expression
//! syntax they use.
//!
//! A descriptor is JSON shaped like the metadata `javap -p -v` exposes:
//!
//! ```json
//! { "classes": [
//!   { "name": "pkg.Box", "modifiers": ["public"],
//!     "type_params": [{ "name": "T", "bounds": ["java.lang.Comparable<T>"] }],
//!     "constructors": [{ "modifiers": ["public"], "params": ["T"] }],
//!     "methods": [{ "name": "get", "modifiers": ["public"], "returns": "T" }] }
//! ] }
//! ```

#![allow(missing_docs)]

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::errors::{OpfError, Result};

/// Root of a descriptor file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UniverseDescriptor {
    pub classes: Vec<ClassDescriptor>,
}

impl UniverseDescriptor {
    /// Parse descriptor JSON.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| OpfError::Descriptor {
            details: format!("malformed descriptor JSON: {err}"),
        })
    }

    /// Load a descriptor from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| OpfError::io(path, source))?;
        Self::from_json(&text)
    }

    /// Append every class of `other`.
    pub fn merge(&mut self, other: Self) {
        self.classes.extend(other.classes);
    }
}

/// Kind of type declaration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Enum,
    Annotation,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClassDescriptor {
    /// Binary name, `pkg.Outer$Inner`.
    pub name: String,
    pub kind: ClassKind,
    pub modifiers: Vec<String>,
    pub type_params: Vec<TypeParamDescriptor>,
    /// Generic superclass; defaults to `java.lang.Object` (or `Enum<Self>`
    /// for enums, or the enum for a constant body).
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    /// Binary name of the declaring class; inferred from `$` when absent.
    pub enclosing: Option<String>,
    pub anonymous: bool,
    pub annotations: Vec<String>,
    pub constructors: Vec<ConstructorDescriptor>,
    pub methods: Vec<MethodDescriptor>,
    pub fields: Vec<FieldDescriptor>,
    pub enum_constants: Vec<EnumConstantDescriptor>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TypeParamDescriptor {
    pub name: String,
    pub bounds: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConstructorDescriptor {
    pub modifiers: Vec<String>,
    pub type_params: Vec<TypeParamDescriptor>,
    pub params: Vec<String>,
    pub synthetic: bool,
    pub annotations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MethodDescriptor {
    pub name: String,
    pub modifiers: Vec<String>,
    pub type_params: Vec<TypeParamDescriptor>,
    pub params: Vec<String>,
    pub returns: String,
    pub bridge: bool,
    pub synthetic: bool,
    pub annotations: Vec<String>,
}

impl Default for MethodDescriptor {
    fn default() -> Self {
        Self {
            name: String::new(),
            modifiers: Vec::new(),
            type_params: Vec::new(),
            params: Vec::new(),
            returns: "void".to_string(),
            bridge: false,
            synthetic: false,
            annotations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FieldDescriptor {
    pub name: String,
    pub modifiers: Vec<String>,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EnumConstantDescriptor {
    pub name: String,
    /// Binary name of the constant's anonymous body class, if it has one.
    pub body: Option<String>,
}

// ──────────────────── type expressions ────────────────────

/// Unresolved generic type expression as written in a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Named { name: String, args: Vec<ArgExpr> },
    Array(Box<TypeExpr>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgExpr {
    Type(TypeExpr),
    Unbounded,
    Extends(TypeExpr),
    Super(TypeExpr),
}

impl TypeExpr {
    /// Parse `java.util.Map<K, ? extends java.util.List<V>>[]` and friends.
    pub fn parse(text: &str) -> Result<Self> {
        let mut parser = ExprParser {
            src: text,
            pos: 0,
        };
        let expr = parser.type_expr()?;
        parser.skip_ws();
        if parser.pos != text.len() {
            return Err(parser.error("trailing characters"));
        }
        Ok(expr)
    }
}

struct ExprParser<'a> {
    src: &'a str,
    pos: usize,
}

impl ExprParser<'_> {
    fn error(&self, what: &str) -> OpfError {
        OpfError::Descriptor {
            details: format!("bad type expression {:?} at offset {}: {what}", self.src, self.pos),
        }
    }

    fn skip_ws(&mut self) {
        while let Some(ch) = self.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.src[self.pos..].starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Result<String> {
        self.skip_ws();
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' || ch == '$' || ch == '.' {
                self.pos += ch.len_utf8();
            } else {
                break;
            }
        }
        if start == self.pos {
            return Err(self.error("expected a type name"));
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn type_expr(&mut self) -> Result<TypeExpr> {
        let name = self.ident()?;
        let mut args = Vec::new();
        if self.eat("<") {
            loop {
                args.push(self.arg_expr()?);
                if self.eat(",") {
                    continue;
                }
                if self.eat(">") {
                    break;
                }
                return Err(self.error("expected ',' or '>'"));
            }
        }
        let mut expr = TypeExpr::Named { name, args };
        while self.eat("[") {
            if !self.eat("]") {
                return Err(self.error("expected ']'"));
            }
            expr = TypeExpr::Array(Box::new(expr));
        }
        Ok(expr)
    }

    fn arg_expr(&mut self) -> Result<ArgExpr> {
        if !self.eat("?") {
            return Ok(ArgExpr::Type(self.type_expr()?));
        }
        self.skip_ws();
        let rest = &self.src[self.pos..];
        if rest.starts_with("extends") {
            self.pos += "extends".len();
            Ok(ArgExpr::Extends(self.type_expr()?))
        } else if rest.starts_with("super") {
            self.pos += "super".len();
            Ok(ArgExpr::Super(self.type_expr()?))
        } else {
            Ok(ArgExpr::Unbounded)
        }
    }
}
