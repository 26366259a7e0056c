//! Raw signatures: the canonical text form of a constructor or method used
//! for omission patterns, user-supplied signature lists and lookups.
//!
//! The form is `[package.]Class[.member](type,type,...)` with erased
//! parameter types. Classes use their binary name, so a member class is
//! written `Outer$Inner`. A constructor has no member segment.

use std::fmt;

use crate::core::errors::{OpfError, Result};
use crate::reflect::ids::{ClassId, ConstructorId, MemberId, MethodId};
use crate::reflect::universe::ClassUniverse;
use crate::types::ty::{PrimitiveKind, Type};

/// A package name. The unnamed package is its own variant rather than the
/// empty string, so `A(int)` and `.A(int)` never collapse into one form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PackageName {
    Unnamed,
    Named(String),
}

impl PackageName {
    /// `None` is the unnamed package; `Some("")` and illegal dotted paths
    /// are rejected.
    pub fn from_option(name: Option<&str>) -> Result<Self> {
        let Some(name) = name else {
            return Ok(Self::Unnamed);
        };
        if name.is_empty() {
            return Err(OpfError::SignatureParse {
                signature: String::new(),
                details: "package name must not be empty; use the unnamed package".to_string(),
            });
        }
        if !is_legal_package(name) {
            return Err(OpfError::SignatureParse {
                signature: name.to_string(),
                details: "package name is not a dotted identifier path".to_string(),
            });
        }
        Ok(Self::Named(name.to_string()))
    }

    #[must_use]
    pub fn as_option(&self) -> Option<&str> {
        match self {
            Self::Unnamed => None,
            Self::Named(name) => Some(name),
        }
    }
}

/// Whether `name` is a legal dotted sequence of Java identifiers.
#[must_use]
pub fn is_legal_package(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            let mut chars = segment.chars();
            chars
                .next()
                .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
                && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        })
}

/// Canonical (package, class, member, erased parameters) tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawSignature {
    package: PackageName,
    class_name: String,
    name: String,
    params: Vec<String>,
    constructor: bool,
}

impl RawSignature {
    /// A method signature. `class_name` is the binary name without the
    /// package (`Outer$Inner`).
    pub fn new(
        package: Option<&str>,
        class_name: &str,
        name: &str,
        params: Vec<String>,
    ) -> Result<Self> {
        Ok(Self {
            package: PackageName::from_option(package)?,
            class_name: class_name.to_string(),
            name: name.to_string(),
            params,
            constructor: false,
        })
    }

    /// A constructor signature; the member name is the simple class name.
    pub fn constructor(package: Option<&str>, class_name: &str, params: Vec<String>) -> Result<Self> {
        let simple = class_name.rsplit('$').next().unwrap_or(class_name);
        Ok(Self {
            package: PackageName::from_option(package)?,
            class_name: class_name.to_string(),
            name: simple.to_string(),
            params,
            constructor: true,
        })
    }

    #[must_use]
    pub fn of_method(universe: &ClassUniverse, id: MethodId) -> Self {
        let method = universe.method(id);
        let class = universe.class(method.declaring);
        Self {
            package: package_of(class.package()),
            class_name: class.binary_simple_name().to_string(),
            name: method.name.clone(),
            params: method.params.iter().map(|p| universe.erased_name(p)).collect(),
            constructor: false,
        }
    }

    #[must_use]
    pub fn of_constructor(universe: &ClassUniverse, id: ConstructorId) -> Self {
        let ctor = universe.constructor(id);
        let class = universe.class(ctor.declaring);
        let binary = class.binary_simple_name();
        Self {
            package: package_of(class.package()),
            class_name: binary.to_string(),
            name: binary.rsplit('$').next().unwrap_or(binary).to_string(),
            params: ctor.params.iter().map(|p| universe.erased_name(p)).collect(),
            constructor: true,
        }
    }

    #[must_use]
    pub fn package(&self) -> &PackageName {
        &self.package
    }

    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.constructor
    }
}

fn package_of(package: Option<&str>) -> PackageName {
    package.map_or(PackageName::Unnamed, |p| PackageName::Named(p.to_string()))
}

impl fmt::Display for RawSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let PackageName::Named(package) = &self.package {
            write!(f, "{package}.")?;
        }
        f.write_str(&self.class_name)?;
        if !self.constructor {
            write!(f, ".{}", self.name)?;
        }
        write!(f, "({})", self.params.join(","))
    }
}

/// Resolve signature text to the constructor or method it names.
///
/// `pkg.C.m(int)` is first read as member `m` of class `pkg.C`; a member
/// segment of `<init>` means the constructor, and so does the simple class
/// name when no method of that name matches. If that reading fails, the whole path is taken as a class
/// and the signature names one of its constructors.
pub fn parse_signature(text: &str, universe: &ClassUniverse) -> Result<MemberId> {
    let error = |details: String| OpfError::SignatureParse {
        signature: text.to_string(),
        details,
    };
    let (path, param_text) = split_signature(text)
        .ok_or_else(|| error("expected qualified.name(type,...)".to_string()))?;
    let params = parse_params(param_text, universe).map_err(error)?;

    let member_reading = path.rsplit_once('.').and_then(|(prefix, member)| {
        let class = universe.lookup(prefix)?;
        find_member(universe, class, member, &params)
    });
    if let Some(found) = member_reading {
        return Ok(found);
    }
    let class = universe
        .lookup(path)
        .ok_or_else(|| error(format!("no class or member named {path}")))?;
    universe
        .declared_constructor(class, &params)
        .map(MemberId::Constructor)
        .ok_or_else(|| {
            error(format!(
                "{} has no constructor taking ({})",
                universe.class(class).name,
                param_text.trim()
            ))
        })
}

/// Split `path(params)` into its two parts.
fn split_signature(text: &str) -> Option<(&str, &str)> {
    let (path, rest) = text.trim().split_once('(')?;
    let params = rest.strip_suffix(')')?;
    let path = path.trim_end();
    let legal_path = !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '$' | '.' | '<' | '>'));
    (legal_path && !params.contains(['(', ')'])).then_some((path, params))
}

fn find_member(universe: &ClassUniverse, class: ClassId, member: &str, params: &[Type]) -> Option<MemberId> {
    if member == "<init>" {
        return universe
            .declared_constructor(class, params)
            .map(MemberId::Constructor);
    }
    find_method(universe, class, member, params)
        .map(MemberId::Method)
        .or_else(|| {
            // A method may share the simple class name; only then is the
            // segment a constructor alias.
            (member == universe.class(class).simple_name())
                .then(|| universe.declared_constructor(class, params))
                .flatten()
                .map(MemberId::Constructor)
        })
}

fn find_method(universe: &ClassUniverse, class: ClassId, name: &str, params: &[Type]) -> Option<MethodId> {
    // Declared first, then inherited through the superclass chain.
    let mut current = Some(class);
    while let Some(id) = current {
        if let Some(found) = universe.declared_method(id, name, params) {
            return Some(found);
        }
        current = universe.superclass(id).map(|s| s.class);
    }
    universe.methods(class).into_iter().find(|&m| {
        let method = universe.method(m);
        method.name == name && universe.erase_all(&method.params) == params
    })
}

fn parse_params(text: &str, universe: &ClassUniverse) -> std::result::Result<Vec<Type>, String> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split(',')
        .map(|param| resolve_erased(param.trim(), universe))
        .collect()
}

/// An erased type name: primitive, class (binary or dotted) or array.
fn resolve_erased(name: &str, universe: &ClassUniverse) -> std::result::Result<Type, String> {
    if let Some(element) = name.strip_suffix("[]") {
        return Ok(Type::array_of(resolve_erased(element.trim_end(), universe)?));
    }
    if let Some(kind) = PrimitiveKind::from_name(name) {
        return Ok(Type::Primitive(kind));
    }
    universe
        .lookup(name)
        .map(Type::class)
        .ok_or_else(|| format!("unknown parameter type {name}"))
}
