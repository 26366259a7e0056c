//! Pre/post/throws specifications attached to operations.
//!
//! Specifications are read from a JSON list keyed by raw signature:
//!
//! ```json
//! [ { "operation": "pkg.A.f(int)",
//!     "pre":    [ { "description": "x positive", "guard": "x > 0" } ],
//!     "post":   [ { "description": "result even", "guard": "true", "property": "result % 2 == 0" } ],
//!     "throws": [ { "description": "x zero", "guard": "x == 0", "exception": "java.lang.ArithmeticException" } ] } ]
//! ```

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::errors::{OpfError, Result};

use super::signature::RawSignature;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default)]
pub struct Precondition {
    pub description: String,
    pub guard: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default)]
pub struct Postcondition {
    pub description: String,
    pub guard: String,
    pub property: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrowsCondition {
    pub description: String,
    pub guard: String,
    pub exception: String,
}

/// Conditions for one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutableSpecification {
    #[serde(rename = "pre")]
    pub preconditions: Vec<Precondition>,
    #[serde(rename = "post")]
    pub postconditions: Vec<Postcondition>,
    pub throws: Vec<ThrowsCondition>,
}

impl ExecutableSpecification {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.preconditions.is_empty() && self.postconditions.is_empty() && self.throws.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct SpecEntry {
    operation: String,
    #[serde(flatten)]
    spec: ExecutableSpecification,
}

/// Source of specifications for extracted operations.
pub trait SpecificationLookup {
    fn lookup(&self, signature: &RawSignature) -> Option<&ExecutableSpecification>;
}

/// Specifications keyed by raw-signature text.
#[derive(Debug, Clone, Default)]
pub struct SpecificationCollection {
    specs: BTreeMap<String, ExecutableSpecification>,
}

impl SpecificationCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let entries: Vec<SpecEntry> = serde_json::from_str(text)?;
        let mut collection = Self::new();
        for entry in entries {
            collection
                .specs
                .entry(normalize(&entry.operation))
                .or_default()
                .merge(entry.spec);
        }
        Ok(collection)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| OpfError::io(path, source))?;
        Self::from_json(&text)
    }

    pub fn insert(&mut self, signature: &RawSignature, spec: ExecutableSpecification) {
        self.specs
            .entry(signature.to_string())
            .or_default()
            .merge(spec);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl ExecutableSpecification {
    fn merge(&mut self, other: Self) {
        self.preconditions.extend(other.preconditions);
        self.postconditions.extend(other.postconditions);
        self.throws.extend(other.throws);
    }
}

impl SpecificationLookup for SpecificationCollection {
    fn lookup(&self, signature: &RawSignature) -> Option<&ExecutableSpecification> {
        self.specs.get(&signature.to_string())
    }
}

fn normalize(signature: &str) -> String {
    signature.chars().filter(|c| !c.is_whitespace()).collect()
}
