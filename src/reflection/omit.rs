//! Omission patterns: user regexes matched against raw signatures.
//!
//! A pattern matches if it is found anywhere in the signature text
//! (`pkg.C.m(int)`), not only when it spans the whole of it.
//!
//! Closure is one-directional. Omitting an override also omits every
//! method it overrides (see `OperationSet`), so a polymorphic call through
//! a supertype cannot reach the omitted body. Omitting a base method does
//! not omit the methods that override it. Whether that asymmetry is wanted
//! is an open question; it is kept as is.

use regex::Regex;

use crate::core::errors::{BugContext, OpfError, Result};
use crate::operation::typed::TypedOperation;
use crate::reflect::universe::ClassUniverse;

#[derive(Debug, Clone, Default)]
pub struct OmitMethodsPredicate {
    patterns: Vec<Regex>,
}

impl OmitMethodsPredicate {
    /// Compile `patterns` in order. An invalid pattern is a configuration
    /// error.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    #[must_use]
    pub fn matches_signature(&self, signature: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(signature))
    }

    /// Whether a constructor or method call is omitted. Any other kind of
    /// operation is a caller bug.
    pub fn should_omit(&self, universe: &ClassUniverse, op: &TypedOperation) -> Result<bool> {
        let Some(signature) = op.raw_signature(universe) else {
            return Err(OpfError::bug(
                format!("omission test on a {} operation", op.kind.label()),
                BugContext {
                    operation: Some(op.describe(universe).to_string()),
                    declaring_type: Some(universe.display_class_type(&op.declaring_type)),
                    walked_class: None,
                },
            ));
        };
        if self.patterns.is_empty() {
            return Ok(false);
        }
        Ok(self.matches_signature(&signature.to_string()))
    }
}
