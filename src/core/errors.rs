//! OPF-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, OpfError>;

/// Diagnostic context attached to internal invariant violations.
///
/// Every field is optional because some invariants are checked before an
/// operation has been built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BugContext {
    pub operation: Option<String>,
    pub declaring_type: Option<String>,
    pub walked_class: Option<String>,
}

impl fmt::Display for BugContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (label, value) in [
            ("operation", &self.operation),
            ("declaring type", &self.declaring_type),
            ("walked class", &self.walked_class),
        ] {
            if let Some(value) = value {
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{label}: {value}")?;
                first = false;
            }
        }
        if first {
            f.write_str("no context")?;
        }
        Ok(())
    }
}

/// Top-level error type for opforge.
#[derive(Debug, Error)]
pub enum OpfError {
    #[error("[OPF-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[OPF-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[OPF-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[OPF-2001] class universe descriptor error: {details}")]
    Descriptor { details: String },

    #[error("[OPF-2002] class not found: {name}")]
    ClassNotFound { name: String },

    #[error("[OPF-2003] literals file error: {details}\n{record}")]
    LiteralsParse { details: String, record: String },

    #[error("[OPF-2004] cannot parse signature {signature:?}: {details}")]
    SignatureParse { signature: String, details: String },

    #[error("[OPF-2005] annotation contract violated: {details}")]
    AnnotationContract { details: String },

    #[error("[OPF-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[OPF-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[OPF-3900] internal bug: {details} [{context}]")]
    InternalBug { details: String, context: BugContext },
}

impl OpfError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "OPF-1001",
            Self::MissingConfig { .. } => "OPF-1002",
            Self::ConfigParse { .. } => "OPF-1003",
            Self::Descriptor { .. } => "OPF-2001",
            Self::ClassNotFound { .. } => "OPF-2002",
            Self::LiteralsParse { .. } => "OPF-2003",
            Self::SignatureParse { .. } => "OPF-2004",
            Self::AnnotationContract { .. } => "OPF-2005",
            Self::Serialization { .. } => "OPF-2101",
            Self::Io { .. } => "OPF-3002",
            Self::InternalBug { .. } => "OPF-3900",
        }
    }

    /// Whether the error stems from user-supplied input that can be skipped
    /// while processing continues with the remaining inputs.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::ClassNotFound { .. } | Self::SignatureParse { .. }
        )
    }

    /// Whether the error is a bug in the tool itself rather than bad input.
    #[must_use]
    pub const fn is_internal_bug(&self) -> bool {
        matches!(self, Self::InternalBug { .. })
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Convenience constructor for internal invariant violations.
    #[must_use]
    pub fn bug(details: impl Into<String>, context: BugContext) -> Self {
        Self::InternalBug {
            details: details.into(),
            context,
        }
    }
}

impl From<serde_json::Error> for OpfError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for OpfError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<regex::Error> for OpfError {
    fn from(value: regex::Error) -> Self {
        Self::InvalidConfig {
            details: format!("invalid regular expression: {value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_variants() -> Vec<OpfError> {
        vec![
            OpfError::InvalidConfig {
                details: String::new(),
            },
            OpfError::MissingConfig {
                path: PathBuf::new(),
            },
            OpfError::ConfigParse {
                context: "",
                details: String::new(),
            },
            OpfError::Descriptor {
                details: String::new(),
            },
            OpfError::ClassNotFound {
                name: String::new(),
            },
            OpfError::LiteralsParse {
                details: String::new(),
                record: String::new(),
            },
            OpfError::SignatureParse {
                signature: String::new(),
                details: String::new(),
            },
            OpfError::AnnotationContract {
                details: String::new(),
            },
            OpfError::Serialization {
                context: "",
                details: String::new(),
            },
            OpfError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other("test"),
            },
            OpfError::InternalBug {
                details: String::new(),
                context: BugContext::default(),
            },
        ]
    }

    #[test]
    fn error_codes_are_unique() {
        let codes: Vec<&str> = all_variants().iter().map(OpfError::code).collect();
        let unique: std::collections::HashSet<&&str> = codes.iter().collect();
        assert_eq!(
            codes.len(),
            unique.len(),
            "error codes must be unique: {codes:?}"
        );
    }

    #[test]
    fn error_codes_have_opf_prefix() {
        for err in &all_variants() {
            assert!(
                err.code().starts_with("OPF-"),
                "code {} must start with OPF-",
                err.code()
            );
            assert!(err.to_string().contains(err.code()));
        }
    }

    #[test]
    fn user_errors_and_bugs_are_distinct() {
        for err in &all_variants() {
            assert!(!(err.is_user_error() && err.is_internal_bug()));
        }
        assert!(
            OpfError::ClassNotFound {
                name: "x.Y".to_string()
            }
            .is_user_error()
        );
        assert!(OpfError::bug("boom", BugContext::default()).is_internal_bug());
        assert!(
            !OpfError::LiteralsParse {
                details: String::new(),
                record: String::new()
            }
            .is_user_error()
        );
    }

    #[test]
    fn bug_display_carries_full_context() {
        let err = OpfError::bug(
            "declaring type is not a supertype of the walked class",
            BugContext {
                operation: Some("pkg.A.f(int)".to_string()),
                declaring_type: Some("pkg.A".to_string()),
                walked_class: Some("pkg.B".to_string()),
            },
        );
        let msg = err.to_string();
        assert!(msg.contains("OPF-3900"));
        assert!(msg.contains("operation: pkg.A.f(int)"));
        assert!(msg.contains("declaring type: pkg.A"));
        assert!(msg.contains("walked class: pkg.B"));
    }

    #[test]
    fn empty_bug_context_renders_placeholder() {
        assert_eq!(BugContext::default().to_string(), "no context");
    }

    #[test]
    fn io_convenience_constructor() {
        let err = OpfError::io(
            "/tmp/universe.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.code(), "OPF-3002");
        assert!(err.to_string().contains("/tmp/universe.json"));
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: OpfError = json_err.into();
        assert_eq!(err.code(), "OPF-2101");
    }

    #[test]
    fn from_toml_error() {
        let toml_err = toml::from_str::<toml::Value>("= invalid").unwrap_err();
        let err: OpfError = toml_err.into();
        assert_eq!(err.code(), "OPF-1003");
    }

    #[test]
    fn from_regex_error() {
        let re_err = regex::Regex::new("(unclosed").unwrap_err();
        let err: OpfError = re_err.into();
        assert_eq!(err.code(), "OPF-1001");
    }
}
