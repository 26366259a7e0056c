//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use opforge::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{OpfError, Result};

// Logging
pub use crate::logger::diagnostics::{DiagnosticEvent, Diagnostics};
pub use crate::logger::jsonl::EventType;

// Class universe
pub use crate::reflect::descriptor::UniverseDescriptor;
pub use crate::reflect::ids::{ClassId, ConstructorId, FieldId, MemberId, MethodId};
pub use crate::reflect::universe::ClassUniverse;

// Types
pub use crate::types::pool::{TypePool, TypePoolBuilder};
pub use crate::types::substitution::Substitution;
pub use crate::types::ty::{ClassType, Type, TypeArg, Wildcard};

// Operations
pub use crate::operation::signature::{PackageName, RawSignature, parse_signature};
pub use crate::operation::typed::{OperationKind, TypedOperation};

// Reflection pipeline
pub use crate::reflection::accessibility::VisibilityPredicate;
pub use crate::reflection::filter::{DefaultReflectionPredicate, ReflectionPredicate};
pub use crate::reflection::instantiator::TypeInstantiator;
pub use crate::reflection::model::{ClassNameErrorHandler, ModelSettings, OperationModel};
pub use crate::reflection::omit::OmitMethodsPredicate;
pub use crate::reflection::walker::{ClassVisitor, ReflectionWalker};
