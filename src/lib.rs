#![forbid(unsafe_code)]

//! opforge: the operation model of a feedback-directed unit-test
//! generator.
//!
//! Given a class universe, opforge decides which constructors, methods,
//! fields and enum constants generated tests may use:
//! 1. **Walk**: visit the reflective surface of each test class under a
//!    visibility policy
//! 2. **Extract**: turn accepted members into typed operations, with an
//!    omission sub-language and override closure
//! 3. **Instantiate**: resolve generic type parameters against a pool of
//!    ground types with a seeded search
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use opforge::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use opforge::core::config::Config;
//! use opforge::reflection::model::{ModelSettings, OperationModel};
//! ```

pub mod prelude;

pub mod core;
pub mod logger;
pub mod operation;
pub mod reflect;
pub mod reflection;
pub mod types;
