//! The reflective pipeline: visibility and inclusion policy, class walks,
//! operation extraction, omission and generic instantiation.

pub mod accessibility;
pub mod extractor;
pub mod filter;
pub mod instantiator;
pub mod model;
pub mod omit;
pub mod operation_set;
pub mod walker;
