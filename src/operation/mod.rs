//! Operations: typed members, raw signatures, specifications and literals.

pub mod literals;
pub mod signature;
pub mod specification;
pub mod typed;
