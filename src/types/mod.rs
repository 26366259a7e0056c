//! Type model: type expressions, substitutions, subtyping and the
//! ground-type pool.

pub mod pool;
pub mod substitution;
pub mod subtype;
pub mod ty;
