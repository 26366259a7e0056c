//! Reflective substrate: class and member metadata loaded from descriptors.

pub mod descriptor;
pub mod ids;
pub mod modifiers;
pub mod universe;
