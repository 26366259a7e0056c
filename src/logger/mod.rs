//! Logging: JSONL writer and the diagnostics handle built on it.

pub mod diagnostics;
pub mod jsonl;
