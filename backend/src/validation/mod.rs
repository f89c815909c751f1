//! Validation rules for procurement payloads.

pub mod rules;

pub use validator::Validate;
