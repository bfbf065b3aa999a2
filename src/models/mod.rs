//! Data models for the storage gateway.
//!
//! The gateway keeps no state of its own; these types describe the JSON
//! surface exchanged with callers. They serialize naturally via `serde`.

pub mod envelope;
pub mod object;
