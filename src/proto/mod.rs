//! Wire schema of the agent backend.
//!
//! Declared by hand with prost derives so the crate builds without `protoc`.
//! Field tags must match the backend's schema; nothing else in the crate
//! depends on how these types are encoded.

pub mod messages;
pub mod requests;

pub use messages::*;
pub use requests::*;
