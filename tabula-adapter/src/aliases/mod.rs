//! Re-exports of third-party crates we use in the API.
//!
//! The HashMap should be preferred over the standard library variants or other alternatives.
//! Currently defers to the excellent [hashbrown](https://docs.rs/hashbrown/latest/hashbrown/) crate.

pub mod hash_map;
