//! Plain data shared by every tack crate.
//!
//! Nothing in here performs I/O: these are the payloads exchanged with the
//! claim queue and the severity tiers the worker reports back.

mod domain;
pub use domain::*;
