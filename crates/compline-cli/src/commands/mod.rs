//! Command implementations.
//!
//! Each built-in lives in its own module; commands declared in the
//! configuration file share [`declared`].

pub mod completion;
pub mod declared;
pub mod hello;
pub mod version;
