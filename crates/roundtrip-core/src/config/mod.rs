//! Configuration for round-trip runs
//!
//! Settings come from an optional config file (see [`ConfigLoader`]) and are
//! then overridden by command-line flags.

pub mod loader;
pub mod roundtrip_config;

pub use loader::ConfigLoader;
pub use roundtrip_config::RoundtripConfig;
