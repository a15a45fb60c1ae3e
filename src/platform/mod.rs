// logvet - platform/mod.rs
//
// Platform abstraction layer: local filesystem, SSH transport, and
// platform-appropriate configuration directories.
// Must NOT depend on: core, app.

pub mod config;
pub mod local;
pub mod remote;
