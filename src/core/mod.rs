// logvet - core/mod.rs
//
// Core business logic layer: pure functions over text and profiles.
// Must NOT depend on: platform, app, or any I/O crate directly.
// No filesystem, no network, no wall clock.

pub mod extract;
pub mod model;
pub mod profile;
pub mod report;
