// logvet - lib.rs
//
// Library entry point, exposing all modules for integration testing and
// programmatic use. The CLI wiring lives in `main.rs` and is not part of
// the library surface.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
