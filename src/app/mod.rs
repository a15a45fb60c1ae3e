// logvet - app/mod.rs
//
// Application layer: check orchestration and profile loading.
// Dependencies: core and platform layers.

pub mod check;
pub mod profile_mgr;
