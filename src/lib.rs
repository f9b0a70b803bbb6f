// TraceLog - lib.rs
//
// Library entry point. The `tracelog` binary is a thin clap front-end over
// these modules; embedding hosts and the integration tests use them directly.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
