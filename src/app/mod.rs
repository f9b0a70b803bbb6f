// TraceLog - app/mod.rs
//
// Application layer: composes core and platform into the operations the
// CLI exposes.

pub mod service;
