// TraceLog - core/mod.rs
//
// Core business logic layer.
// Dependencies: util, plus parsing/serialisation crates (regex, chrono,
// walkdir, csv, serde_json).
// Must NOT depend on: platform, app.

pub mod catalog;
pub mod export;
pub mod model;
pub mod parser;
