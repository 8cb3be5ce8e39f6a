//! Transcoder tests
//!
//! Node graph <-> Pandoc AST, synchronously and through the async pipelines.

mod citations;
mod fallback;
mod pipeline;
mod round_trip;
