#![forbid(unsafe_code)]

//! Batch extractor that turns a list of YouTube channel ids into two flat
//! tables: one enriched row per video and one comment sample per video.
//!
//! The crate is deliberately synchronous. Every network call blocks until the
//! provider answers, channels are processed in the order given, and the only
//! shared state is the pair of accumulating tables owned by the single thread
//! of control.

pub mod api;
pub mod config;
pub mod duration;
pub mod enrich;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod table;
