//! Story Rhythm: pacing and layout engine for serialized romance outlines.
//!
//! Scores chapters for pleasure, pain, tension, and misunderstanding,
//! flags pacing defects, stretches story templates onto a target chapter
//! count, and repairs drafts with a bounded loop of local edits.

pub mod core;
pub mod schema;

pub use crate::core::engine::{EngineError, RhythmEngine, RhythmEngineBuilder};
