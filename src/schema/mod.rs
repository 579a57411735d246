//! Value types shared by every stage of the engine.

pub mod block;
pub mod chapter;
pub mod template;
pub mod warning;
