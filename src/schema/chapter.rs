use serde::{Deserialize, Serialize};

use super::block::EventBlockInstance;

/// The narrative beat a chapter plays in the overall arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChapterPosition {
    #[default]
    Setup,
    Encounter,
    Escalation,
    Rift,
    Separation,
    Abyss,
    TurningPoint,
    Eruption,
    Chasing,
    TruthReveal,
    Climax,
    Resolution,
}

impl ChapterPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Encounter => "encounter",
            Self::Escalation => "escalation",
            Self::Rift => "rift",
            Self::Separation => "separation",
            Self::Abyss => "abyss",
            Self::TurningPoint => "turning-point",
            Self::Eruption => "eruption",
            Self::Chasing => "chasing",
            Self::TruthReveal => "truth-reveal",
            Self::Climax => "climax",
            Self::Resolution => "resolution",
        }
    }
}

/// Emotional scores of one chapter, each in `[0, 10]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChapterEmotionMetrics {
    pub pleasure: f64,
    pub pain: f64,
    pub tension: f64,
    pub misunderstanding: f64,
}

impl ChapterEmotionMetrics {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 10.0;

    /// Clamp every score independently into `[MIN, MAX]`.
    pub fn clamped(self) -> Self {
        Self {
            pleasure: self.pleasure.clamp(Self::MIN, Self::MAX),
            pain: self.pain.clamp(Self::MIN, Self::MAX),
            tension: self.tension.clamp(Self::MIN, Self::MAX),
            misunderstanding: self.misunderstanding.clamp(Self::MIN, Self::MAX),
        }
    }
}

/// One chapter of a story outline.
///
/// `metrics` is a cache derived from `events`. It must be refreshed
/// (see [`crate::core::metrics::refresh_all_metrics`]) after any mutation
/// of `events` and before anything reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// 1-based position in the story.
    pub index: usize,
    pub position: ChapterPosition,
    #[serde(default)]
    pub events: Vec<EventBlockInstance>,
    #[serde(default)]
    pub metrics: ChapterEmotionMetrics,
}

impl Chapter {
    /// An empty chapter shell.
    pub fn new(index: usize, position: ChapterPosition) -> Self {
        Self {
            index,
            position,
            events: Vec::new(),
            metrics: ChapterEmotionMetrics::default(),
        }
    }

    pub fn contains_block(&self, block_id: &str) -> bool {
        self.events.iter().any(|e| e.block_id == block_id)
    }
}
