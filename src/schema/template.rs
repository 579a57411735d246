use serde::{Deserialize, Serialize};

use super::block::{BlockCategory, IntensityLevel, WorldGenre};
use super::chapter::{Chapter, ChapterPosition};

/// Per-position guidance inside a template's canonical chapter sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateChapterBlueprint {
    /// 1-based index within the template, not within the story.
    pub index: usize,
    pub position: ChapterPosition,
    pub suggested_block_categories: Vec<BlockCategory>,
    pub min_events: usize,
    pub max_events: usize,
}

/// Tone sliders that bias the random layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneConfig {
    /// 1-10.
    pub pain_level: u8,
    /// 1-10.
    pub pleasure_level: u8,
    pub misunderstanding_intensity: IntensityLevel,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            pain_level: 5,
            pleasure_level: 5,
            misunderstanding_intensity: IntensityLevel::Medium,
        }
    }
}

impl ToneConfig {
    /// Acceptance probability for a suggested pain slot.
    pub fn pain_weight(&self) -> f64 {
        f64::from(self.pain_level) / 10.0
    }

    /// Acceptance probability for a suggested pleasure slot.
    pub fn pleasure_weight(&self) -> f64 {
        f64::from(self.pleasure_level) / 10.0
    }

    /// Acceptance probability for a suggested misunderstanding slot.
    pub fn misunderstanding_weight(&self) -> f64 {
        match self.misunderstanding_intensity {
            IntensityLevel::High => 0.8,
            IntensityLevel::Medium => 0.5,
            IntensityLevel::Low => 0.2,
        }
    }

    /// The acceptance weight for a category, or `None` when the category
    /// is always attempted.
    pub fn weight_for(&self, category: BlockCategory) -> Option<f64> {
        match category {
            BlockCategory::Pain => Some(self.pain_weight()),
            BlockCategory::Pleasure => Some(self.pleasure_weight()),
            BlockCategory::Misunderstanding => Some(self.misunderstanding_weight()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldConfig {
    pub genre: WorldGenre,
}

/// A story template: a fixed-shape arc plus default settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryTemplate {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub chapters: Vec<TemplateChapterBlueprint>,
    #[serde(default)]
    pub default_tone: ToneConfig,
    #[serde(default)]
    pub default_world: WorldConfig,
}

/// The slice of a user's story configuration the engine reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryConfig {
    pub template_id: String,
    pub world: WorldConfig,
    pub tone: ToneConfig,
    pub chapter_count: usize,
    /// The current layout; returned unchanged when the template is unknown.
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}
