use serde::{Deserialize, Serialize};

/// Newtype wrapper for event-block instance IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub u64);

/// The structural role an event block plays in a chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockCategory {
    Relationship,
    Misunderstanding,
    Pleasure,
    Pain,
    Truth,
    Obstacle,
    Hook,
}

impl BlockCategory {
    pub const ALL: [BlockCategory; 7] = [
        Self::Relationship,
        Self::Misunderstanding,
        Self::Pleasure,
        Self::Pain,
        Self::Truth,
        Self::Obstacle,
        Self::Hook,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relationship => "relationship",
            Self::Misunderstanding => "misunderstanding",
            Self::Pleasure => "pleasure",
            Self::Pain => "pain",
            Self::Truth => "truth",
            Self::Obstacle => "obstacle",
            Self::Hook => "hook",
        }
    }
}

/// Low / medium / high, used for block intensity and tone enums alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensityLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl IntensityLevel {
    /// Scales every metric contribution of an event.
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::High => 1.5,
            Self::Medium => 1.0,
            Self::Low => 0.6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<IntensityLevel> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Coarse banding of a chapter's position in the story. Ordered by story
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Early,
    Mid,
    Late,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Early, Phase::Mid, Phase::Late];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Early => "early",
            Self::Mid => "mid",
            Self::Late => "late",
        }
    }
}

/// The setting family a story takes place in. Blocks may be restricted
/// to a subset of genres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldGenre {
    #[default]
    Wealthy,
    Campus,
    Workplace,
    Entertainment,
    Cultivation,
}

impl WorldGenre {
    pub const ALL: [WorldGenre; 5] = [
        Self::Wealthy,
        Self::Campus,
        Self::Workplace,
        Self::Entertainment,
        Self::Cultivation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wealthy => "wealthy",
            Self::Campus => "campus",
            Self::Workplace => "workplace",
            Self::Entertainment => "entertainment",
            Self::Cultivation => "cultivation",
        }
    }

    /// Parse a genre name; accepts the snake_case names used by `as_str`.
    pub fn parse(s: &str) -> Option<WorldGenre> {
        let wanted = s.trim().to_lowercase();
        Self::ALL.iter().copied().find(|g| g.as_str() == wanted)
    }
}

/// A character role that can take part in an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Male,
    Female,
    ThirdParty,
}

/// How publicly an event plays out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicLevel {
    #[default]
    Private,
    SemiPublic,
    Public,
}

/// Numeric effect deltas a block applies to the leads' resources.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockEffects {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_delta: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guilt_delta: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fame_delta: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obsession_delta: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub love_delta: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_delta: Option<i32>,
}

/// A catalog entry describing a reusable narrative beat.
///
/// Only the structural metadata (category, phases, genres, prerequisites,
/// usage cap) is interpreted by the engine. `name` and `description` are
/// carried for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBlockDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: BlockCategory,
    #[serde(default)]
    pub default_intensity: IntensityLevel,
    #[serde(default)]
    pub default_effects: BlockEffects,
    pub suggested_phase: Vec<Phase>,
    /// `None` means the block is usable in every genre.
    #[serde(default)]
    pub world_genres: Option<Vec<WorldGenre>>,
    #[serde(default)]
    pub prerequisites: Option<Vec<String>>,
    #[serde(default)]
    pub max_usages_per_story: Option<u32>,
}

impl EventBlockDefinition {
    pub fn fits_phase(&self, phase: Phase) -> bool {
        self.suggested_phase.contains(&phase)
    }

    pub fn allows_genre(&self, genre: WorldGenre) -> bool {
        match &self.world_genres {
            Some(genres) => genres.contains(&genre),
            None => true,
        }
    }
}

/// A placement of a catalog block inside one chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBlockInstance {
    pub instance_id: InstanceId,
    pub block_id: String,
    pub involved_characters: Vec<Role>,
    pub intensity: IntensityLevel,
    #[serde(default)]
    pub public_level: PublicLevel,
    #[serde(default)]
    pub effects: BlockEffects,
    #[serde(default)]
    pub has_foreshadowing: bool,
}

impl EventBlockInstance {
    /// Instantiate a block with its catalog defaults: both leads involved,
    /// private, no foreshadowing.
    pub fn from_definition(instance_id: InstanceId, block: &EventBlockDefinition) -> Self {
        Self {
            instance_id,
            block_id: block.id.clone(),
            involved_characters: vec![Role::Male, Role::Female],
            intensity: block.default_intensity,
            public_level: PublicLevel::Private,
            effects: block.default_effects,
            has_foreshadowing: false,
        }
    }

    pub fn involves(&self, role: Role) -> bool {
        self.involved_characters.contains(&role)
    }
}
