//! Shared fixtures for unit tests.

use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::catalog::BlockCatalog;
use crate::schema::block::{
    BlockCategory, BlockEffects, EventBlockDefinition, EventBlockInstance, InstanceId,
    IntensityLevel, Phase, PublicLevel, Role, WorldGenre,
};
use crate::schema::chapter::{Chapter, ChapterPosition};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

const ALL_PHASES: &[Phase] = &[Phase::Early, Phase::Mid, Phase::Late];

pub fn def(id: &str, category: BlockCategory, phases: &[Phase]) -> EventBlockDefinition {
    EventBlockDefinition {
        id: id.to_string(),
        name: String::new(),
        description: String::new(),
        category,
        default_intensity: IntensityLevel::Medium,
        default_effects: BlockEffects::default(),
        suggested_phase: phases.to_vec(),
        world_genres: None,
        prerequisites: None,
        max_usages_per_story: None,
    }
}

/// A compact catalog: one universal block per category plus a few
/// constrained blocks.
pub fn test_catalog() -> BlockCatalog {
    let mut blocks = vec![
        def("rel-a", BlockCategory::Relationship, ALL_PHASES),
        def("mis-a", BlockCategory::Misunderstanding, ALL_PHASES),
        def("ple-a", BlockCategory::Pleasure, ALL_PHASES),
        def("pain-a", BlockCategory::Pain, ALL_PHASES),
        def("pain-b", BlockCategory::Pain, ALL_PHASES),
        def("truth-a", BlockCategory::Truth, ALL_PHASES),
        def("obs-a", BlockCategory::Obstacle, ALL_PHASES),
        def("hook-a", BlockCategory::Hook, ALL_PHASES),
    ];

    let mut kneel = def("ple-male-kneel", BlockCategory::Pleasure, &[Phase::Late]);
    kneel.default_intensity = IntensityLevel::High;
    kneel.max_usages_per_story = Some(1);
    blocks.push(kneel);

    blocks.push(def("ple-face-slap", BlockCategory::Pleasure, &[Phase::Mid, Phase::Late]));

    let mut bomb = def("hook-truth-bomb", BlockCategory::Hook, &[Phase::Mid, Phase::Late]);
    bomb.default_intensity = IntensityLevel::High;
    blocks.push(bomb);

    let mut unique = def("obs-unique", BlockCategory::Obstacle, ALL_PHASES);
    unique.max_usages_per_story = Some(1);
    blocks.push(unique);

    let mut campus = def("rel-campus", BlockCategory::Relationship, ALL_PHASES);
    campus.world_genres = Some(vec![WorldGenre::Campus]);
    blocks.push(campus);

    let mut gated = def("obs-after-truth", BlockCategory::Obstacle, ALL_PHASES);
    gated.prerequisites = Some(vec!["truth-a".to_string()]);
    blocks.push(gated);

    BlockCatalog::new(blocks, FxHashMap::default()).unwrap()
}

pub fn instance(block_id: &str, intensity: IntensityLevel) -> EventBlockInstance {
    EventBlockInstance {
        instance_id: InstanceId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
        block_id: block_id.to_string(),
        involved_characters: vec![Role::Male, Role::Female],
        intensity,
        public_level: PublicLevel::Private,
        effects: BlockEffects::default(),
        has_foreshadowing: false,
    }
}

pub fn chapter_with(index: usize, events: &[(&str, IntensityLevel)]) -> Chapter {
    let mut ch = Chapter::new(index, ChapterPosition::Setup);
    ch.events = events
        .iter()
        .map(|(id, intensity)| instance(id, *intensity))
        .collect();
    ch
}

/// Chapters 1..=n from per-chapter event lists.
pub fn story(chapters: &[&[(&str, IntensityLevel)]]) -> Vec<Chapter> {
    chapters
        .iter()
        .enumerate()
        .map(|(i, events)| chapter_with(i + 1, events))
        .collect()
}
