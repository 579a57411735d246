/// Layout integration tests: end-to-end template-to-outline generation.

use proptest::prelude::*;
use story_rhythm::core::catalog::TemplateRegistry;
use story_rhythm::core::constraints::usage_count;
use story_rhythm::core::layout::{blueprint_index, phase_for};
use story_rhythm::schema::block::{IntensityLevel, Phase, WorldGenre};
use story_rhythm::schema::chapter::{Chapter, ChapterPosition};
use story_rhythm::schema::template::{StoryConfig, ToneConfig, WorldConfig};
use story_rhythm::RhythmEngine;

fn engine(seed: u64) -> RhythmEngine {
    RhythmEngine::builder().seed(seed).build().unwrap()
}

fn config(template_id: &str, chapter_count: usize, genre: WorldGenre) -> StoryConfig {
    StoryConfig {
        template_id: template_id.to_string(),
        world: WorldConfig { genre },
        tone: ToneConfig {
            pain_level: 7,
            pleasure_level: 6,
            misunderstanding_intensity: IntensityLevel::High,
        },
        chapter_count,
        chapters: Vec::new(),
    }
}

fn capped_blocks(engine: &RhythmEngine) -> Vec<(String, u32)> {
    engine
        .catalog()
        .blocks()
        .iter()
        .filter_map(|b| b.max_usages_per_story.map(|cap| (b.id.clone(), cap)))
        .collect()
}

#[test]
fn chasing_wife_stretches_to_any_length() {
    for n in [1, 6, 12, 24, 40] {
        let mut engine = engine(42);
        let chapters = engine.auto_layout(&config("chasing-wife-crematorium", n, WorldGenre::Wealthy));
        assert_eq!(chapters.len(), n);
        for (i, ch) in chapters.iter().enumerate() {
            assert_eq!(ch.index, i + 1);
            assert_eq!(ch.metrics, engine.metrics(ch));
        }
        assert_eq!(chapters[0].position, ChapterPosition::Setup);
        if n > 1 {
            assert_eq!(chapters[n - 1].position, ChapterPosition::Resolution);
        }
    }
}

#[test]
fn same_seed_same_outline() {
    let cfg = config("chasing-wife-crematorium", 18, WorldGenre::Wealthy);
    let a = engine(2024).auto_layout(&cfg);
    let b = engine(2024).auto_layout(&cfg);
    assert_eq!(a, b);
}

#[test]
fn repeated_calls_replay_in_order() {
    let cfg = config("contract-marriage", 10, WorldGenre::Workplace);
    let mut first = engine(5);
    let mut second = engine(5);
    let a: Vec<Vec<Chapter>> = (0..3).map(|_| first.auto_layout(&cfg)).collect();
    let b: Vec<Vec<Chapter>> = (0..3).map(|_| second.auto_layout(&cfg)).collect();
    assert_eq!(a, b);
}

#[test]
fn usage_caps_hold_after_repair() {
    for seed in 0..25 {
        let mut engine = engine(seed);
        let caps = capped_blocks(&engine);
        let chapters = engine.auto_layout(&config("chasing-wife-crematorium", 30, WorldGenre::Wealthy));
        for (id, cap) in &caps {
            assert!(
                usage_count(&chapters, id) <= *cap as usize,
                "seed {}: {} used more than {} times",
                seed,
                id,
                cap
            );
        }
    }
}

fn assert_prerequisites_hold(engine: &RhythmEngine, chapters: &[Chapter], label: &str) {
    for (i, ch) in chapters.iter().enumerate() {
        for event in &ch.events {
            let Some(prerequisites) = engine
                .catalog()
                .get(&event.block_id)
                .and_then(|b| b.prerequisites.clone())
            else {
                continue;
            };
            for pre in prerequisites {
                assert!(
                    chapters[..i].iter().any(|c| c.contains_block(&pre)),
                    "{}: {} in chapter {} without earlier {}",
                    label,
                    event.block_id,
                    i + 1,
                    pre
                );
            }
        }
    }
}

#[test]
fn drafts_respect_prerequisites() {
    let tone = ToneConfig::default();
    let world = WorldConfig {
        genre: WorldGenre::Wealthy,
    };
    for seed in 0..25 {
        let mut engine = engine(seed);
        let chapters = engine
            .generate_layout("chasing-wife-crematorium", &tone, &world, 24)
            .unwrap();
        assert_prerequisites_hold(&engine, &chapters, &format!("seed {}", seed));
    }
}

#[test]
fn repaired_outlines_respect_prerequisites() {
    for template in ["chasing-wife-crematorium", "contract-marriage"] {
        for n in [8, 12, 24] {
            for seed in 0..60 {
                let mut engine = engine(seed);
                let chapters = engine.auto_layout(&config(template, n, WorldGenre::Wealthy));
                assert_prerequisites_hold(&engine, &chapters, &format!("seed {} {} n={}", seed, template, n));
            }
        }
    }
}

#[test]
fn drafts_stay_within_blueprint_maximums() {
    let tone = ToneConfig::default();
    let world = WorldConfig::default();
    let mut engine = engine(11);
    let template = engine.templates().get("chasing-wife-crematorium").unwrap().clone();
    let chapters = engine
        .generate_layout(&template.id, &tone, &world, 20)
        .unwrap();
    for ch in &chapters {
        let bp = &template.chapters[blueprint_index(ch.index, 20, template.chapters.len()) - 1];
        assert_eq!(ch.position, bp.position);
        assert!(ch.events.len() <= bp.max_events);
    }
}

#[test]
fn genre_restricted_blocks_stay_out_of_other_worlds() {
    for seed in 0..15 {
        let mut engine = engine(seed);
        let chapters = engine.auto_layout(&config("chasing-wife-crematorium", 16, WorldGenre::Campus));
        for ch in &chapters {
            for event in &ch.events {
                let block = engine.catalog().get(&event.block_id).unwrap();
                assert!(
                    block.allows_genre(WorldGenre::Campus),
                    "seed {}: {} placed in a campus story",
                    seed,
                    block.id
                );
            }
        }
    }
}

#[test]
fn phases_gate_block_choice_in_drafts() {
    let tone = ToneConfig::default();
    let world = WorldConfig::default();
    let mut engine = engine(3);
    let chapters = engine
        .generate_layout("chasing-wife-crematorium", &tone, &world, 12)
        .unwrap();
    for ch in &chapters {
        let phase = phase_for(ch.index, chapters.len());
        for event in &ch.events {
            let block = engine.catalog().get(&event.block_id).unwrap();
            assert!(block.fits_phase(phase), "{} in {} chapter {}", block.id, phase.as_str(), ch.index);
        }
    }
}

#[test]
fn unknown_template_returns_existing_chapters() {
    let mut engine = engine(1);
    let existing = engine.auto_layout(&config("contract-marriage", 4, WorldGenre::Workplace));
    let mut cfg = config("no-such-template", 9, WorldGenre::Wealthy);
    cfg.chapters = existing.clone();
    assert_eq!(engine.auto_layout(&cfg), existing);
}

#[test]
fn templates_file_overrides_builtin() {
    let path = std::env::temp_dir().join("story_rhythm_layout_tests_templates.ron");
    std::fs::write(
        &path,
        r#"[
            (
                id: "contract-marriage",
                name: "Two Chapter Contract",
                chapters: [
                    (index: 1, position: setup, suggested_block_categories: [relationship], min_events: 1, max_events: 2),
                    (index: 2, position: resolution, suggested_block_categories: [pleasure], min_events: 1, max_events: 2),
                ],
            ),
        ]"#,
    )
    .unwrap();

    let engine = RhythmEngine::builder().templates_path(&path).build().unwrap();
    let merged = engine.templates().get("contract-marriage").unwrap();
    assert_eq!(merged.chapters.len(), 2);
    assert!(engine.templates().get("chasing-wife-crematorium").is_some());

    let _ = std::fs::remove_file(&path);
}

#[test]
fn builtin_templates_are_contiguous() {
    let registry = TemplateRegistry::builtin().unwrap();
    for template in registry.templates() {
        for (i, bp) in template.chapters.iter().enumerate() {
            assert_eq!(bp.index, i + 1, "{}", template.id);
            assert!(bp.min_events <= bp.max_events);
        }
    }
}

proptest! {
    #[test]
    fn remap_hits_both_ends(target in 1_usize..200, len in 1_usize..30) {
        prop_assert_eq!(blueprint_index(1, target, len), 1);
        let last = blueprint_index(target, target, len);
        if target > 1 {
            prop_assert_eq!(last, len);
        }
        for i in 1..=target {
            let idx = blueprint_index(i, target, len);
            prop_assert!((1..=len).contains(&idx));
        }
    }

    #[test]
    fn remap_is_monotonic(target in 2_usize..120, len in 1_usize..30) {
        let mapped: Vec<usize> = (1..=target).map(|i| blueprint_index(i, target, len)).collect();
        prop_assert!(mapped.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn phases_never_go_backwards(total in 1_usize..150) {
        let phases: Vec<Phase> = (1..=total).map(|i| phase_for(i, total)).collect();
        prop_assert_eq!(phases[0], Phase::Early);
        prop_assert!(phases.windows(2).all(|w| w[0] <= w[1]));
    }
}
