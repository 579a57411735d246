/// Rhythm integration tests over the built-in catalog.

use proptest::prelude::*;
use story_rhythm::core::catalog::BlockCatalog;
use story_rhythm::core::constraints::{can_place, usage_count};
use story_rhythm::core::layout::LayoutContext;
use story_rhythm::core::metrics::{calculate_all_metrics, calculate_chapter_metrics};
use story_rhythm::core::random::{InstanceIdGenerator, ScriptedSource};
use story_rhythm::core::repair::{repair, MAX_REPAIR_ITERATIONS};
use story_rhythm::core::warnings::{detect_warnings, misunderstanding_spans, MisunderstandingSpan};
use story_rhythm::schema::block::{EventBlockInstance, InstanceId, IntensityLevel, Role, WorldGenre};
use story_rhythm::schema::chapter::{Chapter, ChapterPosition};
use story_rhythm::schema::warning::{Severity, WarningKind};

fn catalog() -> BlockCatalog {
    BlockCatalog::builtin().unwrap()
}

/// Build chapters 1..=n from (block id, intensity) lists, using catalog
/// defaults for everything else.
fn outline(catalog: &BlockCatalog, chapters: &[&[(&str, IntensityLevel)]]) -> Vec<Chapter> {
    let mut ids = InstanceIdGenerator::new();
    chapters
        .iter()
        .enumerate()
        .map(|(i, events)| {
            let mut chapter = Chapter::new(i + 1, ChapterPosition::Setup);
            for &(id, intensity) in events.iter() {
                let def = catalog.get(id).unwrap_or_else(|| panic!("no block {}", id));
                let mut event = EventBlockInstance::from_definition(ids.next_id(), def);
                event.intensity = intensity;
                chapter.events.push(event);
            }
            chapter
        })
        .collect()
}

fn count(warnings: &[story_rhythm::schema::warning::RhythmWarning], kind: WarningKind) -> usize {
    warnings.iter().filter(|w| w.kind == kind).count()
}

const HEAVY: &[(&str, IntensityLevel)] = &[
    ("pain-public-humiliation", IntensityLevel::High),
    ("pain-divorce-papers", IntensityLevel::High),
];

#[test]
fn builtin_catalog_loads() {
    let catalog = catalog();
    assert!(catalog.len() >= 40);
    assert!(catalog.contains("ple-male-kneel"));
    for id in ["ple-face-slap", "ple-public-vindication", "ple-career-triumph", "hook-identity-reveal", "hook-truth-bomb"] {
        assert!(catalog.contains(id), "missing curated block {}", id);
    }
}

#[test]
fn pain_overload_example() {
    let catalog = catalog();
    let chapters = outline(&catalog, &[HEAVY, HEAVY, HEAVY]);
    let metrics = calculate_all_metrics(&chapters, &catalog);
    for m in &metrics {
        assert!((m.pain - 7.5).abs() < 1e-9);
        assert_eq!(m.pleasure, 0.0);
    }

    let warnings = detect_warnings(&chapters, &catalog);
    let overloads: Vec<_> = warnings
        .iter()
        .filter(|w| w.kind == WarningKind::PainOverload)
        .collect();
    assert_eq!(overloads.len(), 1);
    assert_eq!(overloads[0].chapter_index, Some(1));
    assert_eq!(overloads[0].id, "pain-overload-1");
}

#[test]
fn short_misunderstanding_example() {
    let catalog = catalog();
    let chapters = outline(
        &catalog,
        &[
            &[("mis-overheard-call", IntensityLevel::Medium)],
            &[("truth-diary-found", IntensityLevel::Medium)],
            &[],
        ],
    );
    let warnings = detect_warnings(&chapters, &catalog);
    let short: Vec<_> = warnings
        .iter()
        .filter(|w| w.kind == WarningKind::ShortMisunderstanding)
        .collect();
    assert_eq!(short.len(), 1);
    assert_eq!(short[0].chapter_index, Some(2));
    assert_eq!(short[0].severity, Severity::Info);
}

#[test]
fn missing_climax_example() {
    let catalog = catalog();
    let flat = outline(
        &catalog,
        &[&[], &[], &[], &[("obs-rival-scheme", IntensityLevel::Medium)], &[]],
    );
    let warnings = detect_warnings(&flat, &catalog);
    assert_eq!(count(&warnings, WarningKind::MissingClimax), 1);
    assert_eq!(warnings[0].chapter_index, Some(4));

    let peaked = outline(
        &catalog,
        &[&[], &[], &[], &[("hook-truth-bomb", IntensityLevel::High)], &[]],
    );
    assert_eq!(count(&detect_warnings(&peaked, &catalog), WarningKind::MissingClimax), 0);
}

#[test]
fn early_redemption_counts_male_pleasure_beats() {
    let catalog = catalog();
    let triumph: &[(&str, IntensityLevel)] = &[("ple-career-triumph", IntensityLevel::Medium)];
    let chapters = outline(&catalog, &[triumph, triumph, triumph, &[], &[], &[]]);
    let warnings = detect_warnings(&chapters, &catalog);
    assert_eq!(count(&warnings, WarningKind::EarlyRedemption), 1);
    assert_eq!(
        warnings
            .iter()
            .find(|w| w.kind == WarningKind::EarlyRedemption)
            .and_then(|w| w.chapter_index),
        None
    );

    // Late beats are outside the window.
    let chapters = outline(&catalog, &[&[], &[], &[], triumph, triumph, triumph]);
    assert_eq!(count(&detect_warnings(&chapters, &catalog), WarningKind::EarlyRedemption), 0);
}

#[test]
fn spans_follow_misunderstanding_to_reveal() {
    let catalog = catalog();
    let chapters = outline(
        &catalog,
        &[
            &[("mis-white-moonlight-return", IntensityLevel::High)],
            &[("pain-cold-war", IntensityLevel::Medium)],
            &[("mis-overheard-call", IntensityLevel::Medium)],
            &[("truth-witness-testimony", IntensityLevel::Medium)],
            &[("mis-jealousy-trap", IntensityLevel::Medium)],
        ],
    );
    assert_eq!(
        misunderstanding_spans(&chapters, &catalog),
        vec![
            MisunderstandingSpan { start: 1, end: 4 },
            MisunderstandingSpan { start: 5, end: 5 },
        ]
    );
}

#[test]
fn kneel_needs_an_earlier_sacrifice_and_is_capped() {
    let catalog = catalog();
    let chapters = outline(
        &catalog,
        &[&[], &[("truth-past-sacrifice", IntensityLevel::High)], &[], &[]],
    );
    assert!(!can_place(&chapters, 1, "ple-male-kneel", WorldGenre::Wealthy, &catalog));
    assert!(can_place(&chapters, 2, "ple-male-kneel", WorldGenre::Wealthy, &catalog));

    let mut with_kneel = chapters.clone();
    let def = catalog.get("ple-male-kneel").unwrap();
    with_kneel[2]
        .events
        .push(EventBlockInstance::from_definition(InstanceId(999), def));
    assert_eq!(usage_count(&with_kneel, "ple-male-kneel"), 1);
    assert!(!can_place(&with_kneel, 3, "ple-male-kneel", WorldGenre::Wealthy, &catalog));
}

#[test]
fn genre_locked_blocks() {
    let catalog = catalog();
    let chapters = outline(&catalog, &[&[]]);
    assert!(can_place(&chapters, 0, "obs-sect-rules", WorldGenre::Cultivation, &catalog));
    assert!(!can_place(&chapters, 0, "obs-sect-rules", WorldGenre::Campus, &catalog));
    assert!(!can_place(&chapters, 0, "not-a-block", WorldGenre::Wealthy, &catalog));
}

#[test]
fn repair_clears_the_overload_example() {
    let catalog = catalog();
    let mut chapters = outline(&catalog, &[HEAVY, HEAVY, HEAVY, &[]]);
    let mut rng = ScriptedSource::default();
    let mut ids = InstanceIdGenerator::starting_after(100);
    let mut ctx = LayoutContext::new(&catalog, &mut rng, &mut ids);
    let outcome = repair(&mut chapters, WorldGenre::Wealthy, &mut ctx);

    assert!(outcome.is_clean(), "left: {:?}", outcome.remaining);
    let slap = chapters[1]
        .events
        .iter()
        .find(|e| e.block_id == "ple-face-slap")
        .unwrap();
    assert_eq!(slap.intensity, IntensityLevel::Medium);
    assert_eq!(slap.involved_characters, vec![Role::Female]);
    assert!(chapters[2].contains_block("hook-identity-reveal"));
}

const BLOCK_IDS: &[&str] = &[
    "rel-cold-dinner",
    "rel-shared-secret",
    "mis-overheard-call",
    "mis-jealousy-trap",
    "ple-face-slap",
    "ple-career-triumph",
    "ple-male-kneel",
    "pain-cold-war",
    "pain-public-humiliation",
    "truth-diary-found",
    "truth-past-sacrifice",
    "obs-rival-scheme",
    "hook-cliffhanger-call",
    "hook-truth-bomb",
    "no-such-block",
];

fn intensity() -> impl Strategy<Value = IntensityLevel> {
    prop_oneof![
        Just(IntensityLevel::Low),
        Just(IntensityLevel::Medium),
        Just(IntensityLevel::High),
    ]
}

fn chapter_events() -> impl Strategy<Value = Vec<(usize, IntensityLevel)>> {
    prop::collection::vec((0..BLOCK_IDS.len(), intensity()), 0..6)
}

fn build(raw: &[Vec<(usize, IntensityLevel)>]) -> Vec<Chapter> {
    let mut next = 1;
    raw.iter()
        .enumerate()
        .map(|(i, events)| {
            let mut chapter = Chapter::new(i + 1, ChapterPosition::Chasing);
            for &(b, intensity) in events {
                chapter.events.push(EventBlockInstance {
                    instance_id: InstanceId(next),
                    block_id: BLOCK_IDS[b].to_string(),
                    involved_characters: vec![Role::Male, Role::Female],
                    intensity,
                    public_level: Default::default(),
                    effects: Default::default(),
                    has_foreshadowing: false,
                });
                next += 1;
            }
            chapter
        })
        .collect()
}

proptest! {
    #[test]
    fn metrics_are_bounded_and_deterministic(raw in prop::collection::vec(chapter_events(), 1..8)) {
        let catalog = catalog();
        let chapters = build(&raw);
        for chapter in &chapters {
            let a = calculate_chapter_metrics(chapter, &catalog);
            let b = calculate_chapter_metrics(chapter, &catalog);
            prop_assert_eq!(a, b);
            for v in [a.pleasure, a.pain, a.tension, a.misunderstanding] {
                prop_assert!((0.0..=10.0).contains(&v));
            }
        }
    }

    #[test]
    fn repair_terminates_and_keeps_chapters(
        raw in prop::collection::vec(chapter_events(), 1..16),
        script in prop::collection::vec(0.0f64..1.0, 0..8),
    ) {
        let catalog = catalog();
        let mut chapters = build(&raw);
        let shells: Vec<(usize, ChapterPosition)> = chapters.iter().map(|c| (c.index, c.position)).collect();

        let mut rng = ScriptedSource::new(script);
        let mut ids = InstanceIdGenerator::starting_after(10_000);
        let mut ctx = LayoutContext::new(&catalog, &mut rng, &mut ids);
        let outcome = repair(&mut chapters, WorldGenre::Wealthy, &mut ctx);

        prop_assert!(outcome.iterations <= MAX_REPAIR_ITERATIONS);
        let after: Vec<(usize, ChapterPosition)> = chapters.iter().map(|c| (c.index, c.position)).collect();
        prop_assert_eq!(shells, after);
        for chapter in &chapters {
            prop_assert_eq!(chapter.metrics, calculate_chapter_metrics(chapter, &catalog));
        }
        prop_assert_eq!(outcome.remaining, detect_warnings(&chapters, &catalog));
    }
}
