/// Rhythm repair: a bounded fix-point loop that applies one local edit per
/// detected warning until the outline is clean or the budget runs out.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::catalog::BlockCatalog;
use crate::core::constraints::can_place;
use crate::core::layout::{eligible_blocks, phase_for, LayoutContext};
use crate::core::metrics::refresh_all_metrics;
use crate::core::random::pick;
use crate::core::warnings::{
    count_early_redemption, detect_warnings, early_threshold, early_window, is_redemption_beat,
};
use crate::schema::block::{
    BlockCategory, EventBlockDefinition, EventBlockInstance, IntensityLevel, Role, WorldGenre,
};
use crate::schema::chapter::Chapter;
use crate::schema::warning::{RhythmWarning, WarningKind};

pub const MAX_REPAIR_ITERATIONS: usize = 6;

/// Pleasure beats tried, in order, before a random one when relieving a
/// pain overload.
pub const SATISFYING_PLEASURE_IDS: [&str; 3] =
    ["ple-face-slap", "ple-public-vindication", "ple-career-triumph"];

/// Hooks tried, in order, before a random one when a climax is missing.
pub const BIG_REVEAL_HOOK_IDS: [&str; 2] = ["hook-identity-reveal", "hook-truth-bomb"];

/// Result of a repair run. Leftover warnings are normal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairOutcome {
    /// Passes that found and acted on warnings.
    pub iterations: usize,
    /// Warnings still present after the last pass.
    pub remaining: Vec<RhythmWarning>,
}

impl RepairOutcome {
    pub fn is_clean(&self) -> bool {
        self.remaining.is_empty()
    }
}

/// Repair `chapters` in place. Chapters are never added or removed, and
/// every chapter's cached metrics are fresh on return.
pub fn repair(chapters: &mut [Chapter], genre: WorldGenre, ctx: &mut LayoutContext<'_>) -> RepairOutcome {
    let catalog = ctx.catalog;
    let mut iterations = 0;

    while iterations < MAX_REPAIR_ITERATIONS {
        let warnings = detect_warnings(chapters, catalog);
        if warnings.is_empty() {
            break;
        }
        iterations += 1;
        debug!(iteration = iterations, warnings = warnings.len(), "repair pass");

        for warning in &warnings {
            apply_repair(chapters, warning, genre, ctx);
        }
        refresh_all_metrics(chapters, catalog);
    }

    let remaining = detect_warnings(chapters, catalog);
    refresh_all_metrics(chapters, catalog);
    if !remaining.is_empty() {
        debug!(remaining = remaining.len(), "repair budget exhausted");
    }
    RepairOutcome { iterations, remaining }
}

fn apply_repair(chapters: &mut [Chapter], warning: &RhythmWarning, genre: WorldGenre, ctx: &mut LayoutContext<'_>) {
    debug!(warning = %warning.id, "applying repair");
    match (warning.kind, warning.chapter_index) {
        (WarningKind::PainOverload, Some(anchor)) => relieve_pain(chapters, anchor, genre, ctx),
        (WarningKind::ShortMisunderstanding, Some(reveal)) => {
            stretch_misunderstanding(chapters, reveal, ctx.catalog)
        }
        (WarningKind::EarlyRedemption, _) => delay_redemption(chapters, ctx.catalog),
        (WarningKind::MissingClimax, Some(anchor)) => raise_climax(chapters, anchor, genre, ctx),
        _ => {}
    }
}

/// Insert a satisfying pleasure beat in the chapter after the overload
/// window starts.
fn relieve_pain(chapters: &mut [Chapter], anchor: usize, genre: WorldGenre, ctx: &mut LayoutContext<'_>) {
    let Some(last) = chapters.len().checked_sub(1) else {
        return;
    };
    let target = anchor.min(last);
    let catalog = ctx.catalog;

    let relieved = chapters[target].events.iter().any(|e| {
        e.intensity != IntensityLevel::Low
            && catalog.category_of(&e.block_id) == Some(BlockCategory::Pleasure)
    });
    if relieved {
        return;
    }

    let Some(block) = choose_block(chapters, target, BlockCategory::Pleasure, &SATISFYING_PLEASURE_IDS, genre, ctx)
    else {
        return;
    };
    let mut event = ctx.instantiate(block);
    event.intensity = IntensityLevel::Medium;
    event.involved_characters = vec![Role::Female];
    insert_before_hook(&mut chapters[target], event, catalog);
}

/// Push the reveal one chapter later, or drop the misunderstanding when
/// the reveal is already in the final chapter or cannot move without
/// stranding a block that requires it.
fn stretch_misunderstanding(chapters: &mut [Chapter], reveal: usize, catalog: &BlockCatalog) {
    if reveal < 2 || reveal > chapters.len() {
        return;
    }
    let mis_idx = reveal - 2;
    let truth_idx = reveal - 1;
    let next_idx = reveal;

    if next_idx < chapters.len() {
        let found = chapters[truth_idx]
            .events
            .iter()
            .position(|e| catalog.category_of(&e.block_id) == Some(BlockCategory::Truth));
        if let Some(pos) = found {
            let event = chapters[truth_idx].events.remove(pos);
            let block_id = event.block_id.clone();
            let at = insert_before_hook(&mut chapters[next_idx], event, catalog);
            if dependents_satisfied(chapters, &block_id, catalog) {
                return;
            }
            let event = chapters[next_idx].events.remove(at);
            chapters[truth_idx].events.insert(pos, event);
            debug!(block = %block_id, "reveal pinned by a dependent block");
        }
    }

    let found = chapters[mis_idx]
        .events
        .iter()
        .position(|e| catalog.category_of(&e.block_id) == Some(BlockCategory::Misunderstanding));
    if let Some(pos) = found {
        let event = chapters[mis_idx].events.remove(pos);
        if !dependents_satisfied(chapters, &event.block_id, catalog) {
            debug!(block = %event.block_id, "misunderstanding pinned by a dependent block");
            chapters[mis_idx].events.insert(pos, event);
        }
    }
}

/// Whether every event that lists `block_id` as a prerequisite still has
/// it in a strictly earlier chapter.
fn dependents_satisfied(chapters: &[Chapter], block_id: &str, catalog: &BlockCatalog) -> bool {
    let first = chapters.iter().position(|ch| ch.contains_block(block_id));
    chapters.iter().enumerate().all(|(i, ch)| {
        ch.events.iter().all(|e| {
            let requires = catalog
                .get(&e.block_id)
                .and_then(|b| b.prerequisites.as_ref())
                .is_some_and(|pres| pres.iter().any(|pre| pre == block_id));
            !requires || first.is_some_and(|f| f < i)
        })
    })
}

/// Add `event` to `chapter`, keeping a closing hook last. Returns the
/// position it landed at.
fn insert_before_hook(chapter: &mut Chapter, event: EventBlockInstance, catalog: &BlockCatalog) -> usize {
    let ends_on_hook = chapter
        .events
        .last()
        .is_some_and(|e| catalog.category_of(&e.block_id) == Some(BlockCategory::Hook));
    let at = if ends_on_hook {
        chapter.events.len() - 1
    } else {
        chapter.events.len()
    };
    chapter.events.insert(at, event);
    at
}

/// Strip the male lead from early redemption beats until the count drops
/// below threshold. Marker blocks that never listed him cannot be fixed
/// this way and are left alone.
fn delay_redemption(chapters: &mut [Chapter], catalog: &BlockCatalog) {
    let window = early_window(chapters.len());
    let threshold = early_threshold(window);
    let window = window.min(chapters.len());

    while count_early_redemption(chapters, catalog) >= threshold {
        let next = chapters[..window]
            .iter_mut()
            .flat_map(|ch| ch.events.iter_mut())
            .find(|e| is_redemption_beat(e, catalog) && e.involves(Role::Male));
        let Some(event) = next else {
            break;
        };
        event.involved_characters.retain(|r| *r != Role::Male);
        if event.involved_characters.is_empty() {
            event.involved_characters.push(Role::Female);
        }
    }
}

/// Give the climax slot a high-intensity beat: upgrade an existing hook,
/// then an existing pleasure, else insert a big-reveal hook.
fn raise_climax(chapters: &mut [Chapter], anchor: usize, genre: WorldGenre, ctx: &mut LayoutContext<'_>) {
    if anchor == 0 || anchor > chapters.len() {
        return;
    }
    let idx = anchor - 1;
    let catalog = ctx.catalog;

    for category in [BlockCategory::Hook, BlockCategory::Pleasure] {
        let found = chapters[idx]
            .events
            .iter_mut()
            .find(|e| catalog.category_of(&e.block_id) == Some(category));
        if let Some(event) = found {
            event.intensity = IntensityLevel::High;
            return;
        }
    }

    if let Some(block) = choose_block(chapters, idx, BlockCategory::Hook, &BIG_REVEAL_HOOK_IDS, genre, ctx) {
        let mut event = ctx.instantiate(block);
        event.intensity = IntensityLevel::High;
        insert_before_hook(&mut chapters[idx], event, catalog);
    }
}

/// A curated id if any is placeable, otherwise a random placeable block of
/// `category` eligible for the chapter's phase.
fn choose_block<'c>(
    chapters: &[Chapter],
    idx: usize,
    category: BlockCategory,
    curated: &[&str],
    genre: WorldGenre,
    ctx: &mut LayoutContext<'c>,
) -> Option<&'c EventBlockDefinition> {
    let catalog = ctx.catalog;

    let preferred = curated
        .iter()
        .filter(|id| can_place(chapters, idx, id, genre, catalog))
        .find_map(|id| catalog.get(id));
    if preferred.is_some() {
        return preferred;
    }

    let phase = phase_for(idx + 1, chapters.len());
    let pool: Vec<&EventBlockDefinition> = eligible_blocks(catalog, phase, genre)
        .into_iter()
        .filter(|b| b.category == category && can_place(chapters, idx, &b.id, genre, catalog))
        .collect();
    pick(&mut *ctx.rng, &pool).copied()
}
