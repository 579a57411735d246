/// Layout generation: stretch a template onto a target chapter count and
/// fill each chapter with tone-weighted, constraint-checked event blocks.

use tracing::debug;

use crate::core::catalog::BlockCatalog;
use crate::core::constraints::can_place;
use crate::core::random::{pick, InstanceIdGenerator, RandomSource};
use crate::core::warnings::has_category;
use crate::schema::block::{BlockCategory, EventBlockDefinition, EventBlockInstance, Phase, WorldGenre};
use crate::schema::chapter::Chapter;
use crate::schema::template::{StoryTemplate, ToneConfig, WorldConfig};

/// Early phase covers the first ceil(33%) of chapters...
pub const EARLY_PERCENT: usize = 33;
/// ...mid runs through ceil(66%).
pub const MID_PERCENT: usize = 66;
pub const MIN_EARLY_CHAPTERS: usize = 2;

/// Everything a pass that creates event instances needs to borrow.
pub struct LayoutContext<'a> {
    pub catalog: &'a BlockCatalog,
    pub rng: &'a mut dyn RandomSource,
    pub ids: &'a mut InstanceIdGenerator,
}

impl<'a> LayoutContext<'a> {
    pub fn new(
        catalog: &'a BlockCatalog,
        rng: &'a mut dyn RandomSource,
        ids: &'a mut InstanceIdGenerator,
    ) -> Self {
        Self { catalog, rng, ids }
    }

    /// A fresh instance of `block` with its catalog defaults.
    pub fn instantiate(&mut self, block: &EventBlockDefinition) -> EventBlockInstance {
        EventBlockInstance::from_definition(self.ids.next_id(), block)
    }
}

/// Map 1-based story chapter `chapter` of `target` onto a 1-based template
/// blueprint index, preserving relative position in the arc.
pub fn blueprint_index(chapter: usize, target: usize, template_len: usize) -> usize {
    if template_len <= 1 || target <= 1 {
        return 1;
    }
    let ratio = (chapter.saturating_sub(1)) as f64 / (target - 1) as f64;
    let mapped = (ratio * (template_len - 1) as f64).round() as usize + 1;
    mapped.clamp(1, template_len)
}

/// Last 1-based chapter of the early and mid phases for a story of `total`
/// chapters.
pub fn phase_bounds(total: usize) -> (usize, usize) {
    let early_end = MIN_EARLY_CHAPTERS.max(ceil_percent(total, EARLY_PERCENT));
    let mid_end = (early_end + 1).max(ceil_percent(total, MID_PERCENT));
    (early_end, mid_end)
}

fn ceil_percent(total: usize, percent: usize) -> usize {
    (total * percent).div_ceil(100)
}

/// Phase of 1-based chapter `chapter` in a story of `total` chapters.
pub fn phase_for(chapter: usize, total: usize) -> Phase {
    let (early_end, mid_end) = phase_bounds(total);
    if chapter <= early_end {
        Phase::Early
    } else if chapter <= mid_end {
        Phase::Mid
    } else {
        Phase::Late
    }
}

/// Catalog blocks suitable for a phase and genre, in catalog order.
pub fn eligible_blocks(catalog: &BlockCatalog, phase: Phase, genre: WorldGenre) -> Vec<&EventBlockDefinition> {
    catalog
        .blocks()
        .iter()
        .filter(|b| b.fits_phase(phase) && b.allows_genre(genre))
        .collect()
}

/// Generate a draft layout of `target` chapters.
///
/// Slots that cannot be filled are left empty; chapters may end up below
/// their blueprint minimum. A template without blueprints yields no
/// chapters.
pub fn generate(
    template: &StoryTemplate,
    tone: &ToneConfig,
    world: &WorldConfig,
    target: usize,
    ctx: &mut LayoutContext<'_>,
) -> Vec<Chapter> {
    let template_len = template.chapters.len();
    if template_len == 0 {
        debug!(template = %template.id, "template has no blueprints");
        return Vec::new();
    }

    let mut chapters: Vec<Chapter> = (1..=target)
        .map(|n| {
            let bp = &template.chapters[blueprint_index(n, target, template_len) - 1];
            Chapter::new(n, bp.position)
        })
        .collect();

    for idx in 0..target {
        fill_chapter(&mut chapters, idx, template, tone, world.genre, ctx);
    }

    chapters
}

fn fill_chapter(
    chapters: &mut [Chapter],
    idx: usize,
    template: &StoryTemplate,
    tone: &ToneConfig,
    genre: WorldGenre,
    ctx: &mut LayoutContext<'_>,
) {
    let catalog = ctx.catalog;
    let total = chapters.len();
    let number = idx + 1;
    let phase = phase_for(number, total);
    let bp = &template.chapters[blueprint_index(number, total, template.chapters.len()) - 1];
    let candidates = eligible_blocks(catalog, phase, genre);

    // Suggested categories, gated by tone.
    for &category in &bp.suggested_block_categories {
        let pool: Vec<&EventBlockDefinition> = candidates
            .iter()
            .copied()
            .filter(|b| b.category == category)
            .collect();
        if pool.is_empty() {
            continue;
        }
        if let Some(weight) = tone.weight_for(category) {
            if ctx.rng.next_uniform() > weight {
                continue;
            }
        }
        let Some(&picked) = pick(&mut *ctx.rng, &pool) else {
            continue;
        };
        if chapters[idx].contains_block(&picked.id)
            || !can_place(chapters, idx, &picked.id, genre, catalog)
        {
            continue;
        }
        let event = ctx.instantiate(picked);
        chapters[idx].events.push(event);
    }

    // Top up to the minimum.
    while chapters[idx].events.len() < bp.min_events {
        let remaining: Vec<&EventBlockDefinition> = candidates
            .iter()
            .copied()
            .filter(|b| !chapters[idx].contains_block(&b.id) && can_place(&*chapters, idx, &b.id, genre, catalog))
            .collect();
        let Some(&picked) = pick(&mut *ctx.rng, &remaining) else {
            break;
        };
        let event = ctx.instantiate(picked);
        chapters[idx].events.push(event);
    }

    // Every chapter but the last ends on a hook.
    if number < total && !has_category(&chapters[idx], BlockCategory::Hook, catalog) {
        let hooks: Vec<&EventBlockDefinition> = candidates
            .iter()
            .copied()
            .filter(|b| {
                b.category == BlockCategory::Hook
                    && !chapters[idx].contains_block(&b.id)
                    && can_place(&*chapters, idx, &b.id, genre, catalog)
            })
            .collect();
        if let Some(&picked) = pick(&mut *ctx.rng, &hooks) {
            let event = ctx.instantiate(picked);
            chapters[idx].events.push(event);
        }
    }

    chapters[idx].events.truncate(bp.max_events);

    debug!(
        chapter = number,
        phase = phase.as_str(),
        events = chapters[idx].events.len(),
        min = bp.min_events,
        "filled chapter"
    );
}
