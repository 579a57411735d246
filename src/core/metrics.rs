/// Emotion metrics: per-chapter pleasure / pain / tension / misunderstanding scores.

use crate::core::catalog::BlockCatalog;
use crate::schema::block::{BlockCategory, EventBlockInstance};
use crate::schema::chapter::{Chapter, ChapterEmotionMetrics};

/// Score one chapter from its events.
///
/// Events whose block id does not resolve contribute nothing. Each score
/// is clamped to `[0, 10]` after accumulation, so a `truth` block can pull
/// misunderstanding below zero mid-sum without the result going negative.
pub fn calculate_chapter_metrics(chapter: &Chapter, catalog: &BlockCatalog) -> ChapterEmotionMetrics {
    let mut m = ChapterEmotionMetrics::default();

    for event in &chapter.events {
        let Some(category) = catalog.category_of(&event.block_id) else {
            continue;
        };
        accumulate(&mut m, category, event);
    }

    m.clamped()
}

fn accumulate(m: &mut ChapterEmotionMetrics, category: BlockCategory, event: &EventBlockInstance) {
    let k = event.intensity.multiplier();

    match category {
        BlockCategory::Pleasure => {
            m.pleasure += 2.5 * k;
            m.tension += 0.5 * k;
        }
        BlockCategory::Pain => {
            m.pain += 2.5 * k;
            m.tension += 1.0 * k;
        }
        BlockCategory::Misunderstanding => {
            m.misunderstanding += 2.0 * k;
            m.pain += 1.0 * k;
            m.tension += 1.0 * k;
        }
        BlockCategory::Truth => {
            m.pleasure += 1.0 * k;
            m.tension += 1.5 * k;
            m.misunderstanding -= 1.5 * k;
        }
        BlockCategory::Obstacle => {
            m.pain += 1.0 * k;
            m.tension += 2.0 * k;
        }
        BlockCategory::Hook => {
            m.tension += 2.5 * k;
        }
        BlockCategory::Relationship => {
            if event.effects.love_delta.is_some_and(|d| d > 0) {
                m.pleasure += 1.5 * k;
            } else if event.effects.trust_delta.is_some_and(|d| d < 0) {
                m.pain += 1.5 * k;
            }
        }
    }
}

/// Score every chapter independently.
pub fn calculate_all_metrics(chapters: &[Chapter], catalog: &BlockCatalog) -> Vec<ChapterEmotionMetrics> {
    chapters
        .iter()
        .map(|ch| calculate_chapter_metrics(ch, catalog))
        .collect()
}

impl Chapter {
    /// Recompute the cached `metrics` from the current events.
    pub fn refresh_metrics(&mut self, catalog: &BlockCatalog) {
        self.metrics = calculate_chapter_metrics(self, catalog);
    }
}

/// Recompute the cached `metrics` of every chapter.
pub fn refresh_all_metrics(chapters: &mut [Chapter], catalog: &BlockCatalog) {
    for chapter in chapters.iter_mut() {
        chapter.refresh_metrics(catalog);
    }
}
