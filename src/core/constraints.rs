/// Placement constraints for event blocks.

use crate::core::catalog::BlockCatalog;
use crate::schema::block::WorldGenre;
use crate::schema::chapter::Chapter;

/// Whether `block_id` may be added to the chapter at 0-based `chapter_index`.
///
/// Usage caps count instances across the whole sequence. Prerequisites
/// only count when they appear in chapters strictly before
/// `chapter_index`; the target chapter and anything after it never
/// satisfy them, even if already populated.
pub fn can_place(
    chapters: &[Chapter],
    chapter_index: usize,
    block_id: &str,
    world_genre: WorldGenre,
    catalog: &BlockCatalog,
) -> bool {
    let Some(block) = catalog.get(block_id) else {
        return false;
    };

    if !block.allows_genre(world_genre) {
        return false;
    }

    if let Some(cap) = block.max_usages_per_story {
        if usage_count(chapters, block_id) >= cap as usize {
            return false;
        }
    }

    if let Some(prerequisites) = &block.prerequisites {
        let earlier = &chapters[..chapter_index.min(chapters.len())];
        let satisfied = prerequisites
            .iter()
            .all(|pre| earlier.iter().any(|ch| ch.contains_block(pre)));
        if !satisfied {
            return false;
        }
    }

    true
}

/// Instances of `block_id` anywhere in the sequence.
pub fn usage_count(chapters: &[Chapter], block_id: &str) -> usize {
    chapters
        .iter()
        .flat_map(|ch| ch.events.iter())
        .filter(|e| e.block_id == block_id)
        .count()
}
