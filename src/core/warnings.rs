/// Pacing-defect detection over a chapter sequence.
///
/// Every call rescans the sequence from scratch; nothing is carried over
/// from earlier passes.

use serde::{Deserialize, Serialize};

use crate::core::catalog::BlockCatalog;
use crate::core::metrics::calculate_all_metrics;
use crate::schema::block::{BlockCategory, EventBlockInstance, IntensityLevel, Role};
use crate::schema::chapter::Chapter;
use crate::schema::warning::{RhythmWarning, Severity, WarningKind};

/// Pain above this in three consecutive chapters is an overload...
pub const PAIN_OVERLOAD_PAIN: f64 = 4.0;
/// ...when pleasure stays below this in all three.
pub const PAIN_OVERLOAD_PLEASURE: f64 = 2.0;
pub const PAIN_OVERLOAD_WINDOW: usize = 3;

/// Block id that always counts as a redemption beat.
pub const REDEMPTION_MARKER: &str = "ple-male-kneel";
pub const EARLY_WINDOW_MIN: usize = 3;
pub const EARLY_WINDOW_FRACTION: f64 = 0.5;
pub const EARLY_THRESHOLD_MIN: usize = 3;
pub const EARLY_THRESHOLD_FRACTION: f64 = 0.4;

/// Number of leading chapters inspected by the early-redemption rule.
/// May exceed `total`; callers slice with `min`.
pub fn early_window(total: usize) -> usize {
    EARLY_WINDOW_MIN.max((total as f64 * EARLY_WINDOW_FRACTION).floor() as usize)
}

/// Redemption beats in the early window at or above this count trigger
/// a warning.
pub fn early_threshold(window: usize) -> usize {
    EARLY_THRESHOLD_MIN.max((window as f64 * EARLY_THRESHOLD_FRACTION).ceil() as usize)
}

/// Whether an event reads as the male lead's redemption or pleasure beat.
pub fn is_redemption_beat(event: &EventBlockInstance, catalog: &BlockCatalog) -> bool {
    event.block_id == REDEMPTION_MARKER
        || (catalog.category_of(&event.block_id) == Some(BlockCategory::Pleasure)
            && event.involves(Role::Male))
}

/// Count redemption beats across the early window.
pub fn count_early_redemption(chapters: &[Chapter], catalog: &BlockCatalog) -> usize {
    let window = early_window(chapters.len()).min(chapters.len());
    chapters[..window]
        .iter()
        .flat_map(|ch| ch.events.iter())
        .filter(|e| is_redemption_beat(e, catalog))
        .count()
}

pub(crate) fn has_category(chapter: &Chapter, category: BlockCategory, catalog: &BlockCatalog) -> bool {
    chapter
        .events
        .iter()
        .any(|e| catalog.category_of(&e.block_id) == Some(category))
}

/// Run every pacing rule and concatenate the results in rule order.
pub fn detect_warnings(chapters: &[Chapter], catalog: &BlockCatalog) -> Vec<RhythmWarning> {
    let mut warnings = Vec::new();
    if chapters.is_empty() {
        return warnings;
    }

    detect_pain_overload(chapters, catalog, &mut warnings);
    detect_short_misunderstanding(chapters, catalog, &mut warnings);
    detect_early_redemption(chapters, catalog, &mut warnings);
    detect_missing_climax(chapters, catalog, &mut warnings);

    warnings
}

fn detect_pain_overload(chapters: &[Chapter], catalog: &BlockCatalog, out: &mut Vec<RhythmWarning>) {
    let metrics = calculate_all_metrics(chapters, catalog);

    for (i, window) in metrics.windows(PAIN_OVERLOAD_WINDOW).enumerate() {
        let overloaded = window
            .iter()
            .all(|m| m.pain > PAIN_OVERLOAD_PAIN && m.pleasure < PAIN_OVERLOAD_PLEASURE);
        if overloaded {
            out.push(RhythmWarning {
                id: format!("pain-overload-{}", i + 1),
                kind: WarningKind::PainOverload,
                message: format!(
                    "Chapters {}-{} are heavy on pain with no pleasure beat; readers may drop off",
                    i + 1,
                    i + PAIN_OVERLOAD_WINDOW
                ),
                chapter_index: Some(i + 1),
                severity: Severity::Warning,
            });
        }
    }
}

fn detect_short_misunderstanding(
    chapters: &[Chapter],
    catalog: &BlockCatalog,
    out: &mut Vec<RhythmWarning>,
) {
    for (i, pair) in chapters.windows(2).enumerate() {
        if has_category(&pair[0], BlockCategory::Misunderstanding, catalog)
            && has_category(&pair[1], BlockCategory::Truth, catalog)
        {
            // Anchored on the reveal chapter, one past the misunderstanding.
            let reveal = i + 2;
            out.push(RhythmWarning {
                id: format!("short-mis-{}", reveal),
                kind: WarningKind::ShortMisunderstanding,
                message: format!(
                    "The misunderstanding set up in chapter {} is resolved in chapter {}, only one chapter later",
                    i + 1,
                    reveal
                ),
                chapter_index: Some(reveal),
                severity: Severity::Info,
            });
        }
    }
}

fn detect_early_redemption(chapters: &[Chapter], catalog: &BlockCatalog, out: &mut Vec<RhythmWarning>) {
    let window = early_window(chapters.len());
    let count = count_early_redemption(chapters, catalog);
    if count >= early_threshold(window) {
        out.push(RhythmWarning {
            id: "early-redemption".to_string(),
            kind: WarningKind::EarlyRedemption,
            message: format!(
                "The male lead's redemption is front-loaded: {} redemption or pleasure beats in the first {} chapters",
                count, window
            ),
            chapter_index: None,
            severity: Severity::Warning,
        });
    }
}

fn detect_missing_climax(chapters: &[Chapter], catalog: &BlockCatalog, out: &mut Vec<RhythmWarning>) {
    if chapters.len() < 2 {
        return;
    }
    let anchor = chapters.len() - 1;
    let chapter = &chapters[anchor - 1];
    if chapter.events.is_empty() {
        return;
    }

    let has_climax = chapter.events.iter().any(|e| {
        e.intensity == IntensityLevel::High
            && matches!(
                catalog.category_of(&e.block_id),
                Some(BlockCategory::Pleasure | BlockCategory::Hook)
            )
    });
    if !has_climax {
        out.push(RhythmWarning {
            id: format!("missing-climax-{}", anchor),
            kind: WarningKind::MissingClimax,
            message: format!(
                "Chapter {} is the climax slot but has no high-intensity pleasure or hook beat",
                anchor
            ),
            chapter_index: Some(anchor),
            severity: Severity::Warning,
        });
    }
}

/// A stretch of chapters during which a misunderstanding stays unresolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MisunderstandingSpan {
    /// 1-based chapter that introduces the misunderstanding.
    pub start: usize,
    /// 1-based chapter that resolves it, or the last chapter if it never is.
    pub end: usize,
}

impl MisunderstandingSpan {
    /// Chapters covered, both ends included.
    pub fn duration(&self) -> usize {
        self.end + 1 - self.start
    }
}

/// Walk the sequence pairing each opening misunderstanding with the next
/// truth reveal. Overlapping misunderstandings fold into the open span.
pub fn misunderstanding_spans(chapters: &[Chapter], catalog: &BlockCatalog) -> Vec<MisunderstandingSpan> {
    let mut spans = Vec::new();
    let mut open: Option<usize> = None;

    for (i, chapter) in chapters.iter().enumerate() {
        if open.is_none() && has_category(chapter, BlockCategory::Misunderstanding, catalog) {
            open = Some(i + 1);
        }
        if let Some(start) = open {
            if has_category(chapter, BlockCategory::Truth, catalog) {
                spans.push(MisunderstandingSpan { start, end: i + 1 });
                open = None;
            }
        }
    }

    if let Some(start) = open {
        spans.push(MisunderstandingSpan {
            start,
            end: chapters.len(),
        });
    }
    spans
}
