/// The rhythm engine: catalog + templates + seeded randomness behind one
/// facade. Built via `RhythmEngine::builder()`.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::catalog::{BlockCatalog, CatalogError, TemplateRegistry};
use crate::core::constraints;
use crate::core::layout::{self, LayoutContext};
use crate::core::metrics::{calculate_all_metrics, calculate_chapter_metrics, refresh_all_metrics};
use crate::core::random::{InstanceIdGenerator, RandomSource};
use crate::core::repair::{self, RepairOutcome};
use crate::core::warnings::{self, MisunderstandingSpan};
use crate::schema::block::WorldGenre;
use crate::schema::chapter::{Chapter, ChapterEmotionMetrics};
use crate::schema::template::{StoryConfig, ToneConfig, WorldConfig};
use crate::schema::warning::RhythmWarning;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

pub struct RhythmEngine {
    catalog: BlockCatalog,
    templates: TemplateRegistry,
    ids: InstanceIdGenerator,
    seed: u64,
    generation_count: u64,
}

/// Builder for constructing a `RhythmEngine`.
pub struct RhythmEngineBuilder {
    seed: u64,
    catalog_path: Option<PathBuf>,
    templates_path: Option<PathBuf>,
    /// Directly provided catalog (for testing without files).
    catalog: Option<BlockCatalog>,
    /// Directly provided templates (for testing without files).
    templates: Option<TemplateRegistry>,
}

impl RhythmEngine {
    pub fn builder() -> RhythmEngineBuilder {
        RhythmEngineBuilder {
            seed: 0,
            catalog_path: None,
            templates_path: None,
            catalog: None,
            templates: None,
        }
    }

    pub fn catalog(&self) -> &BlockCatalog {
        &self.catalog
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn metrics(&self, chapter: &Chapter) -> ChapterEmotionMetrics {
        calculate_chapter_metrics(chapter, &self.catalog)
    }

    pub fn all_metrics(&self, chapters: &[Chapter]) -> Vec<ChapterEmotionMetrics> {
        calculate_all_metrics(chapters, &self.catalog)
    }

    pub fn detect_warnings(&self, chapters: &[Chapter]) -> Vec<RhythmWarning> {
        warnings::detect_warnings(chapters, &self.catalog)
    }

    pub fn misunderstanding_spans(&self, chapters: &[Chapter]) -> Vec<MisunderstandingSpan> {
        warnings::misunderstanding_spans(chapters, &self.catalog)
    }

    /// See [`constraints::can_place`]; `chapter_index` is 0-based.
    pub fn can_place(&self, chapters: &[Chapter], chapter_index: usize, block_id: &str, genre: WorldGenre) -> bool {
        constraints::can_place(chapters, chapter_index, block_id, genre, &self.catalog)
    }

    /// Draft a layout from a registered template, or `None` if the id is
    /// unknown.
    pub fn generate_layout(
        &mut self,
        template_id: &str,
        tone: &ToneConfig,
        world: &WorldConfig,
        chapter_count: usize,
    ) -> Option<Vec<Chapter>> {
        let mut rng = self.next_rng();
        self.generate_layout_with(template_id, tone, world, chapter_count, &mut rng)
    }

    pub fn generate_layout_with(
        &mut self,
        template_id: &str,
        tone: &ToneConfig,
        world: &WorldConfig,
        chapter_count: usize,
        rng: &mut dyn RandomSource,
    ) -> Option<Vec<Chapter>> {
        let template = self.templates.get(template_id)?;
        let mut ctx = LayoutContext::new(&self.catalog, rng, &mut self.ids);
        let mut chapters = layout::generate(template, tone, world, chapter_count, &mut ctx);
        refresh_all_metrics(&mut chapters, &self.catalog);
        Some(chapters)
    }

    pub fn repair(&mut self, chapters: &mut [Chapter], genre: WorldGenre) -> RepairOutcome {
        let mut rng = self.next_rng();
        self.repair_with(chapters, genre, &mut rng)
    }

    pub fn repair_with(
        &mut self,
        chapters: &mut [Chapter],
        genre: WorldGenre,
        rng: &mut dyn RandomSource,
    ) -> RepairOutcome {
        if let Some(max) = chapters.iter().flat_map(|c| c.events.iter()).map(|e| e.instance_id).max() {
            self.ids.advance_past(max);
        }
        let mut ctx = LayoutContext::new(&self.catalog, rng, &mut self.ids);
        repair::repair(chapters, genre, &mut ctx)
    }

    /// Generate, repair, and score a full outline for `config`.
    ///
    /// An unknown template id leaves the caller's chapters as they were.
    pub fn auto_layout(&mut self, config: &StoryConfig) -> Vec<Chapter> {
        let mut rng = self.next_rng();
        self.auto_layout_with(config, &mut rng)
    }

    pub fn auto_layout_with(&mut self, config: &StoryConfig, rng: &mut dyn RandomSource) -> Vec<Chapter> {
        let Some(mut chapters) =
            self.generate_layout_with(&config.template_id, &config.tone, &config.world, config.chapter_count, rng)
        else {
            warn!(template = %config.template_id, "unknown template, keeping existing chapters");
            return config.chapters.clone();
        };

        let outcome = self.repair_with(&mut chapters, config.world.genre, rng);
        debug!(
            template = %config.template_id,
            chapters = chapters.len(),
            iterations = outcome.iterations,
            remaining = outcome.remaining.len(),
            "auto layout complete"
        );
        chapters
    }

    fn next_rng(&mut self) -> StdRng {
        let rng = StdRng::seed_from_u64(self.seed.wrapping_add(self.generation_count));
        self.generation_count += 1;
        rng
    }
}

impl RhythmEngineBuilder {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Load the block catalog from a RON file instead of the built-in one.
    pub fn catalog_path(mut self, path: impl AsRef<Path>) -> Self {
        self.catalog_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load extra templates from a RON file; they override same-id
    /// templates from the base registry.
    pub fn templates_path(mut self, path: impl AsRef<Path>) -> Self {
        self.templates_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Provide a catalog directly (for testing without files).
    pub fn with_catalog(mut self, catalog: BlockCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Provide templates directly (for testing without files).
    pub fn with_templates(mut self, templates: TemplateRegistry) -> Self {
        self.templates = Some(templates);
        self
    }

    pub fn build(self) -> Result<RhythmEngine, EngineError> {
        let catalog = match (self.catalog, &self.catalog_path) {
            (Some(catalog), _) => catalog,
            (None, Some(path)) => BlockCatalog::load_from_ron(path)?,
            (None, None) => BlockCatalog::builtin()?,
        };

        let mut templates = match self.templates {
            Some(templates) => templates,
            None => TemplateRegistry::builtin()?,
        };
        if let Some(ref path) = self.templates_path {
            templates.merge(TemplateRegistry::load_from_ron(path)?);
        }

        debug!(
            blocks = catalog.len(),
            templates = templates.templates().len(),
            seed = self.seed,
            "rhythm engine ready"
        );

        Ok(RhythmEngine {
            catalog,
            templates,
            ids: InstanceIdGenerator::new(),
            seed: self.seed,
            generation_count: 0,
        })
    }
}
