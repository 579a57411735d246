/// Block catalog and template registry.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::schema::block::{BlockCategory, EventBlockDefinition};
use crate::schema::template::StoryTemplate;

const BUILTIN_BLOCKS: &str = include_str!("../../story_data/blocks.ron");
const BUILTIN_TEMPLATES: &str = include_str!("../../story_data/templates.ron");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("duplicate block id '{0}'")]
    DuplicateBlock(String),
    #[error("block '{block}' requires unknown block '{prerequisite}'")]
    UnknownPrerequisite { block: String, prerequisite: String },
    #[error("duplicate template id '{0}'")]
    DuplicateTemplate(String),
    #[error("template '{template}' blueprint {index}: {reason}")]
    InvalidBlueprint {
        template: String,
        index: usize,
        reason: String,
    },
}

/// Display label for a block category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryLabel {
    pub label: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Deserialize)]
struct RonCatalog {
    blocks: Vec<EventBlockDefinition>,
    #[serde(default)]
    category_labels: FxHashMap<BlockCategory, CategoryLabel>,
}

/// The read-only table of event-block definitions.
///
/// Iteration order is the declaration order of the source file, so that
/// seeded random selection over catalog slices is reproducible.
#[derive(Debug, Clone, Default)]
pub struct BlockCatalog {
    blocks: Vec<EventBlockDefinition>,
    index: FxHashMap<String, usize>,
    category_labels: FxHashMap<BlockCategory, CategoryLabel>,
}

impl BlockCatalog {
    /// Build a catalog, rejecting duplicate ids and dangling prerequisites.
    pub fn new(
        blocks: Vec<EventBlockDefinition>,
        category_labels: FxHashMap<BlockCategory, CategoryLabel>,
    ) -> Result<BlockCatalog, CatalogError> {
        let mut index = FxHashMap::default();
        for (i, block) in blocks.iter().enumerate() {
            if index.insert(block.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateBlock(block.id.clone()));
            }
        }

        for block in &blocks {
            for prerequisite in block.prerequisites.iter().flatten() {
                if !index.contains_key(prerequisite) {
                    return Err(CatalogError::UnknownPrerequisite {
                        block: block.id.clone(),
                        prerequisite: prerequisite.clone(),
                    });
                }
            }
        }

        Ok(BlockCatalog {
            blocks,
            index,
            category_labels,
        })
    }

    /// Load a catalog from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<BlockCatalog, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a catalog from a RON string of shape
    /// `(blocks: [...], category_labels: {...})`.
    pub fn parse_ron(input: &str) -> Result<BlockCatalog, CatalogError> {
        let raw: RonCatalog = ron::from_str(input)?;
        Self::new(raw.blocks, raw.category_labels)
    }

    /// The catalog shipped with the crate.
    pub fn builtin() -> Result<BlockCatalog, CatalogError> {
        Self::parse_ron(BUILTIN_BLOCKS)
    }

    pub fn get(&self, id: &str) -> Option<&EventBlockDefinition> {
        self.index.get(id).map(|&i| &self.blocks[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Category of a block id, if it resolves.
    pub fn category_of(&self, id: &str) -> Option<BlockCategory> {
        self.get(id).map(|b| b.category)
    }

    pub fn blocks(&self) -> &[EventBlockDefinition] {
        &self.blocks
    }

    pub fn by_category(&self, category: BlockCategory) -> impl Iterator<Item = &EventBlockDefinition> {
        self.blocks.iter().filter(move |b| b.category == category)
    }

    pub fn label(&self, category: BlockCategory) -> Option<&CategoryLabel> {
        self.category_labels.get(&category)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Templates by id.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: Vec<StoryTemplate>,
    index: FxHashMap<String, usize>,
}

impl TemplateRegistry {
    pub fn new(templates: Vec<StoryTemplate>) -> Result<TemplateRegistry, CatalogError> {
        let mut index = FxHashMap::default();
        for (i, template) in templates.iter().enumerate() {
            if index.insert(template.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateTemplate(template.id.clone()));
            }
            validate_blueprints(template)?;
        }
        Ok(TemplateRegistry { templates, index })
    }

    /// Load templates from a RON file holding a list of templates.
    pub fn load_from_ron(path: &Path) -> Result<TemplateRegistry, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<TemplateRegistry, CatalogError> {
        let templates: Vec<StoryTemplate> = ron::from_str(input)?;
        Self::new(templates)
    }

    /// The templates shipped with the crate.
    pub fn builtin() -> Result<TemplateRegistry, CatalogError> {
        Self::parse_ron(BUILTIN_TEMPLATES)
    }

    pub fn get(&self, id: &str) -> Option<&StoryTemplate> {
        self.index.get(id).map(|&i| &self.templates[i])
    }

    pub fn templates(&self) -> &[StoryTemplate] {
        &self.templates
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|t| t.id.as_str())
    }

    /// Add templates from `other`, replacing any with the same id.
    pub fn merge(&mut self, other: TemplateRegistry) {
        for template in other.templates {
            match self.index.get(&template.id) {
                Some(&i) => self.templates[i] = template,
                None => {
                    self.index.insert(template.id.clone(), self.templates.len());
                    self.templates.push(template);
                }
            }
        }
    }
}

fn validate_blueprints(template: &StoryTemplate) -> Result<(), CatalogError> {
    let invalid = |index: usize, reason: String| CatalogError::InvalidBlueprint {
        template: template.id.clone(),
        index,
        reason,
    };

    for (i, bp) in template.chapters.iter().enumerate() {
        if bp.index != i + 1 {
            return Err(invalid(
                bp.index,
                format!("expected index {} at this position", i + 1),
            ));
        }
        if bp.min_events > bp.max_events {
            return Err(invalid(
                bp.index,
                format!("min_events {} exceeds max_events {}", bp.min_events, bp.max_events),
            ));
        }
        let mut seen = FxHashSet::default();
        for category in &bp.suggested_block_categories {
            if !seen.insert(*category) {
                return Err(invalid(
                    bp.index,
                    format!("category '{}' suggested twice", category.as_str()),
                ));
            }
        }
    }
    Ok(())
}
