//! Catalog Linter
//!
//! Validates a block catalog and template file pair: load errors, phase
//! coverage per category, blueprint slots no block can fill, and
//! prerequisites that can only appear after the block that needs them.

use clap::Parser;
use std::path::Path;
use std::process;
use story_rhythm::core::catalog::{BlockCatalog, TemplateRegistry};
use story_rhythm::core::layout::{eligible_blocks, phase_for};
use story_rhythm::schema::block::{BlockCategory, Phase, WorldGenre};

/// Catalog Linter - check block and template data files
#[derive(Parser, Debug)]
#[command(name = "catalog_linter")]
#[command(about = "Validate a block catalog and story template files")]
struct Args {
    /// Block catalog RON file
    #[arg(long, default_value = "story_data/blocks.ron")]
    catalog: String,

    /// Story templates RON file
    #[arg(long, default_value = "story_data/templates.ron")]
    templates: String,

    /// Only check blueprint coverage for this genre (all genres if omitted)
    #[arg(long)]
    genre: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let genres: Vec<WorldGenre> = match args.genre.as_deref() {
        Some(name) => match WorldGenre::parse(name) {
            Some(genre) => vec![genre],
            None => {
                eprintln!("ERROR: unknown genre '{}'", name);
                process::exit(1);
            }
        },
        None => WorldGenre::ALL.to_vec(),
    };

    let catalog = match BlockCatalog::load_from_ron(Path::new(&args.catalog)) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("ERROR: Failed to load catalog {}: {}", args.catalog, e);
            process::exit(1);
        }
    };
    let templates = match TemplateRegistry::load_from_ron(Path::new(&args.templates)) {
        Ok(templates) => templates,
        Err(e) => {
            eprintln!("ERROR: Failed to load templates {}: {}", args.templates, e);
            process::exit(1);
        }
    };

    tracing::info!(
        blocks = catalog.len(),
        templates = templates.templates().len(),
        "loaded data files"
    );

    let (errors, warnings) = lint(&catalog, &templates, &genres);

    println!("\n=== Catalog Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if !errors.is_empty() {
        process::exit(1);
    }
}

fn lint(catalog: &BlockCatalog, templates: &TemplateRegistry, genres: &[WorldGenre]) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Every category should have something to offer in every phase.
    for category in BlockCategory::ALL {
        for phase in Phase::ALL {
            if !catalog.by_category(category).any(|b| b.fits_phase(phase)) {
                warnings.push(format!(
                    "No '{}' block is suggested for the {} phase",
                    category.as_str(),
                    phase.as_str()
                ));
            }
        }
    }

    // Blueprint slots, at the template's native length.
    for template in templates.templates() {
        let len = template.chapters.len();
        for bp in &template.chapters {
            let phase = phase_for(bp.index, len);
            for &genre in genres {
                let eligible = eligible_blocks(catalog, phase, genre);
                for &category in &bp.suggested_block_categories {
                    if !eligible.iter().any(|b| b.category == category) {
                        warnings.push(format!(
                            "Template '{}' chapter {} ({}) suggests '{}' but no {} block fits the {} world",
                            template.id,
                            bp.index,
                            bp.position.as_str(),
                            category.as_str(),
                            phase.as_str(),
                            genre.as_str()
                        ));
                    }
                }
                if eligible.len() < bp.min_events {
                    warnings.push(format!(
                        "Template '{}' chapter {} needs {} events but only {} blocks fit the {} world",
                        template.id,
                        bp.index,
                        bp.min_events,
                        eligible.len(),
                        genre.as_str()
                    ));
                }
            }
        }
    }

    // A prerequisite that only ever lands after its dependent makes the
    // dependent unplaceable.
    for block in catalog.blocks() {
        let Some(prerequisites) = &block.prerequisites else {
            continue;
        };
        let Some(&latest) = block.suggested_phase.iter().max() else {
            errors.push(format!("Block '{}' has no suggested phase", block.id));
            continue;
        };
        for pre in prerequisites {
            let Some(required) = catalog.get(pre) else {
                continue;
            };
            match required.suggested_phase.iter().min() {
                Some(&earliest) if earliest > latest => errors.push(format!(
                    "Block '{}' ({} at the latest) requires '{}' which cannot appear before the {} phase",
                    block.id,
                    latest.as_str(),
                    pre,
                    earliest.as_str()
                )),
                Some(&earliest) if earliest == latest && block.suggested_phase.len() == 1 => {
                    warnings.push(format!(
                        "Block '{}' and its prerequisite '{}' share only the {} phase",
                        block.id,
                        pre,
                        latest.as_str()
                    ))
                }
                Some(_) => {}
                None => errors.push(format!("Block '{}' has no suggested phase", pre)),
            }
        }
    }

    (errors, warnings)
}
