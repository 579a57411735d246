//! Layout Preview
//!
//! Generates an outline from a template and prints each chapter's beats,
//! scores, misunderstanding spans, and any pacing warnings left over.

use clap::Parser;
use std::process;
use story_rhythm::core::catalog::BlockCatalog;
use story_rhythm::schema::block::{IntensityLevel, WorldGenre};
use story_rhythm::schema::chapter::Chapter;
use story_rhythm::schema::template::{StoryConfig, ToneConfig, WorldConfig};
use story_rhythm::RhythmEngine;

/// Layout Preview - generate and inspect a chapter outline
#[derive(Parser, Debug)]
#[command(name = "layout_preview")]
#[command(about = "Generate a chapter outline from a story template and print its rhythm")]
struct Args {
    /// Template id (see story_data/templates.ron)
    #[arg(long, default_value = "chasing-wife-crematorium")]
    template: String,

    /// Number of chapters to lay out
    #[arg(long, default_value_t = 12)]
    chapters: usize,

    /// World genre; defaults to the template's
    #[arg(long)]
    genre: Option<String>,

    /// Pain level 0-10; defaults to the template's
    #[arg(long)]
    pain: Option<u8>,

    /// Pleasure level 0-10; defaults to the template's
    #[arg(long)]
    pleasure: Option<u8>,

    /// Misunderstanding intensity: low, medium or high
    #[arg(long)]
    misunderstanding: Option<String>,

    /// Random seed for deterministic runs
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Block catalog RON file (built-in catalog if omitted)
    #[arg(long)]
    catalog: Option<String>,

    /// Extra templates RON file, merged over the built-in ones
    #[arg(long)]
    templates: Option<String>,

    /// Print the raw draft without running the repair loop
    #[arg(long)]
    no_repair: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let mut builder = RhythmEngine::builder().seed(args.seed);
    if let Some(ref path) = args.catalog {
        builder = builder.catalog_path(path);
    }
    if let Some(ref path) = args.templates {
        builder = builder.templates_path(path);
    }
    let mut engine = match builder.build() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    let Some(template) = engine.templates().get(&args.template).cloned() else {
        eprintln!("ERROR: unknown template '{}'", args.template);
        let ids: Vec<&str> = engine.templates().ids().collect();
        eprintln!("Available: {}", ids.join(", "));
        process::exit(1);
    };

    let genre = match args.genre.as_deref() {
        Some(name) => WorldGenre::parse(name).unwrap_or_else(|| {
            eprintln!("ERROR: unknown genre '{}'", name);
            process::exit(1);
        }),
        None => template.default_world.genre,
    };
    let misunderstanding_intensity = match args.misunderstanding.as_deref() {
        Some(level) => IntensityLevel::parse(level).unwrap_or_else(|| {
            eprintln!("ERROR: unknown intensity '{}'", level);
            process::exit(1);
        }),
        None => template.default_tone.misunderstanding_intensity,
    };
    let tone = ToneConfig {
        pain_level: args.pain.unwrap_or(template.default_tone.pain_level).min(10),
        pleasure_level: args.pleasure.unwrap_or(template.default_tone.pleasure_level).min(10),
        misunderstanding_intensity,
    };
    let world = WorldConfig { genre };

    tracing::info!(
        template = %template.id,
        chapters = args.chapters,
        genre = genre.as_str(),
        seed = args.seed,
        "generating layout"
    );

    let chapters = if args.no_repair {
        engine
            .generate_layout(&template.id, &tone, &world, args.chapters)
            .unwrap_or_default()
    } else {
        engine.auto_layout(&StoryConfig {
            template_id: template.id.clone(),
            world,
            tone,
            chapter_count: args.chapters,
            chapters: Vec::new(),
        })
    };

    println!("\n=== {} ({} chapters, {}) ===\n", template.name, chapters.len(), genre.as_str());
    for chapter in &chapters {
        print_chapter(chapter, engine.catalog());
    }

    let spans = engine.misunderstanding_spans(&chapters);
    if !spans.is_empty() {
        println!("\nMisunderstanding spans:");
        for span in &spans {
            println!("  ch {:>2} -> ch {:>2} ({} chapters)", span.start, span.end, span.duration());
        }
    }

    let warnings = engine.detect_warnings(&chapters);
    println!();
    if warnings.is_empty() {
        println!("No pacing warnings.");
    }
    for warning in &warnings {
        let at = warning
            .chapter_index
            .map(|i| format!(" @ch{}", i))
            .unwrap_or_default();
        println!("{:?}{}: {}", warning.severity, at, warning.message);
    }
}

fn print_chapter(chapter: &Chapter, catalog: &BlockCatalog) {
    let m = &chapter.metrics;
    println!(
        "Ch {:>2} [{}]  pleasure {:>4.1}  pain {:>4.1}  tension {:>4.1}  misunderstanding {:>4.1}",
        chapter.index,
        chapter.position.as_str(),
        m.pleasure,
        m.pain,
        m.tension,
        m.misunderstanding
    );
    for event in &chapter.events {
        let (icon, name) = match catalog.get(&event.block_id) {
            Some(block) => (
                catalog
                    .label(block.category)
                    .map(|l| l.icon.as_str())
                    .unwrap_or(""),
                block.name.as_str(),
            ),
            None => ("?", event.block_id.as_str()),
        };
        println!("    {} {} ({})", icon, name, event.intensity.as_str());
    }
}
